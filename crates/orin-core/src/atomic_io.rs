use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};

/// Writes `content` through a sibling temp file plus rename, so a concurrent
/// reader sees either the old document or the new one, never a torn write.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("destination path cannot be empty");
    }
    if path.is_dir() {
        bail!("destination path '{}' is a directory", path.display());
    }

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let temp_path = sibling_temp_path(&parent, path);
    let mut file = std::fs::File::create(&temp_path)
        .with_context(|| format!("failed to create temporary file {}", temp_path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("failed to write temporary file {}", temp_path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush temporary file {}", temp_path.display()))?;
    drop(file);

    std::fs::rename(&temp_path, path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            temp_path.display(),
            path.display()
        )
    })
}

fn sibling_temp_path(parent: &Path, path: &Path) -> PathBuf {
    static WRITE_COUNTER: AtomicU64 = AtomicU64::new(0);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");
    let nonce = WRITE_COUNTER.fetch_add(1, Ordering::Relaxed);
    parent.join(format!(".{file_name}.{}-{nonce}.tmp", std::process::id()))
}
