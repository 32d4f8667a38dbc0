//! Best-effort text extraction from uploaded chat attachments.
//!
//! Extraction never fails a chat turn: unsupported extensions, corrupt
//! archives, and parser errors all come back as the empty string, with a
//! warning logged for the operator.

use std::io::{Cursor, Read};

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `UploadedDocument` used across Orin components.
pub struct UploadedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Extracts plain text from `document` based on its file extension.
pub fn extract_text(document: &UploadedDocument) -> String {
    let extension = std::path::Path::new(&document.file_name)
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => extract_pdf_text(document),
        Some("docx") => extract_docx_text(document),
        Some("txt") => String::from_utf8_lossy(&document.bytes).into_owned(),
        _ => String::new(),
    }
}

fn extract_pdf_text(document: &UploadedDocument) -> String {
    match pdf_extract::extract_text_from_mem(&document.bytes) {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(
                file_name = document.file_name.as_str(),
                error = %error,
                "pdf text extraction failed"
            );
            String::new()
        }
    }
}

fn extract_docx_text(document: &UploadedDocument) -> String {
    match read_docx_document_xml(&document.bytes) {
        Ok(xml) => flatten_docx_xml(&xml),
        Err(error) => {
            tracing::warn!(
                file_name = document.file_name.as_str(),
                error = %error,
                "docx text extraction failed"
            );
            String::new()
        }
    }
}

fn read_docx_document_xml(bytes: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("failed to open docx archive")?;
    let mut entry = archive
        .by_name("word/document.xml")
        .context("docx archive has no word/document.xml")?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .context("failed to read word/document.xml")?;
    Ok(xml)
}

/// Strips WordprocessingML markup, keeping run text with paragraph and line
/// breaks rendered as newlines.
fn flatten_docx_xml(xml: &str) -> String {
    let mut text = String::new();
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in xml.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' => {
                in_tag = false;
                if tag == "/w:p" || tag.starts_with("w:br") {
                    text.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => text.push(ch),
        }
    }

    decode_xml_entities(text.trim_end_matches('\n'))
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
