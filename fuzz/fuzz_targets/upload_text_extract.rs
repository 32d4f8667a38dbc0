#![no_main]

use libfuzzer_sys::fuzz_target;
use orin_extract::{extract_text, UploadedDocument};

fuzz_target!(|data: &[u8]| {
    let text_file = UploadedDocument::new("fuzz.txt", data.to_vec());
    assert_eq!(
        extract_text(&text_file),
        String::from_utf8_lossy(data).into_owned()
    );

    let archive = UploadedDocument::new("fuzz.docx", data.to_vec());
    let _ = extract_text(&archive);

    let unknown = UploadedDocument::new("fuzz.bin", data.to_vec());
    assert!(extract_text(&unknown).is_empty());
});
