//! Document information post-processing built on top of `lopdf`.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::error::Result;

/// Sets the `/Author` entry of the document information dictionary.
///
/// The information dictionary is created when the trailer does not reference one.
pub fn set_author(pdf_bytes: &[u8], author: &str) -> Result<Vec<u8>> {
    let mut document = Document::load_mem(pdf_bytes)?;

    let info_id = info_dictionary_id(&mut document);
    if let Some(Object::Dictionary(info)) = document.objects.get_mut(&info_id) {
        info.set("Author", encode_text(author));
    }

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Reads the `/Author` entry, if any.
pub fn author(pdf_bytes: &[u8]) -> Result<Option<String>> {
    let document = Document::load_mem(pdf_bytes)?;

    let Some(info) = document
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok()
        .and_then(|id| document.get_dictionary(id).ok())
    else {
        return Ok(None);
    };

    match info.get(b"Author") {
        Ok(Object::String(bytes, _)) => Ok(Some(decode_text(bytes))),
        _ => Ok(None),
    }
}

/// Counts the pages of a rendered document.
pub fn page_count(pdf_bytes: &[u8]) -> Result<usize> {
    let document = Document::load_mem(pdf_bytes)?;
    Ok(document.get_pages().len())
}

fn info_dictionary_id(document: &mut Document) -> ObjectId {
    let existing = document
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok()
        .filter(|id| matches!(document.objects.get(id), Some(Object::Dictionary(_))));

    match existing {
        Some(id) => id,
        None => {
            let id = document.add_object(Dictionary::new());
            document.trailer.set("Info", Object::Reference(id));
            id
        }
    }
}

/// ASCII text is stored as a literal string, anything else as UTF-16BE with a byte order mark.
fn encode_text(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_text(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect::<Vec<_>>();
            String::from_utf16_lossy(&units)
        }
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}
