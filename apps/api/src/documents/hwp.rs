//! HWP 5.x body text reader.
//!
//! An HWP file is an OLE compound document. `FileHeader` carries the
//! compression/encryption flags, and each `BodyText/SectionN` stream is a
//! sequence of tagged records; paragraph text lives in `PARA_TEXT` records as
//! UTF-16LE with inline control codes.

use std::io::{Cursor, Read};

use flate2::read::DeflateDecoder;

use super::DocumentError;

const SIGNATURE: &[u8] = b"HWP Document File";
const FLAG_COMPRESSED: u32 = 0x01;
const FLAG_ENCRYPTED: u32 = 0x02;
const HWPTAG_PARA_TEXT: u32 = 0x10 + 51;
/// Inline and extended controls span eight UTF-16 units including the code itself.
const CONTROL_WIDTH: usize = 8;

pub(super) fn extract(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut file =
        cfb::CompoundFile::open(Cursor::new(bytes)).map_err(|e| DocumentError::Hwp(e.to_string()))?;

    let header = read_stream(&mut file, "/FileHeader")?;
    let flags = parse_header(&header)?;
    if flags & FLAG_ENCRYPTED != 0 {
        return Err(DocumentError::Hwp("password-protected documents are not supported".into()));
    }

    let mut text = String::new();
    let mut section = 0;
    loop {
        let path = format!("/BodyText/Section{section}");
        if !file.exists(&path) {
            break;
        }
        let raw = read_stream(&mut file, &path)?;
        let body = if flags & FLAG_COMPRESSED != 0 {
            inflate(&raw)?
        } else {
            raw
        };
        collect_section_text(&body, &mut text)?;
        section += 1;
    }

    if section == 0 {
        return Err(DocumentError::Hwp("no BodyText sections".into()));
    }
    Ok(text)
}

fn read_stream<F: Read + std::io::Seek>(
    file: &mut cfb::CompoundFile<F>,
    path: &str,
) -> Result<Vec<u8>, DocumentError> {
    let mut stream = file
        .open_stream(path)
        .map_err(|e| DocumentError::Hwp(format!("{path}: {e}")))?;
    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .map_err(|e| DocumentError::Hwp(format!("{path}: {e}")))?;
    Ok(buf)
}

/// Validates the signature and returns the property flags.
fn parse_header(header: &[u8]) -> Result<u32, DocumentError> {
    if header.len() < 40 || !header.starts_with(SIGNATURE) {
        return Err(DocumentError::Hwp("missing HWP signature".into()));
    }
    Ok(u32::from_le_bytes([header[36], header[37], header[38], header[39]]))
}

fn inflate(raw: &[u8]) -> Result<Vec<u8>, DocumentError> {
    let mut out = Vec::new();
    DeflateDecoder::new(raw)
        .read_to_end(&mut out)
        .map_err(|e| DocumentError::Hwp(format!("section decompression failed: {e}")))?;
    Ok(out)
}

fn collect_section_text(body: &[u8], out: &mut String) -> Result<(), DocumentError> {
    let mut pos = 0;
    while pos + 4 <= body.len() {
        let header = read_u32(body, pos);
        pos += 4;

        let tag = header & 0x3FF;
        let mut size = (header >> 20) as usize;
        if size == 0xFFF {
            if pos + 4 > body.len() {
                return Err(DocumentError::Hwp("truncated record header".into()));
            }
            size = read_u32(body, pos) as usize;
            pos += 4;
        }

        let end = pos
            .checked_add(size)
            .filter(|&end| end <= body.len())
            .ok_or_else(|| DocumentError::Hwp("record extends past end of section".into()))?;

        if tag == HWPTAG_PARA_TEXT {
            decode_para_text(&body[pos..end], out);
        }
        pos = end;
    }
    Ok(())
}

fn read_u32(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

fn decode_para_text(payload: &[u8], out: &mut String) {
    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let mut visible = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        match unit {
            // Single-unit char controls.
            0 | 24..=31 => i += 1,
            10 | 13 => {
                visible.push(u16::from(b'\n'));
                i += 1;
            }
            9 => {
                visible.push(u16::from(b'\t'));
                i += CONTROL_WIDTH;
            }
            1..=8 | 11 | 12 | 14..=23 => i += CONTROL_WIDTH,
            _ => {
                visible.push(unit);
                i += 1;
            }
        }
    }

    out.extend(
        char::decode_utf16(visible).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}
