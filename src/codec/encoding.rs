//! codec/encoding: текстовые кодировки заголовка SLOB (utf-7, utf-8, utf-32, ascii).
//!
//! Декодирование «мягкое»: некорректные последовательности заменяются
//! (U+FFFD для utf-8/utf-32/utf-7, '?' для ascii), как это делает исходный рантайм.

use std::fmt;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use byteorder::{ByteOrder, LittleEndian};

use crate::errors::SlobError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf7,
    Utf8,
    /// UTF-32 little-endian.
    Utf32,
    Ascii,
}

impl TextEncoding {
    /// Имя из заголовка -> кодировка (регистр не важен).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim_end_matches('\0').to_ascii_lowercase().as_str() {
            "utf-7" => Ok(TextEncoding::Utf7),
            "utf-8" => Ok(TextEncoding::Utf8),
            "utf-32" => Ok(TextEncoding::Utf32),
            "ascii" => Ok(TextEncoding::Ascii),
            _ => Err(SlobError::UnsupportedEncoding(name.to_string()).into()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf7 => "utf-7",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf32 => "utf-32",
            TextEncoding::Ascii => "ascii",
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Ascii => bytes
                .iter()
                .map(|&b| if b < 0x80 { b as char } else { '?' })
                .collect(),
            TextEncoding::Utf32 => {
                let mut out = String::with_capacity(bytes.len() / 4);
                let mut chunks = bytes.chunks_exact(4);
                for c in &mut chunks {
                    let cp = LittleEndian::read_u32(c);
                    out.push(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                if !chunks.remainder().is_empty() {
                    out.push(char::REPLACEMENT_CHARACTER);
                }
                out
            }
            TextEncoding::Utf7 => decode_utf7(bytes),
        }
    }

    pub fn encode(self, s: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => s.as_bytes().to_vec(),
            TextEncoding::Ascii => s
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            TextEncoding::Utf32 => {
                let mut out = Vec::with_capacity(s.len() * 4);
                for c in s.chars() {
                    let mut b = [0u8; 4];
                    LittleEndian::write_u32(&mut b, c as u32);
                    out.extend_from_slice(&b);
                }
                out
            }
            TextEncoding::Utf7 => encode_utf7(s),
        }
    }

    /// Длина в байтах после кодирования.
    pub fn byte_len(self, s: &str) -> usize {
        match self {
            TextEncoding::Utf8 => s.len(),
            TextEncoding::Ascii => s.chars().count(),
            TextEncoding::Utf32 => s.chars().count() * 4,
            TextEncoding::Utf7 => encode_utf7(s).len(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn is_b64(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

#[inline]
fn is_utf7_direct(c: char) -> bool {
    (c.is_ascii_graphic() || c == ' ' || c == '\t' || c == '\r' || c == '\n')
        && c != '+'
        && c != '\\'
        && c != '~'
}

/// RFC 2152: прямые ASCII-символы и base64-сдвиги "+<utf-16be в base64>-".
fn decode_utf7(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'+' {
            out.push(if b < 0x80 {
                b as char
            } else {
                char::REPLACEMENT_CHARACTER
            });
            i += 1;
            continue;
        }

        i += 1;
        let start = i;
        // '+' внутри сдвига: часть алфавита, но run начинается только с не-'-'
        while i < bytes.len() && is_b64(bytes[i]) {
            i += 1;
        }
        let run = &bytes[start..i];
        let terminated_by_dash = i < bytes.len() && bytes[i] == b'-';
        if terminated_by_dash {
            i += 1;
        }

        if run.is_empty() {
            // "+-" -> '+'
            out.push('+');
            continue;
        }

        match STANDARD_NO_PAD.decode(run) {
            Ok(raw) => {
                let units = raw
                    .chunks_exact(2)
                    .map(|p| u16::from_be_bytes([p[0], p[1]]));
                for r in char::decode_utf16(units) {
                    out.push(r.unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
            Err(_) => out.push(char::REPLACEMENT_CHARACTER),
        }
    }
    out
}

fn encode_utf7(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut pending: Vec<u8> = Vec::new();

    let flush = |pending: &mut Vec<u8>, out: &mut Vec<u8>| {
        if pending.is_empty() {
            return;
        }
        out.push(b'+');
        out.extend_from_slice(STANDARD_NO_PAD.encode(&pending[..]).as_bytes());
        out.push(b'-');
        pending.clear();
    };

    for c in s.chars() {
        if c == '+' {
            flush(&mut pending, &mut out);
            out.extend_from_slice(b"+-");
        } else if is_utf7_direct(c) {
            flush(&mut pending, &mut out);
            out.push(c as u8);
        } else {
            let mut units = [0u16; 2];
            for u in c.encode_utf16(&mut units) {
                pending.extend_from_slice(&u.to_be_bytes());
            }
        }
    }
    flush(&mut pending, &mut out);
    out
}
