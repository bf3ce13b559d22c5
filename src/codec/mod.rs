//! codec: big-endian примитивы формата SLOB.
//!
//! Что здесь:
//! - u8/u16/u32/u64 чтение/запись (BE) поверх `Read`/`Write`;
//! - три вида строк с префиксом длины:
//!   * tiny text: [len u8][bytes]   (0..=255)
//!   * text     : [len u16][bytes]  (0..=65535)
//!   * big text : [len u32][bytes]  (0..=2^31-1)
//!
//! Нехватка байт при чтении -> `SlobError::Truncated`; слишком длинная строка
//! при записи -> `SlobError::TextTooLong`. Единственное «состояние»:
//! scratch-буфер вызывающего, который переиспользуется между чтениями.

pub mod encoding;

pub use encoding::TextEncoding;

use anyhow::{anyhow, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::consts::{BIG_TEXT_MAX, TEXT_MAX, TINY_TEXT_MAX};
use crate::errors::SlobError;

/// Вид фрейминга строки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Tiny,
    Text,
    Big,
}

impl Framing {
    pub fn name(self) -> &'static str {
        match self {
            Framing::Tiny => "tiny text",
            Framing::Text => "text",
            Framing::Big => "big text",
        }
    }

    pub fn max_len(self) -> usize {
        match self {
            Framing::Tiny => TINY_TEXT_MAX,
            Framing::Text => TEXT_MAX,
            Framing::Big => BIG_TEXT_MAX,
        }
    }

    /// Размер префикса длины в байтах.
    pub fn prefix_len(self) -> usize {
        match self {
            Framing::Tiny => 1,
            Framing::Text => 2,
            Framing::Big => 4,
        }
    }
}

/// io::Error -> anyhow; UnexpectedEof становится `Truncated`.
pub(crate) fn map_eof(e: io::Error, what: &'static str, expected: u64) -> anyhow::Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        SlobError::Truncated { what, expected }.into()
    } else {
        anyhow!(e)
    }
}

// ---------- integers over streams ----------

pub fn read_u8<R: Read>(r: &mut R, what: &'static str) -> Result<u8> {
    r.read_u8().map_err(|e| map_eof(e, what, 1))
}

pub fn read_u16<R: Read>(r: &mut R, what: &'static str) -> Result<u16> {
    r.read_u16::<BigEndian>().map_err(|e| map_eof(e, what, 2))
}

pub fn read_u32<R: Read>(r: &mut R, what: &'static str) -> Result<u32> {
    r.read_u32::<BigEndian>().map_err(|e| map_eof(e, what, 4))
}

pub fn read_u64<R: Read>(r: &mut R, what: &'static str) -> Result<u64> {
    r.read_u64::<BigEndian>().map_err(|e| map_eof(e, what, 8))
}

pub fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_u8(v)?;
    Ok(())
}

pub fn write_u16<W: Write>(w: &mut W, v: u16) -> Result<()> {
    w.write_u16::<BigEndian>(v)?;
    Ok(())
}

pub fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_u32::<BigEndian>(v)?;
    Ok(())
}

pub fn write_u64<W: Write>(w: &mut W, v: u64) -> Result<()> {
    w.write_u64::<BigEndian>(v)?;
    Ok(())
}

// ---------- framed strings ----------

/// Прочитать ровно `len` байт в scratch (растёт по требованию).
pub fn read_exact_into<'a, R: Read>(
    r: &mut R,
    len: usize,
    scratch: &'a mut Vec<u8>,
    what: &'static str,
) -> Result<&'a [u8]> {
    if scratch.len() < len {
        scratch.resize(len, 0);
    }
    r.read_exact(&mut scratch[..len])
        .map_err(|e| map_eof(e, what, len as u64))?;
    Ok(&scratch[..len])
}

/// Прочитать строку указанного фрейминга.
pub fn read_framed<R: Read>(
    r: &mut R,
    framing: Framing,
    enc: TextEncoding,
    scratch: &mut Vec<u8>,
) -> Result<String> {
    let what = framing.name();
    let len = match framing {
        Framing::Tiny => read_u8(r, what)? as usize,
        Framing::Text => read_u16(r, what)? as usize,
        Framing::Big => {
            let n = read_u32(r, what)? as usize;
            if n > BIG_TEXT_MAX {
                return Err(anyhow!("big text length {} exceeds {}", n, BIG_TEXT_MAX));
            }
            n
        }
    };
    let bytes = read_exact_into(r, len, scratch, what)?;
    Ok(enc.decode(bytes))
}

pub fn read_tiny_text<R: Read>(r: &mut R, enc: TextEncoding, scratch: &mut Vec<u8>) -> Result<String> {
    read_framed(r, Framing::Tiny, enc, scratch)
}

pub fn read_text<R: Read>(r: &mut R, enc: TextEncoding, scratch: &mut Vec<u8>) -> Result<String> {
    read_framed(r, Framing::Text, enc, scratch)
}

pub fn read_big_text<R: Read>(r: &mut R, enc: TextEncoding, scratch: &mut Vec<u8>) -> Result<String> {
    read_framed(r, Framing::Big, enc, scratch)
}

/// Записать строку указанного фрейминга. Возвращает число записанных байт
/// (префикс + данные).
pub fn write_framed<W: Write>(
    w: &mut W,
    framing: Framing,
    value: &str,
    enc: TextEncoding,
) -> Result<usize> {
    let bytes = enc.encode(value);
    if bytes.len() > framing.max_len() {
        return Err(SlobError::TextTooLong {
            framing: framing.name(),
            len: bytes.len(),
            max: framing.max_len(),
        }
        .into());
    }
    match framing {
        Framing::Tiny => write_u8(w, bytes.len() as u8)?,
        Framing::Text => write_u16(w, bytes.len() as u16)?,
        Framing::Big => write_u32(w, bytes.len() as u32)?,
    }
    w.write_all(&bytes)?;
    Ok(framing.prefix_len() + bytes.len())
}

pub fn write_tiny_text<W: Write>(w: &mut W, value: &str, enc: TextEncoding) -> Result<usize> {
    write_framed(w, Framing::Tiny, value, enc)
}

pub fn write_text<W: Write>(w: &mut W, value: &str, enc: TextEncoding) -> Result<usize> {
    write_framed(w, Framing::Text, value, enc)
}

pub fn write_big_text<W: Write>(w: &mut W, value: &str, enc: TextEncoding) -> Result<usize> {
    write_framed(w, Framing::Big, value, enc)
}
