//! compress: диспетчер кодеков для содержимого bin'ов.
//!
//! Чтение: zlib, bz2/bzip2, gzip, lzw (unix compress), lzma/lzma2 (сырой поток
//! с синтезированными properties, см. `lzma`). Запись: всегда zlib.
//!
//! Неизвестный токен -> `SlobError::UnsupportedCompression`.

pub mod lzma;
pub mod lzw;

use std::fmt;
use std::io::{Cursor, Read, Write};

use anyhow::Result;
use bzip2::read::BzDecoder;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;

use crate::errors::SlobError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Zlib,
    Bzip2,
    Gzip,
    Lzw,
    Lzma,
    Lzma2,
}

impl Compression {
    /// Токен из заголовка -> кодек. Регистр не важен, хвостовые NUL отбрасываются.
    pub fn from_token(token: &str) -> Result<Self> {
        match token.trim_end_matches('\0').to_ascii_lowercase().as_str() {
            "zlib" => Ok(Compression::Zlib),
            "bz2" | "bzip2" => Ok(Compression::Bzip2),
            "gzip" => Ok(Compression::Gzip),
            "lzw" => Ok(Compression::Lzw),
            "lzma" => Ok(Compression::Lzma),
            "lzma2" => Ok(Compression::Lzma2),
            _ => Err(SlobError::UnsupportedCompression(token.to_string()).into()),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Compression::Zlib => "zlib",
            Compression::Bzip2 => "bz2",
            Compression::Gzip => "gzip",
            Compression::Lzw => "lzw",
            Compression::Lzma => "lzma",
            Compression::Lzma2 => "lzma2",
        }
    }

    /// Для lzma-семейства недочитанный хвост bin'а деградирует в заглушку.
    pub fn tolerates_truncated_tail(self) -> bool {
        matches!(self, Compression::Lzma | Compression::Lzma2)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Распаковывающий reader над сжатыми байтами bin'а.
///
/// zlib/bzip2/gzip распаковываются потоково; lzma и lzw декодируются целиком
/// в буфер (у этих форматов нет потокового декодера в используемых крейтах).
pub fn decompressor<'a>(method: Compression, compressed: &'a [u8]) -> Result<Box<dyn Read + 'a>> {
    let r: Box<dyn Read + 'a> = match method {
        Compression::Zlib => Box::new(ZlibDecoder::new(compressed)),
        Compression::Bzip2 => Box::new(BzDecoder::new(compressed)),
        Compression::Gzip => Box::new(GzDecoder::new(compressed)),
        Compression::Lzw => Box::new(Cursor::new(lzw::decompress(compressed)?)),
        Compression::Lzma | Compression::Lzma2 => {
            Box::new(Cursor::new(lzma::decompress_prefixed(compressed)?))
        }
    };
    Ok(r)
}

/// Распаковать целиком (диагностика/CLI).
pub fn decompress_all(method: Compression, compressed: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decompressor(method, compressed)?.read_to_end(&mut out)?;
    Ok(out)
}

/// zlib-писатель для bin'ов (единственный кодек записи).
pub fn zlib_writer<W: Write>(w: W, level: u32) -> ZlibEncoder<W> {
    ZlibEncoder::new(w, flate2::Compression::new(level))
}
