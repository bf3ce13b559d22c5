//! compress/lzma: bins, сжатые lzma/lzma2.
//!
//! Полного LZMA-заголовка в bin'е нет. Перед сырыми данными лежит 6-байтовый
//! префикс, последний байт которого: props (lc/lp/pb). Dictionary size
//! синтезируется из фиксированного показателя (LZMA_DICT_EXPONENT_BYTE), после
//! чего поток декодируется как LZMA с неизвестной распакованной длиной.
//!
//! Декодер потоковый, в режиме allow_incomplete: обрезанный поток отдаёт всё,
//! что удалось распаковать; недостающие элементы bin'а обрабатывает store.

use std::io::Write;

use anyhow::{anyhow, Result};
use byteorder::{ByteOrder, LittleEndian};
use lzma_rs::decompress::{Options, Stream, UnpackedSize};

use crate::consts::{LZMA_DICT_EXPONENT_BYTE, LZMA_PREFIX_LEN};
use crate::errors::SlobError;

/// Размер словаря по «байту показателя» (формула 7-zip: 40 -> максимум).
pub fn dictionary_size(exponent_byte: u32) -> u32 {
    if exponent_byte >= 40 {
        u32::MAX
    } else {
        (2 + exponent_byte % 2) << (11 + exponent_byte / 2)
    }
}

/// 5-байтовый блок properties: [props][dict_size u32 LE].
pub fn synthesize_properties(props: u8) -> [u8; 5] {
    let mut out = [0u8; 5];
    out[0] = props;
    LittleEndian::write_u32(&mut out[1..5], dictionary_size(LZMA_DICT_EXPONENT_BYTE));
    out
}

/// Распаковать bin с 6-байтовым префиксом.
pub fn decompress_prefixed(compressed: &[u8]) -> Result<Vec<u8>> {
    if compressed.len() < LZMA_PREFIX_LEN {
        return Err(SlobError::Truncated {
            what: "lzma prefix",
            expected: (LZMA_PREFIX_LEN - compressed.len()) as u64,
        }
        .into());
    }
    let props = compressed[LZMA_PREFIX_LEN - 1];
    let opts = Options {
        unpacked_size: UnpackedSize::UseProvided(None),
        memlimit: None,
        allow_incomplete: true,
    };
    // потоковый декодер: при allow_incomplete finish() отдаёт уже распакованное
    let mut stream = Stream::new_with_options(&opts, Vec::new());
    stream.write_all(&synthesize_properties(props))?;
    stream
        .write_all(&compressed[LZMA_PREFIX_LEN..])
        .map_err(|e| anyhow!("lzma decode: {}", e))?;
    stream
        .finish()
        .map_err(|e| anyhow!("lzma decode: {:?}", e))
}

#[cfg(test)]
pub(crate) fn compress_prefixed(plain: &[u8]) -> Vec<u8> {
    // lzma_compress пишет 13-байтовый заголовок: [props][dict u32][size u64]
    let mut packed = Vec::new();
    lzma_rs::lzma_compress(&mut std::io::BufReader::new(plain), &mut packed)
        .expect("lzma compress");
    let mut out = vec![0u8; LZMA_PREFIX_LEN - 1];
    out.push(packed[0]);
    out.extend_from_slice(&packed[13..]);
    out
}
