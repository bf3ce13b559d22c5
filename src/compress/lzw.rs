//! compress/lzw: декодер unix `compress` (.Z).
//!
//! Формат: [0x1F 0x9D][flags] + коды переменной ширины, LSB-first.
//! flags & 0x1F: максимальная ширина кода (9..=16), flags & 0x80: block mode
//! (код 256 = CLEAR). Ширина кода растёт с 9 бит; при смене ширины и после
//! CLEAR позиция выравнивается на границу группы из 8 кодов текущей ширины.

use anyhow::{anyhow, Result};

const MAGIC: [u8; 2] = [0x1F, 0x9D];
const BITS_MASK: u8 = 0x1F;
const BLOCK_MODE: u8 = 0x80;
const INIT_BITS: u32 = 9;
const MIN_MAXBITS: u32 = 9;
const MAX_MAXBITS: u32 = 16;
const CLEAR: u32 = 256;
const HEADER_BITS: usize = 3 * 8;

/// Прочитать код шириной `n_bits` с битовой позиции `pos` (LSB-first).
#[inline]
fn code_at(data: &[u8], pos: usize, n_bits: u32) -> u32 {
    let byte = pos / 8;
    let mut acc: u32 = 0;
    for i in 0..3 {
        if let Some(b) = data.get(byte + i) {
            acc |= (*b as u32) << (8 * i);
        }
    }
    (acc >> (pos % 8)) & ((1u32 << n_bits) - 1)
}

/// Округлить позицию вверх до границы группы кодов (n_bits * 8 бит от `base`).
#[inline]
fn align_group(base: usize, pos: usize, n_bits: u32) -> usize {
    let group = (n_bits as usize) * 8;
    let used = pos - base;
    base + used.div_ceil(group) * group
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 3 || data[..2] != MAGIC {
        return Err(anyhow!("lzw: bad magic"));
    }
    let flags = data[2];
    let maxbits = (flags & BITS_MASK) as u32;
    if !(MIN_MAXBITS..=MAX_MAXBITS).contains(&maxbits) {
        return Err(anyhow!("lzw: unsupported max code width {}", maxbits));
    }
    let block_mode = flags & BLOCK_MODE != 0;
    let maxmaxcode: u32 = 1 << maxbits;

    let mut prefix = vec![0u16; maxmaxcode as usize];
    let mut suffix = vec![0u8; maxmaxcode as usize];
    for (i, s) in suffix.iter_mut().enumerate().take(256) {
        *s = i as u8;
    }

    let total_bits = data.len() * 8;
    let mut n_bits = INIT_BITS;
    let mut maxcode: u32 = (1 << n_bits) - 1;
    let mut free_ent: u32 = if block_mode { CLEAR + 1 } else { CLEAR };
    let mut base = HEADER_BITS;
    let mut pos = HEADER_BITS;
    let mut oldcode: Option<u32> = None;
    let mut finchar: u8 = 0;

    let mut out = Vec::with_capacity(data.len() * 3);
    let mut stack: Vec<u8> = Vec::new();

    loop {
        if free_ent > maxcode {
            pos = align_group(base, pos, n_bits);
            base = pos;
            n_bits += 1;
            maxcode = if n_bits == maxbits {
                maxmaxcode
            } else {
                (1 << n_bits) - 1
            };
            continue;
        }
        if pos + n_bits as usize > total_bits {
            break;
        }
        let code = code_at(data, pos, n_bits);
        pos += n_bits as usize;

        let old = match oldcode {
            None => {
                if code >= 256 {
                    return Err(anyhow!("lzw: first code {} is not a literal", code));
                }
                finchar = code as u8;
                out.push(finchar);
                oldcode = Some(code);
                continue;
            }
            Some(old) => old,
        };

        if code == CLEAR && block_mode {
            free_ent = CLEAR;
            pos = align_group(base, pos, n_bits);
            base = pos;
            n_bits = INIT_BITS;
            maxcode = (1 << n_bits) - 1;
            continue;
        }

        let incode = code;
        let mut c = code;
        stack.clear();
        if c >= free_ent {
            if c > free_ent {
                return Err(anyhow!("lzw: corrupt input (code {} > next {})", c, free_ent));
            }
            // KwKwK
            stack.push(finchar);
            c = old;
        }
        while c >= 256 {
            if stack.len() >= maxmaxcode as usize {
                return Err(anyhow!("lzw: corrupt input (prefix chain loop)"));
            }
            stack.push(suffix[c as usize]);
            c = prefix[c as usize] as u32;
        }
        finchar = c as u8;
        stack.push(finchar);
        out.extend(stack.iter().rev());

        if free_ent < maxmaxcode {
            prefix[free_ent as usize] = old as u16;
            suffix[free_ent as usize] = finchar;
            free_ent += 1;
        }
        oldcode = Some(incode);
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) fn pack_9bit(codes: &[u16]) -> Vec<u8> {
    // 16-битный максимум, block mode; годится для потоков короче 255 кодов
    let mut out = vec![0x1F, 0x9D, 0x90];
    let mut acc: u32 = 0;
    let mut nb = 0;
    for c in codes {
        acc |= (*c as u32) << nb;
        nb += 9;
        while nb >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            nb -= 8;
        }
    }
    if nb > 0 {
        out.push(acc as u8);
    }
    out
}
