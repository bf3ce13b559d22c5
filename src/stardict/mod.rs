//! StarDict: .ifo + .idx[.gz] + .dict[.dz], целиком в памяти.
//!
//! Индекс: подряд идущие записи [word utf-8][0][offset u32|u64 BE][size u32 BE].
//! Ширина offset задаётся `idxoffsetbits` (32 по умолчанию).
//! Тексты статей декодируются из буфера .dict при обращении.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use byteorder::{BigEndian, ByteOrder};
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use serde::Serialize;

use crate::collation::{sort_parallel, Collator, SortKey};
use crate::consts::STARDICT_DEFAULT_CONTENT_TYPE;
use crate::dictionary::{Entry, WordDictionary};
use crate::errors::SlobError;
use crate::metrics::record_lookup;

/// Поля .ifo, которые используются при чтении.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IfoInfo {
    pub version: String,
    pub bookname: String,
    pub wordcount: u64,
    pub idxfilesize: u64,
    pub sametypesequence: Option<String>,
    pub idxoffsetbits: u32,
}

impl IfoInfo {
    /// key=value построчно; неизвестные ключи пропускаются.
    pub fn parse(text: &str) -> Result<Self> {
        let mut info = IfoInfo {
            idxoffsetbits: 32,
            ..Default::default()
        };
        for line in text.lines() {
            let Some((k, v)) = line.split_once('=') else {
                continue;
            };
            let key = k.trim().to_ascii_lowercase();
            let val = v.trim();
            match key.as_str() {
                "version" => info.version = val.to_string(),
                "bookname" => info.bookname = val.to_string(),
                "wordcount" => {
                    info.wordcount = val.parse().with_context(|| format!("wordcount={}", val))?
                }
                "idxfilesize" => {
                    info.idxfilesize =
                        val.parse().with_context(|| format!("idxfilesize={}", val))?
                }
                "sametypesequence" => info.sametypesequence = Some(val.to_string()),
                "idxoffsetbits" => {
                    info.idxoffsetbits =
                        val.parse().with_context(|| format!("idxoffsetbits={}", val))?
                }
                _ => {}
            }
        }
        if info.idxoffsetbits != 32 && info.idxoffsetbits != 64 {
            return Err(anyhow!("idxoffsetbits must be 32 or 64, got {}", info.idxoffsetbits));
        }
        Ok(info)
    }

    /// MIME-тип статей по первому символу sametypesequence.
    pub fn content_type(&self) -> &'static str {
        match self.sametypesequence.as_deref().and_then(|s| s.chars().next()) {
            None => STARDICT_DEFAULT_CONTENT_TYPE,
            Some('h') | Some('g') => "text/html",
            Some('x') => "text/xml",
            Some(_) => "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxEntry {
    pub word: String,
    pub offset: u64,
    pub size: u32,
}

/// Разобрать буфер .idx.
pub fn parse_idx(buf: &[u8], offset_bits: u32) -> Result<Vec<IdxEntry>> {
    let off_len = if offset_bits == 64 { 8 } else { 4 };
    let mut out = Vec::new();
    let mut pos = buf.iter().position(|b| *b >= 0x20).unwrap_or(buf.len());
    while pos < buf.len() {
        let nul = buf[pos..]
            .iter()
            .position(|b| *b == 0)
            .ok_or(SlobError::Truncated {
                what: "idx word terminator",
                expected: 1,
            })?;
        let word = String::from_utf8_lossy(&buf[pos..pos + nul])
            .trim_start()
            .to_string();
        let p = pos + nul + 1;
        if p + off_len + 4 > buf.len() {
            return Err(SlobError::Truncated {
                what: "idx entry",
                expected: (p + off_len + 4 - buf.len()) as u64,
            }
            .into());
        }
        let offset = if off_len == 8 {
            BigEndian::read_u64(&buf[p..p + 8])
        } else {
            BigEndian::read_u32(&buf[p..p + 4]) as u64
        };
        let size = BigEndian::read_u32(&buf[p + off_len..p + off_len + 4]);
        out.push(IdxEntry { word, offset, size });
        pos = p + off_len + 4;
    }
    Ok(out)
}

fn read_maybe_gz(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if name.ends_with(".gz") || name.ends_with(".dz") {
        let mut out = Vec::new();
        GzDecoder::new(&raw[..])
            .read_to_end(&mut out)
            .with_context(|| format!("gunzip {}", path.display()))?;
        Ok(out)
    } else {
        Ok(raw)
    }
}

fn first_existing(base: &Path, suffixes: &[&str]) -> Option<PathBuf> {
    suffixes.iter().find_map(|s| {
        let mut p = base.as_os_str().to_os_string();
        p.push(s);
        let p = PathBuf::from(p);
        p.is_file().then_some(p)
    })
}

pub struct StarDictionary {
    path: PathBuf,
    info: IfoInfo,
    entries: Vec<IdxEntry>,
    sort_keys: Vec<SortKey>,
    collator: Collator,
    dict: Vec<u8>,
}

impl StarDictionary {
    /// Открыть по пути к .ifo; .idx/.dict ищутся рядом с тем же базовым именем.
    pub fn open<P: AsRef<Path>>(ifo_path: P) -> Result<Self> {
        let path = ifo_path.as_ref();
        let base = path.with_extension("");
        let dict_path = first_existing(&base, &[".dict", ".dict.dz"])
            .ok_or_else(|| anyhow!("no .dict or .dict.dz next to {}", path.display()))?;
        let idx_path = first_existing(&base, &[".idx", ".idx.gz"])
            .ok_or_else(|| anyhow!("no .idx or .idx.gz next to {}", path.display()))?;

        let ifo_text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let info = IfoInfo::parse(&ifo_text).with_context(|| format!("parse {}", path.display()))?;

        let idx = read_maybe_gz(&idx_path)?;
        if info.idxfilesize != 0 && info.idxfilesize != idx.len() as u64 {
            warn!(
                "{}: idxfilesize={} but index has {} bytes",
                path.display(),
                info.idxfilesize,
                idx.len()
            );
        }
        let mut entries = parse_idx(&idx, info.idxoffsetbits)
            .with_context(|| format!("parse {}", idx_path.display()))?;
        if info.wordcount != 0 && info.wordcount != entries.len() as u64 {
            debug!(
                "{}: wordcount={} vs {} index entries",
                path.display(),
                info.wordcount,
                entries.len()
            );
        }

        let dict = read_maybe_gz(&dict_path)?;
        let collator = Collator::new();
        let mut sort_keys: Vec<SortKey> = entries.iter().map(|e| collator.sort_key(&e.word)).collect();
        sort_parallel(&mut sort_keys, &mut entries)?;

        info!(
            "opened stardict {} ({:?}, {} word(s))",
            path.display(),
            info.bookname,
            entries.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            info,
            entries,
            sort_keys,
            collator,
            dict,
        })
    }

    pub fn info(&self) -> &IfoInfo {
        &self.info
    }

    fn lower_bound(&self, key: &str) -> usize {
        let target = self.collator.sort_key(key);
        self.sort_keys.partition_point(|k| *k < target)
    }

    fn content_of(&self, e: &IdxEntry) -> Result<String> {
        let start = e.offset as usize;
        let end = start.checked_add(e.size as usize).unwrap_or(usize::MAX);
        if end > self.dict.len() {
            return Err(SlobError::Truncated {
                what: "stardict article",
                expected: (end - self.dict.len()) as u64,
            })
            .with_context(|| format!("article {:?}", e.word));
        }
        Ok(String::from_utf8_lossy(&self.dict[start..end]).into_owned())
    }
}

impl WordDictionary for StarDictionary {
    fn file_name(&self) -> Option<&Path> {
        Some(self.path.as_path())
    }

    fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.word.as_str()).collect()
    }

    fn keys_from(&self, key: &str, count: usize) -> Vec<&str> {
        self.entries
            .iter()
            .skip(self.lower_bound(key))
            .take(count)
            .map(|e| e.word.as_str())
            .collect()
    }

    fn try_get_value(&self, key: &str) -> Result<Option<Entry>> {
        let lb = self.lower_bound(key);
        match self.entries.get(lb) {
            Some(e) if e.word == key => {
                record_lookup(true);
                Ok(Some(Entry::new(self.content_of(e)?, self.info.content_type())))
            }
            _ => {
                record_lookup(false);
                Ok(None)
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx_entry(buf: &mut Vec<u8>, word: &str, off: u32, size: u32) {
        buf.extend_from_slice(word.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&off.to_be_bytes());
        buf.extend_from_slice(&size.to_be_bytes());
    }

    #[test]
    fn ifo_fields_and_content_type() {
        let info = IfoInfo::parse(
            "StarDict's dict ifo file\nversion=2.4.2\nwordcount=2\nbookname=Test\nsametypesequence=x\n",
        )
        .unwrap();
        assert_eq!(info.version, "2.4.2");
        assert_eq!(info.wordcount, 2);
        assert_eq!(info.idxoffsetbits, 32);
        assert_eq!(info.content_type(), "text/xml");
        assert_eq!(IfoInfo::parse("").unwrap().content_type(), "text/html");
        assert!(IfoInfo::parse("idxoffsetbits=16").is_err());
    }

    #[test]
    fn idx_entries_32_and_64() {
        let mut buf = Vec::new();
        idx_entry(&mut buf, "apple", 0, 5);
        idx_entry(&mut buf, "pear", 5, 4);
        let e = parse_idx(&buf, 32).unwrap();
        assert_eq!(e[1], IdxEntry { word: "pear".into(), offset: 5, size: 4 });

        let mut buf = Vec::new();
        buf.extend_from_slice(b"big\0");
        buf.extend_from_slice(&(1u64 << 33).to_be_bytes());
        buf.extend_from_slice(&7u32.to_be_bytes());
        let e = parse_idx(&buf, 64).unwrap();
        assert_eq!(e[0].offset, 1u64 << 33);

        assert!(parse_idx(b"cut\0\0\0", 32).is_err());
    }
}
