//! slob/reader: открытие SLOB-файла.
//!
//! Порядок разбора строго последовательный:
//! header -> таблица offsets ссылок -> ссылки (seek к ref_base + offset)
//! -> store table по store_offset -> проверка позиций всех bins -> bins.
//!
//! Любой bin, начало которого лежит на/за концом файла, валит открытие до
//! какой-либо распаковки. Файлы больше `file_backed_threshold_bytes`
//! открываются file-backed (bins читаются с диска при первом доступе),
//! остальные читаются целиком в память.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::codec::{read_u32, read_u64};
use crate::collation::Collator;
use crate::config::SlobConfig;
use crate::errors::SlobError;
use crate::metrics::record_open;

use super::dictionary::{Slob, SlobDictionary};
use super::header::SlobHeader;
use super::reference::{Reference, ReferenceTable};
use super::store::{FileBin, MemoryBin, StoreItem};
use super::PosReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// По порогу размера из конфига.
    Auto,
    InMemory,
    FileBacked,
}

/// Разобранные таблицы до построения bins.
struct Parsed {
    header: SlobHeader,
    refs: Vec<Reference>,
    /// Абсолютные позиции bins.
    bins: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct SlobReader {
    config: SlobConfig,
}

impl Default for SlobReader {
    fn default() -> Self {
        Self::new(SlobConfig::default())
    }
}

impl SlobReader {
    pub fn new(config: SlobConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SlobConfig {
        &self.config
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Slob> {
        self.open_with(path.as_ref(), OpenMode::Auto)
    }

    pub fn open_in_memory<P: AsRef<Path>>(&self, path: P) -> Result<Slob> {
        self.open_with(path.as_ref(), OpenMode::InMemory)
    }

    pub fn open_file_backed<P: AsRef<Path>>(&self, path: P) -> Result<Slob> {
        self.open_with(path.as_ref(), OpenMode::FileBacked)
    }

    pub fn open_with(&self, path: &Path, mode: OpenMode) -> Result<Slob> {
        self.config.validate()?;

        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let file_len = file
            .metadata()
            .with_context(|| format!("stat {}", path.display()))?
            .len();

        let file_backed = match mode {
            OpenMode::Auto => file_len > self.config.file_backed_threshold_bytes,
            OpenMode::InMemory => false,
            OpenMode::FileBacked => true,
        };

        let mut r = PosReader::new(BufReader::new(file));
        let parsed =
            parse_tables(&mut r, file_len).with_context(|| format!("read {}", path.display()))?;
        let Parsed { header, refs, bins } = parsed;

        if header.size != file_len {
            warn!(
                "{}: declared size {} differs from file length {}",
                path.display(),
                header.size,
                file_len
            );
        }
        if header.blob_count as usize != bins.len() {
            debug!(
                "{}: declared blob count {} vs {} store entries",
                path.display(),
                header.blob_count,
                bins.len()
            );
        }

        let table = ReferenceTable::new(refs, Collator::new())?;
        let compression = header.compression;
        let encoding = header.encoding;
        let path_buf: PathBuf = path.to_path_buf();

        let slob = if file_backed {
            let file = Arc::new(Mutex::new(r.into_inner().into_inner()));
            let store = bins
                .iter()
                .enumerate()
                .map(|(i, pos)| {
                    StoreItem::new(
                        i,
                        FileBin::new(Arc::clone(&file), *pos, file_len),
                        compression,
                        encoding,
                    )
                })
                .collect();
            Slob::FileBacked(SlobDictionary::new(Some(path_buf), header, table, store))
        } else {
            let mut store = Vec::with_capacity(bins.len());
            for (i, pos) in bins.iter().enumerate() {
                r.seek_to(*pos)?;
                let bin = MemoryBin::read_from(&mut r, file_len - *pos)
                    .with_context(|| format!("{}: read bin {} at {}", path.display(), i, pos))?;
                store.push(StoreItem::new(i, bin, compression, encoding));
            }
            Slob::InMemory(SlobDictionary::new(Some(path_buf), header, table, store))
        };

        record_open(file_backed);
        info!(
            "opened {} ({}; {} ref(s), {} bin(s), {}, {}, {} bytes)",
            path.display(),
            if file_backed { "file-backed" } else { "in-memory" },
            slob.references().len(),
            slob.bin_count(),
            slob.header().encoding,
            slob.header().compression,
            file_len
        );
        Ok(slob)
    }
}

/// Открыть с конфигом из окружения.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Slob> {
    SlobReader::new(SlobConfig::from_env()).open(path)
}

fn parse_tables(r: &mut PosReader<BufReader<File>>, file_len: u64) -> Result<Parsed> {
    let mut scratch = Vec::with_capacity(256);
    let header = SlobHeader::read(r, &mut scratch).context("header")?;
    debug!(
        "header: encoding={} compression={} tags={} content_types={}",
        header.encoding,
        header.compression,
        header.tags.len(),
        header.content_types.len()
    );

    // references
    let ref_count = read_u32(r, "reference count")? as u64;
    if r.pos() + ref_count * 8 > file_len {
        return Err(SlobError::Truncated {
            what: "reference offset table",
            expected: r.pos() + ref_count * 8 - file_len,
        }
        .into());
    }
    let mut ref_offsets = Vec::with_capacity(ref_count as usize);
    for _ in 0..ref_count {
        ref_offsets.push(read_u64(r, "reference offset")?);
    }
    let ref_base = r.pos();

    let mut refs = Vec::with_capacity(ref_offsets.len());
    for (i, off) in ref_offsets.iter().enumerate() {
        let pos = ref_base.saturating_add(*off);
        if pos >= file_len {
            return Err(SlobError::Truncated {
                what: "reference",
                expected: pos.saturating_add(1) - file_len,
            })
            .with_context(|| format!("reference #{} at {}", i, pos));
        }
        r.seek_to(pos)?;
        refs.push(
            Reference::read(r, header.encoding, &mut scratch)
                .with_context(|| format!("reference #{} at {}", i, pos))?,
        );
    }
    debug!("{} reference(s) read", refs.len());

    // store table
    if header.store_offset >= file_len {
        return Err(SlobError::Truncated {
            what: "store table",
            expected: header.store_offset.saturating_add(4) - file_len,
        }
        .into());
    }
    r.seek_to(header.store_offset)?;
    let store_count = read_u32(r, "store count")? as u64;
    if r.pos() + store_count * 8 > file_len {
        return Err(SlobError::Truncated {
            what: "store offset table",
            expected: r.pos() + store_count * 8 - file_len,
        }
        .into());
    }
    let mut store_offsets = Vec::with_capacity(store_count as usize);
    for _ in 0..store_count {
        store_offsets.push(read_u64(r, "store offset")?);
    }
    let store_base = r.pos();

    let mut bins = Vec::with_capacity(store_offsets.len());
    for (bin, off) in store_offsets.iter().enumerate() {
        let position = store_base.saturating_add(*off);
        if position >= file_len {
            return Err(SlobError::StoreOffsetPastEnd {
                bin,
                position,
                file_len,
            }
            .into());
        }
        bins.push(position);
    }

    Ok(Parsed { header, refs, bins })
}
