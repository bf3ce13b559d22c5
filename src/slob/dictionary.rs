//! slob/dictionary: словарь SLOB поверх таблицы ссылок и bins.
//!
//! Один тип для обоих режимов открытия: `SlobDictionary<MemoryBin>` и
//! `SlobDictionary<FileBin>`. `Slob`: то, что отдаёт reader.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::dictionary::{Entry, WordDictionary};
use crate::errors::SlobError;
use crate::metrics::record_lookup;

use super::header::SlobHeader;
use super::reference::ReferenceTable;
use super::store::{BinSource, FileBin, MemoryBin, StoreItem};

pub struct SlobDictionary<S: BinSource> {
    path: Option<PathBuf>,
    header: SlobHeader,
    refs: ReferenceTable,
    store: Vec<StoreItem<S>>,
}

impl<S: BinSource> SlobDictionary<S> {
    pub(crate) fn new(
        path: Option<PathBuf>,
        header: SlobHeader,
        refs: ReferenceTable,
        store: Vec<StoreItem<S>>,
    ) -> Self {
        Self {
            path,
            header,
            refs,
            store,
        }
    }

    pub fn header(&self) -> &SlobHeader {
        &self.header
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.refs
    }

    pub fn store(&self) -> &[StoreItem<S>] {
        &self.store
    }

    pub fn bin_count(&self) -> usize {
        self.store.len()
    }

    /// Статья по индексу в таблице ссылок.
    pub fn entry_at(&self, index: usize) -> Result<Entry> {
        let r = self.refs.get(index).ok_or_else(|| {
            anyhow!(
                "reference index {} out of range ({} reference(s))",
                index,
                self.refs.len()
            )
        })?;
        let bin = r.bin_index as usize;
        let item = self.store.get(bin).ok_or(SlobError::BinOutOfRange {
            bin,
            bins: self.store.len(),
        })?;
        let (content, id) = item.get_at(r.item_index as usize)?;
        let content_type = self.header.content_type(id)?.to_string();
        Ok(Entry {
            content,
            content_type,
        })
    }

    /// Индекс точного совпадения (Ok) или граница вставки (Err).
    pub fn search(&self, key: &str) -> std::result::Result<usize, usize> {
        self.refs.search(key)
    }

    /// Первый ключ >= `key`.
    pub fn nearest_key(&self, key: &str) -> Option<&str> {
        let i = match self.refs.search(key) {
            Ok(i) | Err(i) => i,
        };
        self.refs.get(i).map(|r| r.key.as_str())
    }
}

impl<S: BinSource> WordDictionary for SlobDictionary<S> {
    fn file_name(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn keys(&self) -> Vec<&str> {
        self.refs.keys()
    }

    fn keys_from(&self, key: &str, count: usize) -> Vec<&str> {
        self.refs.keys_from(key, count)
    }

    fn try_get_value(&self, key: &str) -> Result<Option<Entry>> {
        match self.refs.search(key) {
            Ok(i) => {
                record_lookup(true);
                Ok(Some(self.entry_at(i)?))
            }
            Err(_) => {
                record_lookup(false);
                Ok(None)
            }
        }
    }

    fn len(&self) -> usize {
        self.refs.len()
    }
}

/// Открытый SLOB-файл в одном из двух режимов.
pub enum Slob {
    InMemory(SlobDictionary<MemoryBin>),
    FileBacked(SlobDictionary<FileBin>),
}

macro_rules! with_dict {
    ($self:expr, $d:ident => $body:expr) => {
        match $self {
            Slob::InMemory($d) => $body,
            Slob::FileBacked($d) => $body,
        }
    };
}

impl Slob {
    pub fn is_file_backed(&self) -> bool {
        matches!(self, Slob::FileBacked(_))
    }

    pub fn header(&self) -> &SlobHeader {
        with_dict!(self, d => d.header())
    }

    pub fn references(&self) -> &ReferenceTable {
        with_dict!(self, d => d.references())
    }

    pub fn bin_count(&self) -> usize {
        with_dict!(self, d => d.bin_count())
    }

    /// Сколько bins уже распаковано.
    pub fn decompressed_bins(&self) -> usize {
        with_dict!(self, d => d.store().iter().filter(|s| s.is_decompressed()).count())
    }

    pub fn entry_at(&self, index: usize) -> Result<Entry> {
        with_dict!(self, d => d.entry_at(index))
    }

    pub fn search(&self, key: &str) -> std::result::Result<usize, usize> {
        with_dict!(self, d => d.search(key))
    }

    pub fn nearest_key(&self, key: &str) -> Option<&str> {
        with_dict!(self, d => d.nearest_key(key))
    }
}

impl WordDictionary for Slob {
    fn file_name(&self) -> Option<&Path> {
        with_dict!(self, d => d.file_name())
    }

    fn keys(&self) -> Vec<&str> {
        with_dict!(self, d => d.keys())
    }

    fn keys_from(&self, key: &str, count: usize) -> Vec<&str> {
        with_dict!(self, d => d.keys_from(key, count))
    }

    fn try_get_value(&self, key: &str) -> Result<Option<Entry>> {
        with_dict!(self, d => d.try_get_value(key))
    }

    fn len(&self) -> usize {
        with_dict!(self, d => d.len())
    }
}
