//! slob/reference: записи ссылок (key -> bin/item) и отсортированная таблица.

use std::io::{Read, Write};

use anyhow::Result;

use crate::codec::{
    read_text, read_tiny_text, read_u16, read_u32, write_text, write_tiny_text, write_u16,
    write_u32, TextEncoding,
};
use crate::collation::{sort_parallel, Collator, SortKey};

/// [key text][bin u32][item u16][fragment tiny]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub key: String,
    pub bin_index: u32,
    pub item_index: u16,
    pub fragment: String,
}

impl Reference {
    pub fn read<R: Read>(r: &mut R, enc: TextEncoding, scratch: &mut Vec<u8>) -> Result<Self> {
        let key = read_text(r, enc, scratch)?;
        let bin_index = read_u32(r, "reference bin index")?;
        let item_index = read_u16(r, "reference item index")?;
        let fragment = read_tiny_text(r, enc, scratch)?;
        Ok(Self {
            key,
            bin_index,
            item_index,
            fragment,
        })
    }

    /// Возвращает число записанных байт.
    pub fn write<W: Write>(&self, w: &mut W, enc: TextEncoding) -> Result<usize> {
        let mut n = write_text(w, &self.key, enc)?;
        write_u32(w, self.bin_index)?;
        write_u16(w, self.item_index)?;
        n += 6;
        n += write_tiny_text(w, &self.fragment, enc)?;
        Ok(n)
    }
}

/// Ссылки в порядке collation + параллельный массив sort keys.
///
/// Дубликаты ключей сохраняют порядок файла; поиск возвращает первый из них.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    refs: Vec<Reference>,
    sort_keys: Vec<SortKey>,
    collator: Collator,
}

impl ReferenceTable {
    pub fn new(mut refs: Vec<Reference>, collator: Collator) -> Result<Self> {
        let mut sort_keys: Vec<SortKey> = refs.iter().map(|r| collator.sort_key(&r.key)).collect();
        sort_parallel(&mut sort_keys, &mut refs)?;
        Ok(Self {
            refs,
            sort_keys,
            collator,
        })
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Reference> {
        self.refs.get(index)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.refs.iter().map(|r| r.key.as_str()).collect()
    }

    /// Первая позиция с ключом >= `key`.
    pub fn lower_bound(&self, key: &str) -> usize {
        let target = self.collator.sort_key(key);
        self.sort_keys.partition_point(|k| *k < target)
    }

    /// Ok(index): точное совпадение (первый дубликат);
    /// Err(bound): позиция, куда встал бы ключ.
    pub fn search(&self, key: &str) -> std::result::Result<usize, usize> {
        let target = self.collator.sort_key(key);
        let lb = self.sort_keys.partition_point(|k| *k < target);
        match self.sort_keys.get(lb) {
            Some(k) if *k == target => Ok(lb),
            _ => Err(lb),
        }
    }

    /// До `count` ключей начиная с первого >= `key`.
    pub fn keys_from(&self, key: &str, count: usize) -> Vec<&str> {
        let start = self.lower_bound(key);
        self.refs
            .iter()
            .skip(start)
            .take(count)
            .map(|r| r.key.as_str())
            .collect()
    }
}
