//! Общий контракт словаря для вызывающего кода (SLOB и StarDict).

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

/// Содержимое статьи и её MIME-тип.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub content: String,
    pub content_type: String,
}

impl Entry {
    pub fn new(content: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    /// Пустая запись, которую `get` возвращает при промахе.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.content_type.is_empty()
    }
}

pub trait WordDictionary: Send + Sync {
    fn file_name(&self) -> Option<&Path>;

    /// Все ключи в порядке collation (дубликаты сохраняются).
    fn keys(&self) -> Vec<&str>;

    /// До `count` ключей, начиная с первого >= `key`.
    fn keys_from(&self, key: &str, count: usize) -> Vec<&str>;

    /// Точное совпадение; промах: `Ok(None)`.
    fn try_get_value(&self, key: &str) -> Result<Option<Entry>>;

    /// Как `try_get_value`, но промах даёт пустую `Entry`.
    fn get(&self, key: &str) -> Result<Entry> {
        Ok(self.try_get_value(key)?.unwrap_or_default())
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
