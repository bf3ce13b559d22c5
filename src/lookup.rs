//! lookup: набор словарей и каскад поиска по общему списку ключей.
//!
//! Ключи всех словарей объединяются, дедуплицируются и сортируются по
//! collation. Поиск идёт по этому объединённому списку: точное совпадение,
//! иначе ближайший ключ >= запроса. Варианты запроса: сам текст, его
//! нижний регистр (если текст начинается с заглавной) и глагольная форма
//! "to <текст>".

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use crate::collation::{sort_parallel, Collator, SortKey};
use crate::config::SlobConfig;
use crate::dictionary::{Entry, WordDictionary};
use crate::fuzzy::SuggestionWorker;
use crate::slob::SlobReader;
use crate::stardict::StarDictionary;

/// Символы, срезаемые с краёв поискового текста.
pub const WORD_TRIM_CHARS: &[char] = &[
    ' ', '\t', '\r', '\n', ',', '.', '!', '?', ';', ':', '-', '+', '"', '\'', '(', ')', '[', ']',
    '{', '}', '<', '>', '|', '=',
];

pub fn trim_search_text(text: &str) -> &str {
    text.trim_matches(WORD_TRIM_CHARS)
}

/// Открыть словарь по расширению: .ifo -> StarDict, иначе SLOB.
pub fn load_dictionary(path: &Path, config: &SlobConfig) -> Result<Box<dyn WordDictionary>> {
    let is_ifo = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("ifo"))
        .unwrap_or(false);
    if is_ifo {
        Ok(Box::new(StarDictionary::open(path)?))
    } else {
        Ok(Box::new(SlobReader::new(config.clone()).open(path)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    /// Индекс словаря в наборе.
    pub dictionary: usize,
    pub key: String,
    /// Ключ совпал точно (а не ближайший следующий).
    pub found: bool,
    pub entry: Entry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Ключ, который следует выделить в списке ключей.
    pub selected_key: Option<String>,
    /// Статьи к показу (непустые), в порядке: прямые, затем глагольные.
    pub hits: Vec<Hit>,
}

#[derive(Default)]
pub struct DictionarySet {
    config: SlobConfig,
    collator: Collator,
    dictionaries: Vec<Box<dyn WordDictionary>>,
    keys: Vec<String>,
    sort_keys: Vec<SortKey>,
}

impl DictionarySet {
    pub fn new(config: SlobConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Загрузить словарь и пересобрать общий список ключей.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.load_deferred(path)?;
        self.collect_and_sort_keys()
    }

    /// Загрузить без пересборки ключей (для пакетной загрузки;
    /// после неё вызвать `collect_and_sort_keys`).
    pub fn load_deferred<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dict = load_dictionary(path, &self.config)
            .with_context(|| format!("load dictionary {}", path.display()))?;
        self.dictionaries.push(dict);
        Ok(())
    }

    pub fn add(&mut self, dict: Box<dyn WordDictionary>) {
        self.dictionaries.push(dict);
    }

    pub fn dictionaries(&self) -> &[Box<dyn WordDictionary>] {
        &self.dictionaries
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn collect_and_sort_keys(&mut self) -> Result<()> {
        let mut set: HashSet<&str> = HashSet::new();
        for d in &self.dictionaries {
            set.extend(d.keys());
        }
        let mut keys: Vec<String> = set.into_iter().map(str::to_string).collect();
        let mut sort_keys = self.collator.sort_keys(&keys);
        sort_parallel(&mut sort_keys, &mut keys)?;
        info!(
            "{} dictionary(ies), {} distinct key(s)",
            self.dictionaries.len(),
            keys.len()
        );
        self.keys = keys;
        self.sort_keys = sort_keys;
        Ok(())
    }

    /// Ok(i): ключ есть в общем списке; Err(i): граница вставки.
    pub fn search(&self, key: &str) -> std::result::Result<usize, usize> {
        let target = self.collator.sort_key(key);
        self.sort_keys.binary_search(&target)
    }

    /// (ключ для показа, найден ли исходный). Если точного совпадения нет,
    /// следующий ключ списка; за концом списка остаётся исходный текст.
    fn pick(&self, text: &str) -> (String, bool) {
        match self.search(text) {
            Ok(_) => (text.to_string(), true),
            Err(i) => match self.keys.get(i) {
                Some(k) => (k.clone(), false),
                None => (text.to_string(), false),
            },
        }
    }

    pub fn resolve(&self, text: &str) -> Result<Resolution> {
        if text.is_empty() {
            return Ok(Resolution::default());
        }

        let mut variants = vec![text.to_string()];
        if text.chars().next().map(char::is_uppercase).unwrap_or(false) {
            variants.push(text.to_lowercase());
        }
        let verb = format!("to {}", text);

        let mut first: Option<Hit> = None;
        let mut direct: Vec<Hit> = Vec::new();
        let mut verbs: Vec<Hit> = Vec::new();

        for variant in &variants {
            for (di, dict) in self.dictionaries.iter().enumerate() {
                let (key, found) = self.pick(variant);
                let entry = dict.get(&key)?;
                let hit = Hit {
                    dictionary: di,
                    key,
                    found,
                    entry,
                };
                if first.is_none() {
                    first = Some(hit.clone());
                }
                if found {
                    direct.push(hit);
                }

                let (vkey, vfound) = self.pick(&verb);
                if vfound {
                    let entry = dict.get(&vkey)?;
                    verbs.push(Hit {
                        dictionary: di,
                        key: vkey,
                        found: true,
                        entry,
                    });
                }
            }
            if !direct.is_empty() || !verbs.is_empty() {
                break;
            }
        }

        let selected_key = direct
            .first()
            .or(verbs.first())
            .or(first.as_ref())
            .map(|h| h.key.clone());

        let hits: Vec<Hit> = if !direct.is_empty() || !verbs.is_empty() {
            direct.into_iter().chain(verbs).collect()
        } else {
            first.into_iter().collect()
        };
        let hits: Vec<Hit> = hits
            .into_iter()
            .filter(|h| !h.entry.content.is_empty() && !h.entry.content_type.is_empty())
            .collect();

        debug!(
            "resolve {:?}: selected {:?}, {} hit(s)",
            text,
            selected_key,
            hits.len()
        );
        Ok(Resolution { selected_key, hits })
    }

    /// Фоновый подбор подсказок по общему списку ключей.
    pub fn suggestion_worker(&self) -> SuggestionWorker {
        SuggestionWorker::new(self.keys.clone(), self.config.suggestion_limit)
    }
}
