//! collation: порядок ключей словаря (en-US, без языковых особенностей).
//!
//! Sort key: вектор весов по уровням, уровни разделены нулём:
//! 1) primary: базовые символы после NFD, без диакритики, в нижнем регистре;
//!    '-' и '\'' на этом уровне игнорируются, не-буквенно-цифровые символы
//!    идут раньше букв и цифр;
//! 2) secondary: диакритика каждого базового символа;
//! 3) tertiary: регистр (строчные раньше заглавных);
//! 4) последним уровнем идут сами code points строки.
//!
//! Последний уровень делает порядок полным: равные ключи <=> равные строки.
//! Поэтому бинарный поиск по массиву ключей корректен, а стабильная
//! сортировка сохраняет относительный порядок только для точных дубликатов.

use std::cmp::Ordering;

use anyhow::{anyhow, Result};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::consts::COLLATION_LOCALE;

const LEVEL_SEPARATOR: u32 = 0;
/// Буквы/цифры сортируются после всех прочих символов.
const ALNUM_BASE: u32 = 0x11_0001;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey(Vec<u32>);

impl SortKey {
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

#[inline]
fn is_ignorable(c: char) -> bool {
    c == '-' || c == '\''
}

#[inline]
fn primary_weight(c: char) -> u32 {
    if c.is_alphanumeric() {
        ALNUM_BASE + c as u32
    } else {
        c as u32 + 1
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Collator;

impl Collator {
    pub fn new() -> Self {
        Collator
    }

    pub fn locale(&self) -> &'static str {
        COLLATION_LOCALE
    }

    pub fn sort_key(&self, s: &str) -> SortKey {
        let mut primary = Vec::with_capacity(s.len());
        let mut secondary: Vec<u32> = Vec::with_capacity(s.len());
        let mut tertiary = Vec::with_capacity(s.len());

        for c in s.nfd() {
            if is_combining_mark(c) {
                // диакритика относится к последнему базовому символу
                if let Some(last) = secondary.last_mut() {
                    *last = last.wrapping_add(c as u32);
                }
                continue;
            }
            if is_ignorable(c) {
                continue;
            }
            let case = if c.is_uppercase() { 2 } else { 1 };
            for lc in c.to_lowercase() {
                primary.push(primary_weight(lc));
                secondary.push(1);
                tertiary.push(case);
            }
        }

        let mut key = Vec::with_capacity(primary.len() * 3 + s.len() + 3);
        key.extend_from_slice(&primary);
        key.push(LEVEL_SEPARATOR);
        key.extend_from_slice(&secondary);
        key.push(LEVEL_SEPARATOR);
        key.extend_from_slice(&tertiary);
        key.push(LEVEL_SEPARATOR);
        key.extend(s.chars().map(|c| c as u32 + 1));
        SortKey(key)
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.sort_key(a).cmp(&self.sort_key(b))
    }

    pub fn sort_keys<S: AsRef<str>>(&self, strings: &[S]) -> Vec<SortKey> {
        strings.iter().map(|s| self.sort_key(s.as_ref())).collect()
    }
}

/// Стабильно отсортировать `keys` и переставить `items` точно так же.
pub fn sort_parallel<T>(keys: &mut Vec<SortKey>, items: &mut Vec<T>) -> Result<()> {
    if keys.len() != items.len() {
        return Err(anyhow!(
            "sort_parallel: {} keys vs {} items",
            keys.len(),
            items.len()
        ));
    }
    let mut pairs: Vec<(SortKey, T)> = keys.drain(..).zip(items.drain(..)).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    for (k, t) in pairs {
        keys.push(k);
        items.push(t);
    }
    Ok(())
}
