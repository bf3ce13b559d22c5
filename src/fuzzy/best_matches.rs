//! Ранжирование кандидатов по длине общей подстроки с запросом.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::consts::LCS_PREALLOCATE;
use crate::metrics::{record_fuzzy_cancelled, record_fuzzy_completed};

use super::lcs::LongestCommonSubstring;

/// Кооперативная отмена; клоны разделяют один флаг.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub phrase: String,
    pub common_chars: usize,
}

/// Результат последней завершённой оценки: кандидаты по возрастанию счёта,
/// лучшие: в хвосте.
#[derive(Debug, Default)]
pub struct BestMatches {
    lcs: LongestCommonSubstring,
    phrases: Vec<String>,
    scores: Vec<usize>,
}

impl BestMatches {
    pub fn new() -> Self {
        Self {
            lcs: LongestCommonSubstring::with_capacity(LCS_PREALLOCATE),
            phrases: Vec::new(),
            scores: Vec::new(),
        }
    }

    /// Оценить всех кандидатов. Отмена проверяется между кандидатами;
    /// при отмене возвращает false и прежний результат не трогает.
    pub fn evaluate<S: AsRef<str>>(
        &mut self,
        query: &str,
        candidates: &[S],
        cancel: &CancelToken,
    ) -> bool {
        let mut scored: Vec<(usize, &str)> = Vec::with_capacity(candidates.len());
        for c in candidates {
            if cancel.is_cancelled() {
                record_fuzzy_cancelled();
                return false;
            }
            let c = c.as_ref();
            scored.push((self.lcs.evaluate(query, c), c));
        }
        if cancel.is_cancelled() {
            record_fuzzy_cancelled();
            return false;
        }
        scored.sort_by_key(|(score, _)| *score);

        self.phrases = scored.iter().map(|(_, p)| p.to_string()).collect();
        self.scores = scored.iter().map(|(s, _)| *s).collect();
        record_fuzzy_completed();
        true
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// (фраза, число общих символов) от лучшего к худшему.
    pub fn best_matches(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.phrases
            .iter()
            .zip(self.scores.iter())
            .rev()
            .map(|(p, s)| (p.as_str(), *s))
    }

    pub fn top(&self, n: usize) -> Vec<Match> {
        self.best_matches()
            .take(n)
            .map(|(p, s)| Match {
                phrase: p.to_string(),
                common_chars: s,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_run_lands_in_tail() {
        let mut bm = BestMatches::new();
        let cands = ["sitting", "kitchen", "xyz", "mitten"];
        assert!(bm.evaluate("kitten", &cands, &CancelToken::new()));
        let best: Vec<(&str, usize)> = bm.best_matches().collect();
        // mitten: "itten" (5), kitchen: "kit" (3), sitting: "itt" (3), xyz: 0
        assert_eq!(best[0], ("mitten", 5));
        assert_eq!(best[3], ("xyz", 0));
        assert_eq!(bm.top(1)[0].phrase, "mitten");
    }

    #[test]
    fn cancelled_evaluation_keeps_previous_result() {
        let mut bm = BestMatches::new();
        assert!(bm.evaluate("ab", &["ab", "b"], &CancelToken::new()));
        let token = CancelToken::new();
        token.cancel();
        assert!(!bm.evaluate("zz", &["zz"], &token));
        assert_eq!(bm.top(1)[0].phrase, "ab");
        assert_eq!(bm.len(), 2);
    }
}
