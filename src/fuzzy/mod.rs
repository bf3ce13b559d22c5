//! Нечёткий поиск ("did you mean")
//! - lcs.rs         : длина наибольшей общей подстроки
//! - best_matches.rs: ранжирование массива кандидатов, CancelToken
//! - worker.rs      : фоновый подбор подсказок с отменой предыдущего запроса

pub mod best_matches;
pub mod lcs;
pub mod worker;

pub use best_matches::{BestMatches, CancelToken, Match};
pub use lcs::LongestCommonSubstring;
pub use worker::{SuggestionWorker, Suggestions};
