// Базовые модули
pub mod consts;
pub mod errors;
pub mod config;
pub mod metrics;
pub mod lock;

// Формат: примитивы, кодеки, порядок ключей
pub mod codec;     // src/codec/{mod,encoding}.rs
pub mod compress;  // src/compress/{mod,lzma,lzw}.rs
pub mod collation;

// Словари
pub mod dictionary;
pub mod slob;      // src/slob/{mod,header,reference,store,dictionary,reader,writer}.rs
pub mod stardict;  // src/stardict/mod.rs

// Поиск поверх словарей
pub mod fuzzy;     // src/fuzzy/{mod,lcs,best_matches,worker}.rs
pub mod lookup;

// Утилиты (preview, strip_markup, human_bytes)
pub mod util;      // src/util/mod.rs

// Удобные реэкспорты
pub use config::{SlobConfig, SlobConfigBuilder};
pub use dictionary::{Entry, WordDictionary};
pub use errors::SlobError;
pub use lookup::{DictionarySet, Resolution};
pub use slob::{open, Slob, SlobReader, SlobWriter, WriteSummary};
pub use stardict::StarDictionary;
