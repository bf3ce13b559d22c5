//! Типизированные ошибки SLOB.
//!
//! Все публичные функции возвращают `anyhow::Result`; категориальные отказы
//! заворачиваются в `SlobError`, чтобы вызывающий код мог сделать
//! `err.downcast_ref::<SlobError>()`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlobError {
    /// Первые 8 байт не совпали с SLOB_MAGIC.
    BadMagic { found: u64 },
    UnsupportedEncoding(String),
    UnsupportedCompression(String),
    /// Начало bin'а лежит на/за концом файла.
    StoreOffsetPastEnd { bin: usize, position: u64, file_len: u64 },
    /// Данных меньше, чем объявлено длиной/счётчиком.
    Truncated { what: &'static str, expected: u64 },
    /// Строка не помещается в выбранный фрейминг (tiny/text/big).
    TextTooLong { framing: &'static str, len: usize, max: usize },
    /// Курсор элементов bin'а пытался пойти назад.
    BackwardSkip { offset: u64, consumed: u64 },
    ItemOutOfRange { bin: usize, item: usize, len: usize },
    BinOutOfRange { bin: usize, bins: usize },
    ContentTypeOutOfRange { id: u8, types: usize },
    InvalidConfig(String),
}

impl fmt::Display for SlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlobError::BadMagic { found } => {
                write!(f, "not a SLOB file: magic number did not match (got {:#018x})", found)
            }
            SlobError::UnsupportedEncoding(name) => {
                write!(f, "encoding >>{}<< is not supported", name)
            }
            SlobError::UnsupportedCompression(token) => {
                write!(f, "compression >>{}<< is not supported", token)
            }
            SlobError::StoreOffsetPastEnd { bin, position, file_len } => write!(
                f,
                "store offset behind end of file (bin={}, position={}, file_len={})",
                bin, position, file_len
            ),
            SlobError::Truncated { what, expected } => {
                write!(f, "truncated {}: expected {} more byte(s)", what, expected)
            }
            SlobError::TextTooLong { framing, len, max } => write!(
                f,
                "{} too long: {} bytes (max {})",
                framing, len, max
            ),
            SlobError::BackwardSkip { offset, consumed } => write!(
                f,
                "can not go backwards in bin content (offset={}, consumed={})",
                offset, consumed
            ),
            SlobError::ItemOutOfRange { bin, item, len } => write!(
                f,
                "item index {} out of range for bin {} ({} item(s))",
                item, bin, len
            ),
            SlobError::BinOutOfRange { bin, bins } => {
                write!(f, "bin index {} out of range ({} bin(s))", bin, bins)
            }
            SlobError::ContentTypeOutOfRange { id, types } => write!(
                f,
                "content type id {} out of range ({} content type(s))",
                id, types
            ),
            SlobError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for SlobError {}

/// Категория ошибки, если в цепочке anyhow есть `SlobError`.
pub fn slob_error(err: &anyhow::Error) -> Option<&SlobError> {
    err.chain().find_map(|e| e.downcast_ref::<SlobError>())
}
