//! slob/store: bins (store items) и их ленивая распаковка.
//!
//! Bin на диске:
//!   [item_count u32][content_id u8 * item_count][compressed_len u32][compressed]
//! Распакованный payload:
//!   [offset u32 * item_count][big text]*  (offsets от конца таблицы offsets)
//!
//! `StoreItem<S>` один для обоих режимов; источник сжатых байт: `BinSource`
//! (`MemoryBin` держит байты, `FileBin` читает их с диска при первом доступе).
//! Распаковка single-flight под Mutex: выполняется один раз, после чего
//! источник отбрасывается и память сжатых байт освобождается.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};

use crate::codec::{map_eof, read_exact_into, read_u32, TextEncoding};
use crate::compress::{decompressor, Compression};
use crate::consts::{BIG_TEXT_MAX, DEGRADED_CONTENT, MAX_ITEMS_PER_BIN_FORMAT};
use crate::errors::{slob_error, SlobError};
use crate::metrics::{record_bin_decompressed, record_degraded_item};

/// Источник сырых байт bin'а: content ids + сжатый payload.
pub trait BinSource: Send {
    fn with_raw<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[u8], &[u8]) -> Result<T>;
}

/// Bin, целиком прочитанный в память при открытии.
#[derive(Debug, Clone)]
pub struct MemoryBin {
    ids: Vec<u8>,
    compressed: Vec<u8>,
}

impl MemoryBin {
    pub fn new(ids: Vec<u8>, compressed: Vec<u8>) -> Self {
        Self { ids, compressed }
    }

    /// Прочитать bin с текущей позиции. `available`: сколько байт осталось
    /// в файле от начала bin'а; защищает от мусорных длин.
    pub fn read_from<R: Read>(r: &mut R, available: u64) -> Result<Self> {
        let count = read_u32(r, "bin item count")? as usize;
        if count > MAX_ITEMS_PER_BIN_FORMAT {
            return Err(anyhow!(
                "bin item count {} exceeds {}",
                count,
                MAX_ITEMS_PER_BIN_FORMAT
            ));
        }
        let header = 4 + count as u64 + 4;
        if header > available {
            return Err(SlobError::Truncated {
                what: "bin content ids",
                expected: header - available,
            }
            .into());
        }
        let mut ids = Vec::new();
        read_exact_into(r, count, &mut ids, "bin content ids")?;
        ids.truncate(count);

        let len = read_u32(r, "bin compressed length")? as u64;
        if header + len > available {
            return Err(SlobError::Truncated {
                what: "bin compressed content",
                expected: header + len - available,
            }
            .into());
        }
        let mut compressed = Vec::new();
        read_exact_into(r, len as usize, &mut compressed, "bin compressed content")?;
        compressed.truncate(len as usize);
        Ok(Self { ids, compressed })
    }
}

impl BinSource for MemoryBin {
    fn with_raw<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[u8], &[u8]) -> Result<T>,
    {
        f(&self.ids, &self.compressed)
    }
}

/// Bin, который читается с диска по абсолютной позиции при первом доступе.
/// Дескриптор общий для всех bin'ов словаря.
#[derive(Debug, Clone)]
pub struct FileBin {
    file: Arc<Mutex<File>>,
    position: u64,
    file_len: u64,
}

impl FileBin {
    pub fn new(file: Arc<Mutex<File>>, position: u64, file_len: u64) -> Self {
        Self {
            file,
            position,
            file_len,
        }
    }
}

impl BinSource for FileBin {
    fn with_raw<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[u8], &[u8]) -> Result<T>,
    {
        let bin = {
            let mut file = self
                .file
                .lock()
                .map_err(|_| anyhow!("dictionary file handle poisoned"))?;
            file.seek(SeekFrom::Start(self.position))?;
            let mut r = BufReader::new(&mut *file);
            MemoryBin::read_from(&mut r, self.file_len.saturating_sub(self.position))
                .with_context(|| format!("read bin at {}", self.position))?
        };
        f(&bin.ids, &bin.compressed)
    }
}

/// Распакованный bin: content id и текст на каждый элемент.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBin {
    pub ids: Vec<u8>,
    pub content: Vec<String>,
}

impl DecodedBin {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Курсор по распакованному payload: только вперёд.
pub struct ItemCursor<R: Read> {
    inner: R,
    consumed: u64,
    encoding: TextEncoding,
    scratch: Vec<u8>,
}

impl<R: Read> ItemCursor<R> {
    /// Прочитать таблицу из `count` offsets; курсор стоит сразу за ней.
    pub fn open(mut inner: R, count: usize, encoding: TextEncoding) -> Result<(Self, Vec<u32>)> {
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            offsets.push(read_u32(&mut inner, "bin offset table")?);
        }
        Ok((
            Self {
                inner,
                consumed: 0,
                encoding,
                scratch: Vec::new(),
            },
            offsets,
        ))
    }

    /// Байт, прочитанных после таблицы offsets.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn skip_to(&mut self, offset: u64) -> Result<()> {
        if offset < self.consumed {
            return Err(SlobError::BackwardSkip {
                offset,
                consumed: self.consumed,
            }
            .into());
        }
        let gap = offset - self.consumed;
        if gap > 0 {
            let skipped = io::copy(&mut (&mut self.inner).take(gap), &mut io::sink())?;
            self.consumed += skipped;
            if skipped < gap {
                return Err(SlobError::Truncated {
                    what: "bin item gap",
                    expected: gap - skipped,
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn read_big_text(&mut self) -> Result<String> {
        let len = read_u32(&mut self.inner, "bin item length")? as usize;
        self.consumed += 4;
        if len > BIG_TEXT_MAX {
            return Err(anyhow!("bin item length {} exceeds {}", len, BIG_TEXT_MAX));
        }
        if self.scratch.len() < len {
            self.scratch.resize(len, 0);
        }
        self.inner
            .read_exact(&mut self.scratch[..len])
            .map_err(|e| map_eof(e, "bin item", len as u64))?;
        self.consumed += len as u64;
        Ok(self.encoding.decode(&self.scratch[..len]))
    }

    pub fn read_item_at(&mut self, offset: u32) -> Result<String> {
        self.skip_to(offset as u64)?;
        self.read_big_text()
    }
}

fn is_truncation(err: &anyhow::Error) -> bool {
    matches!(slob_error(err), Some(SlobError::Truncated { .. }))
}

/// Распаковать bin целиком. Для lzma/lzma2 элементы, которые не удалось
/// дочитать из хвоста потока, заменяются на DEGRADED_CONTENT.
pub fn decode_bin(
    bin: usize,
    method: Compression,
    encoding: TextEncoding,
    ids: &[u8],
    compressed: &[u8],
) -> Result<DecodedBin> {
    let reader = decompressor(method, compressed).with_context(|| format!("bin {}", bin))?;
    let (mut cursor, offsets) =
        ItemCursor::open(reader, ids.len(), encoding).with_context(|| format!("bin {}", bin))?;

    let mut content = Vec::with_capacity(ids.len());
    for (item, off) in offsets.iter().enumerate() {
        match cursor.read_item_at(*off) {
            Ok(s) => content.push(s),
            Err(e) if method.tolerates_truncated_tail() && is_truncation(&e) => {
                warn!(
                    "bin {} item {}: {} stream ended early ({}), content degraded",
                    bin, item, method, e
                );
                record_degraded_item();
                content.push(DEGRADED_CONTENT.to_string());
            }
            Err(e) => return Err(e.context(format!("bin {} item {}", bin, item))),
        }
    }

    record_bin_decompressed(compressed.len());
    debug!(
        "bin {}: {} item(s), {} compressed byte(s) via {}",
        bin,
        content.len(),
        compressed.len(),
        method
    );
    Ok(DecodedBin {
        ids: ids.to_vec(),
        content,
    })
}

enum BinState<S> {
    Pending(S),
    Ready(Arc<DecodedBin>),
}

/// Один bin словаря.
pub struct StoreItem<S: BinSource> {
    index: usize,
    compression: Compression,
    encoding: TextEncoding,
    state: Mutex<BinState<S>>,
}

impl<S: BinSource> StoreItem<S> {
    pub fn new(index: usize, source: S, compression: Compression, encoding: TextEncoding) -> Self {
        Self {
            index,
            compression,
            encoding,
            state: Mutex::new(BinState::Pending(source)),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// true после первой успешной распаковки (источник уже освобождён).
    pub fn is_decompressed(&self) -> bool {
        match self.state.lock() {
            Ok(g) => matches!(&*g, BinState::Ready(_)),
            Err(_) => false,
        }
    }

    /// Распакованное содержимое; первый вызов распаковывает, остальные
    /// возвращают кэш. Конкурентные первые вызовы ждут один и тот же результат.
    pub fn decoded(&self) -> Result<Arc<DecodedBin>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("bin {} state poisoned", self.index))?;
        let decoded = match &*state {
            BinState::Ready(d) => return Ok(Arc::clone(d)),
            BinState::Pending(src) => Arc::new(src.with_raw(|ids, packed| {
                decode_bin(self.index, self.compression, self.encoding, ids, packed)
            })?),
        };
        *state = BinState::Ready(Arc::clone(&decoded));
        Ok(decoded)
    }

    /// (content, content id) элемента `item`.
    pub fn get_at(&self, item: usize) -> Result<(String, u8)> {
        let bin = self.decoded()?;
        match (bin.content.get(item), bin.ids.get(item)) {
            (Some(c), Some(id)) => Ok((c.clone(), *id)),
            _ => Err(SlobError::ItemOutOfRange {
                bin: self.index,
                item,
                len: bin.len(),
            }
            .into()),
        }
    }
}
