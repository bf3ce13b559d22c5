//! slob/writer: запись словаря key -> value в новый SLOB-файл.
//!
//! Один проход по файлу + патчи в конце:
//! - header с плейсхолдерами blob_count/store_offset/size;
//! - таблица offsets ссылок (резерв) и сами ссылки;
//! - store table (резерв) и bins, каждый: [count][ids][len плейсхолдер][zlib];
//! - затем seek назад и запись всех отложенных значений.
//!
//! Разбиение на bins делается до записи первого байта store: новый bin
//! начинается, если текущий непуст и добавление записи превысит
//! max_bin_items или max_bin_bytes. Запись больше max_bin_bytes получает
//! собственный bin.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use byteorder::{BigEndian, ByteOrder};
use log::{debug, info};
use serde::Serialize;

use crate::codec::{write_big_text, write_u32, write_u64, TextEncoding};
use crate::collation::{sort_parallel, Collator, SortKey};
use crate::compress::zlib_writer;
use crate::config::SlobConfig;
use crate::lock::{acquire_exclusive, sibling_path};
use crate::metrics::record_dictionary_written;
use crate::util::preview;

use super::header::SlobHeader;
use super::reference::Reference;
use super::PosWriter;

/// Итог записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub entries: usize,
    pub bins: usize,
    pub file_len: u64,
}

#[derive(Debug, Clone)]
pub struct SlobWriter {
    config: SlobConfig,
    encoding: TextEncoding,
    tags: Vec<(String, String)>,
}

impl Default for SlobWriter {
    fn default() -> Self {
        Self::new(SlobConfig::default())
    }
}

/// Разбиение отсортированных значений на bins.
/// Возвращает диапазоны записей и (bin, item) для каждой записи.
pub fn plan_bins(
    sizes: impl IntoIterator<Item = usize>,
    max_items: usize,
    max_bytes: usize,
) -> (Vec<Range<usize>>, Vec<(u32, u16)>) {
    let mut bins = Vec::new();
    let mut assignment = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    let mut bytes = 0usize;

    for (i, len) in sizes.into_iter().enumerate() {
        if count > 0 && (count + 1 > max_items || bytes.saturating_add(len) > max_bytes) {
            bins.push(start..i);
            start = i;
            count = 0;
            bytes = 0;
        }
        assignment.push((bins.len() as u32, count as u16));
        count += 1;
        bytes = bytes.saturating_add(len);
    }
    if count > 0 {
        bins.push(start..start + count);
    }
    (bins, assignment)
}

impl SlobWriter {
    pub fn new(config: SlobConfig) -> Self {
        Self {
            config,
            encoding: TextEncoding::Utf8,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Записать все пары с одним MIME-типом. Порядок входа важен только для
    /// дубликатов ключей (сохраняется).
    ///
    /// Файл собирается в `<path>.tmp` и после fsync переименовывается поверх
    /// `path`; при ошибке прежний словарь остаётся на месте.
    pub fn write<P, I, K, V>(&self, path: P, entries: I, content_type: &str) -> Result<WriteSummary>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let path = path.as_ref();
        self.config.validate()?;

        let mut pairs: Vec<(String, String)> =
            entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let collator = Collator::new();
        let mut keys: Vec<SortKey> = pairs.iter().map(|(k, _)| collator.sort_key(k)).collect();
        sort_parallel(&mut keys, &mut pairs)?;
        drop(keys);

        let (bins, assignment) = plan_bins(
            pairs.iter().map(|(_, v)| self.encoding.byte_len(v)),
            self.config.max_bin_items,
            self.config.max_bin_bytes,
        );
        debug!(
            "{}: {} entries planned into {} bin(s)",
            path.display(),
            pairs.len(),
            bins.len()
        );

        let _lock = if self.config.lock_files {
            Some(acquire_exclusive(path)?)
        } else {
            None
        };
        let tmp = sibling_path(path, ".tmp");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .with_context(|| format!("create {}", tmp.display()))?;

        let plan = BinPlan {
            pairs: &pairs,
            bins: &bins,
            assignment: &assignment,
        };
        let file_len = match self.write_file(file, &tmp, &plan, content_type) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e.context(format!("write {}", path.display())));
            }
        };
        fs::rename(&tmp, path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        let _ = fsync_parent_dir(path);

        record_dictionary_written(bins.len());
        info!(
            "wrote {}: {} entries, {} bin(s), {} bytes",
            path.display(),
            pairs.len(),
            bins.len(),
            file_len
        );
        Ok(WriteSummary {
            entries: pairs.len(),
            bins: bins.len(),
            file_len,
        })
    }

    /// Один проход + патчи; возвращает длину файла (после fsync).
    fn write_file(
        &self,
        file: File,
        path: &Path,
        plan: &BinPlan<'_>,
        content_type: &str,
    ) -> Result<u64> {
        let BinPlan {
            pairs,
            bins,
            assignment,
        } = *plan;
        let enc = self.encoding;
        let mut header = SlobHeader::for_write(self.tags.clone(), vec![content_type.to_string()]);
        header.encoding = enc;

        let mut w = PosWriter::new(BufWriter::new(file));
        let mut patches: Vec<(u64, Vec<u8>)> = Vec::new();

        header.write_leading(&mut w)?;
        let blob_count_pos = w.pos();
        write_u32(&mut w, 0)?;
        let store_offset_pos = w.pos();
        write_u64(&mut w, 0)?;
        let size_pos = w.pos();
        write_u64(&mut w, 0)?;

        // references
        let ref_count =
            u32::try_from(pairs.len()).map_err(|_| anyhow!("too many entries: {}", pairs.len()))?;
        write_u32(&mut w, ref_count)?;
        let ref_table_pos = w.pos();
        w.write_all(&vec![0u8; pairs.len() * 8])?;
        let ref_base = w.pos();
        let mut ref_offsets = vec![0u8; pairs.len() * 8];
        for (i, ((key, _), (bin, item))) in pairs.iter().zip(assignment.iter()).enumerate() {
            BigEndian::write_u64(&mut ref_offsets[i * 8..i * 8 + 8], w.pos() - ref_base);
            let r = Reference {
                key: key.clone(),
                bin_index: *bin,
                item_index: *item,
                fragment: String::new(),
            };
            r.write(&mut w, enc)
                .with_context(|| format!("write reference for key {:?}", preview(key, 40)))?;
        }
        patches.push((ref_table_pos, ref_offsets));

        // store
        let store_offset = w.pos();
        write_u32(&mut w, bins.len() as u32)?;
        let store_table_pos = w.pos();
        w.write_all(&vec![0u8; bins.len() * 8])?;
        let store_base = w.pos();
        let mut store_offsets = vec![0u8; bins.len() * 8];

        for (b, range) in bins.iter().enumerate() {
            BigEndian::write_u64(&mut store_offsets[b * 8..b * 8 + 8], w.pos() - store_base);
            let items = &pairs[range.clone()];
            write_u32(&mut w, items.len() as u32)?;
            // единственный content type -> id 0
            w.write_all(&vec![0u8; items.len()])?;
            let len_pos = w.pos();
            write_u32(&mut w, 0)?;
            let start = w.pos();

            let mut z = zlib_writer(&mut w, self.config.zlib_level);
            let mut off: u32 = 0;
            for (_, v) in items {
                write_u32(&mut z, off)?;
                let len = 4 + enc.byte_len(v);
                off = u32::try_from(off as usize + len)
                    .map_err(|_| anyhow!("bin {} content exceeds 4 GiB", b))?;
            }
            for (k, v) in items {
                write_big_text(&mut z, v, enc)
                    .with_context(|| format!("write content for key {:?}", preview(k, 40)))?;
            }
            z.finish()?;

            let clen = w.pos() - start;
            let clen = u32::try_from(clen)
                .map_err(|_| anyhow!("bin {} compressed length {} exceeds u32", b, clen))?;
            let mut buf = [0u8; 4];
            BigEndian::write_u32(&mut buf, clen);
            patches.push((len_pos, buf.to_vec()));
        }
        patches.push((store_table_pos, store_offsets));

        let file_len = w.pos();
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, bins.len() as u32);
        patches.push((blob_count_pos, buf.to_vec()));
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, store_offset);
        patches.push((store_offset_pos, buf.to_vec()));
        BigEndian::write_u64(&mut buf, file_len);
        patches.push((size_pos, buf.to_vec()));

        let mut file: File = w
            .into_inner()
            .into_inner()
            .map_err(|e| anyhow!("flush {}: {}", path.display(), e.error()))?;
        for (pos, bytes) in &patches {
            file.seek(SeekFrom::Start(*pos))?;
            file.write_all(bytes)?;
        }
        file.sync_all()
            .with_context(|| format!("fsync {}", path.display()))?;
        Ok(file_len)
    }
}

/// Отсортированные пары и их раскладка по bins.
#[derive(Clone, Copy)]
struct BinPlan<'a> {
    pairs: &'a [(String, String)],
    bins: &'a [Range<usize>],
    assignment: &'a [(u32, u16)],
}

#[cfg(unix)]
fn fsync_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            File::open(parent)?.sync_all()?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn fsync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
