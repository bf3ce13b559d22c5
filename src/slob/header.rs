//! slob/header: заголовок SLOB до таблицы ссылок.
//!
//! [magic u64][uuid_hi u64][uuid_lo u64][encoding tiny][compression tiny]
//! [tag_count u8]{key tiny, value tiny}* [ct_count u8]{type text}*
//! [blob_count u32][store_offset u64][size u64]

use std::io::{Read, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::codec::{
    read_text, read_tiny_text, read_u32, read_u64, read_u8, write_text, write_tiny_text,
    write_u64, write_u8, TextEncoding,
};
use crate::compress::Compression;
use crate::consts::{FORMAT_UUID_HI, FORMAT_UUID_LO, SLOB_MAGIC};
use crate::errors::SlobError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlobHeader {
    pub uuid_hi: u64,
    pub uuid_lo: u64,
    #[serde(serialize_with = "ser_display")]
    pub encoding: TextEncoding,
    #[serde(serialize_with = "ser_display")]
    pub compression: Compression,
    /// Пары в порядке файла.
    pub tags: Vec<(String, String)>,
    pub content_types: Vec<String>,
    /// Объявленное число bin'ов (авторитетна таблица store).
    pub blob_count: u32,
    pub store_offset: u64,
    /// Объявленный размер файла (информационно).
    pub size: u64,
}

fn ser_display<T: std::fmt::Display, S: serde::Serializer>(
    v: &T,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(v)
}

impl SlobHeader {
    /// Заголовок для записи: текущий UUID формата, utf-8, zlib.
    pub fn for_write(tags: Vec<(String, String)>, content_types: Vec<String>) -> Self {
        Self {
            uuid_hi: FORMAT_UUID_HI,
            uuid_lo: FORMAT_UUID_LO,
            encoding: TextEncoding::Utf8,
            compression: Compression::Zlib,
            tags,
            content_types,
            blob_count: 0,
            store_offset: 0,
            size: 0,
        }
    }

    /// Прочитать заголовок с текущей позиции (ожидается начало файла).
    pub fn read<R: Read>(r: &mut R, scratch: &mut Vec<u8>) -> Result<Self> {
        let magic = read_u64(r, "magic")?;
        if magic != SLOB_MAGIC {
            return Err(SlobError::BadMagic { found: magic }.into());
        }
        let uuid_hi = read_u64(r, "uuid")?;
        let uuid_lo = read_u64(r, "uuid")?;

        // имя кодировки всегда ASCII
        let enc_name = read_tiny_text(r, TextEncoding::Utf8, scratch)?;
        let encoding = TextEncoding::from_name(&enc_name)?;
        let comp_token = read_tiny_text(r, encoding, scratch)?;
        let compression = Compression::from_token(&comp_token)?;

        let tag_count = read_u8(r, "tag count")?;
        let mut tags = Vec::with_capacity(tag_count as usize);
        for i in 0..tag_count {
            let key = read_tiny_text(r, encoding, scratch).with_context(|| format!("tag #{} key", i))?;
            let value =
                read_tiny_text(r, encoding, scratch).with_context(|| format!("tag #{} value", i))?;
            tags.push((key, value.trim_end_matches('\0').to_string()));
        }

        let ct_count = read_u8(r, "content type count")?;
        let mut content_types = Vec::with_capacity(ct_count as usize);
        for i in 0..ct_count {
            content_types
                .push(read_text(r, encoding, scratch).with_context(|| format!("content type #{}", i))?);
        }

        let blob_count = read_u32(r, "blob count")?;
        let store_offset = read_u64(r, "store offset")?;
        let size = read_u64(r, "size")?;

        Ok(Self {
            uuid_hi,
            uuid_lo,
            encoding,
            compression,
            tags,
            content_types,
            blob_count,
            store_offset,
            size,
        })
    }

    /// Записать заголовок до поля blob_count (не включая). Числовые поля
    /// за ним writer резервирует сам и патчит в конце.
    pub fn write_leading<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u64(w, SLOB_MAGIC)?;
        write_u64(w, self.uuid_hi)?;
        write_u64(w, self.uuid_lo)?;
        write_tiny_text(w, self.encoding.name(), TextEncoding::Utf8)?;
        write_tiny_text(w, self.compression.token(), self.encoding)?;

        if self.tags.len() > u8::MAX as usize {
            anyhow::bail!("too many tags: {} (max {})", self.tags.len(), u8::MAX);
        }
        write_u8(w, self.tags.len() as u8)?;
        for (k, v) in &self.tags {
            write_tiny_text(w, k, self.encoding).with_context(|| format!("tag key {:?}", k))?;
            write_tiny_text(w, v, self.encoding).with_context(|| format!("tag value of {:?}", k))?;
        }

        if self.content_types.len() > u8::MAX as usize {
            anyhow::bail!(
                "too many content types: {} (max {})",
                self.content_types.len(),
                u8::MAX
            );
        }
        write_u8(w, self.content_types.len() as u8)?;
        for ct in &self.content_types {
            write_text(w, ct, self.encoding)?;
        }
        Ok(())
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self, id: u8) -> Result<&str> {
        self.content_types
            .get(id as usize)
            .map(|s| s.as_str())
            .ok_or_else(|| {
                SlobError::ContentTypeOutOfRange {
                    id,
                    types: self.content_types.len(),
                }
                .into()
            })
    }

    /// UUID файлов, записанных этим крейтом.
    pub fn is_own_format(&self) -> bool {
        self.uuid_hi == FORMAT_UUID_HI && self.uuid_lo == FORMAT_UUID_LO
    }
}
