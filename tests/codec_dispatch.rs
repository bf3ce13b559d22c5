use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use byteorder::{BigEndian, ByteOrder};
use flate2::write::{GzEncoder, ZlibEncoder};
use oorandom::Rand64;

use slobdict::codec::{write_big_text, write_u32, write_u64, write_u8, TextEncoding};
use slobdict::compress::{decompress_all, Compression};
use slobdict::consts::DEGRADED_CONTENT;
use slobdict::errors::{slob_error, SlobError};
use slobdict::metrics;
use slobdict::slob::{Reference, SlobHeader};
use slobdict::{SlobReader, WordDictionary};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("slobtest-codec-{prefix}-{pid}-{t}-{id}"))
}

// ---------- фикстуры кодеков ----------

fn zlib(plain: &[u8]) -> Result<Vec<u8>> {
    let mut e = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    e.write_all(plain)?;
    Ok(e.finish()?)
}

fn gzip(plain: &[u8]) -> Result<Vec<u8>> {
    let mut e = GzEncoder::new(Vec::new(), flate2::Compression::default());
    e.write_all(plain)?;
    Ok(e.finish()?)
}

fn bzip2(plain: &[u8]) -> Result<Vec<u8>> {
    let mut e = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    e.write_all(plain)?;
    Ok(e.finish()?)
}

/// Сырой lzma-поток с 6-байтовым префиксом вместо 13-байтового заголовка.
fn lzma_prefixed(plain: &[u8]) -> Result<Vec<u8>> {
    let mut packed = Vec::new();
    lzma_rs::lzma_compress(&mut BufReader::new(plain), &mut packed)?;
    let mut out = vec![0u8; 5];
    out.push(packed[0]);
    out.extend_from_slice(&packed[13..]);
    Ok(out)
}

/// unix compress, только литералы 9-битными кодами (коротким потокам хватает).
fn lzw_literals(plain: &[u8]) -> Vec<u8> {
    assert!(plain.len() < 255);
    let mut out = vec![0x1F, 0x9D, 0x90];
    let mut acc: u32 = 0;
    let mut nb = 0;
    for b in plain {
        acc |= (*b as u32) << nb;
        nb += 9;
        while nb >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            nb -= 8;
        }
    }
    if nb > 0 {
        out.push(acc as u8);
    }
    out
}

#[test]
fn every_codec_decodes_its_fixture() -> Result<()> {
    let plain = b"slob bins may be packed by any of several codecs ".repeat(4);

    assert_eq!(decompress_all(Compression::Zlib, &zlib(&plain)?)?, plain);
    assert_eq!(decompress_all(Compression::Gzip, &gzip(&plain)?)?, plain);
    assert_eq!(decompress_all(Compression::Bzip2, &bzip2(&plain)?)?, plain);
    assert_eq!(decompress_all(Compression::Lzma, &lzma_prefixed(&plain)?)?, plain);
    assert_eq!(decompress_all(Compression::Lzma2, &lzma_prefixed(&plain)?)?, plain);

    let short = b"lzw codes";
    assert_eq!(decompress_all(Compression::Lzw, &lzw_literals(short))?, short);
    Ok(())
}

/// Потоки настоящего unix compress: ширина кода растёт до 13 бит (maxbits 16)
/// и таблица на 10 бит несколько раз переполняется с CLEAR.
#[test]
fn lzw_streams_with_width_growth_and_clear() -> Result<()> {
    let grow_z: &[u8] = include_bytes!("data/lzw_grow.Z");
    let grow: &[u8] = include_bytes!("data/lzw_grow.txt");
    assert_eq!(grow_z[2], 0x80 | 16);
    assert_eq!(decompress_all(Compression::Lzw, grow_z)?, grow);

    let clear_z: &[u8] = include_bytes!("data/lzw_clear.Z");
    let clear: &[u8] = include_bytes!("data/lzw_clear.txt");
    assert_eq!(clear_z[2], 0x80 | 10);
    assert_eq!(decompress_all(Compression::Lzw, clear_z)?, clear);

    // обрыв на середине отдаёт только префикс
    let cut = decompress_all(Compression::Lzw, &grow_z[..grow_z.len() / 2])?;
    assert!(!cut.is_empty() && cut.len() < grow.len());
    assert_eq!(&grow[..cut.len()], &cut[..]);
    Ok(())
}

#[test]
fn tokens_map_to_codecs() -> Result<()> {
    assert_eq!(Compression::from_token("ZLIB")?, Compression::Zlib);
    assert_eq!(Compression::from_token("bz2")?, Compression::Bzip2);
    assert_eq!(Compression::from_token("bzip2")?, Compression::Bzip2);
    assert_eq!(Compression::from_token("lzma2\0\0")?, Compression::Lzma2);

    let err = Compression::from_token("snappy").err().expect("unknown token");
    assert_eq!(
        slob_error(&err),
        Some(&SlobError::UnsupportedCompression("snappy".into()))
    );
    Ok(())
}

// ---------- SLOB, собранный вручную с произвольным кодеком ----------

/// Один bin: [offsets][big text]* сжатый `pack`.
fn assemble(
    path: &Path,
    compression: Compression,
    items: &[(&str, &str)],
    pack: impl Fn(&[u8]) -> Result<Vec<u8>>,
) -> Result<()> {
    let enc = TextEncoding::Utf8;
    let mut header = SlobHeader::for_write(vec![], vec!["text/plain".into()]);
    header.compression = compression;

    let mut buf: Vec<u8> = Vec::new();
    header.write_leading(&mut buf)?;
    write_u32(&mut buf, 1)?;
    let store_offset_pos = buf.len();
    write_u64(&mut buf, 0)?;
    let size_pos = buf.len();
    write_u64(&mut buf, 0)?;

    write_u32(&mut buf, items.len() as u32)?;
    let table = buf.len();
    buf.resize(table + items.len() * 8, 0);
    let base = buf.len();
    for (i, (key, _)) in items.iter().enumerate() {
        let off = (buf.len() - base) as u64;
        BigEndian::write_u64(&mut buf[table + i * 8..table + i * 8 + 8], off);
        Reference {
            key: key.to_string(),
            bin_index: 0,
            item_index: i as u16,
            fragment: String::new(),
        }
        .write(&mut buf, enc)?;
    }

    let mut payload = Vec::new();
    let mut off = 0u32;
    for (_, v) in items {
        write_u32(&mut payload, off)?;
        off += 4 + v.len() as u32;
    }
    for (_, v) in items {
        write_big_text(&mut payload, v, enc)?;
    }
    let packed = pack(&payload)?;

    let store_offset = buf.len() as u64;
    BigEndian::write_u64(&mut buf[store_offset_pos..store_offset_pos + 8], store_offset);
    write_u32(&mut buf, 1)?;
    write_u64(&mut buf, 0)?;
    write_u32(&mut buf, items.len() as u32)?;
    for _ in items {
        write_u8(&mut buf, 0)?;
    }
    write_u32(&mut buf, packed.len() as u32)?;
    buf.extend_from_slice(&packed);

    let size = buf.len() as u64;
    BigEndian::write_u64(&mut buf[size_pos..size_pos + 8], size);
    fs::write(path, &buf)?;
    Ok(())
}

const ITEMS: &[(&str, &str)] = &[("one", "first"), ("two", "second"), ("three", "третий")];

#[test]
fn dictionaries_with_foreign_codecs_open() -> Result<()> {
    let root = unique_root("foreign");
    fs::create_dir_all(&root)?;

    let cases: Vec<(Compression, Box<dyn Fn(&[u8]) -> Result<Vec<u8>>>)> = vec![
        (Compression::Zlib, Box::new(zlib)),
        (Compression::Gzip, Box::new(gzip)),
        (Compression::Bzip2, Box::new(bzip2)),
        (Compression::Lzma, Box::new(lzma_prefixed)),
        (
            Compression::Lzw,
            Box::new(|p: &[u8]| -> Result<Vec<u8>> { Ok(lzw_literals(p)) }),
        ),
    ];
    for (method, pack) in cases {
        let path = root.join(format!("{}.slob", method.token()));
        assemble(&path, method, ITEMS, pack)?;

        for file_backed in [false, true] {
            let reader = SlobReader::default();
            let slob = if file_backed {
                reader.open_file_backed(&path)?
            } else {
                reader.open_in_memory(&path)?
            };
            assert_eq!(slob.header().compression, method);
            for (k, v) in ITEMS {
                assert_eq!(slob.get(k)?.content, *v, "{} via {}", k, method);
            }
        }
    }

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn truncated_lzma_tail_degrades_instead_of_failing() -> Result<()> {
    let root = unique_root("lzma-tail");
    fs::create_dir_all(&root)?;
    let path = root.join("tail.slob");

    // несжимаемый хвост: обрезка потока гарантированно задевает последний элемент
    let mut rng = Rand64::new(7);
    let noise: String = (0..20_000)
        .map(|_| (b'a' + rng.rand_range(0..26) as u8) as char)
        .collect();
    let items = [("a", "alpha"), ("b", "beta"), ("c", noise.as_str())];

    assemble(&path, Compression::Lzma, &items, |p| {
        let full = lzma_prefixed(p)?;
        Ok(full[..full.len() / 2].to_vec())
    })?;

    let before = metrics::snapshot();
    let slob = SlobReader::default().open(&path)?;
    assert_eq!(slob.get("a")?.content, "alpha");
    assert_eq!(slob.get("b")?.content, "beta");
    let tail = slob.get("c")?;
    assert_eq!(tail.content, DEGRADED_CONTENT);
    assert_eq!(tail.content_type, "text/plain");
    assert!(metrics::snapshot().degraded_items >= before.degraded_items + 1);

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn truncated_zlib_bin_is_an_error() -> Result<()> {
    let root = unique_root("zlib-tail");
    fs::create_dir_all(&root)?;
    let path = root.join("tail.slob");

    assemble(&path, Compression::Zlib, ITEMS, |p| {
        let full = zlib(p)?;
        Ok(full[..full.len() / 2].to_vec())
    })?;

    let slob = SlobReader::default().open(&path)?;
    assert!(slob.get("three").is_err());

    fs::remove_dir_all(&root).ok();
    Ok(())
}
