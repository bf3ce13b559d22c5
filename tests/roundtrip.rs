use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use oorandom::Rand64;

use slobdict::codec::TextEncoding;
use slobdict::collation::Collator;
use slobdict::consts::{FORMAT_UUID_HI, FORMAT_UUID_LO};
use slobdict::{SlobConfig, SlobReader, SlobWriter, WordDictionary};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("slobtest-roundtrip-{prefix}-{pid}-{t}-{id}"))
}

const ALPHABET: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'é', 'ß', 'Ж', '日', ' ', '<', '>', '&', '\n',
];

fn random_text(rng: &mut Rand64, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.rand_range(0..ALPHABET.len() as u64) as usize])
        .collect()
}

fn random_map(seed: u128, n: usize, max_len: u64) -> HashMap<String, String> {
    let mut rng = Rand64::new(seed);
    let mut map = HashMap::new();
    let mut i = 0usize;
    while map.len() < n {
        let klen = 1 + rng.rand_range(0..12) as usize;
        let key = format!("{}{}", random_text(&mut rng, klen).trim(), i);
        let vlen = rng.rand_range(0..max_len) as usize;
        map.insert(key, random_text(&mut rng, vlen));
        i += 1;
    }
    map
}

/// Запись -> чтение (в памяти и с диска): каждое значение и MIME совпадают.
#[test]
fn random_entries_roundtrip_both_modes() -> Result<()> {
    let root = unique_root("modes");
    fs::create_dir_all(&root)?;
    let path = root.join("random.slob");

    let map = random_map(0xDEADBEEF, 2_000, 3_000);
    let cfg = SlobConfig::default().with_max_bin_bytes(64 * 1024);
    let summary = SlobWriter::new(cfg.clone()).write(&path, map.clone(), "text/plain")?;
    assert_eq!(summary.entries, map.len());
    assert!(summary.bins > 1, "64 KiB bins must split ~3 MB of content");
    assert_eq!(summary.file_len, fs::metadata(&path)?.len());

    let reader = SlobReader::new(cfg);
    for slob in [reader.open_in_memory(&path)?, reader.open_file_backed(&path)?] {
        assert_eq!(slob.len(), map.len());
        for (k, v) in &map {
            let e = slob
                .try_get_value(k)?
                .unwrap_or_else(|| panic!("key {:?} missing", k));
            assert_eq!(&e.content, v);
            assert_eq!(e.content_type, "text/plain");
        }
    }

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn header_fields_and_key_order() -> Result<()> {
    let root = unique_root("header");
    fs::create_dir_all(&root)?;
    let path = root.join("hdr.slob");

    let entries = vec![
        ("zebra", "<b>z</b>"),
        ("Apple", "<b>A</b>"),
        ("apple", "<b>a</b>"),
        ("résumé", "<b>r</b>"),
        ("resume", "<b>r0</b>"),
    ];
    let summary = SlobWriter::default()
        .with_tag("label", "Test dictionary")
        .with_tag("license.name", "MIT")
        .write(&path, entries, "text/html; charset=utf-8")?;

    let slob = SlobReader::default().open(&path)?;
    assert!(!slob.is_file_backed());
    let h = slob.header();
    assert_eq!((h.uuid_hi, h.uuid_lo), (FORMAT_UUID_HI, FORMAT_UUID_LO));
    assert!(h.is_own_format());
    assert_eq!(h.encoding, TextEncoding::Utf8);
    assert_eq!(h.compression.token(), "zlib");
    assert_eq!(h.tag("label"), Some("Test dictionary"));
    assert_eq!(h.tag("license.name"), Some("MIT"));
    assert_eq!(h.content_types, vec!["text/html; charset=utf-8".to_string()]);
    assert_eq!(h.blob_count as usize, summary.bins);
    assert_eq!(h.size, summary.file_len);

    assert_eq!(slob.keys(), vec!["apple", "Apple", "resume", "résumé", "zebra"]);
    let c = Collator::new();
    let keys = slob.keys();
    for w in keys.windows(2) {
        assert!(c.sort_key(w[0]) <= c.sort_key(w[1]));
    }

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn utf7_encoded_dictionary_roundtrip() -> Result<()> {
    let root = unique_root("utf7");
    fs::create_dir_all(&root)?;
    let path = root.join("utf7.slob");

    let entries = vec![("Straße", "breite Straße"), ("日本", "Japan + 日本語"), ("plain", "ascii")];
    SlobWriter::default()
        .with_encoding(TextEncoding::Utf7)
        .write(&path, entries.clone(), "text/plain")?;

    let slob = SlobReader::default().open(&path)?;
    assert_eq!(slob.header().encoding, TextEncoding::Utf7);
    for (k, v) in entries {
        assert_eq!(slob.get(k)?.content, v);
    }

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn empty_dictionary_opens() -> Result<()> {
    let root = unique_root("empty");
    fs::create_dir_all(&root)?;
    let path = root.join("empty.slob");

    let summary = SlobWriter::default().write(&path, Vec::<(String, String)>::new(), "text/plain")?;
    assert_eq!((summary.entries, summary.bins), (0, 0));

    let slob = SlobReader::default().open(&path)?;
    assert!(slob.is_empty());
    assert!(slob.keys_from("a", 10).is_empty());
    assert_eq!(slob.try_get_value("a")?, None);

    fs::remove_dir_all(&root).ok();
    Ok(())
}
