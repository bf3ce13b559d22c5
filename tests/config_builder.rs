use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use slobdict::config::{SlobConfig, SlobConfigBuilder};
use slobdict::errors::{slob_error, SlobError};
use slobdict::{SlobReader, SlobWriter, WordDictionary};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("slobtest-builder-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn builder_threshold_switches_open_mode() -> Result<()> {
    let root = unique_root("threshold");
    fs::create_dir_all(&root)?;
    let path = root.join("small.slob");
    let summary = SlobWriter::default().write(&path, vec![("k", "v")], "text/plain")?;

    // Порог ровно в размер файла: "строго больше" -> ещё в памяти
    let at = SlobConfigBuilder::from_default()
        .file_backed_threshold(summary.file_len)
        .build()?;
    assert!(!SlobReader::new(at).open(&path)?.is_file_backed());

    let below = SlobConfigBuilder::from_default()
        .file_backed_threshold(summary.file_len - 1)
        .lock_files(false)
        .build()?;
    let slob = SlobReader::new(below).open(&path)?;
    assert!(slob.is_file_backed());
    assert_eq!(slob.get("k")?.content, "v");

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn builder_bin_limits_reach_the_writer() -> Result<()> {
    let root = unique_root("limits");
    fs::create_dir_all(&root)?;
    let path = root.join("limits.slob");

    let cfg = SlobConfigBuilder::from_default()
        .max_bin_items(10)
        .zlib_level(9)
        .build()?;
    let entries: Vec<(String, String)> =
        (0..95).map(|i| (format!("w{:03}", i), "text".to_string())).collect();
    let summary = SlobWriter::new(cfg.clone()).write(&path, entries, "text/plain")?;
    assert_eq!(summary.bins, 10);

    let slob = SlobReader::new(cfg).open(&path)?;
    assert_eq!(slob.len(), 95);
    assert_eq!(slob.get("w094")?.content, "text");

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn invalid_values_are_rejected_everywhere() -> Result<()> {
    let err = SlobConfigBuilder::from_default()
        .max_bin_bytes(0)
        .build()
        .err()
        .expect("zero bin bytes");
    assert!(matches!(slob_error(&err), Some(SlobError::InvalidConfig(_))));

    let err = SlobConfigBuilder::from_default()
        .zlib_level(12)
        .build()
        .err()
        .expect("zlib level 12");
    assert!(format!("{}", err).contains("zlib_level"));

    // with_* обходят build(), но writer всё равно валидирует
    let root = unique_root("invalid");
    fs::create_dir_all(&root)?;
    let bad = SlobConfig::default().with_max_bin_items(0);
    let res = SlobWriter::new(bad).write(root.join("x.slob"), vec![("a", "b")], "text/plain");
    assert!(matches!(
        res.as_ref().err().and_then(slob_error),
        Some(SlobError::InvalidConfig(_))
    ));

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn display_lists_every_field() {
    let cfg = SlobConfig::default().with_suggestion_limit(7).with_lock_files(false);
    let s = cfg.to_string();
    assert!(s.contains("suggestion_limit: 7"));
    assert!(s.contains("lock_files: false"));
    assert!(s.contains("max_bin_bytes: 327680"));
}
