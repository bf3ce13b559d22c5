use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use slobdict::errors::{slob_error, SlobError};
use slobdict::lock::{sibling_path, try_acquire_exclusive};
use slobdict::{SlobReader, SlobWriter, WordDictionary};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("slobtest-atomic-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn failed_rewrite_keeps_previous_dictionary() -> Result<()> {
    let root = unique_root("keylen");
    fs::create_dir_all(&root)?;
    let path = root.join("d.slob");

    SlobWriter::default().write(&path, [("a", "alpha")], "text/plain")?;
    let before = fs::read(&path)?;

    // ключ длиннее 65535 байт не помещается в text-фрейм
    let long_key = "k".repeat(70_000);
    let err = SlobWriter::default()
        .write(&path, [(long_key, "v".to_string())], "text/plain")
        .unwrap_err();
    match slob_error(&err) {
        Some(SlobError::TextTooLong { len, max, .. }) => {
            assert_eq!(*len, 70_000);
            assert_eq!(*max, 65_535);
        }
        other => panic!("expected TextTooLong, got {:?} ({:#})", other, err),
    }

    assert_eq!(fs::read(&path)?, before);
    assert!(!sibling_path(&path, ".tmp").exists());
    let slob = SlobReader::default().open(&path)?;
    assert_eq!(slob.get("a")?.content, "alpha");

    // writer lock освобождён и после ошибки
    drop(try_acquire_exclusive(&path)?);

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn rewrite_replaces_whole_file() -> Result<()> {
    let root = unique_root("replace");
    fs::create_dir_all(&root)?;
    let path = root.join("d.slob");

    SlobWriter::default().write(&path, [("old", "gone")], "text/plain")?;
    // читатель старой версии не мешает замене
    let old = SlobReader::default().open_file_backed(&path)?;

    let summary =
        SlobWriter::default().write(&path, [("new", "here"), ("other", "too")], "text/html")?;
    assert_eq!(summary.file_len, fs::metadata(&path)?.len());

    let fresh = SlobReader::default().open(&path)?;
    assert_eq!(fresh.keys(), vec!["new", "other"]);
    assert!(fresh.try_get_value("old")?.is_none());
    assert_eq!(fresh.get("new")?.content_type, "text/html");

    // уже открытый file-backed словарь продолжает читать прежний файл
    assert_eq!(old.get("old")?.content, "gone");

    fs::remove_dir_all(&root).ok();
    Ok(())
}
