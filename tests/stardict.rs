use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use flate2::write::GzEncoder;

use slobdict::lookup::load_dictionary;
use slobdict::{SlobConfig, StarDictionary, WordDictionary};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("slobtest-stardict-{prefix}-{pid}-{t}-{id}"))
}

/// Записать .ifo/.idx/.dict[.dz]; возвращает путь к .ifo.
fn write_stardict(dir: &Path, name: &str, words: &[(&str, &str)], dz: bool) -> Result<PathBuf> {
    let mut idx = Vec::new();
    let mut dict = Vec::new();
    for (w, article) in words {
        idx.extend_from_slice(w.as_bytes());
        idx.push(0);
        idx.extend_from_slice(&(dict.len() as u32).to_be_bytes());
        idx.extend_from_slice(&(article.len() as u32).to_be_bytes());
        dict.extend_from_slice(article.as_bytes());
    }

    let ifo = dir.join(format!("{}.ifo", name));
    fs::write(
        &ifo,
        format!(
            "StarDict's dict ifo file\nversion=2.4.2\nbookname={}\nwordcount={}\nidxfilesize={}\nsametypesequence=h\n",
            name,
            words.len(),
            idx.len()
        ),
    )?;
    fs::write(dir.join(format!("{}.idx", name)), &idx)?;
    if dz {
        let mut e = GzEncoder::new(Vec::new(), flate2::Compression::default());
        e.write_all(&dict)?;
        fs::write(dir.join(format!("{}.dict.dz", name)), e.finish()?)?;
    } else {
        fs::write(dir.join(format!("{}.dict", name)), &dict)?;
    }
    Ok(ifo)
}

const WORDS: &[(&str, &str)] = &[
    ("zebra", "<b>zebra</b> striped"),
    ("apple", "<b>apple</b> fruit"),
    ("Moscow", "<b>Moscow</b> city"),
];

#[test]
fn plain_dict_opens_and_sorts() -> Result<()> {
    let root = unique_root("plain");
    fs::create_dir_all(&root)?;
    let ifo = write_stardict(&root, "plain", WORDS, false)?;

    let sd = StarDictionary::open(&ifo)?;
    assert_eq!(sd.info().bookname, "plain");
    assert_eq!(sd.info().wordcount, 3);
    assert_eq!(sd.len(), 3);
    assert_eq!(sd.keys(), vec!["apple", "Moscow", "zebra"]);
    assert_eq!(sd.file_name(), Some(ifo.as_path()));

    let e = sd.get("Moscow")?;
    assert_eq!(e.content, "<b>Moscow</b> city");
    assert_eq!(e.content_type, "text/html");
    assert_eq!(sd.try_get_value("pear")?, None);
    assert_eq!(sd.keys_from("b", 10), vec!["Moscow", "zebra"]);

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn dictzip_dict_is_read_through_gzip() -> Result<()> {
    let root = unique_root("dz");
    fs::create_dir_all(&root)?;
    let ifo = write_stardict(&root, "packed", WORDS, true)?;

    // загрузка по расширению .ifo
    let d = load_dictionary(&ifo, &SlobConfig::default())?;
    assert_eq!(d.get("zebra")?.content, "<b>zebra</b> striped");

    fs::remove_dir_all(&root).ok();
    Ok(())
}

#[test]
fn missing_dict_file_fails() -> Result<()> {
    let root = unique_root("missing");
    fs::create_dir_all(&root)?;
    let ifo = write_stardict(&root, "lonely", WORDS, false)?;
    fs::remove_file(root.join("lonely.dict"))?;

    assert!(StarDictionary::open(&ifo).is_err());

    fs::remove_dir_all(&root).ok();
    Ok(())
}
