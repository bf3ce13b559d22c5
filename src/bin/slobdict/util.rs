use anyhow::{anyhow, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use slobdict::lookup::load_dictionary;
use slobdict::{SlobConfig, WordDictionary};

/// Открыть словарь (.slob или .ifo) с конфигом из окружения.
pub fn open_any(path: &Path) -> Result<Box<dyn WordDictionary>> {
    load_dictionary(path, &SlobConfig::from_env())
}

/// "key=value" -> (key, value).
pub fn parse_tag(arg: &str) -> Result<(String, String)> {
    let (k, v) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("tag must be key=value, got {:?}", arg))?;
    let k = k.trim();
    if k.is_empty() {
        return Err(anyhow!("tag key is empty in {:?}", arg));
    }
    Ok((k.to_string(), v.to_string()))
}

pub fn write_out(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut f = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    Ok(())
}

pub fn print_json<T: serde::Serialize>(v: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}
