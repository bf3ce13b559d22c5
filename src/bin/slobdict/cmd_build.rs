use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

use slobdict::{SlobConfig, SlobWriter};

use super::util::parse_tag;

pub fn exec(input: PathBuf, out: PathBuf, mime: String, tags: Vec<String>) -> Result<()> {
    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("read {}", input.display()))?;
    let entries: BTreeMap<String, String> =
        serde_json::from_str(&raw).context("parse input json (object of key -> content)")?;

    let mut writer = SlobWriter::new(SlobConfig::from_env());
    for t in &tags {
        let (k, v) = parse_tag(t)?;
        writer = writer.with_tag(k, v);
    }

    let summary = writer.write(&out, entries, &mime)?;
    println!(
        "built {}: entries={} bins={} size={} B",
        out.display(),
        summary.entries,
        summary.bins,
        summary.file_len
    );
    Ok(())
}
