use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use slobdict::collation::Collator;
use slobdict::slob::SlobHeader;
use slobdict::util::human_bytes;
use slobdict::{SlobConfig, SlobReader};

#[derive(Serialize)]
struct InfoOut<'a> {
    path: String,
    file_backed: bool,
    own_format: bool,
    header: &'a SlobHeader,
    references: usize,
    bins: usize,
}

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let slob = SlobReader::new(SlobConfig::from_env()).open(&path)?;
    let h = slob.header();

    if json {
        let out = InfoOut {
            path: path.display().to_string(),
            file_backed: slob.is_file_backed(),
            own_format: h.is_own_format(),
            header: h,
            references: slob.references().len(),
            bins: slob.bin_count(),
        };
        return super::util::print_json(&out);
    }

    println!("SLOB {}", path.display());
    println!(
        "  mode:          {}",
        if slob.is_file_backed() { "file-backed" } else { "in-memory" }
    );
    println!("  uuid:          {:016x}{:016x}", h.uuid_hi, h.uuid_lo);
    println!("  encoding:      {}", h.encoding);
    println!("  compression:   {}", h.compression);
    println!("  declared size: {} ({})", h.size, human_bytes(h.size));
    println!("  store offset:  {}", h.store_offset);
    println!("  blob count:    {} (store: {})", h.blob_count, slob.bin_count());
    println!("  references:    {}", slob.references().len());
    println!("  collation:     {}", Collator::new().locale());
    println!("  content types:");
    for (i, ct) in h.content_types.iter().enumerate() {
        println!("    [{}] {}", i, ct);
    }
    if !h.tags.is_empty() {
        println!("  tags:");
        for (k, v) in &h.tags {
            println!("    {} = {}", k, v);
        }
    }
    Ok(())
}
