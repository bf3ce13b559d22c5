use anyhow::Result;
use std::path::PathBuf;

use super::util::open_any;

pub fn exec(path: PathBuf, from: Option<String>, count: usize) -> Result<()> {
    let dict = open_any(&path)?;
    let keys = match from.as_deref() {
        Some(k) => dict.keys_from(k, count),
        None => dict.keys().into_iter().take(count).collect(),
    };
    for k in &keys {
        println!("{}", k);
    }
    println!("-- {} of {} key(s)", keys.len(), dict.len());
    Ok(())
}
