use anyhow::Result;
use std::path::PathBuf;

use slobdict::util::{preview, strip_markup};

use super::util::{open_any, write_out};

pub fn exec(path: PathBuf, key: String, out: Option<PathBuf>, plain: bool) -> Result<()> {
    let dict = open_any(&path)?;

    let (shown_key, entry) = match dict.try_get_value(&key)? {
        Some(e) => (key.clone(), Some(e)),
        None => match dict.keys_from(&key, 1).first() {
            Some(next) => {
                let next = next.to_string();
                let e = dict.try_get_value(&next)?;
                (next, e)
            }
            None => (key.clone(), None),
        },
    };

    let Some(entry) = entry else {
        println!("NOT FOUND '{}'", key);
        return Ok(());
    };

    if shown_key != key {
        println!("NOT FOUND '{}', nearest key '{}'", key, shown_key);
    }

    if let Some(out_path) = out {
        write_out(&out_path, entry.content.as_bytes())?;
        println!(
            "FOUND '{}' ({}): {} B -> wrote to {}",
            shown_key,
            entry.content_type,
            entry.content.len(),
            out_path.display()
        );
        return Ok(());
    }

    println!("FOUND '{}' ({}): {} B", shown_key, entry.content_type, entry.content.len());
    if plain {
        println!("{}", strip_markup(&entry.content));
    } else {
        println!("{}", entry.content);
    }
    log::debug!("preview: {}", preview(&entry.content, 80));
    Ok(())
}
