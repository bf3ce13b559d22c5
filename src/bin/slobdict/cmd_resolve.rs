use anyhow::Result;
use std::path::PathBuf;

use slobdict::lookup::trim_search_text;
use slobdict::util::preview;
use slobdict::{DictionarySet, SlobConfig};

use super::util::print_json;

pub fn exec(paths: Vec<PathBuf>, text: String, json: bool) -> Result<()> {
    let mut set = DictionarySet::new(SlobConfig::from_env());
    for p in &paths {
        set.load_deferred(p)?;
    }
    set.collect_and_sort_keys()?;

    let res = set.resolve(trim_search_text(&text))?;
    if json {
        return print_json(&res);
    }

    match &res.selected_key {
        Some(k) => println!("selected key: {}", k),
        None => println!("selected key: -"),
    }
    for hit in &res.hits {
        let name = set.dictionaries()[hit.dictionary]
            .file_name()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "[{}] {} {} ({}): {}",
            hit.dictionary,
            name,
            if hit.found { "=" } else { "~" },
            hit.key,
            preview(&hit.entry.content, 100)
        );
    }
    Ok(())
}
