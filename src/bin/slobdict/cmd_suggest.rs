use anyhow::Result;
use std::path::PathBuf;

use slobdict::fuzzy::{BestMatches, CancelToken};
use slobdict::lookup::trim_search_text;
use slobdict::SlobConfig;

use super::util::{open_any, print_json};

pub fn exec(path: PathBuf, query: String, limit: Option<usize>, json: bool) -> Result<()> {
    let limit = limit.unwrap_or_else(|| SlobConfig::from_env().suggestion_limit);
    let dict = open_any(&path)?;
    let keys = dict.keys();
    let query = trim_search_text(&query);

    let mut bm = BestMatches::new();
    bm.evaluate(query, keys.as_slice(), &CancelToken::new());
    let top = bm.top(limit.min(keys.len()));

    if json {
        return print_json(&top);
    }
    for m in &top {
        println!("{:>4}  {}", m.common_chars, m.phrase);
    }
    Ok(())
}
