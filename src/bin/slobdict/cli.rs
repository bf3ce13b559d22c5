use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI для словарей SLOB / StarDict
#[derive(Parser, Debug)]
#[command(name = "slobdict", version, about = "SLOB dictionary reader/writer CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Header, tags, content types and counts of a SLOB file
    Info {
        #[arg(long)]
        path: PathBuf,
        /// Print one JSON object
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the article for a key (falls back to the next key in collation order)
    Get {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        key: String,
        /// Optional file to write the raw article into
        #[arg(long)]
        out: Option<PathBuf>,
        /// Strip HTML/XML markup before printing
        #[arg(long, default_value_t = false)]
        plain: bool,
    },
    /// List keys, optionally starting at --from
    Keys {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        from: Option<String>,
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
    /// "Did you mean": keys ranked by longest common substring
    Suggest {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        query: String,
        /// Defaults to SLOB_SUGGESTION_LIMIT / 100
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Build a SLOB file from a JSON object {"key": "content", ...}
    Build {
        /// JSON input file
        #[arg(long)]
        input: PathBuf,
        /// Output .slob file
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "text/html; charset=utf-8")]
        mime: String,
        /// Header tag as key=value (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Resolve a search text across several dictionaries (.slob or .ifo)
    Resolve {
        /// Dictionary files (repeatable)
        #[arg(long = "path", required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
