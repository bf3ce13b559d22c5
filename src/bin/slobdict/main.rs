use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod util;
mod cmd_info;
mod cmd_get;
mod cmd_keys;
mod cmd_suggest;
mod cmd_build;
mod cmd_resolve;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт info.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Info { path, json } =>
            cmd_info::exec(path, json),

        cli::Cmd::Get { path, key, out, plain } =>
            cmd_get::exec(path, key, out, plain),

        cli::Cmd::Keys { path, from, count } =>
            cmd_keys::exec(path, from, count),

        cli::Cmd::Suggest { path, query, limit, json } =>
            cmd_suggest::exec(path, query, limit, json),

        cli::Cmd::Build { input, out, mime, tags } =>
            cmd_build::exec(input, out, mime, tags),

        cli::Cmd::Resolve { paths, text, json } =>
            cmd_resolve::exec(paths, text, json),
    }
}
