use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(long, default_value = "serve")]
    pub mode: Mode,
    /// Rebuild the search index from stored posts before starting.
    #[arg(long, default_value_t = false)]
    pub reindex: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Serve the browser UI and JSON API.
    Serve,
    /// Fetch posts saved since the last sync, then exit.
    Sync,
    /// Refetch every saved post, then exit.
    SyncAll,
    /// Rebuild the search index from stored posts, then exit.
    Reindex,
}
