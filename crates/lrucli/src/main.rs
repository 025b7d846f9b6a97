//! lru - run cache command scripts against an in-memory LRU cache

mod handler;
mod reply;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use lrucache::SharedLruCache;
use tracing::info;

use crate::handler::{CommandHandler, ScriptCache};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of entries)
    #[arg(short, long, default_value_t = 1024)]
    capacity: usize,

    /// Command script to execute; reads stdin when omitted
    #[arg(short, long)]
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so replies on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let cache = build_cache(args.capacity)?;
    let input = open_input(args.script.as_deref())?;
    let handler = CommandHandler::new(cache);
    let stdout = io::stdout();
    let executed = run(&handler, input, stdout.lock())?;

    info!("Executed {} commands", executed);
    Ok(())
}

fn build_cache(capacity: usize) -> Result<ScriptCache> {
    let cache = SharedLruCache::new(capacity)
        .with_context(|| format!("cannot create cache with capacity {}", capacity))?;
    info!("Cache capacity: {}", capacity);
    Ok(cache)
}

fn open_input(script: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open script {}", path.display()))?;
            info!("Reading commands from {}", path.display());
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Execute every line of `input`, writing one reply per command
fn run<R: BufRead, W: Write>(handler: &CommandHandler, input: R, mut output: W) -> Result<usize> {
    let mut executed = 0;

    for (lineno, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", lineno + 1))?;
        if let Some(reply) = handler.handle(&line) {
            writeln!(output, "{}", reply)?;
            executed += 1;
        }
    }

    output.flush()?;
    Ok(executed)
}
