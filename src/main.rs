//! filestage - stage remote files through a local read-through cache
//!
//! Fetches files named by URI-like remote paths and serves repeated
//! requests from an on-disk cache, refreshing entries when the remote
//! copy changes.

mod backend;
mod cache;

use std::env;
use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use backend::BackendRegistry;
use cache::ReadThroughCache;

/// CLI command
#[derive(Debug)]
enum Command {
    /// Materialize one remote file at a destination path
    Fetch { remote: String, dest: PathBuf },
    /// Populate cache entries for several remotes concurrently
    Warm { remotes: Vec<String> },
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"filestage - stage remote files through a local read-through cache

USAGE:
    filestage fetch <remote> <dest> [--stats]
    filestage warm <remote>... [--stats]
    filestage help

COMMANDS:
    fetch   Fetch a remote file to a local destination, via the cache
    warm    Load (or refresh) cache entries for the given remote paths
    help    Show this help message

EXAMPLES:
    # Fetch over HTTPS; later runs in this process reuse the cache
    filestage fetch https://example.com/data.bin /tmp/data.bin

    # Pre-load several files into the cache
    filestage warm https://example.com/a.bin https://example.com/b.bin

OPTIONS:
    --stats   Print a JSON snapshot of the cache counters before exiting

ENVIRONMENT:
    FILESTAGE_CACHE_DIR  Cache root (defaults to the platform cache directory)
    RUST_LOG             Log level (trace, debug, info, warn, error)
"#
    );
}

fn parse_args(args: &[String]) -> Result<Command> {
    if args.is_empty() {
        return Ok(Command::Help);
    }

    match args[0].as_str() {
        "fetch" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: filestage fetch <remote> <dest>"));
            }
            Ok(Command::Fetch {
                remote: args[1].clone(),
                dest: PathBuf::from(&args[2]),
            })
        }
        "warm" => {
            if args.len() < 2 {
                return Err(anyhow!("Usage: filestage warm <remote>..."));
            }
            Ok(Command::Warm {
                remotes: args[1..].to_vec(),
            })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => {
            eprintln!("Unknown command: {}", other);
            Ok(Command::Help)
        }
    }
}

/// Cache root from the environment, or the platform default
fn cache_location() -> String {
    match env::var("FILESTAGE_CACHE_DIR") {
        Ok(dir) if !dir.is_empty() => dir,
        _ => cache::default_cache_dir().to_string_lossy().into_owned(),
    }
}

fn build_cache() -> Result<ReadThroughCache> {
    let backends = BackendRegistry::with_defaults()
        .map_err(|e| anyhow!("Failed to set up transfer backends: {}", e))?;
    let location = cache_location();
    ReadThroughCache::new(&location, backends)
        .with_context(|| format!("Failed to open cache at {}", location))
}

/// Load every remote path into the cache, one worker thread per path.
/// Returns the number of paths that failed.
fn warm_all(cache: &ReadThroughCache, remotes: &[String]) -> usize {
    thread::scope(|scope| {
        let handles: Vec<_> = remotes
            .iter()
            .map(|remote| {
                scope.spawn(move || match cache.warm(remote) {
                    Ok(()) => {
                        info!(remote = %remote, "Cache entry ready");
                        true
                    }
                    Err(e) => {
                        error!(remote = %remote, error = %e, "Failed to load remote path");
                        false
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(false))
            .filter(|ok| !ok)
            .count()
    })
}

fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Split the --stats flag out of the positional arguments
    let mut args: Vec<String> = env::args().skip(1).collect();
    let want_stats = args.iter().any(|a| a == "--stats");
    args.retain(|a| a != "--stats");

    let command = match parse_args(&args) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    match command {
        Command::Help => {
            print_help();
        }
        Command::Fetch { remote, dest } => {
            let cache = build_cache()?;
            cache.materialize(&remote, &dest)?;
            info!(remote = %remote, dest = %dest.display(), "File staged");

            cache.log_stats();
            if want_stats {
                println!("{}", serde_json::to_string_pretty(&cache.stats())?);
            }
        }
        Command::Warm { remotes } => {
            let cache = build_cache()?;
            let failures = warm_all(&cache, &remotes);

            cache.log_stats();
            if want_stats {
                println!("{}", serde_json::to_string_pretty(&cache.stats())?);
            }

            if failures > 0 {
                return Err(anyhow!(
                    "{} of {} remote paths failed to load",
                    failures,
                    remotes.len()
                ));
            }
            info!(count = remotes.len(), "Cache warmed");
        }
    }

    Ok(())
}
