//! Process-wide Rayon pool shared by the per-pixel batch routines.

use crate::{Error, Result};
use rayon::ThreadPoolBuilder;
use std::sync::OnceLock;

/// Environment variable consulted when no explicit thread count is given.
pub const CPU_THREADS_ENV: &str = "PS_CPU_THREADS";

static POOL_STATE: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Build the global pool once.
///
/// The thread count is `num_threads` if given, else `PS_CPU_THREADS`, else
/// Rayon's own default. Later calls return the outcome of the first one.
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<()> {
    POOL_STATE
        .get_or_init(|| {
            let threads = resolve_thread_count(num_threads)?;
            threads
                .map_or_else(ThreadPoolBuilder::new, |n| {
                    ThreadPoolBuilder::new().num_threads(n)
                })
                .build_global()
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(Error::Runtime)
}

/// Threads available to parallel iterators right now.
pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

fn resolve_thread_count(explicit: Option<usize>) -> std::result::Result<Option<usize>, String> {
    match explicit {
        Some(0) => Err("thread count must be >= 1".to_string()),
        Some(n) => Ok(Some(n)),
        None => match std::env::var(CPU_THREADS_ENV) {
            Ok(raw) => parse_thread_count(&raw).map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(format!("cannot read {CPU_THREADS_ENV}: {e}")),
        },
    }
}

fn parse_thread_count(raw: &str) -> std::result::Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(format!("{CPU_THREADS_ENV} must be >= 1")),
        Ok(n) => Ok(n),
        Err(_) => Err(format!(
            "{CPU_THREADS_ENV} must be a positive integer, got '{raw}'"
        )),
    }
}
