use crate::{CoreError, Result};
use rayon::ThreadPoolBuilder;
use std::env;
use std::sync::OnceLock;

/// Environment variable that sizes the global CPU pool when no explicit count is given.
pub const CPU_THREADS_ENV: &str = "RUSTCV_CPU_THREADS";

static THREAD_POOL_INIT: OnceLock<Result<()>> = OnceLock::new();

/// Initialize the global Rayon thread pool used by CPU-parallel routines.
///
/// Priority:
/// 1. `num_threads` argument
/// 2. `RUSTCV_CPU_THREADS` environment variable
/// 3. Rayon default
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<()> {
    let res = THREAD_POOL_INIT.get_or_init(|| {
        let configured_threads = match num_threads {
            Some(n) => Some(n),
            None => read_cpu_threads_from_env()?,
        };

        let mut builder = ThreadPoolBuilder::new();
        if let Some(n) = configured_threads {
            if n == 0 {
                return Err(CoreError::InvalidConfig(format!(
                    "{CPU_THREADS_ENV} must be >= 1"
                )));
            }
            builder = builder.num_threads(n);
        }

        builder
            .build_global()
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        tracing::debug!(threads = rayon::current_num_threads(), "global thread pool ready");
        Ok(())
    });
    res.clone()
}

pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

fn read_cpu_threads_from_env() -> Result<Option<usize>> {
    let raw = match env::var(CPU_THREADS_ENV) {
        Ok(v) => v,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(e) => {
            return Err(CoreError::InvalidConfig(format!(
                "failed to read {CPU_THREADS_ENV}: {e}"
            )))
        }
    };
    parse_cpu_threads(&raw).map(Some)
}

fn parse_cpu_threads(raw: &str) -> Result<usize> {
    let parsed: usize = raw.trim().parse().map_err(|_| {
        CoreError::InvalidConfig(format!(
            "{CPU_THREADS_ENV} must be a positive integer, got '{raw}'"
        ))
    })?;
    if parsed == 0 {
        return Err(CoreError::InvalidConfig(format!(
            "{CPU_THREADS_ENV} must be >= 1"
        )));
    }
    Ok(parsed)
}
