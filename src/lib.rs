pub use cv_core as core;
pub use cv_imgproc as imgproc;
pub use cv_io as io;
pub use cv_videoio as videoio;
pub use cv_viewer as viewer;

/// Initialize a single global Rayon thread pool for all CPU-parallel routines.
///
/// Call this once at application startup before running heavy image workloads.
/// Repeated calls are idempotent and return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `RUSTCV_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> cv_core::Result<()> {
    cv_core::init_global_thread_pool(num_threads)
}
