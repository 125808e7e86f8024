pub use ps_core as core;
pub use ps_io as io;
pub use ps_optimize as optimize;
pub use ps_photo as photo;
pub use ps_scientific as scientific;

/// Initialize a single global Rayon thread pool for all CPU-parallel routines.
///
/// Call this once at application startup before running batch estimation or
/// integration. Repeated calls are idempotent and return the first
/// initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `PS_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> ps_core::Result<()> {
    ps_core::init_global_thread_pool(num_threads)
}
