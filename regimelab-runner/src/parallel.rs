//! Optional dedicated rayon pool.

/// Run `f` inside a pool of `threads` workers, or on the global pool when
/// `threads` is 0.
pub(crate) fn in_pool<T, F>(threads: usize, f: F) -> Result<T, rayon::ThreadPoolBuildError>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    if threads == 0 {
        return Ok(f());
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    Ok(pool.install(f))
}
