/// Runs `f` with `key` set to `value`, restoring the previous value after.
pub fn with_env_var<F>(key: &str, value: &str, f: F)
where
    F: FnOnce(),
{
    let previous = std::env::var(key).ok();
    std::env::set_var(key, value);

    f();

    match previous {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }
}
