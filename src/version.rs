//! Build identification for the library.

/// Crate version, `MAJOR.MINOR.PATCH`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the crate was built from when `ROUND_ROBIN_GIT_HASH` was set at
/// build time, empty otherwise.
pub const GIT_HASH: &str = match option_env!("ROUND_ROBIN_GIT_HASH") {
    Some(hash) => hash,
    None => "",
};

/// `VERSION`, followed by ` (GIT_HASH)` when a hash is known.
pub fn version_string() -> String {
    if GIT_HASH.is_empty() {
        VERSION.to_string()
    } else {
        format!("{} ({})", VERSION, GIT_HASH)
    }
}
