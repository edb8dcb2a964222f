//! User options and executable discovery.
//!
//! Resolves the racerd binary and the rust source tree the daemon needs,
//! following the override → bundled copy → `$PATH` fallback chain.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Message shown when no racerd binary could be resolved.
pub const BINARY_NOT_FOUND_MESSAGE: &str =
    "racerd binary not found. Did you build it? \
     Set racerd_binary_path to the compiled executable.";

/// Message shown when no rust source tree could be resolved.
pub const RUST_SOURCE_NOT_FOUND_MESSAGE: &str = "rust source not found";

/// Environment variable consulted when no rust_src_path option is given.
pub const RUST_SRC_PATH_ENV: &str = "RUST_SRC_PATH";

/// Name of the racerd executable.
const RACERD_EXECUTABLE: &str = "racerd";

/// Host-supplied options for the completer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserOptions {
    /// Absolute path to the racerd executable. When unset, a bundled
    /// copy next to the host executable and then `$PATH` are probed.
    #[serde(default)]
    pub racerd_binary_path: Option<PathBuf>,

    /// Path to the rust standard library sources. Falls back to the
    /// `RUST_SRC_PATH` environment variable when unset.
    #[serde(default)]
    pub rust_src_path: Option<PathBuf>,

    /// When true, log files are kept instead of being cleaned up on
    /// startup.
    #[serde(default)]
    pub keep_logfiles: bool,
}

/// Finds the racerd binary.
///
/// An explicit `racerd_binary_path` override must point at an existing
/// file; otherwise a copy installed next to the host executable is
/// preferred, then the first match on `$PATH`.
#[must_use]
pub fn find_racerd_binary(options: &UserOptions) -> Option<PathBuf> {
    if let Some(override_path) = &options.racerd_binary_path {
        if override_path.is_file() {
            return Some(override_path.clone());
        }
        return None;
    }

    if let Some(bundled) = bundled_racerd_path() {
        if bundled.is_file() {
            return Some(bundled);
        }
    }

    first_executable_on_path(RACERD_EXECUTABLE)
}

/// Finds the rust source tree.
///
/// An explicit `rust_src_path` override must be an existing directory;
/// otherwise the `RUST_SRC_PATH` environment variable is consulted.
#[must_use]
pub fn find_rust_src_path(options: &UserOptions) -> Option<PathBuf> {
    resolve_rust_src(options, env::var_os(RUST_SRC_PATH_ENV).map(PathBuf::from))
}

/// Resolution logic with the environment value injected, so the fallback
/// chain is testable without mutating process environment.
fn resolve_rust_src(options: &UserOptions, env_value: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(override_path) = &options.rust_src_path {
        if override_path.is_dir() {
            return Some(override_path.clone());
        }
        return None;
    }

    env_value.filter(|path| path.is_dir())
}

/// Returns the path a bundled racerd would live at, next to the host
/// executable.
fn bundled_racerd_path() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let dir = exe.parent()?;
    Some(dir.join(platform_executable_name(RACERD_EXECUTABLE)))
}

/// Walks `$PATH` for the first existing executable with the given name.
fn first_executable_on_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    let file_name = platform_executable_name(name);
    env::split_paths(&path_var)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

/// Returns the executable name with platform-specific adjustments.
fn platform_executable_name(name: &str) -> String {
    #[cfg(windows)]
    {
        format!("{name}.exe")
    }
    #[cfg(not(windows))]
    {
        name.to_string()
    }
}
