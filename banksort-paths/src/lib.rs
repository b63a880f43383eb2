//! XDG Base Directory paths for banksort.
//!
//! XDG locations are used on every platform so config and plan files end up
//! in the same place on Linux and macOS.

use std::path::PathBuf;

const APP: &str = "banksort";

/// Resolve `$<var>/banksort`, falling back to `~/<home_relative>/banksort`.
fn xdg_dir(var: &str, home_relative: &str) -> PathBuf {
    match std::env::var_os(var) {
        Some(base) if !base.is_empty() => PathBuf::from(base).join(APP),
        _ => dirs::home_dir()
            .map(|home| home.join(home_relative))
            .unwrap_or_else(|| PathBuf::from(home_relative))
            .join(APP),
    }
}

/// The banksort config directory.
///
/// Returns `$XDG_CONFIG_HOME/banksort` if set, otherwise `~/.config/banksort`.
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// The banksort data directory.
///
/// Returns `$XDG_DATA_HOME/banksort` if set, otherwise `~/.local/share/banksort`.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// The user config file, `config_dir()/config.toml`.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where allocation plans are written when no path is given.
///
/// # Examples
///
/// ```
/// let plan = banksort_paths::plans_dir().join("run.json");
/// assert!(plan.ends_with("plans/run.json"));
/// ```
pub fn plans_dir() -> PathBuf {
    data_dir().join("plans")
}
