use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "fgt-api";
const CONFIG_FILE: &str = "config.json";

fn normalize_env_path(value: Option<String>) -> Option<PathBuf> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if lowered == "undefined" || lowered == "null" {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn resolve_home_dir() -> Option<PathBuf> {
    env::var("HOME").ok().map(PathBuf::from)
}

fn resolve_xdg_config_dir() -> Option<PathBuf> {
    if let Some(path) = normalize_env_path(env::var("XDG_CONFIG_HOME").ok()) {
        return Some(path);
    }
    resolve_home_dir().map(|home| home.join(".config"))
}

/// `FGT_CONFIG_PATH`, then `$XDG_CONFIG_HOME/fgt-api/config.json`, then `~/.config/...`.
pub fn resolve_config_path() -> PathBuf {
    if let Some(path) = normalize_env_path(env::var("FGT_CONFIG_PATH").ok()) {
        return expand_home_path(path);
    }
    resolve_xdg_config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

pub fn expand_home_path(path: PathBuf) -> PathBuf {
    let expanded = path
        .to_str()
        .and_then(|s| s.strip_prefix("~/"))
        .and_then(|rest| resolve_home_dir().map(|home| home.join(rest)));
    expanded.unwrap_or(path)
}
