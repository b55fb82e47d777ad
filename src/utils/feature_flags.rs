pub fn is_truthy(value: impl AsRef<str>) -> bool {
    matches!(
        value.as_ref().trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn is_falsy(value: impl AsRef<str>) -> bool {
    matches!(
        value.as_ref().trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// `None` when the variable is unset or holds neither a truthy nor a falsy word.
pub fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    if is_truthy(&raw) {
        Some(true)
    } else if is_falsy(&raw) {
        Some(false)
    } else {
        None
    }
}
