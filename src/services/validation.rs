use crate::constants::limits::{MAX_PORT, MIN_PORT};
use crate::errors::FgtError;
use serde_json::Value;
use std::time::Duration;

#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, value: &str, label: &str) -> Result<String, FgtError> {
        let normalized = value.trim();
        if normalized.is_empty() {
            return Err(FgtError::invalid_config(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(normalized.to_string())
    }

    pub fn ensure_host(&self, value: &str) -> Result<String, FgtError> {
        let host = self.ensure_string(value, "host")?;
        if host.chars().any(|c| c.is_whitespace() || c == '/' || c == '?' || c == '#') {
            return Err(FgtError::invalid_config(format!(
                "host '{}' must be a bare hostname or address",
                host
            ))
            .with_hint("Drop the scheme, port and path; use set_protocol/set_port instead."));
        }
        Ok(host)
    }

    pub fn ensure_port(&self, value: i64) -> Result<u16, FgtError> {
        if value < MIN_PORT as i64 || value > MAX_PORT as i64 {
            return Err(FgtError::invalid_config(format!(
                "Port must be an integer between {} and {}",
                MIN_PORT, MAX_PORT
            )));
        }
        Ok(value as u16)
    }

    pub fn ensure_timeout(&self, value: Duration) -> Result<Duration, FgtError> {
        if value.is_zero() {
            return Err(FgtError::invalid_config("timeout must be a positive duration"));
        }
        Ok(value)
    }

    /// Scope names are joined with `,` on the wire, so they may not contain one.
    pub fn ensure_scope_name(&self, value: &str) -> Result<String, FgtError> {
        let name = self.ensure_string(value, "vdom name")?;
        if name.contains(',') || name.chars().any(char::is_whitespace) {
            return Err(FgtError::invalid_config(format!(
                "vdom name '{}' must not contain commas or whitespace",
                name
            )));
        }
        Ok(name)
    }

    pub fn ensure_scope_names<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<String>, FgtError> {
        if values.is_empty() {
            return Err(FgtError::invalid_config(
                "vdom list must contain at least one name",
            ));
        }
        values
            .iter()
            .map(|value| self.ensure_scope_name(value.as_ref()))
            .collect()
    }

    pub fn ensure_object(
        &self,
        value: &Value,
        label: &str,
    ) -> Result<serde_json::Map<String, Value>, FgtError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| FgtError::invalid_config(format!("{} must be a JSON object", label)))
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}
