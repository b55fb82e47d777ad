use crate::constants::defaults;
use crate::constants::network::{DEFAULT_PORT, DEFAULT_TIMEOUT_MS};
use crate::errors::FgtError;
use crate::managers::context::{AuthPlacement, ClearPolicy, RequestContext};
use crate::services::endpoints::Protocol;
use crate::services::filter::FilterMode;
use crate::utils::feature_flags::env_flag;
use crate::utils::paths::resolve_config_path;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

/// One firewall target as stored on disk (`config.json`).
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FgtConfig {
    pub name: String,
    pub host: Option<String>,
    pub token: Option<String>,
    pub protocol: Protocol,
    pub port: i64,
    pub vdom: Option<String>,
    pub global: bool,
    pub auth: AuthPlacement,
    pub cert_verify: bool,
    pub timeout_ms: u64,
    pub clear_filter: bool,
    pub clear_format: bool,
    pub clear_params: bool,
    pub clear_headers: bool,
    pub protected_params: BTreeSet<String>,
    pub protected_headers: BTreeSet<String>,
    pub filter_mode: FilterMode,
}

impl Default for FgtConfig {
    fn default() -> Self {
        let clear = ClearPolicy::default();
        Self {
            name: defaults::NAME.to_string(),
            host: None,
            token: None,
            protocol: Protocol::Https,
            port: DEFAULT_PORT as i64,
            vdom: None,
            global: false,
            auth: AuthPlacement::Header,
            cert_verify: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            clear_filter: clear.clear_filter,
            clear_format: clear.clear_format,
            clear_params: clear.clear_params,
            clear_headers: clear.clear_headers,
            protected_params: BTreeSet::new(),
            protected_headers: BTreeSet::new(),
            filter_mode: FilterMode::Lenient,
        }
    }
}

impl FgtConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, FgtError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            FgtError::invalid_config(format!(
                "Failed to read config {}: {}",
                path.display(),
                err
            ))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            FgtError::invalid_config(format!(
                "Failed to parse config {}: {}",
                path.display(),
                err
            ))
        })
    }

    /// Reads the resolved config file if present, then applies `FGT_*` env overrides.
    pub fn load() -> Result<Self, FgtError> {
        let path = resolve_config_path();
        let mut config = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), FgtError> {
        if let Some(host) = env_string("FGT_HOST") {
            self.host = Some(host);
        }
        if let Some(token) = env_string("FGT_TOKEN") {
            self.token = Some(token);
        }
        if let Some(raw) = env_string("FGT_PORT") {
            self.port = raw.parse::<i64>().map_err(|_| {
                FgtError::invalid_config(format!("FGT_PORT must be an integer, got '{}'", raw))
            })?;
        }
        if let Some(raw) = env_string("FGT_PROTOCOL") {
            self.protocol = raw.parse()?;
        }
        if let Some(vdom) = env_string("FGT_VDOM") {
            self.vdom = Some(vdom);
            self.global = false;
        }
        if let Some(verify) = env_flag("FGT_VERIFY_TLS") {
            self.cert_verify = verify;
        }
        if let Some(raw) = env_string("FGT_TIMEOUT_MS") {
            self.timeout_ms = raw.parse::<u64>().map_err(|_| {
                FgtError::invalid_config(format!(
                    "FGT_TIMEOUT_MS must be a positive integer, got '{}'",
                    raw
                ))
            })?;
        }
        Ok(())
    }

    pub fn clear_policy(&self) -> ClearPolicy {
        ClearPolicy {
            clear_filter: self.clear_filter,
            clear_format: self.clear_format,
            clear_params: self.clear_params,
            clear_headers: self.clear_headers,
            protected_params: self.protected_params.clone(),
            protected_headers: self.protected_headers.clone(),
        }
    }

    pub fn into_context(self) -> Result<RequestContext, FgtError> {
        let host = self.host.as_deref().ok_or_else(|| {
            FgtError::invalid_config("host is not configured")
                .with_hint("Set \"host\" in the config file, FGT_HOST, or pass --host.")
        })?;
        let token = self.token.as_deref().ok_or_else(|| {
            FgtError::invalid_config("token is not configured")
                .with_hint("Set \"token\" in the config file, FGT_TOKEN, or pass --token.")
        })?;

        let mut context = RequestContext::new(&self.name, host, token)?;
        context.set_protocol(self.protocol)?;
        context.set_port(self.port)?;
        context.set_timeout(Duration::from_millis(self.timeout_ms))?;
        context.set_cert_verify(self.cert_verify);
        context.set_filter_mode(self.filter_mode);
        context.set_clear_policy(self.clear_policy());

        if self.global {
            context.set_global_scope();
        } else if let Some(vdom) = self.vdom.as_deref() {
            let names: Vec<&str> = vdom.split(',').map(str::trim).collect();
            match names.as_slice() {
                [single] => context.set_single_scope(single)?,
                _ => context.set_multi_scope(&names)?,
            };
        }

        if self.auth == AuthPlacement::Query {
            context.use_query_auth();
        }
        Ok(context)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
