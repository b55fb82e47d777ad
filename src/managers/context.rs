use crate::constants::defaults;
use crate::constants::headers::{AUTHORIZATION, BEARER_PREFIX};
use crate::constants::network::{DEFAULT_PORT, DEFAULT_TIMEOUT_MS};
use crate::constants::params::{
    ACCESS_TOKEN, COUNT, FILTER, FORMAT, GLOBAL, KEY, PATTERN, SKIP, START, VDOM, WITH_META,
};
use crate::errors::FgtError;
use crate::services::endpoints::{resolve_paths, ApiPaths, Protocol};
use crate::services::filter::{compile_filter, FilterMode, FilterSpec};
use crate::services::params::{HeaderStore, ParamStore, ParamValue};
use crate::services::transport::{headers_to_headermap, OutboundRequest};
use crate::services::validation::Validation;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Result of a setter that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Changed,
    Unchanged,
}

impl Change {
    fn from_bool(changed: bool) -> Self {
        if changed {
            Change::Changed
        } else {
            Change::Unchanged
        }
    }

    pub fn is_changed(self) -> bool {
        self == Change::Changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "vdoms", rename_all = "snake_case")]
pub enum Scope {
    Single(String),
    Multi(Vec<String>),
    Global,
}

impl Scope {
    pub fn param_key(&self) -> &'static str {
        match self {
            Scope::Single(_) | Scope::Multi(_) => VDOM,
            Scope::Global => GLOBAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthPlacement {
    #[default]
    Header,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearPolicy {
    pub clear_filter: bool,
    pub clear_format: bool,
    pub clear_params: bool,
    pub clear_headers: bool,
    pub protected_params: BTreeSet<String>,
    pub protected_headers: BTreeSet<String>,
}

impl Default for ClearPolicy {
    fn default() -> Self {
        Self {
            clear_filter: true,
            clear_format: true,
            clear_params: false,
            clear_headers: false,
            protected_params: BTreeSet::new(),
            protected_headers: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamToggle {
    WithMeta,
    Skip,
}

impl ParamToggle {
    fn key(self) -> &'static str {
        match self {
            ParamToggle::WithMeta => WITH_META,
            ParamToggle::Skip => SKIP,
        }
    }
}

/// Mutable request state for one firewall target and one token.
///
/// Every setter validates before mutating: on `Err` nothing has changed.
#[derive(Clone)]
pub struct RequestContext {
    name: String,
    host: String,
    protocol: Protocol,
    port: u16,
    timeout: Duration,
    token: String,
    auth: AuthPlacement,
    scope: Scope,
    cert_verify: bool,
    params: ParamStore,
    headers: HeaderStore,
    clear_policy: ClearPolicy,
    filter_mode: FilterMode,
    paths: ApiPaths,
    validation: Validation,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("protocol", &self.protocol)
            .field("port", &self.port)
            .field("auth", &self.auth)
            .field("scope", &self.scope)
            .field("cert_verify", &self.cert_verify)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    pub fn new(name: &str, host: &str, token: &str) -> Result<Self, FgtError> {
        let validation = Validation::new();
        let host = validation.ensure_host(host)?;
        let token = validation.ensure_string(token, "token")?;
        let name = if name.trim().is_empty() {
            defaults::NAME.to_string()
        } else {
            name.trim().to_string()
        };
        let paths = resolve_paths(Protocol::Https, &host, DEFAULT_PORT)?;

        let mut params = ParamStore::new();
        params.set(VDOM, defaults::SCOPE);
        let mut headers = HeaderStore::new();
        headers.set(AUTHORIZATION, format!("{}{}", BEARER_PREFIX, token));

        Ok(Self {
            name,
            host,
            protocol: Protocol::Https,
            port: DEFAULT_PORT,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            token,
            auth: AuthPlacement::Header,
            scope: Scope::Single(defaults::SCOPE.to_string()),
            cert_verify: false,
            params,
            headers,
            clear_policy: ClearPolicy::default(),
            filter_mode: FilterMode::default(),
            paths,
            validation,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cert_verify(&self) -> bool {
        self.cert_verify
    }

    pub fn auth_placement(&self) -> AuthPlacement {
        self.auth
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    pub fn clear_policy(&self) -> &ClearPolicy {
        &self.clear_policy
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn paths(&self) -> &ApiPaths {
        &self.paths
    }

    /// Raw token, for redaction only.
    pub(crate) fn secret(&self) -> &str {
        &self.token
    }

    // --- endpoint ---

    fn reresolve(&mut self, protocol: Protocol, host: String, port: u16) -> Result<Change, FgtError> {
        if protocol == self.protocol && host == self.host && port == self.port {
            return Ok(Change::Unchanged);
        }
        let paths = resolve_paths(protocol, &host, port)?;
        self.protocol = protocol;
        self.host = host;
        self.port = port;
        self.paths = paths;
        Ok(Change::Changed)
    }

    pub fn set_host(&mut self, host: &str) -> Result<Change, FgtError> {
        let host = self.validation.ensure_host(host)?;
        self.reresolve(self.protocol, host, self.port)
    }

    pub fn set_protocol(&mut self, protocol: Protocol) -> Result<Change, FgtError> {
        self.reresolve(protocol, self.host.clone(), self.port)
    }

    pub fn set_port(&mut self, port: i64) -> Result<Change, FgtError> {
        let port = self.validation.ensure_port(port)?;
        self.reresolve(self.protocol, self.host.clone(), port)
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<Change, FgtError> {
        let timeout = self.validation.ensure_timeout(timeout)?;
        let changed = timeout != self.timeout;
        self.timeout = timeout;
        Ok(Change::from_bool(changed))
    }

    pub fn set_cert_verify(&mut self, cert_verify: bool) -> Change {
        let changed = cert_verify != self.cert_verify;
        self.cert_verify = cert_verify;
        Change::from_bool(changed)
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) -> Change {
        let changed = mode != self.filter_mode;
        self.filter_mode = mode;
        Change::from_bool(changed)
    }

    pub fn set_clear_policy(&mut self, policy: ClearPolicy) -> Change {
        let changed = policy != self.clear_policy;
        self.clear_policy = policy;
        Change::from_bool(changed)
    }

    // --- auth ---

    pub fn use_header_auth(&mut self) -> Change {
        if self.auth == AuthPlacement::Header {
            return Change::Unchanged;
        }
        self.params.remove(ACCESS_TOKEN);
        self.headers
            .set(AUTHORIZATION, format!("{}{}", BEARER_PREFIX, self.token));
        self.auth = AuthPlacement::Header;
        Change::Changed
    }

    pub fn use_query_auth(&mut self) -> Change {
        if self.auth == AuthPlacement::Query {
            return Change::Unchanged;
        }
        self.headers.remove(AUTHORIZATION);
        self.params.set(ACCESS_TOKEN, self.token.clone());
        self.auth = AuthPlacement::Query;
        Change::Changed
    }

    pub fn header_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
    }

    pub fn query_token(&self) -> Option<&str> {
        match self.params.get(ACCESS_TOKEN) {
            Some(ParamValue::Text(token)) => Some(token.as_str()),
            _ => None,
        }
    }

    fn auth_key(&self) -> &'static str {
        match self.auth {
            AuthPlacement::Header => AUTHORIZATION,
            AuthPlacement::Query => ACCESS_TOKEN,
        }
    }

    // --- scope ---

    fn apply_scope(&mut self, scope: Scope) -> Change {
        if scope == self.scope {
            return Change::Unchanged;
        }
        match &scope {
            Scope::Single(name) => {
                self.params.set(VDOM, name.clone());
                self.params.remove(GLOBAL);
            }
            Scope::Multi(names) => {
                self.params.set(VDOM, names.join(","));
                self.params.remove(GLOBAL);
            }
            Scope::Global => {
                self.params.set(GLOBAL, 1i64);
                self.params.remove(VDOM);
            }
        }
        self.scope = scope;
        Change::Changed
    }

    pub fn set_single_scope(&mut self, name: &str) -> Result<Change, FgtError> {
        let name = self.validation.ensure_scope_name(name)?;
        Ok(self.apply_scope(Scope::Single(name)))
    }

    pub fn set_multi_scope<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Change, FgtError> {
        let names = self.validation.ensure_scope_names(names)?;
        Ok(self.apply_scope(Scope::Multi(names)))
    }

    pub fn set_global_scope(&mut self) -> Change {
        self.apply_scope(Scope::Global)
    }

    // --- generic stores ---

    fn ensure_unowned_param(&self, key: &str) -> Result<(), FgtError> {
        if matches!(key, VDOM | GLOBAL | ACCESS_TOKEN) {
            return Err(FgtError::invalid_config(format!(
                "query parameter '{}' is managed by the scope/auth controllers",
                key
            ))
            .with_hint("Use set_single_scope/set_multi_scope/set_global_scope or use_query_auth."));
        }
        if matches!(key, FILTER | KEY | PATTERN) {
            return Err(FgtError::invalid_config(format!(
                "query parameter '{}' is managed by the filter controls",
                key
            ))
            .with_hint("Use set_filter/unset_filter or set_key_pattern/unset_key_pattern."));
        }
        Ok(())
    }

    fn ensure_unowned_header(&self, key: &str) -> Result<(), FgtError> {
        if key.eq_ignore_ascii_case(AUTHORIZATION) {
            return Err(FgtError::invalid_config(
                "the Authorization header is managed by the auth controller",
            )
            .with_hint("Use use_header_auth/use_query_auth."));
        }
        Ok(())
    }

    pub fn set_params<K, V, I>(&mut self, entries: I) -> Result<Change, FgtError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let entries: Vec<(String, ParamValue)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        for (key, _) in &entries {
            self.validation.ensure_string(key, "parameter name")?;
            self.ensure_unowned_param(key)?;
        }
        let before = self.params.clone();
        self.params.set_many(entries);
        Ok(Change::from_bool(before != self.params))
    }

    pub fn delete_params<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<Change, FgtError> {
        for key in keys {
            self.ensure_unowned_param(key.as_ref())?;
        }
        let keys: Vec<&str> = keys.iter().map(|key| key.as_ref()).collect();
        let removed = self.params.delete_many(keys);
        Ok(Change::from_bool(removed > 0))
    }

    pub fn set_headers<K, V, I>(&mut self, entries: I) -> Result<Change, FgtError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        for (key, _) in &entries {
            self.validation.ensure_string(key, "header name")?;
            self.ensure_unowned_header(key)?;
        }
        let before = self.headers.clone();
        self.headers.set_many(entries);
        Ok(Change::from_bool(before != self.headers))
    }

    pub fn delete_headers<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<Change, FgtError> {
        for key in keys {
            self.ensure_unowned_header(key.as_ref())?;
        }
        let keys: Vec<&str> = keys.iter().map(|key| key.as_ref()).collect();
        let removed = self.headers.delete_many(keys);
        Ok(Change::from_bool(removed > 0))
    }

    pub fn protect_params<K: AsRef<str>>(&mut self, keys: &[K]) -> Change {
        let before = self.clear_policy.protected_params.len();
        self.clear_policy
            .protected_params
            .extend(keys.iter().map(|k| k.as_ref().to_string()));
        Change::from_bool(before != self.clear_policy.protected_params.len())
    }

    pub fn protect_headers<K: AsRef<str>>(&mut self, keys: &[K]) -> Change {
        let before = self.clear_policy.protected_headers.len();
        self.clear_policy
            .protected_headers
            .extend(keys.iter().map(|k| k.as_ref().to_string()));
        Change::from_bool(before != self.clear_policy.protected_headers.len())
    }

    /// Effective exemptions: the protected set plus the live auth and scope keys.
    pub fn param_exemptions(&self) -> BTreeSet<String> {
        let mut exempt = self.clear_policy.protected_params.clone();
        exempt.insert(self.scope.param_key().to_string());
        if self.auth == AuthPlacement::Query {
            exempt.insert(ACCESS_TOKEN.to_string());
        }
        exempt
    }

    pub fn header_exemptions(&self) -> BTreeSet<String> {
        let mut exempt = self.clear_policy.protected_headers.clone();
        if self.auth == AuthPlacement::Header {
            exempt.insert(AUTHORIZATION.to_string());
        }
        exempt
    }

    pub fn clear_params(&mut self) -> Vec<String> {
        let exempt = self.param_exemptions();
        self.params.clear_all(&exempt)
    }

    pub fn clear_headers(&mut self) -> Vec<String> {
        let exempt = self.header_exemptions();
        self.headers.clear_all(&exempt)
    }

    // --- toggles ---

    pub fn set_toggle(&mut self, toggle: ParamToggle, enabled: bool) -> Change {
        let key = toggle.key();
        let changed = if enabled {
            self.params.set(key, 1i64) != Some(ParamValue::Int(1))
        } else {
            self.params.remove(key).is_some()
        };
        Change::from_bool(changed)
    }

    pub fn set_with_meta(&mut self, enabled: bool) -> Change {
        self.set_toggle(ParamToggle::WithMeta, enabled)
    }

    pub fn set_skip(&mut self, enabled: bool) -> Change {
        self.set_toggle(ParamToggle::Skip, enabled)
    }

    fn set_optional_int(&mut self, key: &str, value: Option<u64>) -> Change {
        let changed = match value {
            Some(value) => {
                let value = ParamValue::from(value);
                self.params.set(key, value.clone()) != Some(value)
            }
            None => self.params.remove(key).is_some(),
        };
        Change::from_bool(changed)
    }

    pub fn set_start(&mut self, start: Option<u64>) -> Change {
        self.set_optional_int(START, start)
    }

    pub fn set_count(&mut self, count: Option<u64>) -> Change {
        self.set_optional_int(COUNT, count)
    }

    /// Restricts returned fields: `format=name|subnet|comment`.
    pub fn set_format<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<Change, FgtError> {
        let fields = fields
            .iter()
            .map(|field| self.validation.ensure_string(field.as_ref(), "format field"))
            .collect::<Result<Vec<_>, _>>()?;
        if fields.is_empty() {
            return Err(FgtError::invalid_config("format needs at least one field"));
        }
        let joined = ParamValue::Text(fields.join("|"));
        let changed = self.params.set(FORMAT, joined.clone()) != Some(joined);
        Ok(Change::from_bool(changed))
    }

    pub fn unset_format(&mut self) -> Change {
        Change::from_bool(self.params.remove(FORMAT).is_some())
    }

    // --- filter / key+pattern ---

    /// Empty specs are a no-op and leave any existing filter in place.
    pub fn set_filter(&mut self, spec: &FilterSpec) -> Result<Change, FgtError> {
        let Some(expression) = compile_filter(spec, self.filter_mode)? else {
            return Ok(Change::Unchanged);
        };
        let expression = ParamValue::Text(expression);
        let mut changed = self.params.set(FILTER, expression.clone()) != Some(expression);
        changed |= self.params.delete_many([KEY, PATTERN]) > 0;
        Ok(Change::from_bool(changed))
    }

    pub fn unset_filter(&mut self) -> Change {
        Change::from_bool(self.params.remove(FILTER).is_some())
    }

    pub fn set_key_pattern(&mut self, key: &str, pattern: &str) -> Result<Change, FgtError> {
        let key = self.validation.ensure_string(key, "key")?;
        let pattern = self.validation.ensure_string(pattern, "pattern")?;
        let before = self.params.clone();
        self.params.remove(FILTER);
        self.params.set(KEY, key);
        self.params.set(PATTERN, pattern);
        Ok(Change::from_bool(before != self.params))
    }

    pub fn unset_key_pattern(&mut self) -> Change {
        Change::from_bool(self.params.delete_many([KEY, PATTERN]) > 0)
    }

    // --- lifecycle hooks ---

    pub(crate) fn snapshot(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<OutboundRequest, FgtError> {
        self.validation.ensure_host(&self.host)?;
        if url.trim().is_empty() {
            return Err(FgtError::invalid_config("request URL must be a non-empty string"));
        }
        headers_to_headermap(&self.headers)?;
        Ok(OutboundRequest {
            request_id: Uuid::new_v4(),
            method,
            url: url.to_string(),
            params: self.params.clone(),
            headers: self.headers.clone(),
            body,
            verify_tls: self.cert_verify,
            timeout: self.timeout,
        })
    }

    /// Runs after every call, whether or not a response arrived.
    pub(crate) fn apply_clear_policy(&mut self) -> Vec<String> {
        let mut cleared = Vec::new();
        if self.clear_policy.clear_filter && self.params.remove(FILTER).is_some() {
            cleared.push(FILTER.to_string());
        }
        if self.clear_policy.clear_format && self.params.remove(FORMAT).is_some() {
            cleared.push(FORMAT.to_string());
        }
        if self.clear_policy.clear_params {
            cleared.extend(self.clear_params());
        }
        if self.clear_policy.clear_headers {
            cleared.extend(self.clear_headers());
        }
        debug_assert!(self.params.contains(self.scope.param_key()));
        debug_assert!(match self.auth {
            AuthPlacement::Header => self.headers.contains(self.auth_key()),
            AuthPlacement::Query => self.params.contains(self.auth_key()),
        });
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthPlacement, Change, ClearPolicy, RequestContext, Scope};
    use crate::services::filter::{Combinator, FilterMode, FilterSpec};
    use crate::services::params::ParamValue;
    use std::time::Duration;

    fn context() -> RequestContext {
        RequestContext::new("edge", "fw.example", "tok-123456").expect("context")
    }

    fn scope_keys(ctx: &RequestContext) -> (bool, bool) {
        (ctx.params().contains("vdom"), ctx.params().contains("global"))
    }

    #[test]
    fn defaults_match_a_fresh_session() {
        let ctx = context();
        assert_eq!(ctx.port(), 443);
        assert_eq!(ctx.timeout(), Duration::from_secs(3));
        assert!(!ctx.cert_verify());
        assert_eq!(ctx.scope(), &Scope::Single("root".to_string()));
        assert_eq!(ctx.params().get("vdom"), Some(&ParamValue::from("root")));
        assert_eq!(ctx.header_token(), Some("tok-123456"));
        assert_eq!(ctx.query_token(), None);
    }

    #[test]
    fn new_rejects_blank_token_and_host() {
        assert!(RequestContext::new("edge", "fw", " ").is_err());
        assert!(RequestContext::new("edge", "", "tok").is_err());
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", context());
        assert!(!rendered.contains("tok-123456"));
    }

    #[test]
    fn auth_modes_are_exclusive_and_idempotent() {
        let mut ctx = context();
        assert_eq!(ctx.use_header_auth(), Change::Unchanged);
        assert_eq!(ctx.use_query_auth(), Change::Changed);
        assert_eq!(ctx.use_query_auth(), Change::Unchanged);
        assert_eq!(ctx.auth_placement(), AuthPlacement::Query);
        assert_eq!(ctx.query_token(), Some("tok-123456"));
        assert!(!ctx.headers().contains("Authorization"));
        assert_eq!(ctx.header_token(), None);

        assert_eq!(ctx.use_header_auth(), Change::Changed);
        assert!(!ctx.params().contains("access_token"));
        assert_eq!(
            ctx.headers().get("Authorization").map(String::as_str),
            Some("Bearer tok-123456")
        );
    }

    #[test]
    fn scope_sequence_always_leaves_exactly_one_key() {
        let mut ctx = context();
        assert_eq!(scope_keys(&ctx), (true, false));
        ctx.set_global_scope();
        assert_eq!(scope_keys(&ctx), (false, true));
        assert_eq!(ctx.params().get("global"), Some(&ParamValue::Int(1)));
        ctx.set_multi_scope(&["root", "dmz"]).expect("multi");
        assert_eq!(scope_keys(&ctx), (true, false));
        assert_eq!(ctx.params().get("vdom"), Some(&ParamValue::from("root,dmz")));
        ctx.set_global_scope();
        ctx.set_single_scope("dmz").expect("single");
        assert_eq!(scope_keys(&ctx), (true, false));
        assert_eq!(ctx.scope(), &Scope::Single("dmz".to_string()));
    }

    #[test]
    fn invalid_scope_input_leaves_scope_unchanged() {
        let mut ctx = context();
        ctx.set_global_scope();
        assert!(ctx.set_single_scope("").is_err());
        let empty: [&str; 0] = [];
        assert!(ctx.set_multi_scope(&empty).is_err());
        assert!(ctx.set_multi_scope(&["ok", ""]).is_err());
        assert_eq!(ctx.scope(), &Scope::Global);
        assert_eq!(scope_keys(&ctx), (false, true));
    }

    #[test]
    fn repeated_scope_is_unchanged() {
        let mut ctx = context();
        assert_eq!(ctx.set_single_scope("root").expect("scope"), Change::Unchanged);
        assert_eq!(ctx.set_global_scope(), Change::Changed);
        assert_eq!(ctx.set_global_scope(), Change::Unchanged);
    }

    #[test]
    fn set_port_reresolves_every_path() {
        let mut ctx = context();
        assert_eq!(ctx.set_port(8443).expect("port"), Change::Changed);
        let paths = ctx.paths();
        for url in [
            &paths.cmdb_base,
            &paths.monitor_base,
            &paths.address_collection,
            &paths.policy_collection,
            &paths.firmware_info,
        ] {
            assert!(url.contains(":8443"), "{} should carry the new port", url);
        }
    }

    #[test]
    fn failed_port_change_keeps_previous_paths() {
        let mut ctx = context();
        let before = ctx.paths().clone();
        assert!(ctx.set_port(70_000).is_err());
        assert!(ctx.set_port(0).is_err());
        assert_eq!(ctx.port(), 443);
        assert_eq!(ctx.paths(), &before);
    }

    #[test]
    fn protocol_and_host_changes_rebuild_paths() {
        let mut ctx = context();
        ctx.set_protocol(crate::services::endpoints::Protocol::Http)
            .expect("protocol");
        ctx.set_host("10.0.0.1").expect("host");
        assert_eq!(ctx.paths().cmdb_base, "http://10.0.0.1:443/api/v2/cmdb/");
        assert!(ctx.set_host("bad host").is_err());
        assert_eq!(ctx.host(), "10.0.0.1");
    }

    #[test]
    fn filter_and_key_pattern_are_mutually_exclusive() {
        let mut ctx = context();
        ctx.set_key_pattern("name", "web").expect("key pattern");
        let spec = FilterSpec::new().term("name==a", Combinator::None);
        ctx.set_filter(&spec).expect("filter");
        assert!(ctx.params().contains("filter"));
        assert!(!ctx.params().contains("key"));
        assert!(!ctx.params().contains("pattern"));

        ctx.set_key_pattern("name", "web").expect("key pattern");
        assert!(!ctx.params().contains("filter"));
        assert_eq!(ctx.params().get("key"), Some(&ParamValue::from("name")));
    }

    #[test]
    fn empty_filter_spec_leaves_existing_filter() {
        let mut ctx = context();
        ctx.set_filter(&FilterSpec::new().term("a", Combinator::None))
            .expect("filter");
        assert_eq!(ctx.set_filter(&FilterSpec::new()).expect("empty"), Change::Unchanged);
        assert_eq!(ctx.params().get("filter"), Some(&ParamValue::from("filter=a")));
    }

    #[test]
    fn strict_filter_failure_keeps_previous_filter() {
        let mut ctx = context();
        ctx.set_filter(&FilterSpec::new().term("a", Combinator::None))
            .expect("filter");
        ctx.set_filter_mode(FilterMode::Strict);
        let bad = FilterSpec::new().term("b", Combinator::None).term("c", "xor");
        assert!(ctx.set_filter(&bad).is_err());
        assert_eq!(ctx.params().get("filter"), Some(&ParamValue::from("filter=a")));
    }

    #[test]
    fn store_setters_refuse_controller_owned_keys() {
        let mut ctx = context();
        assert!(ctx.set_params([("vdom", "other")]).is_err());
        assert!(ctx.set_params([("global", 1i64)]).is_err());
        assert!(ctx.delete_params(&["access_token"]).is_err());
        assert!(ctx.set_headers([("authorization", "Bearer x")]).is_err());
        assert!(ctx.delete_headers(&["Authorization"]).is_err());
        assert_eq!(ctx.params().get("vdom"), Some(&ParamValue::from("root")));
    }

    #[test]
    fn store_setters_refuse_filter_and_key_pattern_keys() {
        let mut ctx = context();
        ctx.set_key_pattern("name", "web").expect("key pattern");
        let err = ctx
            .set_params([("filter", "filter=x&access_token=evil")])
            .expect_err("filter goes through set_filter");
        assert_eq!(err.code, "INVALID_CONFIG");
        assert!(ctx.set_params([("key", "comment")]).is_err());
        assert!(ctx.set_params([("datasource", "1"), ("pattern", "db")]).is_err());
        assert!(ctx.delete_params(&["pattern"]).is_err());

        assert!(!ctx.params().contains("filter"));
        assert!(!ctx.params().contains("datasource"));
        assert_eq!(ctx.params().get("key"), Some(&ParamValue::from("name")));
        assert_eq!(ctx.params().get("pattern"), Some(&ParamValue::from("web")));
    }

    #[test]
    fn store_setters_report_changes() {
        let mut ctx = context();
        assert_eq!(
            ctx.set_params([("datasource", 1i64)]).expect("set"),
            Change::Changed
        );
        assert_eq!(
            ctx.set_params([("datasource", 1i64)]).expect("set"),
            Change::Unchanged
        );
        assert_eq!(ctx.delete_params(&["missing"]).expect("delete"), Change::Unchanged);
        assert_eq!(ctx.delete_params(&["datasource"]).expect("delete"), Change::Changed);
        assert_eq!(
            ctx.set_headers([("X-Request", "1")]).expect("headers"),
            Change::Changed
        );
    }

    #[test]
    fn bulk_clear_never_removes_active_auth_or_scope() {
        let mut ctx = context();
        ctx.use_query_auth();
        ctx.set_global_scope();
        ctx.set_params([("start", 5i64), ("count", 10i64)]).expect("params");
        ctx.set_headers([("X-One", "1")]).expect("headers");
        let removed = ctx.clear_params();
        assert_eq!(removed, vec!["count".to_string(), "start".to_string()]);
        assert!(ctx.params().contains("global"));
        assert!(ctx.params().contains("access_token"));
        ctx.clear_headers();
        assert!(ctx.headers().is_empty());

        ctx.use_header_auth();
        ctx.clear_headers();
        assert!(ctx.headers().contains("Authorization"));
    }

    #[test]
    fn protected_keys_survive_bulk_clear() {
        let mut ctx = context();
        ctx.set_params([("datasource", 1i64), ("with_meta", 1i64)])
            .expect("params");
        ctx.protect_params(&["datasource"]);
        ctx.clear_params();
        assert!(ctx.params().contains("datasource"));
        assert!(!ctx.params().contains("with_meta"));
    }

    #[test]
    fn clear_policy_drops_transient_keys_only() {
        let mut ctx = context();
        ctx.set_filter(&FilterSpec::new().term("a", Combinator::None))
            .expect("filter");
        ctx.set_format(&["name", "subnet"]).expect("format");
        ctx.set_with_meta(true);
        let mut cleared = ctx.apply_clear_policy();
        cleared.sort();
        assert_eq!(cleared, vec!["filter".to_string(), "format".to_string()]);
        assert!(ctx.params().contains("with_meta"));
        assert!(ctx.params().contains("vdom"));

        ctx.set_clear_policy(ClearPolicy {
            clear_params: true,
            ..ClearPolicy::default()
        });
        ctx.apply_clear_policy();
        assert!(!ctx.params().contains("with_meta"));
        assert!(ctx.params().contains("vdom"));
    }

    #[test]
    fn toggles_and_pagination() {
        let mut ctx = context();
        assert_eq!(ctx.set_skip(true), Change::Changed);
        assert_eq!(ctx.set_skip(true), Change::Unchanged);
        assert_eq!(ctx.set_start(Some(20)), Change::Changed);
        assert_eq!(ctx.set_count(Some(10)), Change::Changed);
        assert_eq!(ctx.params().get("start"), Some(&ParamValue::Int(20)));
        assert_eq!(ctx.set_skip(false), Change::Changed);
        assert_eq!(ctx.set_count(None), Change::Changed);
        assert!(!ctx.params().contains("skip"));
        assert!(!ctx.params().contains("count"));
        assert_eq!(ctx.params().get("format"), None);
        ctx.set_format(&["name", "subnet"]).expect("format");
        assert_eq!(ctx.params().get("format"), Some(&ParamValue::from("name|subnet")));
        let none: [&str; 0] = [];
        assert!(ctx.set_format(&none).is_err());
    }
}
