use crate::constants::api::{
    ADDRESS_PATH, API_PREFIX, CMDB_BRANCH, FIRMWARE_PATH, MONITOR_BRANCH, POLICY_PATH,
};
use crate::constants::limits::MIN_PORT;
use crate::errors::FgtError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = FgtError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().trim_end_matches(':').to_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(FgtError::invalid_config(format!(
                "protocol must be http or https, got '{}'",
                other
            ))),
        }
    }
}

/// Base URLs for one firewall target. Always rebuilt as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiPaths {
    pub cmdb_base: String,
    pub monitor_base: String,
    pub address_collection: String,
    pub policy_collection: String,
    pub monitor_policy: String,
    pub firmware_info: String,
}

pub fn resolve_paths(protocol: Protocol, host: &str, port: u16) -> Result<ApiPaths, FgtError> {
    if port < MIN_PORT {
        return Err(FgtError::invalid_config(format!(
            "port {} is outside 1-65535",
            port
        )));
    }
    if host.trim().is_empty() {
        return Err(FgtError::invalid_config("host must be a non-empty string"));
    }
    let origin = format!("{}://{}:{}", protocol, host, port);
    Url::parse(&origin).map_err(|err| {
        FgtError::invalid_config(format!("'{}' is not a valid API origin: {}", origin, err))
    })?;

    let cmdb_base = format!("{}{}/{}/", origin, API_PREFIX, CMDB_BRANCH);
    let monitor_base = format!("{}{}/{}/", origin, API_PREFIX, MONITOR_BRANCH);
    Ok(ApiPaths {
        address_collection: format!("{}{}", cmdb_base, ADDRESS_PATH),
        policy_collection: format!("{}{}", cmdb_base, POLICY_PATH),
        monitor_policy: format!("{}{}", monitor_base, POLICY_PATH),
        firmware_info: format!("{}{}", monitor_base, FIRMWARE_PATH),
        cmdb_base,
        monitor_base,
    })
}

/// Appends one percent-encoded path segment (slashes included) to a collection URL.
///
/// The collection text is kept as-is so an explicit default port survives.
pub fn join_segment(collection: &str, segment: &str) -> Result<String, FgtError> {
    if segment.is_empty() {
        return Err(FgtError::invalid_config("resource name must be a non-empty string"));
    }
    let mut scratch = Url::parse(collection)
        .map_err(|_| FgtError::invalid_config(format!("Invalid collection URL '{}'", collection)))?;
    scratch
        .path_segments_mut()
        .map_err(|_| FgtError::invalid_config("Collection URL cannot be a base"))?
        .pop_if_empty()
        .push(segment);
    let encoded = scratch
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .ok_or_else(|| FgtError::internal("Failed to encode resource name"))?;

    let base = collection.trim_end_matches('/');
    Ok(format!("{}/{}", base, encoded))
}
