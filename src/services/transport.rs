use crate::constants::network::USER_AGENT;
use crate::constants::params::FILTER;
use crate::errors::FgtError;
use crate::services::filter::filter_query_fragments;
use crate::services::logger::Logger;
use crate::services::params::{HeaderStore, ParamStore, ParamValue};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Frozen copy of the context taken right before a call goes out.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub request_id: Uuid,
    pub method: Method,
    pub url: String,
    pub params: ParamStore,
    pub headers: HeaderStore,
    pub body: Option<Value>,
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl OutboundRequest {
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Encoded query string. Filter terms are encoded one by one around the literal grammar.
    pub fn query_string(&self) -> Result<String, FgtError> {
        let pairs: Vec<(String, String)> = self
            .params
            .to_pairs()
            .into_iter()
            .filter(|(key, _)| key != FILTER)
            .collect();
        let mut query = serde_urlencoded::to_string(&pairs)
            .map_err(|err| FgtError::internal(format!("Failed to encode query: {}", err)))?;
        if let Some(ParamValue::Text(expression)) = self.params.get(FILTER) {
            for fragment in filter_query_fragments(expression) {
                if !query.is_empty() {
                    query.push('&');
                }
                query.push_str(&fragment);
            }
        }
        Ok(query)
    }

    pub fn full_url(&self) -> Result<String, FgtError> {
        let query = self.query_string()?;
        if query.is_empty() {
            return Ok(self.url.clone());
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", self.url, separator, query))
    }
}

/// Raw response, handed back unmodified whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &OutboundRequest) -> Result<ApiResponse, FgtError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    logger: Logger,
    clients: Arc<Mutex<HashMap<bool, Client>>>,
}

impl ReqwestTransport {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("http"),
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn get_client(&self, verify_tls: bool) -> Result<Client, FgtError> {
        let mut guard = self
            .clients
            .lock()
            .map_err(|_| FgtError::internal("Failed to access HTTP client cache"))?;
        if let Some(existing) = guard.get(&verify_tls) {
            return Ok(existing.clone());
        }
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if !verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
            self.logger.debug("Certificate verification disabled", None);
        }
        let client = builder
            .build()
            .map_err(|err| FgtError::internal(format!("Failed to build HTTP client: {}", err)))?;
        guard.insert(verify_tls, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<ApiResponse, FgtError> {
        let client = self.get_client(request.verify_tls)?;
        let url = request.full_url()?;

        let mut req = client
            .request(request.method.clone(), url)
            .headers(headers_to_headermap(&request.headers)?)
            .timeout(request.timeout);
        if let Some(body) = request.body.as_ref() {
            req = req.json(body);
        }

        let response = req.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(key, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|text| (key.as_str().to_string(), text.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FgtError {
    if err.is_timeout() {
        return FgtError::timeout("HTTP request timed out");
    }
    FgtError::transport(err.to_string())
}

pub(crate) fn headers_to_headermap(headers: &HeaderStore) -> Result<HeaderMap, FgtError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers.iter() {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| FgtError::invalid_config(format!("Invalid header name '{}'", key)))?;
        let val = HeaderValue::from_str(value)
            .map_err(|_| FgtError::invalid_config(format!("Invalid value for header '{}'", key)))?;
        map.insert(name, val);
    }
    Ok(map)
}
