use crate::errors::FgtError;
use crate::managers::context::RequestContext;
use crate::services::logger::Logger;
use crate::services::transport::{ApiResponse, HttpTransport, ReqwestTransport};
use crate::utils::redact::{redact_headers, redact_text};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// What a verb produced once local validation passed.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Any HTTP status, 2xx or not, exactly as the firewall sent it.
    Response(ApiResponse),
    /// The call never produced a response (refused, TLS failure, timeout).
    NoResponse(FgtError),
}

impl Outcome {
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Outcome::Response(response) => Some(response),
            Outcome::NoResponse(_) => None,
        }
    }

    pub fn into_response(self) -> Option<ApiResponse> {
        match self {
            Outcome::Response(response) => Some(response),
            Outcome::NoResponse(_) => None,
        }
    }

    pub fn is_no_response(&self) -> bool {
        matches!(self, Outcome::NoResponse(_))
    }
}

/// Owns one context and issues calls through an injected transport.
///
/// Verbs take `&mut self`: a session serves one call at a time, and the
/// clear policy runs before the borrow is released.
pub struct Session {
    logger: Logger,
    context: RequestContext,
    transport: Arc<dyn HttpTransport>,
}

impl Session {
    pub fn new(logger: Logger, context: RequestContext, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            logger: logger.child(context.name()),
            context,
            transport,
        }
    }

    /// Session backed by the real HTTP client.
    pub fn connect(logger: Logger, context: RequestContext) -> Self {
        let transport = Arc::new(ReqwestTransport::new(logger.child(context.name())));
        Self::new(logger, context, transport)
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RequestContext {
        &mut self.context
    }

    pub fn into_context(self) -> RequestContext {
        self.context
    }

    pub async fn get(&mut self, url: &str) -> Result<Outcome, FgtError> {
        self.send(Method::GET, url, None).await
    }

    pub async fn post(&mut self, url: &str, body: Value) -> Result<Outcome, FgtError> {
        self.send(Method::POST, url, Some(body)).await
    }

    pub async fn put(&mut self, url: &str, body: Option<Value>) -> Result<Outcome, FgtError> {
        self.send(Method::PUT, url, body).await
    }

    pub async fn delete(&mut self, url: &str) -> Result<Outcome, FgtError> {
        self.send(Method::DELETE, url, None).await
    }

    async fn send(
        &mut self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Outcome, FgtError> {
        let request = self.context.snapshot(method, url, body)?;
        let token = self.context.secret().to_string();
        let secret = [token.as_str()];
        let display_url = request
            .full_url()
            .map(|full| redact_text(&full, &secret))
            .unwrap_or_else(|_| redact_text(&request.url, &secret));
        self.logger.debug(
            "HTTP request",
            Some(&serde_json::json!({
                "request_id": request.request_id,
                "method": request.method.as_str(),
                "url": display_url,
                "headers": redact_headers(request.headers.iter()),
                "verify_tls": request.verify_tls,
                "timeout_ms": request.timeout.as_millis(),
            })),
        );

        let started = Instant::now();
        let result = self.transport.execute(&request).await;
        let cleared = self.context.apply_clear_policy();
        if !cleared.is_empty() {
            self.logger.debug(
                "Cleared transient state",
                Some(&serde_json::json!({
                    "request_id": request.request_id,
                    "keys": cleared,
                })),
            );
        }

        match result {
            Ok(response) => {
                self.logger.debug(
                    "HTTP response",
                    Some(&serde_json::json!({
                        "request_id": request.request_id,
                        "status": response.status,
                        "duration_ms": started.elapsed().as_millis(),
                    })),
                );
                Ok(Outcome::Response(response))
            }
            Err(err) if err.is_transport_failure() => {
                self.logger.warn(
                    "No response from firewall",
                    Some(&serde_json::json!({
                        "request_id": request.request_id,
                        "method": request.method.as_str(),
                        "url": display_url,
                        "error": redact_text(&err.message, &secret),
                        "kind": err.kind,
                    })),
                );
                Ok(Outcome::NoResponse(err))
            }
            Err(err) => Err(err),
        }
    }
}
