#![allow(dead_code)]

use async_trait::async_trait;
use fgt_api::errors::FgtError;
use fgt_api::managers::context::RequestContext;
use fgt_api::managers::session::Session;
use fgt_api::services::logger::Logger;
use fgt_api::services::transport::{ApiResponse, HttpTransport, OutboundRequest};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Records every request and answers from a script; an empty script answers `200 {}`.
#[derive(Default)]
pub struct RecordingTransport {
    requests: StdMutex<Vec<OutboundRequest>>,
    script: StdMutex<VecDeque<Result<ApiResponse, FgtError>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_response(&self, status: u16, body: &str) {
        self.script.lock().expect("script").push_back(Ok(ApiResponse {
            status,
            headers: BTreeMap::new(),
            body: body.to_string(),
        }));
    }

    pub fn push_error(&self, err: FgtError) {
        self.script.lock().expect("script").push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().expect("requests").clone()
    }

    pub fn last(&self) -> OutboundRequest {
        self.requests()
            .pop()
            .expect("at least one recorded request")
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<ApiResponse, FgtError> {
        self.requests
            .lock()
            .expect("requests")
            .push(request.clone());
        self.script
            .lock()
            .expect("script")
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ApiResponse {
                    status: 200,
                    headers: BTreeMap::new(),
                    body: "{}".to_string(),
                })
            })
    }
}

pub fn context() -> RequestContext {
    let mut context =
        RequestContext::new("edge-01", "fw.example", "tok-0123456789").expect("context");
    context.set_port(8443).expect("port");
    context
}

pub fn session(transport: Arc<RecordingTransport>) -> Session {
    Session::new(Logger::new("test"), context(), transport)
}
