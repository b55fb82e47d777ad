//! Client for the FortiGate REST API using token authentication.
//!
//! A [`RequestContext`] accumulates auth placement, vdom scoping, query
//! parameters and headers; a [`Session`] issues calls through an
//! [`HttpTransport`] and expires transient state (filter, format) afterwards.

pub mod cli;
pub mod constants;
pub mod errors;
pub mod managers;
pub mod services;
pub mod utils;

pub use errors::{FgtError, FgtErrorKind};
pub use managers::context::{AuthPlacement, Change, ClearPolicy, RequestContext, Scope};
pub use managers::policy::MovePosition;
pub use managers::session::{Outcome, Session};
pub use services::config::FgtConfig;
pub use services::endpoints::{resolve_paths, ApiPaths, Protocol};
pub use services::filter::{compile_filter, Combinator, FilterMode, FilterSpec};
pub use services::transport::{ApiResponse, HttpTransport, OutboundRequest, ReqwestTransport};
pub use utils::color::normalize_color;
pub use utils::country::is_valid_country_code;
