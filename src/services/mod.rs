pub mod config;
pub mod endpoints;
pub mod filter;
pub mod logger;
pub mod params;
pub mod transport;
pub mod validation;
