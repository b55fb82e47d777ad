pub mod address;
pub mod context;
pub mod firmware;
pub mod policy;
pub mod session;
