pub mod color;
pub mod country;
pub mod feature_flags;
pub mod paths;
pub mod redact;
