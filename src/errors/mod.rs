mod fgt_error;

pub use fgt_error::{FgtError, FgtErrorKind};
