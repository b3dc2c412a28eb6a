//! Utility modules

pub mod error;
pub mod resp;

pub use error::{classify, ErrorClass, FailoverError, Result, StoreError};
pub use resp::{RespDecoder, RespEncoder, RespValue};
