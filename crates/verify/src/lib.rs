pub mod decode;
pub mod error;
pub mod validator;

pub use crate::decode::QrDecoder;
pub use crate::validator::Validator;
use std::sync::Arc;

pub type ValidatorHandle = Arc<dyn Validator + Send + Sync>;
pub type DecoderHandle = Arc<dyn QrDecoder + Send + Sync>;
