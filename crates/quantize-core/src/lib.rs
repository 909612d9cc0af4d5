//! Orchestration of external GGUF quantization engines.
//!
//! Quantization itself is delegated to executables honouring the positional
//! contract `<exe> <input> <output> <method>`. A [`Quantizer`] tries its
//! [`EngineTemplate`]s in order and stops at the first zero exit status.

pub mod engine;
pub mod error;
pub mod orchestrator;

pub use engine::{EngineTemplate, default_engines};
pub use error::{QuantizeError, Result};
pub use orchestrator::{DEFAULT_METHOD, QuantizeOutcome, Quantizer, default_output_path};
