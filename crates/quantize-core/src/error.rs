use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuantizeError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Could not locate a working quantization engine ({attempted} tried)")]
    NoEngineAvailable { attempted: usize },
}

pub type Result<T> = std::result::Result<T, QuantizeError>;
