//! Ordered engine fallback.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::engine::{EngineTemplate, default_engines};
use crate::error::{QuantizeError, Result};

/// Quantization method used when the caller does not pick one.
pub const DEFAULT_METHOD: &str = "q4_k_m";

/// Result of a successful [`Quantizer::quantize`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizeOutcome {
    /// Name of the engine that exited with status zero.
    pub engine: String,
    pub output: PathBuf,
}

/// Tries each engine once, in order; the first zero exit wins.
#[derive(Debug, Clone)]
pub struct Quantizer {
    engines: Vec<EngineTemplate>,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(default_engines())
    }
}

impl Quantizer {
    pub fn new(engines: Vec<EngineTemplate>) -> Self {
        Self { engines }
    }

    pub fn engines(&self) -> &[EngineTemplate] {
        &self.engines
    }

    /// Quantize `input` into `output` with `method`.
    ///
    /// A missing executable or a non-zero exit moves on to the next engine.
    /// `method` is passed through untouched, and the output file is not
    /// checked.
    pub fn quantize(&self, input: &Path, output: &Path, method: &str) -> Result<QuantizeOutcome> {
        if !input.exists() {
            return Err(QuantizeError::InputNotFound(input.to_path_buf()));
        }

        for engine in &self.engines {
            info!(
                engine = %engine.name,
                command = %engine.command_line(input, output, method),
                "Attempting quantization"
            );
            match engine.command(input, output, method).status() {
                Ok(status) if status.success() => {
                    info!(engine = %engine.name, output = %output.display(), "Quantization complete");
                    return Ok(QuantizeOutcome {
                        engine: engine.name.clone(),
                        output: output.to_path_buf(),
                    });
                }
                Ok(status) => {
                    debug!(engine = %engine.name, code = ?status.code(), "engine failed, trying next");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(engine = %engine.name, program = %engine.program, "engine not installed, trying next");
                }
                Err(e) => {
                    debug!(engine = %engine.name, error = %e, "engine could not be started, trying next");
                }
            }
        }

        Err(QuantizeError::NoEngineAvailable {
            attempted: self.engines.len(),
        })
    }
}

/// `{input without extension}_{method}{.ext}`, next to the input.
pub fn default_output_path(input: &Path, method: &str) -> PathBuf {
    let mut name = input.file_stem().map(OsString::from).unwrap_or_default();
    name.push("_");
    name.push(method);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}
