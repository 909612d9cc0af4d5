//! Engine invocation templates.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// One external quantization command.
///
/// Invoked as `program args… <input> <output> <method>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineTemplate {
    /// Label used in logs and in [`crate::QuantizeOutcome`].
    pub name: String,
    pub program: String,
    /// Fixed arguments placed before the positional ones.
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineTemplate {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the process for one quantization run.
    pub fn command(&self, input: &Path, output: &Path, method: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(input)
            .arg(output)
            .arg(OsStr::new(method));
        cmd
    }

    /// Shell-like rendering of the command line, for logs.
    pub fn command_line(&self, input: &Path, output: &Path, method: &str) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push(input.display().to_string());
        parts.push(output.display().to_string());
        parts.push(method.to_string());
        parts.join(" ")
    }
}

/// Engines tried when nothing is configured, in preference order.
pub fn default_engines() -> Vec<EngineTemplate> {
    vec![
        EngineTemplate::new("llama-quantize", "llama-quantize", Vec::<String>::new()),
        EngineTemplate::new(
            "llama_cpp.quantize",
            "python3",
            ["-m", "llama_cpp.quantize"],
        ),
    ]
}
