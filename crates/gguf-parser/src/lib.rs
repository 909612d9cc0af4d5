//! Pure-Rust GGUF metadata reader.
//!
//! Parses the header, typed key/value metadata and tensor directory of a
//! `.gguf` file in a single sequential pass, without touching tensor data.
//! The [`inspect`] module turns a parsed file into display lines, including
//! the engine-specific `<engine>.runtime.*` hint fields.

pub mod inspect;
pub mod reader;
pub mod types;

pub use inspect::{DEFAULT_HINT_NAMESPACE, ModelSummary, describe, dump_lines, summarize};
pub use reader::{GGUFFile, GGUFReader, open};
pub use types::{
    ByteOrder, GGMLType, GGUFError, GGUFHeader, GGUFMetadataKV, GGUFValue, GGUFValueType,
    TensorInfo, file_type_name,
};
