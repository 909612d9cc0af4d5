//! Human-readable summaries of a parsed [`GGUFFile`].

use serde::Serialize;
use tracing::debug;

use crate::reader::GGUFFile;
use crate::types::{ByteOrder, GGUFValue, file_type_name};

/// Namespace of the runtime-hint keys when none is configured.
pub const DEFAULT_HINT_NAMESPACE: &str = "wllama";

/// Well-known fields of one model, as shown by `describe`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub byte_order: ByteOrder,
    pub version: u32,
    pub tensor_count: usize,
    pub field_count: usize,
    pub architecture: Option<String>,
    pub name: Option<String>,
    pub quantization: Option<String>,
    pub max_threads: Option<i64>,
    /// Gigabytes.
    pub max_ram: Option<f64>,
}

/// Key of a runtime hint, e.g. `wllama.runtime.max_threads`.
pub fn hint_key(namespace: &str, hint: &str) -> String {
    format!("{namespace}.runtime.{hint}")
}

/// Extract the well-known fields. Absent or mistyped optional fields are `None`.
pub fn summarize(file: &GGUFFile, hint_namespace: &str) -> ModelSummary {
    let string_field = |key: &str| -> Option<String> {
        let value = file.get_field(key)?;
        let s = value.as_str();
        if s.is_none() {
            debug!(key, ?value, "field is not a string, skipping");
        }
        s.map(String::from)
    };

    let threads_key = hint_key(hint_namespace, "max_threads");
    let max_threads = file.get_field(&threads_key).and_then(|v| {
        let n = v.as_i64();
        if n.is_none() {
            debug!(key = %threads_key, value = ?v, "runtime hint is not an integer, skipping");
        }
        n
    });

    let ram_key = hint_key(hint_namespace, "max_ram");
    let max_ram = file.get_field(&ram_key).and_then(|v| {
        let gb = match *v {
            // Go through the shortest f32 rendering so 3.2f32 stays 3.2.
            GGUFValue::Float32(x) => x.to_string().parse().ok(),
            _ => v.as_f64(),
        };
        if gb.is_none() {
            debug!(key = %ram_key, value = ?v, "runtime hint is not numeric, skipping");
        }
        gb
    });

    let quantization = file
        .get_field("general.file_type")
        .and_then(|v| v.as_u64())
        .and_then(|ft| u32::try_from(ft).ok())
        .map(|ft| file_type_name(ft).to_string());

    ModelSummary {
        byte_order: file.byte_order(),
        version: file.header().version,
        tensor_count: file.tensors().len(),
        field_count: file.fields().len(),
        architecture: string_field("general.architecture"),
        name: string_field("general.name"),
        quantization,
        max_threads,
        max_ram,
    }
}

/// Display lines in fixed order: byte order, tensor count, field count,
/// architecture, max threads, max RAM. Absent optional lines are omitted.
pub fn describe(file: &GGUFFile, hint_namespace: &str) -> Vec<String> {
    let summary = summarize(file, hint_namespace);

    let mut lines = vec![
        format!("Byte Order: {}", summary.byte_order),
        format!("Total Tensors: {}", summary.tensor_count),
        format!("Total Metadata Fields: {}", summary.field_count),
    ];
    if let Some(arch) = summary.architecture {
        lines.push(format!("Architecture: {arch}"));
    }
    if let Some(threads) = summary.max_threads {
        lines.push(format!("Runtime Max Threads: {threads}"));
    }
    if let Some(ram) = summary.max_ram {
        lines.push(format!("Runtime Max RAM: {ram:?} GB"));
    }
    lines
}

/// Every metadata field and tensor directory entry, one per line.
pub fn dump_lines(file: &GGUFFile) -> Vec<String> {
    let mut lines = Vec::with_capacity(file.fields().len() + file.tensors().len() + 2);
    lines.push(format!("Metadata ({}):", file.fields().len()));
    for kv in file.fields() {
        lines.push(format!("  {} = {}", kv.key, kv.value));
    }
    lines.push(format!(
        "Tensors ({}, data at offset {}):",
        file.tensors().len(),
        file.data_offset()
    ));
    for t in file.tensors() {
        lines.push(format!(
            "  {} {:?} {} @ {}",
            t.name, t.shape, t.dtype, t.offset
        ));
    }
    lines
}
