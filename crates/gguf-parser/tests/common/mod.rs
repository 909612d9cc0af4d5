//! Test-only GGUF encoder used to build fixtures in memory.

#![allow(dead_code)]

use gguf_parser::{ByteOrder, GGUFValue, GGUFValueType};

enum Entry {
    Typed(String, GGUFValue),
    Raw(String, u32, Vec<u8>),
}

struct Tensor {
    name: String,
    shape: Vec<u64>,
    dtype: u32,
    offset: u64,
}

pub struct GgufBuilder {
    order: ByteOrder,
    version: u32,
    entries: Vec<Entry>,
    tensors: Vec<Tensor>,
}

impl GgufBuilder {
    pub fn new() -> Self {
        Self {
            order: ByteOrder::Little,
            version: 3,
            entries: Vec::new(),
            tensors: Vec::new(),
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.order = ByteOrder::Big;
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn kv(mut self, key: &str, value: GGUFValue) -> Self {
        self.entries.push(Entry::Typed(key.to_string(), value));
        self
    }

    /// A metadata entry with an arbitrary type tag and pre-encoded payload.
    pub fn raw_kv(mut self, key: &str, tag: u32, payload: Vec<u8>) -> Self {
        self.entries.push(Entry::Raw(key.to_string(), tag, payload));
        self
    }

    pub fn tensor(mut self, name: &str, shape: &[u64], dtype: u32, offset: u64) -> Self {
        self.tensors.push(Tensor {
            name: name.to_string(),
            shape: shape.to_vec(),
            dtype,
            offset,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer {
            buf: Vec::new(),
            order: self.order,
        };
        w.buf.extend_from_slice(b"GGUF");
        w.u32(self.version);
        w.u64(self.tensors.len() as u64);
        w.u64(self.entries.len() as u64);

        for entry in &self.entries {
            match entry {
                Entry::Typed(key, value) => {
                    w.string(key);
                    w.u32(value.value_type() as u32);
                    w.value(value);
                }
                Entry::Raw(key, tag, payload) => {
                    w.string(key);
                    w.u32(*tag);
                    w.buf.extend_from_slice(payload);
                }
            }
        }

        for t in &self.tensors {
            w.string(&t.name);
            w.u32(t.shape.len() as u32);
            for &dim in &t.shape {
                w.u64(dim);
            }
            w.u32(t.dtype);
            w.u64(t.offset);
        }
        w.buf
    }
}

pub struct Writer {
    pub buf: Vec<u8>,
    pub order: ByteOrder,
}

macro_rules! put {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self, v: $ty) {
            match self.order {
                ByteOrder::Little => self.buf.extend_from_slice(&v.to_le_bytes()),
                ByteOrder::Big => self.buf.extend_from_slice(&v.to_be_bytes()),
            }
        }
    };
}

impl Writer {
    put!(u8, u8);
    put!(i8, i8);
    put!(u16, u16);
    put!(i16, i16);
    put!(u32, u32);
    put!(i32, i32);
    put!(u64, u64);
    put!(i64, i64);
    put!(f32, f32);
    put!(f64, f64);

    pub fn string(&mut self, s: &str) {
        self.u64(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn value(&mut self, value: &GGUFValue) {
        match value {
            GGUFValue::Uint8(v) => self.u8(*v),
            GGUFValue::Int8(v) => self.i8(*v),
            GGUFValue::Uint16(v) => self.u16(*v),
            GGUFValue::Int16(v) => self.i16(*v),
            GGUFValue::Uint32(v) => self.u32(*v),
            GGUFValue::Int32(v) => self.i32(*v),
            GGUFValue::Uint64(v) => self.u64(*v),
            GGUFValue::Int64(v) => self.i64(*v),
            GGUFValue::Float32(v) => self.f32(*v),
            GGUFValue::Float64(v) => self.f64(*v),
            GGUFValue::Bool(v) => self.u8(u8::from(*v)),
            GGUFValue::String(s) => self.string(s),
            GGUFValue::Array(items) => {
                let elem = items
                    .first()
                    .map_or(GGUFValueType::String, GGUFValue::value_type);
                self.u32(elem as u32);
                self.u64(items.len() as u64);
                for item in items {
                    self.value(item);
                }
            }
        }
    }
}

pub fn little_endian_bytes(f: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut w = Writer {
        buf: Vec::new(),
        order: ByteOrder::Little,
    };
    f(&mut w);
    w.buf
}

pub fn strings(items: &[&str]) -> GGUFValue {
    GGUFValue::Array(items.iter().map(|s| GGUFValue::String(s.to_string())).collect())
}

/// Pad `bytes` to the default 32-byte alignment and append `data_len` zero
/// bytes of tensor data.
pub fn with_data_section(mut bytes: Vec<u8>, data_len: usize) -> Vec<u8> {
    let padded = bytes.len().div_ceil(32) * 32;
    bytes.resize(padded + data_len, 0);
    bytes
}
