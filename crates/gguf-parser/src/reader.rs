//! GGUF file reader: one sequential pass over header, metadata and tensor
//! directory. Tensor payload bytes are never read.

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::types::*;

/// Keys whose value is a single string. Some converters store these as an
/// indexed string array; [`GGUFFile::get_field`] folds that back to a string.
const STRING_SCALAR_KEYS: &[&str] = &[
    "general.architecture",
    "general.name",
    "general.type",
    "general.basename",
];

//  Reader settings

/// Reader-level settings. Little-endian unless told otherwise.
#[derive(Debug, Clone, Copy)]
pub struct GGUFReader {
    /// `None` means detect from the version field.
    byte_order: Option<ByteOrder>,
}

impl Default for GGUFReader {
    fn default() -> Self {
        Self {
            byte_order: Some(ByteOrder::Little),
        }
    }
}

impl GGUFReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode multi-byte values with a fixed byte order.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }

    /// Guess the byte order from the version field: a little-endian read whose
    /// low 16 bits are zero can only be a byte-swapped small version number.
    pub fn detect_byte_order(mut self) -> Self {
        self.byte_order = None;
        self
    }

    /// Open and parse the file at `path`.
    pub fn open(&self, path: &Path) -> Result<GGUFFile, GGUFError> {
        let file = fs::File::open(path)?;
        let file_len = file.metadata()?.len();
        let gguf = self.parse(BufReader::new(file))?;
        gguf.verify_data_section(file_len)?;
        debug!(
            path = %path.display(),
            fields = gguf.fields.len(),
            tensors = gguf.tensors.len(),
            "parsed GGUF file"
        );
        Ok(gguf)
    }

    /// Parse a GGUF byte stream.
    pub fn parse(&self, reader: impl Read) -> Result<GGUFFile, GGUFError> {
        let mut r = Source {
            inner: reader,
            order: ByteOrder::Little,
            pos: 0,
        };

        //  Magic
        let magic = r.read_array::<4>()?;
        if magic != GGUF_MAGIC {
            return Err(GGUFError::BadMagic(u32::from_le_bytes(magic)));
        }

        //  Version (decides the byte order when detecting)
        let raw_version = r.read_array::<4>()?;
        r.order = match self.byte_order {
            Some(order) => order,
            None if u32::from_le_bytes(raw_version) & 0xFFFF == 0 => ByteOrder::Big,
            None => ByteOrder::Little,
        };
        let version = match r.order {
            ByteOrder::Little => u32::from_le_bytes(raw_version),
            ByteOrder::Big => u32::from_be_bytes(raw_version),
        };
        if !(GGUF_VERSION_MIN..=GGUF_VERSION_MAX).contains(&version) {
            return Err(GGUFError::UnsupportedVersion(version));
        }

        //  Counts
        let tensor_count = r.read_u64()?;
        let metadata_kv_count = r.read_u64()?;
        let header = GGUFHeader {
            version,
            tensor_count,
            metadata_kv_count,
        };
        debug!(?header, byte_order = %r.order, "read GGUF header");

        //  Metadata
        let mut fields = Vec::new();
        let mut index = HashMap::new();
        for _ in 0..metadata_kv_count {
            let kv = read_kv(&mut r)?;
            if index.contains_key(&kv.key) {
                return Err(GGUFError::DuplicateKey(kv.key));
            }
            index.insert(kv.key.clone(), fields.len());
            fields.push(kv);
        }

        //  Tensor directory
        let mut tensors = Vec::new();
        for _ in 0..tensor_count {
            tensors.push(read_tensor_info(&mut r)?);
        }

        let alignment = index
            .get("general.alignment")
            .and_then(|&i| fields[i].value.as_u64())
            .filter(|a| a.is_power_of_two())
            .unwrap_or(GGUF_DEFAULT_ALIGNMENT);
        let data_offset = r.pos.div_ceil(alignment) * alignment;

        Ok(GGUFFile {
            byte_order: r.order,
            header,
            fields,
            index,
            tensors,
            alignment,
            data_offset,
        })
    }
}

/// Parse `path` with default settings.
pub fn open(path: &Path) -> Result<GGUFFile, GGUFError> {
    GGUFReader::new().open(path)
}

//  Parsed file

/// An in-memory index of one GGUF file's metadata and tensor directory.
#[derive(Debug, Clone)]
pub struct GGUFFile {
    byte_order: ByteOrder,
    header: GGUFHeader,
    fields: Vec<GGUFMetadataKV>,
    index: HashMap<String, usize>,
    tensors: Vec<TensorInfo>,
    alignment: u64,
    data_offset: u64,
}

impl GGUFFile {
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn header(&self) -> &GGUFHeader {
        &self.header
    }

    /// Metadata fields in file order.
    pub fn fields(&self) -> &[GGUFMetadataKV] {
        &self.fields
    }

    /// Tensor directory in file order.
    pub fn tensors(&self) -> &[TensorInfo] {
        &self.tensors
    }

    pub fn tensor(&self, name: &str) -> Option<&TensorInfo> {
        self.tensors.iter().find(|t| t.name == name)
    }

    /// Alignment of the tensor data section.
    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// Absolute file offset where tensor data begins.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Check that every tensor's payload fits in an input of `file_len`
    /// bytes. Payloads of unknown tensor types only need their start in range.
    pub fn verify_data_section(&self, file_len: u64) -> Result<(), GGUFError> {
        if self.tensors.is_empty() {
            return Ok(());
        }
        if self.data_offset > file_len {
            return Err(GGUFError::Truncated);
        }
        for t in &self.tensors {
            let start = self
                .data_offset
                .checked_add(t.offset)
                .ok_or(GGUFError::Truncated)?;
            let end = match t.dtype.block_layout() {
                Some(_) => t
                    .data_size()
                    .and_then(|size| start.checked_add(size))
                    .ok_or(GGUFError::Truncated)?,
                None => start,
            };
            if end > file_len {
                debug!(tensor = %t.name, end, file_len, "tensor data runs past end of file");
                return Err(GGUFError::Truncated);
            }
        }
        Ok(())
    }

    /// The value stored under `key`, exactly as it was read.
    pub fn raw_field(&self, key: &str) -> Option<&GGUFValue> {
        self.index.get(key).map(|&i| &self.fields[i].value)
    }

    /// Look up `key`. A present zero or empty string is `Some`.
    ///
    /// String-valued general fields stored as indexed arrays are returned as
    /// the referenced string element.
    pub fn get_field(&self, key: &str) -> Option<&GGUFValue> {
        let value = self.raw_field(key)?;
        if STRING_SCALAR_KEYS.contains(&key) {
            if let Some(resolved) = resolve_indexed_string(value) {
                return Some(resolved);
            }
        }
        Some(value)
    }
}

/// Resolve `[index, part0, part1, …]` to `part[index]`, or a plain string
/// array to its first element.
fn resolve_indexed_string(value: &GGUFValue) -> Option<&GGUFValue> {
    let items = value.as_array()?;
    let (first, parts) = items.split_first()?;
    let resolved = match first.as_u64() {
        Some(idx) if !parts.is_empty() && parts.iter().all(|p| p.as_str().is_some()) => {
            parts.get(usize::try_from(idx).ok()?)?
        }
        _ => first,
    };
    resolved.as_str().map(|_| resolved)
}

//  Binary reading primitives

struct Source<R> {
    inner: R,
    order: ByteOrder,
    pos: u64,
}

macro_rules! read_num {
    ($name:ident, $ty:ty, $n:literal) => {
        fn $name(&mut self) -> Result<$ty, GGUFError> {
            let buf = self.read_array::<$n>()?;
            Ok(match self.order {
                ByteOrder::Little => <$ty>::from_le_bytes(buf),
                ByteOrder::Big => <$ty>::from_be_bytes(buf),
            })
        }
    };
}

impl<R: Read> Source<R> {
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], GGUFError> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(eof_to_truncated)?;
        self.pos += N as u64;
        Ok(buf)
    }

    read_num!(read_u8, u8, 1);
    read_num!(read_i8, i8, 1);
    read_num!(read_u16, u16, 2);
    read_num!(read_i16, i16, 2);
    read_num!(read_u32, u32, 4);
    read_num!(read_i32, i32, 4);
    read_num!(read_u64, u64, 8);
    read_num!(read_i64, i64, 8);
    read_num!(read_f32, f32, 4);
    read_num!(read_f64, f64, 8);

    fn read_bool(&mut self) -> Result<bool, GGUFError> {
        Ok(self.read_u8()? != 0)
    }

    fn read_string(&mut self) -> Result<String, GGUFError> {
        let len = self.read_u64()?;
        // `take` bounds the allocation by what the input actually holds.
        let mut buf = Vec::new();
        (&mut self.inner).take(len).read_to_end(&mut buf)?;
        if (buf.len() as u64) < len {
            return Err(GGUFError::Truncated);
        }
        self.pos += len;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn eof_to_truncated(e: io::Error) -> GGUFError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        GGUFError::Truncated
    } else {
        GGUFError::Io(e)
    }
}

fn read_value<R: Read>(r: &mut Source<R>, vtype: GGUFValueType) -> Result<GGUFValue, GGUFError> {
    match vtype {
        GGUFValueType::Uint8 => Ok(GGUFValue::Uint8(r.read_u8()?)),
        GGUFValueType::Int8 => Ok(GGUFValue::Int8(r.read_i8()?)),
        GGUFValueType::Uint16 => Ok(GGUFValue::Uint16(r.read_u16()?)),
        GGUFValueType::Int16 => Ok(GGUFValue::Int16(r.read_i16()?)),
        GGUFValueType::Uint32 => Ok(GGUFValue::Uint32(r.read_u32()?)),
        GGUFValueType::Int32 => Ok(GGUFValue::Int32(r.read_i32()?)),
        GGUFValueType::Float32 => Ok(GGUFValue::Float32(r.read_f32()?)),
        GGUFValueType::Bool => Ok(GGUFValue::Bool(r.read_bool()?)),
        GGUFValueType::String => Ok(GGUFValue::String(r.read_string()?)),
        GGUFValueType::Array => {
            let elem_type = GGUFValueType::try_from(r.read_u32()?)?;
            if elem_type == GGUFValueType::Array {
                return Err(GGUFError::UnsupportedNesting);
            }
            let count = r.read_u64()?;
            // Never trust the declared count for the initial allocation.
            let mut arr = Vec::with_capacity(count.min(1024) as usize);
            for _ in 0..count {
                arr.push(read_value(r, elem_type)?);
            }
            Ok(GGUFValue::Array(arr))
        }
        GGUFValueType::Uint64 => Ok(GGUFValue::Uint64(r.read_u64()?)),
        GGUFValueType::Int64 => Ok(GGUFValue::Int64(r.read_i64()?)),
        GGUFValueType::Float64 => Ok(GGUFValue::Float64(r.read_f64()?)),
    }
}

fn read_kv<R: Read>(r: &mut Source<R>) -> Result<GGUFMetadataKV, GGUFError> {
    let key = r.read_string()?;
    let vtype = GGUFValueType::try_from(r.read_u32()?)?;
    let value = read_value(r, vtype)?;
    Ok(GGUFMetadataKV { key, value })
}

fn read_tensor_info<R: Read>(r: &mut Source<R>) -> Result<TensorInfo, GGUFError> {
    let name = r.read_string()?;
    let n_dims = r.read_u32()?;
    let mut shape = Vec::with_capacity(n_dims.min(8) as usize);
    for _ in 0..n_dims {
        shape.push(r.read_u64()?);
    }
    let dtype = GGMLType::from(r.read_u32()?);
    let offset = r.read_u64()?;
    Ok(TensorInfo {
        name,
        shape,
        dtype,
        offset,
    })
}
