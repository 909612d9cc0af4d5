//! GGUF format types and constants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Magic bytes at the start of every GGUF file.
pub const GGUF_MAGIC: [u8; 4] = *b"GGUF";

/// Oldest GGUF version we can parse (v1 used 32-bit counts).
pub const GGUF_VERSION_MIN: u32 = 2;

/// Newest GGUF version we support.
pub const GGUF_VERSION_MAX: u32 = 3;

/// Alignment of the tensor data section when `general.alignment` is unset.
pub const GGUF_DEFAULT_ALIGNMENT: u64 = 32;

//  Byte order

/// Byte order of multi-byte integers and floats in a GGUF file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => f.write_str("Little"),
            Self::Big => f.write_str("Big"),
        }
    }
}

//  Value type tag

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum GGUFValueType {
    Uint8 = 0,
    Int8 = 1,
    Uint16 = 2,
    Int16 = 3,
    Uint32 = 4,
    Int32 = 5,
    Float32 = 6,
    Bool = 7,
    String = 8,
    Array = 9,
    Uint64 = 10,
    Int64 = 11,
    Float64 = 12,
}

impl TryFrom<u32> for GGUFValueType {
    type Error = GGUFError;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Uint8),
            1 => Ok(Self::Int8),
            2 => Ok(Self::Uint16),
            3 => Ok(Self::Int16),
            4 => Ok(Self::Uint32),
            5 => Ok(Self::Int32),
            6 => Ok(Self::Float32),
            7 => Ok(Self::Bool),
            8 => Ok(Self::String),
            9 => Ok(Self::Array),
            10 => Ok(Self::Uint64),
            11 => Ok(Self::Int64),
            12 => Ok(Self::Float64),
            _ => Err(GGUFError::UnknownValueType(v)),
        }
    }
}

//  Header

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GGUFHeader {
    pub version: u32,
    pub tensor_count: u64,
    pub metadata_kv_count: u64,
}

//  Metadata values

/// One metadata value.
///
/// GGUF declares a single element type per array, but elements are kept
/// individually tagged so that values assembled in memory may mix kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GGUFValue {
    Uint8(u8),
    Int8(i8),
    Uint16(u16),
    Int16(i16),
    Uint32(u32),
    Int32(i32),
    Float32(f32),
    Bool(bool),
    String(String),
    Array(Vec<GGUFValue>),
    Uint64(u64),
    Int64(i64),
    Float64(f64),
}

/// Number of array elements shown by `Display` before eliding the rest.
const DISPLAY_ARRAY_LIMIT: usize = 8;

impl GGUFValue {
    pub fn value_type(&self) -> GGUFValueType {
        match self {
            Self::Uint8(_) => GGUFValueType::Uint8,
            Self::Int8(_) => GGUFValueType::Int8,
            Self::Uint16(_) => GGUFValueType::Uint16,
            Self::Int16(_) => GGUFValueType::Int16,
            Self::Uint32(_) => GGUFValueType::Uint32,
            Self::Int32(_) => GGUFValueType::Int32,
            Self::Float32(_) => GGUFValueType::Float32,
            Self::Bool(_) => GGUFValueType::Bool,
            Self::String(_) => GGUFValueType::String,
            Self::Array(_) => GGUFValueType::Array,
            Self::Uint64(_) => GGUFValueType::Uint64,
            Self::Int64(_) => GGUFValueType::Int64,
            Self::Float64(_) => GGUFValueType::Float64,
        }
    }

    /// Unsigned view of any integer kind; `None` for negatives.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Uint8(v) => Some(v.into()),
            Self::Uint16(v) => Some(v.into()),
            Self::Uint32(v) => Some(v.into()),
            Self::Uint64(v) => Some(v),
            Self::Int8(v) => u64::try_from(v).ok(),
            Self::Int16(v) => u64::try_from(v).ok(),
            Self::Int32(v) => u64::try_from(v).ok(),
            Self::Int64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Signed view of any integer kind; `None` if it does not fit.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int8(v) => Some(v.into()),
            Self::Int16(v) => Some(v.into()),
            Self::Int32(v) => Some(v.into()),
            Self::Int64(v) => Some(v),
            Self::Uint8(v) => Some(v.into()),
            Self::Uint16(v) => Some(v.into()),
            Self::Uint32(v) => Some(v.into()),
            Self::Uint64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Floating-point view of any numeric kind.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float32(v) => Some(v.into()),
            Self::Float64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[GGUFValue]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for GGUFValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint8(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Uint16(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Uint32(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().take(DISPLAY_ARRAY_LIMIT).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Self::String(s) => write!(f, "{s:?}")?,
                        other => write!(f, "{other}")?,
                    }
                }
                if items.len() > DISPLAY_ARRAY_LIMIT {
                    write!(f, ", … ({} total)", items.len())?;
                }
                f.write_str("]")
            }
        }
    }
}

//  Metadata KV

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GGUFMetadataKV {
    pub key: String,
    pub value: GGUFValue,
}

//  Tensor directory

/// ggml tensor element type, as stored in the tensor directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GGMLType {
    F32,
    F16,
    Q4_0,
    Q4_1,
    Q5_0,
    Q5_1,
    Q8_0,
    Q8_1,
    Q2K,
    Q3K,
    Q4K,
    Q5K,
    Q6K,
    Q8K,
    IQ2XXS,
    IQ2XS,
    IQ3XXS,
    IQ1S,
    IQ4NL,
    IQ3S,
    IQ2S,
    IQ4XS,
    I8,
    I16,
    I32,
    I64,
    F64,
    IQ1M,
    BF16,
    /// A tag this parser does not know; kept so newer files still parse.
    Unknown(u32),
}

impl From<u32> for GGMLType {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::F32,
            1 => Self::F16,
            2 => Self::Q4_0,
            3 => Self::Q4_1,
            6 => Self::Q5_0,
            7 => Self::Q5_1,
            8 => Self::Q8_0,
            9 => Self::Q8_1,
            10 => Self::Q2K,
            11 => Self::Q3K,
            12 => Self::Q4K,
            13 => Self::Q5K,
            14 => Self::Q6K,
            15 => Self::Q8K,
            16 => Self::IQ2XXS,
            17 => Self::IQ2XS,
            18 => Self::IQ3XXS,
            19 => Self::IQ1S,
            20 => Self::IQ4NL,
            21 => Self::IQ3S,
            22 => Self::IQ2S,
            23 => Self::IQ4XS,
            24 => Self::I8,
            25 => Self::I16,
            26 => Self::I32,
            27 => Self::I64,
            28 => Self::F64,
            29 => Self::IQ1M,
            30 => Self::BF16,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for GGMLType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::F32 => "F32",
            Self::F16 => "F16",
            Self::Q4_0 => "Q4_0",
            Self::Q4_1 => "Q4_1",
            Self::Q5_0 => "Q5_0",
            Self::Q5_1 => "Q5_1",
            Self::Q8_0 => "Q8_0",
            Self::Q8_1 => "Q8_1",
            Self::Q2K => "Q2_K",
            Self::Q3K => "Q3_K",
            Self::Q4K => "Q4_K",
            Self::Q5K => "Q5_K",
            Self::Q6K => "Q6_K",
            Self::Q8K => "Q8_K",
            Self::IQ2XXS => "IQ2_XXS",
            Self::IQ2XS => "IQ2_XS",
            Self::IQ3XXS => "IQ3_XXS",
            Self::IQ1S => "IQ1_S",
            Self::IQ4NL => "IQ4_NL",
            Self::IQ3S => "IQ3_S",
            Self::IQ2S => "IQ2_S",
            Self::IQ4XS => "IQ4_XS",
            Self::I8 => "I8",
            Self::I16 => "I16",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::F64 => "F64",
            Self::IQ1M => "IQ1_M",
            Self::BF16 => "BF16",
            Self::Unknown(tag) => return write!(f, "UNKNOWN({tag})"),
        };
        f.write_str(name)
    }
}

impl GGMLType {
    /// `(elements per block, bytes per block)`; `None` for unknown tags.
    pub fn block_layout(&self) -> Option<(u64, u64)> {
        Some(match self {
            Self::F32 | Self::I32 => (1, 4),
            Self::F16 | Self::BF16 | Self::I16 => (1, 2),
            Self::I8 => (1, 1),
            Self::F64 | Self::I64 => (1, 8),
            Self::Q4_0 | Self::IQ4NL => (32, 18),
            Self::Q4_1 => (32, 20),
            Self::Q5_0 => (32, 22),
            Self::Q5_1 => (32, 24),
            Self::Q8_0 => (32, 34),
            Self::Q8_1 => (32, 36),
            Self::Q2K => (256, 84),
            Self::Q3K | Self::IQ3S => (256, 110),
            Self::Q4K => (256, 144),
            Self::Q5K => (256, 176),
            Self::Q6K => (256, 210),
            Self::Q8K => (256, 292),
            Self::IQ2XXS => (256, 66),
            Self::IQ2XS => (256, 74),
            Self::IQ3XXS => (256, 98),
            Self::IQ1S => (256, 50),
            Self::IQ2S => (256, 82),
            Self::IQ4XS => (256, 136),
            Self::IQ1M => (256, 56),
            Self::Unknown(_) => return None,
        })
    }
}

/// One entry of the tensor directory. Payload bytes are never loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorInfo {
    pub name: String,
    pub shape: Vec<u64>,
    pub dtype: GGMLType,
    /// Byte offset relative to the start of the data section.
    pub offset: u64,
}

impl TensorInfo {
    /// Product of the shape; `None` if it does not fit in a `u64`.
    pub fn n_elements(&self) -> Option<u64> {
        self.shape.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
    }

    /// Payload size in bytes. `None` for unknown types or on overflow.
    pub fn data_size(&self) -> Option<u64> {
        let (block_elems, block_bytes) = self.dtype.block_layout()?;
        self.n_elements()?
            .div_ceil(block_elems)
            .checked_mul(block_bytes)
    }
}

//  Error

#[derive(Debug, thiserror::Error)]
pub enum GGUFError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid GGUF magic: 0x{0:08X}")]
    BadMagic(u32),

    #[error("Unsupported GGUF version: {0}")]
    UnsupportedVersion(u32),

    #[error("Unknown value type tag: {0}")]
    UnknownValueType(u32),

    #[error("Nested arrays are not supported")]
    UnsupportedNesting,

    #[error("Duplicate metadata key: {0}")]
    DuplicateKey(String),

    #[error("Truncated file (ends before the declared data)")]
    Truncated,
}

//  File-type ↔ human name

/// Map a `general.file_type` value to a short quantisation name.
pub fn file_type_name(ft: u32) -> &'static str {
    match ft {
        0 => "F32",
        1 => "F16",
        2 => "Q4_0",
        3 => "Q4_1",
        7 => "Q8_0",
        8 => "Q5_0",
        9 => "Q5_1",
        10 => "Q2_K",
        11 => "Q3_K_S",
        12 => "Q3_K_M",
        13 => "Q3_K_L",
        14 => "Q4_K_S",
        15 => "Q4_K_M",
        16 => "Q5_K_S",
        17 => "Q5_K_M",
        18 => "Q6_K",
        19 => "IQ2_XXS",
        20 => "IQ2_XS",
        21 => "Q2_K_S",
        22 => "IQ3_XS",
        23 => "IQ3_XXS",
        24 => "IQ1_S",
        25 => "IQ4_NL",
        26 => "IQ3_S",
        27 => "IQ3_M",
        28 => "IQ2_S",
        29 => "IQ2_M",
        30 => "IQ4_XS",
        31 => "IQ1_M",
        32 => "BF16",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_tags_match_format() {
        for tag in 0..=12u32 {
            let ty = GGUFValueType::try_from(tag).unwrap();
            assert_eq!(ty as u32, tag);
        }
        assert!(matches!(
            GGUFValueType::try_from(13),
            Err(GGUFError::UnknownValueType(13))
        ));
    }

    #[test]
    fn integer_views_respect_sign_and_width() {
        assert_eq!(GGUFValue::Int8(-1).as_u64(), None);
        assert_eq!(GGUFValue::Int8(-1).as_i64(), Some(-1));
        assert_eq!(GGUFValue::Uint64(u64::MAX).as_i64(), None);
        assert_eq!(GGUFValue::Uint16(7).as_u64(), Some(7));
        assert_eq!(GGUFValue::String("7".into()).as_u64(), None);
    }

    #[test]
    fn float_view_accepts_integers() {
        assert_eq!(GGUFValue::Float32(1.5).as_f64(), Some(1.5));
        assert_eq!(GGUFValue::Uint32(4).as_f64(), Some(4.0));
        assert_eq!(GGUFValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn display_elides_long_arrays() {
        let arr = GGUFValue::Array((0..10).map(GGUFValue::Int32).collect());
        assert_eq!(arr.to_string(), "[0, 1, 2, 3, 4, 5, 6, 7, … (10 total)]");

        let strs = GGUFValue::Array(vec![GGUFValue::String("a".into())]);
        assert_eq!(strs.to_string(), "[\"a\"]");
    }

    #[test]
    fn ggml_type_keeps_unknown_tags() {
        assert_eq!(GGMLType::from(12), GGMLType::Q4K);
        assert_eq!(GGMLType::from(999), GGMLType::Unknown(999));
        assert_eq!(GGMLType::from(999).to_string(), "UNKNOWN(999)");
        assert_eq!(GGMLType::Q4K.to_string(), "Q4_K");
    }

    #[test]
    fn n_elements_is_shape_product() {
        let t = TensorInfo {
            name: "w".into(),
            shape: vec![4, 8],
            dtype: GGMLType::F16,
            offset: 0,
        };
        assert_eq!(t.n_elements(), Some(32));
        assert_eq!(t.data_size(), Some(64));
    }

    #[test]
    fn overflowing_shape_has_no_element_count() {
        let t = TensorInfo {
            name: "w".into(),
            shape: vec![u64::MAX, 2],
            dtype: GGMLType::F32,
            offset: 0,
        };
        assert_eq!(t.n_elements(), None);
        assert_eq!(t.data_size(), None);
    }

    #[test]
    fn data_size_overflow_is_none() {
        let t = TensorInfo {
            name: "w".into(),
            shape: vec![u64::MAX / 2],
            dtype: GGMLType::F32,
            offset: 0,
        };
        assert!(t.n_elements().is_some());
        assert_eq!(t.data_size(), None);
    }

    #[test]
    fn quantized_sizes_follow_block_layout() {
        let t = TensorInfo {
            name: "w".into(),
            shape: vec![256, 4],
            dtype: GGMLType::Q4K,
            offset: 0,
        };
        assert_eq!(t.data_size(), Some(4 * 144));
        let unknown = TensorInfo {
            dtype: GGMLType::Unknown(77),
            ..t
        };
        assert_eq!(unknown.data_size(), None);
    }

    #[test]
    fn iq_file_types_have_names() {
        assert_eq!(file_type_name(19), "IQ2_XXS");
        assert_eq!(file_type_name(30), "IQ4_XS");
        assert_eq!(file_type_name(31), "IQ1_M");
        assert_eq!(file_type_name(99), "Unknown");
    }
}
