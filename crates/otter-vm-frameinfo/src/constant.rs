//! Constants materialized from value records

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::flags::ValueKind;

/// Compiled method that a deoptimization can resume in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedMethod {
    /// Qualified method name
    pub name: Arc<str>,
    /// Offset of the method's deoptimization entry in the image
    pub deopt_offset_in_image: i32,
}

impl SharedMethod {
    /// Create a method reference
    pub fn new(name: impl Into<Arc<str>>, deopt_offset_in_image: i32) -> Self {
        Self {
            name: name.into(),
            deopt_offset_in_image,
        }
    }

    /// Offset of the method's deoptimization entry in the image
    #[inline]
    pub fn deopt_offset_in_image(&self) -> i32 {
        self.deopt_offset_in_image
    }
}

/// Entry of the interned object constant table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectConstant {
    /// Deoptimization target method
    Method(SharedMethod),
    /// Interned string
    String(Arc<str>),
    /// Image heap object, identified by its offset in the image heap
    HeapObject(u64),
}

impl ObjectConstant {
    /// Get the method if this entry is one
    #[inline]
    pub fn as_method(&self) -> Option<&SharedMethod> {
        match self {
            Self::Method(method) => Some(method),
            _ => None,
        }
    }
}

/// Value of a constant frame slot
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// No value (void / illegal kinds)
    Illegal,
    /// boolean
    Boolean(bool),
    /// 8-bit integer
    Byte(i8),
    /// 16-bit integer
    Short(i16),
    /// 16-bit character
    Char(u16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Object reference; `None` is null
    Object {
        /// Referenced object
        object: Option<ObjectConstant>,
        /// Whether the reference is stored compressed
        compressed: bool,
    },
}

impl Constant {
    /// The zero / null value of `kind`
    pub fn default_for_kind(kind: ValueKind, compressed: bool) -> Self {
        match kind {
            ValueKind::Boolean => Self::Boolean(false),
            ValueKind::Byte => Self::Byte(0),
            ValueKind::Short => Self::Short(0),
            ValueKind::Char => Self::Char(0),
            ValueKind::Int => Self::Int(0),
            ValueKind::Long => Self::Long(0),
            ValueKind::Float => Self::Float(0.0),
            ValueKind::Double => Self::Double(0.0),
            ValueKind::Object => Self::Object {
                object: None,
                compressed,
            },
            ValueKind::Void | ValueKind::Illegal => Self::Illegal,
        }
    }

    /// Integer constant of `kind` from a raw payload
    ///
    /// Narrow kinds keep the low bits of `raw`.
    pub fn for_integer_kind(kind: ValueKind, raw: i64) -> Self {
        debug_assert!(kind.is_numeric_integer(), "{kind:?} is not an integer kind");
        match kind {
            ValueKind::Boolean => Self::Boolean(raw != 0),
            ValueKind::Byte => Self::Byte(raw as i8),
            ValueKind::Short => Self::Short(raw as i16),
            ValueKind::Char => Self::Char(raw as u16),
            ValueKind::Int => Self::Int(raw as i32),
            _ => Self::Long(raw),
        }
    }

    /// Whether this is the zero / null value of its kind
    pub fn is_default_for_kind(&self) -> bool {
        match self {
            Self::Illegal => true,
            Self::Boolean(v) => !*v,
            Self::Byte(v) => *v == 0,
            Self::Short(v) => *v == 0,
            Self::Char(v) => *v == 0,
            Self::Int(v) => *v == 0,
            Self::Long(v) => *v == 0,
            Self::Float(v) => v.to_bits() == 0,
            Self::Double(v) => v.to_bits() == 0,
            Self::Object { object, .. } => object.is_none(),
        }
    }

    /// Check if this is a null reference
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Object { object: None, .. })
    }
}
