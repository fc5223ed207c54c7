//! Value record flags byte
//!
//! Layout, least significant bit first:
//!
//! ```text
//!  7   6 5 4 3   2 1 0
//! [C] [ kind  ] [type ]
//! ```
//!
//! - `type` (3 bits): [`ValueType`] ordinal
//! - `kind` (4 bits): [`ValueKind`] ordinal, or [`IS_ELIMINATED_MONITOR_KIND_VALUE`]
//! - `C` (1 bit): the value is a compressed reference

use serde::{Deserialize, Serialize};

use crate::error::{FrameInfoError, Result};

/// Width of the value type field
pub const TYPE_BITS: u32 = 3;
/// Position of the value type field
pub const TYPE_SHIFT: u32 = 0;
/// Value type field, in place
pub const TYPE_MASK_IN_PLACE: u8 = ((1 << TYPE_BITS) - 1) << TYPE_SHIFT;

/// Width of the kind field
pub const KIND_BITS: u32 = 4;
/// Position of the kind field
pub const KIND_SHIFT: u32 = TYPE_SHIFT + TYPE_BITS;
/// Kind field, in place
pub const KIND_MASK_IN_PLACE: u8 = ((1 << KIND_BITS) - 1) << KIND_SHIFT;

/// Kind value no [`ValueKind`] uses; marks an eliminated monitor.
///
/// The kind of a monitor is always [`ValueKind::Object`].
pub const IS_ELIMINATED_MONITOR_KIND_VALUE: u8 = 15;

/// Width of the compressed reference flag
pub const IS_COMPRESSED_REFERENCE_BITS: u32 = 1;
/// Position of the compressed reference flag
pub const IS_COMPRESSED_REFERENCE_SHIFT: u32 = KIND_SHIFT + KIND_BITS;
/// Compressed reference flag, in place
pub const IS_COMPRESSED_REFERENCE_MASK_IN_PLACE: u8 =
    ((1 << IS_COMPRESSED_REFERENCE_BITS) - 1) << IS_COMPRESSED_REFERENCE_SHIFT;

/// Kind of a value held in a frame slot
///
/// Ordinals are part of the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueKind {
    /// boolean
    Boolean = 0,
    /// 8-bit signed integer
    Byte = 1,
    /// 16-bit signed integer
    Short = 2,
    /// 16-bit unsigned character
    Char = 3,
    /// 32-bit signed integer
    Int = 4,
    /// 32-bit IEEE float
    Float = 5,
    /// 64-bit signed integer
    Long = 6,
    /// 64-bit IEEE double
    Double = 7,
    /// Object reference
    Object = 8,
    /// No value
    Void = 9,
    /// Unused slot
    #[default]
    Illegal = 10,
}

impl ValueKind {
    const VALUES: [ValueKind; 11] = [
        ValueKind::Boolean,
        ValueKind::Byte,
        ValueKind::Short,
        ValueKind::Char,
        ValueKind::Int,
        ValueKind::Float,
        ValueKind::Long,
        ValueKind::Double,
        ValueKind::Object,
        ValueKind::Void,
        ValueKind::Illegal,
    ];

    /// Look up a kind by ordinal
    #[inline]
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::VALUES.get(ordinal as usize).copied()
    }

    /// Ordinal used in the flags byte
    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Integer kinds whose constants are sign- or zero-extended payloads
    #[inline]
    pub const fn is_numeric_integer(self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Byte | Self::Short | Self::Char | Self::Int | Self::Long
        )
    }
}

/// How a value record stores its value
///
/// Ordinals are part of the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    /// No value
    #[default]
    Illegal = 0,
    /// Value lives in a stack slot or register; data is its index
    StackSlot = 1,
    /// Constant; data is the raw bits or an object constant index
    Constant = 2,
    /// The default (zero / null) value of the kind
    DefaultConstant = 3,
    /// Reference to a virtual object; data is its index in the walk's table
    VirtualObject = 4,
}

impl ValueType {
    const VALUES: [ValueType; 5] = [
        ValueType::Illegal,
        ValueType::StackSlot,
        ValueType::Constant,
        ValueType::DefaultConstant,
        ValueType::VirtualObject,
    ];

    /// Look up a type by ordinal
    #[inline]
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::VALUES.get(ordinal as usize).copied()
    }

    /// Ordinal used in the flags byte
    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Whether a payload follows the flags byte
    #[inline]
    pub const fn has_data(self) -> bool {
        matches!(self, Self::StackSlot | Self::Constant | Self::VirtualObject)
    }
}

/// Extract the value type
#[inline]
pub fn extract_type(flags: u8) -> Result<ValueType> {
    let tag = (flags & TYPE_MASK_IN_PLACE) >> TYPE_SHIFT;
    ValueType::from_ordinal(tag).ok_or(FrameInfoError::InvalidValueType { tag })
}

/// Extract the value kind; an eliminated monitor reads as [`ValueKind::Object`]
#[inline]
pub fn extract_kind(flags: u8) -> Result<ValueKind> {
    let kind = (flags & KIND_MASK_IN_PLACE) >> KIND_SHIFT;
    if kind == IS_ELIMINATED_MONITOR_KIND_VALUE {
        return Ok(ValueKind::Object);
    }
    ValueKind::from_ordinal(kind).ok_or(FrameInfoError::InvalidValueKind { kind })
}

/// Extract the compressed reference flag
#[inline]
pub fn extract_is_compressed_reference(flags: u8) -> bool {
    flags & IS_COMPRESSED_REFERENCE_MASK_IN_PLACE != 0
}

/// Extract the eliminated monitor flag
#[inline]
pub fn extract_is_eliminated_monitor(flags: u8) -> bool {
    (flags & KIND_MASK_IN_PLACE) >> KIND_SHIFT == IS_ELIMINATED_MONITOR_KIND_VALUE
}

/// Pack a flags byte. Inverse of the `extract_*` functions.
///
/// An eliminated monitor stores [`IS_ELIMINATED_MONITOR_KIND_VALUE`] in place
/// of `kind`.
pub fn pack_flags(
    value_type: ValueType,
    kind: ValueKind,
    is_compressed_reference: bool,
    is_eliminated_monitor: bool,
) -> u8 {
    let kind_bits = if is_eliminated_monitor {
        IS_ELIMINATED_MONITOR_KIND_VALUE
    } else {
        kind.ordinal()
    };
    (value_type.ordinal() << TYPE_SHIFT)
        | (kind_bits << KIND_SHIFT)
        | ((is_compressed_reference as u8) << IS_COMPRESSED_REFERENCE_SHIFT)
}
