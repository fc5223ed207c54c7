//! Result factories for the decoder
//!
//! The decoder never creates records itself. It asks a
//! [`FrameInfoQueryResultAllocator`] for frames and a [`ValueInfoAllocator`]
//! for value storage, so the same decoding logic serves both regimes:
//!
//! - heap-based: every request succeeds and values are materialized
//! - restricted: one frame per reload, no value storage, nothing allocated
//!
//! An allocator answering `None` is not an error. The decoder stops and
//! returns the frames it already linked.

use crate::code_info::CodeInfo;
use crate::constant::Constant;
use crate::error::{FrameInfoError, Result};
use crate::flags::{ValueKind, ValueType};
use crate::frame::{FrameInfoQueryResult, ValueInfo};

/// Source of frame records
pub trait FrameInfoQueryResultAllocator {
    /// A blank record, or `None` once capacity is exhausted
    fn new_frame_info_query_result(&mut self) -> Option<FrameInfoQueryResult>;
}

/// Source of value record storage and constant materialization
pub trait ValueInfoAllocator {
    /// Storage with room for `len` value records, or `None` to decode without
    /// keeping them
    fn new_value_info_array(&mut self, len: usize) -> Option<Vec<ValueInfo>>;

    /// Storage with room for `len` virtual objects, or `None` to skip them
    fn new_value_info_array_array(&mut self, len: usize) -> Option<Vec<Vec<ValueInfo>>>;

    /// Fill in `value_info.value` from its type, kind and payload
    fn decode_constant(&mut self, value_info: &mut ValueInfo, info: &CodeInfo) -> Result<()>;
}

/// Allocates every requested frame on the heap
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapBasedFrameInfoQueryResultAllocator;

impl FrameInfoQueryResultAllocator for HeapBasedFrameInfoQueryResultAllocator {
    #[inline]
    fn new_frame_info_query_result(&mut self) -> Option<FrameInfoQueryResult> {
        Some(FrameInfoQueryResult::new())
    }
}

/// Hands out a single frame per [`reload`](Self::reload)
///
/// Used where allocation is forbidden: a single frame never needs a boxed
/// caller link.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleShotFrameInfoQueryResultAllocator {
    fired: bool,
}

impl SingleShotFrameInfoQueryResultAllocator {
    /// Create an allocator with its frame available
    pub const fn new() -> Self {
        Self { fired: false }
    }

    /// Make the frame available again
    #[inline]
    pub fn reload(&mut self) {
        self.fired = false;
    }
}

impl FrameInfoQueryResultAllocator for SingleShotFrameInfoQueryResultAllocator {
    #[inline]
    fn new_frame_info_query_result(&mut self) -> Option<FrameInfoQueryResult> {
        if self.fired {
            return None;
        }
        self.fired = true;
        Some(FrameInfoQueryResult::new())
    }
}

/// Keeps every value record and materializes constants
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapBasedValueInfoAllocator;

fn as_s4(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| FrameInfoError::IntOutOfRange { value })
}

impl ValueInfoAllocator for HeapBasedValueInfoAllocator {
    fn new_value_info_array(&mut self, len: usize) -> Option<Vec<ValueInfo>> {
        Some(Vec::with_capacity(len))
    }

    fn new_value_info_array_array(&mut self, len: usize) -> Option<Vec<Vec<ValueInfo>>> {
        Some(Vec::with_capacity(len))
    }

    fn decode_constant(&mut self, value_info: &mut ValueInfo, info: &CodeInfo) -> Result<()> {
        let compressed = value_info.is_compressed_reference;
        let value = match value_info.value_type {
            ValueType::DefaultConstant => Constant::default_for_kind(value_info.kind, compressed),
            ValueType::Constant => match value_info.kind {
                ValueKind::Object => {
                    let index = as_s4(value_info.data)?;
                    let object = info.object_constant(i64::from(index))?.clone();
                    Constant::Object {
                        object: Some(object),
                        compressed,
                    }
                }
                ValueKind::Float => Constant::Float(f32::from_bits(as_s4(value_info.data)? as u32)),
                ValueKind::Double => Constant::Double(f64::from_bits(value_info.data as u64)),
                kind => Constant::for_integer_kind(kind, value_info.data),
            },
            ValueType::Illegal | ValueType::StackSlot | ValueType::VirtualObject => return Ok(()),
        };
        value_info.value = Some(value);
        Ok(())
    }
}

/// Reads past value records without keeping or materializing anything
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyValueInfoAllocator;

impl ValueInfoAllocator for DummyValueInfoAllocator {
    #[inline]
    fn new_value_info_array(&mut self, _len: usize) -> Option<Vec<ValueInfo>> {
        None
    }

    #[inline]
    fn new_value_info_array_array(&mut self, _len: usize) -> Option<Vec<Vec<ValueInfo>>> {
        None
    }

    #[inline]
    fn decode_constant(&mut self, _value_info: &mut ValueInfo, _info: &CodeInfo) -> Result<()> {
        Ok(())
    }
}
