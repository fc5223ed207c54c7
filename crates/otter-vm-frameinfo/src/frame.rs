//! Decoded logical frames and their value records

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::bci::{self, NO_LOCAL_INFO_BCI};
use crate::constant::{Constant, SharedMethod};
use crate::flags::{ValueKind, ValueType};

/// Virtual objects of one stack walk, each a list of field values.
///
/// Decoded once on the first frame and shared by every frame of the walk.
pub type VirtualObjects = Arc<[Vec<ValueInfo>]>;

/// One decoded value record
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInfo {
    /// How the value is stored
    pub value_type: ValueType,
    /// Kind of the value
    pub kind: ValueKind,
    /// Reference is stored compressed
    pub is_compressed_reference: bool,
    /// Slot describes a lock whose monitor was eliminated
    pub is_eliminated_monitor: bool,
    /// Raw payload: slot index, constant bits, object constant index or
    /// virtual object index, depending on `value_type`
    pub data: i64,
    /// Materialized constant, for constant and default-constant records
    pub value: Option<Constant>,
}

impl ValueInfo {
    /// Create an empty (illegal) value record
    pub const fn new() -> Self {
        Self {
            value_type: ValueType::Illegal,
            kind: ValueKind::Illegal,
            is_compressed_reference: false,
            is_eliminated_monitor: false,
            data: 0,
            value: None,
        }
    }
}

impl Default for ValueInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// One logical (possibly inlined) frame
///
/// `caller` links to the next outer inlined frame. The last frame of a chain
/// belongs to the physical frame itself; its caller is found by the stack
/// walker, not by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfoQueryResult {
    /// Next outer inlined frame
    pub caller: Option<Box<FrameInfoQueryResult>>,
    /// Method to resume in after deoptimization, when encoded as a reference
    pub deopt_method: Option<SharedMethod>,
    /// Offset of the deoptimization target
    pub deopt_method_offset: i32,
    /// Encoded source position, see [`crate::bci`]
    pub encoded_bci: i64,
    /// The frame is itself a deoptimization entry point
    pub is_deopt_entry: bool,
    /// Number of local slots
    pub num_locals: u32,
    /// Number of expression stack slots
    pub num_stack: u32,
    /// Number of held locks
    pub num_locks: u32,
    /// Locals, then stack slots, then locks
    pub value_infos: Option<Vec<ValueInfo>>,
    /// Virtual objects of the walk
    pub virtual_objects: Option<VirtualObjects>,
    /// Source class name
    pub source_class: Option<Arc<str>>,
    /// Source method name
    pub source_method_name: Option<Arc<str>>,
    /// Source line, or -1
    pub source_line_number: i32,
    /// Index into the source class table, or -1
    pub source_class_index: i32,
    /// Index into the source method name table, or -1
    pub source_method_name_index: i32,
    /// Method identifier, or -1
    pub method_id: i32,
}

impl FrameInfoQueryResult {
    /// Create an empty record. Never allocates.
    pub const fn new() -> Self {
        Self {
            caller: None,
            deopt_method: None,
            deopt_method_offset: 0,
            encoded_bci: -1,
            is_deopt_entry: false,
            num_locals: 0,
            num_stack: 0,
            num_locks: 0,
            value_infos: None,
            virtual_objects: None,
            source_class: None,
            source_method_name: None,
            source_line_number: -1,
            source_class_index: -1,
            source_method_name_index: -1,
            method_id: -1,
        }
    }

    /// Next outer inlined frame
    #[inline]
    pub fn caller(&self) -> Option<&FrameInfoQueryResult> {
        self.caller.as_deref()
    }

    /// Bytecode index
    #[inline]
    pub fn bci(&self) -> i32 {
        bci::decode_bci(self.encoded_bci)
    }

    /// Stopped inside a call
    #[inline]
    pub fn during_call(&self) -> bool {
        bci::decode_during_call(self.encoded_bci)
    }

    /// Rethrows an exception on resume
    #[inline]
    pub fn rethrow_exception(&self) -> bool {
        bci::decode_rethrow_exception(self.encoded_bci)
    }

    /// Whether locals, stack and locks were encoded for this frame
    #[inline]
    pub fn has_local_value_info(&self) -> bool {
        self.encoded_bci != NO_LOCAL_INFO_BCI
    }

    /// Field values of the virtual object a value record points at
    pub fn virtual_object(&self, value: &ValueInfo) -> Option<&[ValueInfo]> {
        if value.value_type != ValueType::VirtualObject {
            return None;
        }
        let objects = self.virtual_objects.as_deref()?;
        let index = usize::try_from(value.data).ok()?;
        objects.get(index).map(Vec::as_slice)
    }

    /// This frame followed by its callers
    pub fn iter(&self) -> Frames<'_> {
        Frames { next: Some(self) }
    }

    /// Number of frames in the chain starting here
    pub fn depth(&self) -> usize {
        self.iter().count()
    }
}

impl Default for FrameInfoQueryResult {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a FrameInfoQueryResult {
    type Item = &'a FrameInfoQueryResult;
    type IntoIter = Frames<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a frame and its callers
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    next: Option<&'a FrameInfoQueryResult>,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a FrameInfoQueryResult;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next?;
        self.next = frame.caller();
        Some(frame)
    }
}

impl FusedIterator for Frames<'_> {}
