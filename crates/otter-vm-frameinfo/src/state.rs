//! Decode state carried across the physical frames of one stack walk

use crate::frame::VirtualObjects;

/// Leading value of an uncompressed frame slice. Any other leading value
/// starts a compressed slice and doubles as its first discriminator.
pub const UNCOMPRESSED_FRAME_SLICE_MARKER: i32 = -1;

/// Whether a slice's leading value selects the compressed encoding
#[inline]
pub const fn is_compressed_frame_slice(first_value: i32) -> bool {
    first_value != UNCOMPRESSED_FRAME_SLICE_MARKER
}

/// Which decoder the next call is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSliceMode {
    /// The leading value has not been read yet
    NeedFirstValue,
    /// Compressed slice: source locations only
    Compressed,
    /// Uncompressed slice: values and deoptimization targets
    Uncompressed,
}

/// Caller-owned decode state
///
/// Reset once at the start of a walk, never between the calls of one walk.
/// One state per walk: states must not be shared between concurrent walks.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfoState {
    /// No frame of this walk has been decoded yet
    pub is_first_frame: bool,
    /// The leading value of the slice has been read
    pub has_first_value: bool,
    /// Leading value of the slice, read on the first call
    pub first_value: i32,
    /// A compressed chain reached its terminal entry
    pub is_done: bool,
    /// Offset of a pending unique shared frame successor
    pub successor_index: Option<usize>,
    /// Virtual objects decoded on the first frame of the walk
    pub virtual_objects: Option<VirtualObjects>,
}

impl FrameInfoState {
    /// Create a state for a new walk
    pub const fn new() -> Self {
        Self {
            is_first_frame: true,
            has_first_value: false,
            first_value: 0,
            is_done: false,
            successor_index: None,
            virtual_objects: None,
        }
    }

    /// Prepare for a new walk
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current routing decision
    pub fn mode(&self) -> FrameSliceMode {
        if !self.has_first_value {
            FrameSliceMode::NeedFirstValue
        } else if is_compressed_frame_slice(self.first_value) {
            FrameSliceMode::Compressed
        } else {
            FrameSliceMode::Uncompressed
        }
    }
}

impl Default for FrameInfoState {
    fn default() -> Self {
        Self::new()
    }
}
