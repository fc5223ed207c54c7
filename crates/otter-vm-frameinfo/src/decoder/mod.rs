//! Frame info decoder
//!
//! One call decodes the logical frames of one physical frame. A stack walk
//! calls [`decode_frame_info`] once per physical frame with the same
//! [`FrameInfoState`]; the state carries whatever the next call needs.
//!
//! # Dispatch
//!
//! ```text
//! first call of a walk:  first_value = SV, read once
//!   first_value == -1  → uncompressed slice (values, deopt targets)
//!   otherwise          → compressed slice, first_value is its first discriminator
//! ```

mod compressed;
mod uncompressed;
mod values;

use smallvec::SmallVec;

use crate::allocator::{FrameInfoQueryResultAllocator, ValueInfoAllocator};
use crate::bci::NO_CALLER_BCI;
use crate::code_info::CodeInfo;
use crate::error::{FrameInfoError, Result};
use crate::frame::FrameInfoQueryResult;
use crate::reader::{ByteArrayTypeReader, TypeReader};
use crate::state::{FrameInfoState, is_compressed_frame_slice};

pub use compressed::{
    COMPRESSED_FRAME_POINTER_ADDEND, COMPRESSED_SOURCE_LINE_ADDEND,
    COMPRESSED_UNIQUE_SUCCESSOR_ADDEND,
};

/// Deepest nesting of saved cursor positions the format produces
pub const MAX_CURSOR_DEPTH: usize = 2;

/// Decode the logical frames of one physical frame.
///
/// Returns the innermost frame with its callers linked, or `None` when the
/// slice holds no frames or the allocator had no capacity left. When the
/// allocator runs out mid-chain the frames linked so far are returned.
pub fn decode_frame_info<R, A, V>(
    is_deopt_entry: bool,
    reader: &mut R,
    info: &CodeInfo,
    result_allocator: &mut A,
    value_info_allocator: &mut V,
    state: &mut FrameInfoState,
) -> Result<Option<FrameInfoQueryResult>>
where
    R: TypeReader + ?Sized,
    A: FrameInfoQueryResultAllocator + ?Sized,
    V: ValueInfoAllocator + ?Sized,
{
    if !state.has_first_value {
        state.first_value = reader.get_sv_int()?;
        state.has_first_value = true;
    }

    #[cfg(feature = "frameinfo_logging")]
    tracing::trace!(
        target: "otter::frameinfo",
        offset = reader.get_byte_index(),
        first_value = state.first_value,
        compressed = is_compressed_frame_slice(state.first_value),
        first_frame = state.is_first_frame,
        "decoding frame slice"
    );

    let mut decoder = Decoder {
        reader,
        info,
        result_allocator,
        value_info_allocator,
    };
    let result = if is_compressed_frame_slice(state.first_value) {
        decoder.decode_compressed_frame_info(is_deopt_entry, state)
    } else {
        decoder.decode_uncompressed_frame_info(is_deopt_entry, state)
    };

    #[cfg(feature = "frameinfo_logging")]
    match &result {
        Ok(frames) => tracing::trace!(
            target: "otter::frameinfo",
            frames = frames.as_ref().map_or(0, FrameInfoQueryResult::depth),
            done = state.is_done,
            "frame slice decoded"
        ),
        Err(err) => tracing::debug!(
            target: "otter::frameinfo",
            error = %err,
            "frame slice decoding failed"
        ),
    }

    result
}

/// Check whether the uncompressed slice at `frame_info_index` starts with
/// `search_encoded_bci`. Compressed slices carry no positions and never match.
pub fn is_frame_info_match(
    frame_info_index: usize,
    frame_info_encodings: &[u8],
    search_encoded_bci: i64,
) -> Result<bool> {
    let mut reader = ByteArrayTypeReader::new(frame_info_encodings, frame_info_index);
    let first_value = reader.get_sv_int()?;
    if is_compressed_frame_slice(first_value) {
        return Ok(false);
    }

    let actual_encoded_bci = reader.get_sv()?;
    debug_assert_ne!(actual_encoded_bci, NO_CALLER_BCI);

    Ok(actual_encoded_bci == search_encoded_bci)
}

/// Borrowed collaborators of one decode call
pub(crate) struct Decoder<'a, R: ?Sized, A: ?Sized, V: ?Sized> {
    pub(crate) reader: &'a mut R,
    pub(crate) info: &'a CodeInfo,
    pub(crate) result_allocator: &'a mut A,
    pub(crate) value_info_allocator: &'a mut V,
}

/// Saved cursor positions for jumps into shared data
///
/// Stays inline: the format never nests deeper than [`MAX_CURSOR_DEPTH`].
#[derive(Debug, Default)]
pub(crate) struct CursorStack {
    saved: SmallVec<[usize; MAX_CURSOR_DEPTH]>,
}

impl CursorStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Remember the current position and jump to `byte_index`
    pub(crate) fn push_and_seek<R: TypeReader + ?Sized>(
        &mut self,
        reader: &mut R,
        byte_index: usize,
    ) -> Result<()> {
        if self.saved.len() == MAX_CURSOR_DEPTH {
            return Err(FrameInfoError::CursorDepthExceeded {
                depth: MAX_CURSOR_DEPTH + 1,
            });
        }
        self.saved.push(reader.get_byte_index());
        reader.set_byte_index(byte_index);
        Ok(())
    }

    /// Return to the most recently saved position
    pub(crate) fn pop_and_restore<R: TypeReader + ?Sized>(&mut self, reader: &mut R) {
        if let Some(byte_index) = self.saved.pop() {
            reader.set_byte_index(byte_index);
        }
    }

    /// Return to the first saved position, dropping all others
    pub(crate) fn restore_all<R: TypeReader + ?Sized>(&mut self, reader: &mut R) {
        if let Some(&byte_index) = self.saved.first() {
            reader.set_byte_index(byte_index);
        }
        self.saved.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}
