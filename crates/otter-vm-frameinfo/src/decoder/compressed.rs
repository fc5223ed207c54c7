//! Compressed frame slices: source locations only
//!
//! ```text
//! frame entry:
//!   [discriminator: SV]            class index, or -(offset + 2) for a shared frame
//!   [method name index: SV]        index, or -(index + 1) if a successor follows
//!   [line: SV]                     ±(line + 3), negative on the last entry of a chain
//!   [method id: SV]
//!   [successor offset: SV]         only when the method name index was negative
//! ```
//!
//! A shared frame pointer jumps to an entry stored once and referenced from
//! many slices. A successor offset continues the chain at another shared
//! entry on the next decode call.

use crate::allocator::{FrameInfoQueryResultAllocator, ValueInfoAllocator};
use crate::bci::NO_LOCAL_INFO_BCI;
use crate::error::{FrameInfoError, Result};
use crate::frame::FrameInfoQueryResult;
use crate::reader::TypeReader;
use crate::state::{FrameInfoState, UNCOMPRESSED_FRAME_SLICE_MARKER};

use super::{CursorStack, Decoder};

/// Offset added before negating a shared frame pointer
pub const COMPRESSED_FRAME_POINTER_ADDEND: i32 = 2;
/// Offset added before negating a method name index that has a successor
pub const COMPRESSED_UNIQUE_SUCCESSOR_ADDEND: i32 = 1;
/// Offset added to a line number before signing it
pub const COMPRESSED_SOURCE_LINE_ADDEND: i32 = 3;

#[inline]
fn is_shared_frame_pointer(discriminator: i32) -> bool {
    discriminator < 0
}

fn decode_shared_frame_offset(discriminator: i32) -> Result<usize> {
    if discriminator >= UNCOMPRESSED_FRAME_SLICE_MARKER {
        return Err(FrameInfoError::InvalidSharedFramePointer {
            value: discriminator,
        });
    }
    // discriminator <= -2, so the negation is non-negative
    Ok(-(discriminator + COMPRESSED_FRAME_POINTER_ADDEND) as usize)
}

#[inline]
fn has_unique_successor(encoded_method_name_index: i32) -> bool {
    encoded_method_name_index < 0
}

#[inline]
fn decode_method_name_index(encoded_method_name_index: i32) -> i32 {
    if has_unique_successor(encoded_method_name_index) {
        -(encoded_method_name_index + COMPRESSED_UNIQUE_SUCCESSOR_ADDEND)
    } else {
        encoded_method_name_index
    }
}

#[inline]
fn is_chain_end(encoded_line: i32) -> bool {
    encoded_line < 0
}

#[inline]
fn decode_line(encoded_line: i32) -> i32 {
    encoded_line
        .wrapping_abs()
        .wrapping_sub(COMPRESSED_SOURCE_LINE_ADDEND)
}

fn decode_successor_offset(value: i32) -> Result<usize> {
    usize::try_from(value).map_err(|_| FrameInfoError::InvalidSuccessorIndex { value })
}

impl<R, A, V> Decoder<'_, R, A, V>
where
    R: TypeReader + ?Sized,
    A: FrameInfoQueryResultAllocator + ?Sized,
    V: ValueInfoAllocator + ?Sized,
{
    pub(super) fn decode_compressed_frame_info(
        &mut self,
        is_deopt_entry: bool,
        state: &mut FrameInfoState,
    ) -> Result<Option<FrameInfoQueryResult>> {
        debug_assert!(
            self.info.config().source_references,
            "compressed frame slices require source references"
        );

        let mut result: Option<FrameInfoQueryResult> = None;
        let mut prev: Option<&mut FrameInfoQueryResult> = None;

        while !state.is_done {
            let Some(mut cur) = self.result_allocator.new_frame_info_query_result() else {
                #[cfg(feature = "frameinfo_logging")]
                tracing::trace!(target: "otter::frameinfo", "frame allocator exhausted");
                break;
            };
            cur.encoded_bci = NO_LOCAL_INFO_BCI;
            cur.is_deopt_entry = is_deopt_entry;

            let mut cursor = CursorStack::new();
            if let Some(successor) = state.successor_index {
                cursor.push_and_seek(&mut *self.reader, successor)?;
            }

            let discriminator = if state.is_first_frame {
                state.first_value
            } else {
                let value = self.reader.get_sv_int()?;
                debug_assert!(
                    !is_deopt_entry,
                    "deoptimization entry must not have inlined frames"
                );
                value
            };

            if is_shared_frame_pointer(discriminator) {
                debug_assert!(
                    cursor.is_empty(),
                    "a successor never starts with a shared frame pointer"
                );
                let offset = decode_shared_frame_offset(discriminator)?;
                cursor.push_and_seek(&mut *self.reader, offset)?;

                let source_class_index = self.reader.get_sv_int()?;
                if is_shared_frame_pointer(source_class_index) {
                    return Err(FrameInfoError::SharedFramePointerChain {
                        offset,
                        value: source_class_index,
                    });
                }
                self.decode_compressed_frame_data(state, source_class_index, &mut cur)?;
                cursor.pop_and_restore(&mut *self.reader);
            } else {
                self.decode_compressed_frame_data(state, discriminator, &mut cur)?;
            }
            cursor.restore_all(&mut *self.reader);

            prev = Some(match prev {
                None => result.insert(cur),
                Some(p) => &mut **p.caller.insert(Box::new(cur)),
            });
            state.is_first_frame = false;
        }

        Ok(result)
    }

    fn decode_compressed_frame_data(
        &mut self,
        state: &mut FrameInfoState,
        source_class_index: i32,
        cur: &mut FrameInfoQueryResult,
    ) -> Result<()> {
        let encoded_method_name_index = self.reader.get_sv_int()?;
        let source_method_name_index = decode_method_name_index(encoded_method_name_index);
        let encoded_line = self.reader.get_sv_int()?;
        let method_id = self.reader.get_sv_int()?;

        cur.source_class = Some(self.info.source_class(source_class_index)?.clone());
        cur.source_method_name =
            Some(self.info.source_method_name(source_method_name_index)?.clone());
        cur.source_class_index = source_class_index;
        cur.source_method_name_index = source_method_name_index;
        cur.source_line_number = decode_line(encoded_line);
        cur.method_id = method_id;

        state.successor_index = if has_unique_successor(encoded_method_name_index) {
            Some(decode_successor_offset(self.reader.get_sv_int()?)?)
        } else {
            None
        };
        state.is_done = is_chain_end(encoded_line);
        debug_assert!(
            !state.is_done || state.successor_index.is_none(),
            "the last entry of a chain has no successor"
        );
        Ok(())
    }
}
