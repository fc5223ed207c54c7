//! One-shot frame info lookups
//!
//! A loader decodes the frame chain of a single slice, starting from a fresh
//! walk state. Two regimes:
//!
//! - [`HeapBasedFrameInfoQueryResultLoader`]: the whole chain with values,
//!   returned by value
//! - [`RestrictedFrameInfoQueryResultLoader`]: the innermost frame only,
//!   decoded into a reused record without allocating; usable where the heap
//!   must not be touched

use std::borrow::Borrow;

use crate::allocator::{
    DummyValueInfoAllocator, HeapBasedFrameInfoQueryResultAllocator,
    HeapBasedValueInfoAllocator, SingleShotFrameInfoQueryResultAllocator,
};
use crate::code_info::CodeInfo;
use crate::decoder::decode_frame_info;
use crate::error::Result;
use crate::frame::FrameInfoQueryResult;
use crate::reader::ByteArrayTypeReader;
use crate::state::FrameInfoState;

/// Decodes the slice at a frame info index
pub trait FrameInfoQueryResultLoader {
    /// What a load hands back: an owned chain or a borrow of loader storage
    type Output<'a>: Borrow<FrameInfoQueryResult>
    where
        Self: 'a;

    /// Decode the slice starting at `frame_info_index` in `info`'s encodings
    fn load(
        &mut self,
        info: &CodeInfo,
        frame_info_index: usize,
        is_deopt_entry: bool,
    ) -> Result<Option<Self::Output<'_>>>;
}

/// Decodes full chains onto the heap
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapBasedFrameInfoQueryResultLoader;

impl FrameInfoQueryResultLoader for HeapBasedFrameInfoQueryResultLoader {
    type Output<'a> = FrameInfoQueryResult;

    fn load(
        &mut self,
        info: &CodeInfo,
        frame_info_index: usize,
        is_deopt_entry: bool,
    ) -> Result<Option<FrameInfoQueryResult>> {
        let mut reader = ByteArrayTypeReader::new(info.frame_info_encodings(), frame_info_index);
        let mut state = FrameInfoState::new();
        decode_frame_info(
            is_deopt_entry,
            &mut reader,
            info,
            &mut HeapBasedFrameInfoQueryResultAllocator,
            &mut HeapBasedValueInfoAllocator,
            &mut state,
        )
    }
}

/// Decodes the innermost frame into reused storage
///
/// The returned borrow ends at the next [`load`](FrameInfoQueryResultLoader::load).
/// Value records and virtual objects are skipped, so the result carries
/// positions, counts, deoptimization targets and source references only.
#[derive(Debug, Default)]
pub struct RestrictedFrameInfoQueryResultLoader {
    state: FrameInfoState,
    frame_allocator: SingleShotFrameInfoQueryResultAllocator,
    value_allocator: DummyValueInfoAllocator,
    result: Option<FrameInfoQueryResult>,
}

impl RestrictedFrameInfoQueryResultLoader {
    /// Create a loader with empty storage
    pub const fn new() -> Self {
        Self {
            state: FrameInfoState::new(),
            frame_allocator: SingleShotFrameInfoQueryResultAllocator::new(),
            value_allocator: DummyValueInfoAllocator,
            result: None,
        }
    }
}

impl FrameInfoQueryResultLoader for RestrictedFrameInfoQueryResultLoader {
    type Output<'a> = &'a FrameInfoQueryResult;

    fn load(
        &mut self,
        info: &CodeInfo,
        frame_info_index: usize,
        is_deopt_entry: bool,
    ) -> Result<Option<&FrameInfoQueryResult>> {
        self.state.reset();
        self.frame_allocator.reload();
        self.result = None;

        let mut reader = ByteArrayTypeReader::new(info.frame_info_encodings(), frame_info_index);
        self.result = decode_frame_info(
            is_deopt_entry,
            &mut reader,
            info,
            &mut self.frame_allocator,
            &mut self.value_allocator,
            &mut self.state,
        )?;
        Ok(self.result.as_ref())
    }
}
