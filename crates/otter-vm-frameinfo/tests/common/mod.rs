//! Test-only writer for frame info slices
#![allow(dead_code)]

use otter_vm_frameinfo::allocator::FrameInfoQueryResultAllocator;
use otter_vm_frameinfo::flags::pack_flags;
use otter_vm_frameinfo::{
    ByteArrayTypeReader, CodeInfo, DummyValueInfoAllocator, FrameInfoQueryResult, FrameInfoState,
    HeapBasedFrameInfoQueryResultAllocator, HeapBasedValueInfoAllocator,
    SingleShotFrameInfoQueryResultAllocator, ValueKind, ValueType, decode_frame_info,
};

/// Offset added to line numbers in compressed entries
pub const LINE_ADDEND: i64 = 3;

/// Byte buffer with LEB128 writers
#[derive(Debug, Default)]
pub struct SliceWriter {
    buf: Vec<u8>,
}

impl SliceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_u1(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn put_uv(&mut self, mut value: u64) -> &mut Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return self;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn put_sv(&mut self, mut value: i64) -> &mut Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
            if done {
                self.buf.push(byte);
                return self;
            }
            self.buf.push(byte | 0x80);
        }
    }

    /// Compressed entry with a plain class index
    pub fn compressed_frame(
        &mut self,
        class_index: i64,
        method_name_index: i64,
        line: i64,
        method_id: i64,
        last: bool,
    ) -> &mut Self {
        self.put_sv(class_index);
        self.compressed_frame_data(method_name_index, line, method_id, None, last)
    }

    /// Compressed entry body: everything after the discriminator
    pub fn compressed_frame_data(
        &mut self,
        method_name_index: i64,
        line: i64,
        method_id: i64,
        successor: Option<usize>,
        last: bool,
    ) -> &mut Self {
        let name = if successor.is_some() {
            -(method_name_index + 1)
        } else {
            method_name_index
        };
        let encoded_line = line + LINE_ADDEND;
        self.put_sv(name)
            .put_sv(if last { -encoded_line } else { encoded_line })
            .put_sv(method_id);
        if let Some(offset) = successor {
            self.put_sv(offset as i64);
        }
        self
    }

    /// Discriminator pointing at a shared entry
    pub fn shared_frame_pointer(&mut self, offset: usize) -> &mut Self {
        self.put_sv(-(offset as i64 + 2))
    }

    /// Value record
    pub fn value(
        &mut self,
        value_type: ValueType,
        kind: ValueKind,
        data: Option<i64>,
    ) -> &mut Self {
        self.flagged_value(value_type, kind, false, false, data)
    }

    pub fn flagged_value(
        &mut self,
        value_type: ValueType,
        kind: ValueKind,
        is_compressed_reference: bool,
        is_eliminated_monitor: bool,
        data: Option<i64>,
    ) -> &mut Self {
        self.put_u1(pack_flags(
            value_type,
            kind,
            is_compressed_reference,
            is_eliminated_monitor,
        ));
        if let Some(data) = data {
            self.put_sv(data);
        }
        self
    }

    /// Uncompressed source reference: class, method name, line, method id
    pub fn source_reference(
        &mut self,
        class_index: i64,
        method_name_index: i64,
        line: i64,
        method_id: u64,
    ) -> &mut Self {
        self.put_sv(class_index)
            .put_sv(method_name_index)
            .put_sv(line)
            .put_uv(method_id)
    }
}

/// Allocator that runs dry after a fixed number of frames
#[derive(Debug)]
pub struct BoundedAllocator {
    pub remaining: usize,
}

impl FrameInfoQueryResultAllocator for BoundedAllocator {
    fn new_frame_info_query_result(&mut self) -> Option<FrameInfoQueryResult> {
        self.remaining = self.remaining.checked_sub(1)?;
        Some(FrameInfoQueryResult::new())
    }
}

/// Decode a whole slice at once onto the heap
pub fn decode_all(info: &CodeInfo, offset: usize) -> Option<FrameInfoQueryResult> {
    let mut reader = ByteArrayTypeReader::new(info.frame_info_encodings(), offset);
    let mut state = FrameInfoState::new();
    decode_frame_info(
        false,
        &mut reader,
        info,
        &mut HeapBasedFrameInfoQueryResultAllocator,
        &mut HeapBasedValueInfoAllocator,
        &mut state,
    )
    .unwrap()
}

/// Decode a slice one frame per call, the way a restricted stack walk does
pub fn decode_stepwise(info: &CodeInfo, offset: usize, keep_values: bool) -> Vec<FrameInfoQueryResult> {
    let mut reader = ByteArrayTypeReader::new(info.frame_info_encodings(), offset);
    let mut state = FrameInfoState::new();
    let mut allocator = SingleShotFrameInfoQueryResultAllocator::new();
    let mut frames = Vec::new();

    loop {
        allocator.reload();
        let frame = if keep_values {
            decode_frame_info(
                false,
                &mut reader,
                info,
                &mut allocator,
                &mut HeapBasedValueInfoAllocator,
                &mut state,
            )
        } else {
            decode_frame_info(
                false,
                &mut reader,
                info,
                &mut allocator,
                &mut DummyValueInfoAllocator,
                &mut state,
            )
        };
        match frame.unwrap() {
            Some(frame) => {
                assert!(frame.caller.is_none());
                frames.push(frame);
            }
            None => return frames,
        }
    }
}

/// Source lines of a chain, innermost first
pub fn lines(frame: &FrameInfoQueryResult) -> Vec<i32> {
    frame.iter().map(|f| f.source_line_number).collect()
}
