//! Uncompressed frame slice decoding
//!
//! Frames with local value info, deoptimization targets, virtual objects and
//! optional source references.

mod common;

use std::sync::Arc;

use common::{BoundedAllocator, SliceWriter, decode_all, decode_stepwise};
use otter_vm_frameinfo::bci::{NO_CALLER_BCI, NO_LOCAL_INFO_BCI, encode_bci};
use otter_vm_frameinfo::{
    ByteArrayTypeReader, CodeInfo, Constant, FrameInfoConfig, FrameInfoError,
    FrameInfoQueryResult, FrameInfoQueryResultLoader, FrameInfoState, FrameSliceMode,
    HeapBasedFrameInfoQueryResultAllocator, HeapBasedFrameInfoQueryResultLoader,
    HeapBasedValueInfoAllocator, ObjectConstant,
    RestrictedFrameInfoQueryResultLoader, SharedMethod, ValueKind, ValueType, decode_frame_info,
    is_frame_info_match,
};

fn builder() -> otter_vm_frameinfo::CodeInfoBuilder {
    let mut builder = CodeInfo::builder();
    builder.source_class("app.Leaf");
    builder.source_class("app.Root");
    builder.source_method_name("compute");
    builder.source_method_name("main");
    builder
}

/// Frame at bci 12 (during a call) with locals, one virtual object and a
/// caller frame without local info.
fn two_frame_slice() -> SliceWriter {
    let mut w = SliceWriter::new();
    w.put_sv(-1)
        .put_sv(encode_bci(12, true, false))
        // locks, locals, stack
        .put_uv(1)
        .put_uv(2)
        .put_uv(1)
        // deopt target offset
        .put_sv(128)
        .put_uv(4)
        .value(ValueType::StackSlot, ValueKind::Int, Some(8))
        .value(ValueType::Constant, ValueKind::Long, Some(1 << 40))
        .value(ValueType::VirtualObject, ValueKind::Object, Some(0))
        .flagged_value(ValueType::StackSlot, ValueKind::Object, false, true, Some(16))
        // one virtual object with two fields
        .put_uv(1)
        .put_uv(2)
        .value(ValueType::Constant, ValueKind::Int, Some(7))
        .flagged_value(ValueType::DefaultConstant, ValueKind::Object, true, false, None)
        .source_reference(0, 0, 42, 3)
        // caller
        .put_sv(NO_LOCAL_INFO_BCI)
        .source_reference(1, 1, 7, 4)
        .put_sv(NO_CALLER_BCI);
    w
}

fn decode(
    info: &CodeInfo,
    offset: usize,
    is_deopt_entry: bool,
) -> otter_vm_frameinfo::Result<Option<FrameInfoQueryResult>> {
    let mut reader = ByteArrayTypeReader::new(info.frame_info_encodings(), offset);
    decode_frame_info(
        is_deopt_entry,
        &mut reader,
        info,
        &mut HeapBasedFrameInfoQueryResultAllocator,
        &mut HeapBasedValueInfoAllocator,
        &mut FrameInfoState::new(),
    )
}

#[test]
fn test_empty_slice() {
    let mut w = SliceWriter::new();
    w.put_sv(-1).put_sv(NO_CALLER_BCI);
    let mut b = builder();
    b.append_encoding(w.bytes());
    let info = b.build();

    let mut reader = ByteArrayTypeReader::new(info.frame_info_encodings(), 0);
    let mut state = FrameInfoState::new();
    let frame = decode_frame_info(
        false,
        &mut reader,
        &info,
        &mut HeapBasedFrameInfoQueryResultAllocator,
        &mut HeapBasedValueInfoAllocator,
        &mut state,
    )
    .unwrap();

    assert!(frame.is_none());
    assert_eq!(state.mode(), FrameSliceMode::Uncompressed);
}

#[test]
fn test_frame_with_locals() {
    let mut b = builder();
    b.append_encoding(two_frame_slice().bytes());
    let info = b.build();

    let frame = decode_all(&info, 0).unwrap();
    assert_eq!(frame.depth(), 2);

    assert_eq!(frame.bci(), 12);
    assert!(frame.during_call());
    assert!(!frame.rethrow_exception());
    assert!(frame.has_local_value_info());
    assert_eq!(
        (frame.num_locks, frame.num_locals, frame.num_stack),
        (1, 2, 1)
    );
    assert_eq!(frame.deopt_method_offset, 128);
    assert!(frame.deopt_method.is_none());
    assert_eq!(frame.source_line_number, 42);
    assert_eq!(frame.method_id, 3);
    assert_eq!(frame.source_class.as_deref(), Some("app.Leaf"));

    let values = frame.value_infos.as_deref().unwrap();
    assert_eq!(values.len(), 4);
    assert_eq!(values[0].value_type, ValueType::StackSlot);
    assert_eq!(values[0].data, 8);
    assert_eq!(values[1].value, Some(Constant::Long(1 << 40)));
    assert!(values[3].is_eliminated_monitor);
    assert_eq!(values[3].kind, ValueKind::Object);

    let fields = frame.virtual_object(&values[2]).unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].value, Some(Constant::Int(7)));
    assert_eq!(
        fields[1].value,
        Some(Constant::Object {
            object: None,
            compressed: true,
        })
    );

    let caller = frame.caller().unwrap();
    assert_eq!(caller.encoded_bci, NO_LOCAL_INFO_BCI);
    assert!(!caller.has_local_value_info());
    assert!(caller.value_infos.is_none());
    assert_eq!(caller.source_method_name.as_deref(), Some("main"));
    assert_eq!(caller.source_line_number, 7);
    assert_eq!(caller.method_id, 4);
    assert!(Arc::ptr_eq(
        frame.virtual_objects.as_ref().unwrap(),
        caller.virtual_objects.as_ref().unwrap()
    ));
}

#[test]
fn test_virtual_objects_shared_across_calls() {
    let mut b = builder();
    b.append_encoding(two_frame_slice().bytes());
    let info = b.build();

    let steps = decode_stepwise(&info, 0, true);
    assert_eq!(steps.len(), 2);
    let first = steps[0].virtual_objects.as_ref().unwrap();
    let second = steps[1].virtual_objects.as_ref().unwrap();
    assert!(Arc::ptr_eq(first, second));
    assert_eq!(first.len(), 1);
}

#[test]
fn test_stepwise_without_values() {
    let mut b = builder();
    b.append_encoding(two_frame_slice().bytes());
    let info = b.build();
    let full = decode_all(&info, 0).unwrap();

    let steps = decode_stepwise(&info, 0, false);
    assert_eq!(steps.len(), 2);
    for (step, expected) in steps.iter().zip(full.iter()) {
        assert_eq!(step.encoded_bci, expected.encoded_bci);
        assert_eq!(step.num_locals, expected.num_locals);
        assert_eq!(step.source_line_number, expected.source_line_number);
        assert!(step.value_infos.is_none());
        assert!(step.virtual_objects.is_none());
    }
}

#[test]
fn test_deopt_method_reference() {
    let mut b = builder();
    let method = SharedMethod::new("app.Leaf.compute", 256);
    let index = b.object_constant(ObjectConstant::Method(method.clone()));
    let mut w = SliceWriter::new();
    w.put_sv(-1)
        .put_sv(encode_bci(3, false, false))
        .put_uv(0)
        .put_uv(0)
        .put_uv(0)
        .put_sv(-1 - i64::from(index))
        .put_uv(0)
        .put_uv(0)
        .source_reference(0, 0, 5, 1)
        .put_sv(NO_CALLER_BCI);
    b.append_encoding(w.bytes());
    let info = b.build();

    let frame = decode(&info, 0, true).unwrap().unwrap();
    assert!(frame.is_deopt_entry);
    assert_eq!(frame.bci(), 3);
    assert_eq!(frame.deopt_method_offset, 256);
    assert_eq!(frame.deopt_method, Some(method));
    assert_eq!(frame.value_infos.as_deref(), Some(&[][..]));
    assert_eq!(frame.virtual_objects.as_deref().map(<[_]>::len), Some(0));
}

#[test]
fn test_deopt_reference_must_be_a_method() {
    let mut b = builder();
    b.object_constant(ObjectConstant::String("not a method".into()));
    let mut w = SliceWriter::new();
    w.put_sv(-1)
        .put_sv(encode_bci(0, false, false))
        .put_uv(0)
        .put_uv(0)
        .put_uv(0)
        .put_sv(-1);
    b.append_encoding(w.bytes());
    let info = b.build();

    assert_eq!(
        decode(&info, 0, false),
        Err(FrameInfoError::NotAMethod { index: 0 })
    );
}

#[test]
fn test_source_references_disabled() {
    let mut b = builder().config(FrameInfoConfig::new().source_references(false));
    let mut w = SliceWriter::new();
    w.put_sv(-1)
        .put_sv(NO_LOCAL_INFO_BCI)
        .put_sv(NO_LOCAL_INFO_BCI)
        .put_sv(NO_CALLER_BCI);
    b.append_encoding(w.bytes());
    let info = b.build();

    let frame = decode(&info, 0, false).unwrap().unwrap();
    assert_eq!(frame.depth(), 2);
    for f in &frame {
        assert!(f.source_class.is_none());
        assert!(f.source_method_name.is_none());
        assert_eq!(f.source_line_number, -1);
        assert_eq!(f.method_id, -1);
    }
}

#[test]
fn test_invalid_value_kind() {
    let mut b = builder();
    let mut w = SliceWriter::new();
    w.put_sv(-1)
        .put_sv(encode_bci(0, false, false))
        .put_uv(0)
        .put_uv(1)
        .put_uv(0)
        .put_sv(0)
        .put_uv(1)
        // StackSlot with kind 11
        .put_u1((11 << 3) | 1);
    b.append_encoding(w.bytes());
    let info = b.build();

    assert_eq!(
        decode(&info, 0, false),
        Err(FrameInfoError::InvalidValueKind { kind: 11 })
    );
}

#[test]
fn test_bounded_allocator_stops_before_caller() {
    let mut b = builder();
    b.append_encoding(two_frame_slice().bytes());
    let info = b.build();

    let mut reader = ByteArrayTypeReader::new(info.frame_info_encodings(), 0);
    let mut state = FrameInfoState::new();
    let frame = decode_frame_info(
        false,
        &mut reader,
        &info,
        &mut BoundedAllocator { remaining: 1 },
        &mut HeapBasedValueInfoAllocator,
        &mut state,
    )
    .unwrap()
    .unwrap();
    assert_eq!(frame.depth(), 1);
    assert_eq!(frame.source_line_number, 42);
    assert!(!state.is_first_frame);
}

#[test]
fn test_resume_after_call_without_frames() {
    let mut b = builder();
    b.append_encoding(two_frame_slice().bytes());
    let info = b.build();

    let mut reader = ByteArrayTypeReader::new(info.frame_info_encodings(), 0);
    let mut state = FrameInfoState::new();
    let none = decode_frame_info(
        false,
        &mut reader,
        &info,
        &mut BoundedAllocator { remaining: 0 },
        &mut HeapBasedValueInfoAllocator,
        &mut state,
    )
    .unwrap();
    assert!(none.is_none());
    assert!(state.is_first_frame);
    assert_eq!(state.mode(), FrameSliceMode::Uncompressed);

    let frame = decode_frame_info(
        false,
        &mut reader,
        &info,
        &mut HeapBasedFrameInfoQueryResultAllocator,
        &mut HeapBasedValueInfoAllocator,
        &mut state,
    )
    .unwrap()
    .unwrap();
    assert_eq!(frame.depth(), 2);
    assert_eq!(frame.virtual_objects.as_deref().map(<[_]>::len), Some(1));
    assert_eq!(Some(frame), decode_all(&info, 0));
}

#[test]
fn test_value_count_beyond_input() {
    let mut w = SliceWriter::new();
    w.put_sv(-1)
        .put_sv(encode_bci(0, false, false))
        .put_uv(0)
        .put_uv(0)
        .put_uv(0)
        .put_sv(0)
        .put_uv(u64::from(u32::MAX));
    let mut b = builder();
    b.append_encoding(w.bytes());
    let info = b.build();

    let mut loader = HeapBasedFrameInfoQueryResultLoader;
    assert_eq!(
        loader.load(&info, 0, false),
        Err(FrameInfoError::UnexpectedEnd { offset: w.len() })
    );
}

#[test]
fn test_virtual_object_count_beyond_input() {
    let mut w = SliceWriter::new();
    w.put_sv(-1)
        .put_sv(encode_bci(0, false, false))
        .put_uv(0)
        .put_uv(0)
        .put_uv(0)
        .put_sv(0)
        .put_uv(0)
        .put_uv(u64::from(u32::MAX));
    let mut b = builder();
    b.append_encoding(w.bytes());
    let info = b.build();

    assert_eq!(
        decode(&info, 0, false),
        Err(FrameInfoError::UnexpectedEnd { offset: w.len() })
    );
}

#[test]
fn test_frame_info_match() {
    let mut b = builder();
    let compressed = b.append_encoding(&[0x00, 0x00, 0x73, 0x01]);
    let uncompressed = b.append_encoding(two_frame_slice().bytes());
    let info = b.build();
    let encodings = info.frame_info_encodings();

    assert!(is_frame_info_match(uncompressed, encodings, encode_bci(12, true, false)).unwrap());
    assert!(!is_frame_info_match(uncompressed, encodings, encode_bci(12, false, false)).unwrap());
    assert!(!is_frame_info_match(compressed, encodings, NO_LOCAL_INFO_BCI).unwrap());
}

#[test]
fn test_restricted_loader_skips_values() {
    let mut b = builder();
    b.append_encoding(two_frame_slice().bytes());
    let info = b.build();

    let mut loader = RestrictedFrameInfoQueryResultLoader::new();
    let frame = loader.load(&info, 0, false).unwrap().unwrap();
    assert_eq!(frame.bci(), 12);
    assert_eq!(frame.num_locals, 2);
    assert_eq!(frame.deopt_method_offset, 128);
    assert_eq!(frame.source_line_number, 42);
    assert!(frame.value_infos.is_none());
    assert!(frame.virtual_objects.is_none());
    assert!(frame.caller().is_none());
}
