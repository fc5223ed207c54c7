//! # Otter VM Frame Info
//!
//! Decoder for the compact call-stack metadata stored with compiled code.
//! Given the position of a physical frame's slice in the encoding buffer, it
//! reconstructs the chain of logical (inlined) frames with their source
//! locations, bytecode positions, deoptimization targets and slot values.
//!
//! ## Design Principles
//!
//! - **Two encodings**: compressed slices hold source locations only and
//!   share common frames through back-references; uncompressed slices hold
//!   everything a deoptimizer needs
//! - **Pluggable allocation**: allocator traits let the same decoder build
//!   full chains on the heap or fill a single reused record without
//!   allocating, for use inside signal handlers and GC safepoints
//! - **Read-only tables**: [`CodeInfo`] is immutable once built, so stack
//!   walks decode concurrently; each walk owns its [`FrameInfoState`]
//!
//! ## Example
//!
//! ```
//! use otter_vm_frameinfo::{CodeInfo, FrameInfoQueryResultLoader, HeapBasedFrameInfoQueryResultLoader};
//!
//! let mut builder = CodeInfo::builder();
//! builder.source_class("app.Main");
//! builder.source_method_name("main");
//! // class 0, method 0, last frame at line 10, method id 1
//! builder.append_encoding(&[0x00, 0x00, 0x73, 0x01]);
//! let info = builder.build();
//!
//! let frame = HeapBasedFrameInfoQueryResultLoader
//!     .load(&info, 0, false)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(frame.source_line_number, 10);
//! assert_eq!(frame.source_method_name.as_deref(), Some("main"));
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod bci;
pub mod code_info;
pub mod config;
pub mod constant;
pub mod decoder;
pub mod error;
pub mod flags;
pub mod frame;
pub mod loader;
pub mod reader;
pub mod state;

pub use allocator::{
    DummyValueInfoAllocator, FrameInfoQueryResultAllocator, HeapBasedFrameInfoQueryResultAllocator,
    HeapBasedValueInfoAllocator, SingleShotFrameInfoQueryResultAllocator, ValueInfoAllocator,
};
pub use bci::ReadableBci;
pub use code_info::{CodeInfo, CodeInfoBuilder, InternedTable};
pub use config::FrameInfoConfig;
pub use constant::{Constant, ObjectConstant, SharedMethod};
pub use decoder::{decode_frame_info, is_frame_info_match};
pub use error::{FrameInfoError, Result};
pub use flags::{ValueKind, ValueType};
pub use frame::{FrameInfoQueryResult, Frames, ValueInfo, VirtualObjects};
pub use loader::{
    FrameInfoQueryResultLoader, HeapBasedFrameInfoQueryResultLoader,
    RestrictedFrameInfoQueryResultLoader,
};
pub use reader::{ByteArrayTypeReader, TypeReader};
pub use state::{FrameInfoState, FrameSliceMode};
