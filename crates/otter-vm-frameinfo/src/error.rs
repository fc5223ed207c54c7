//! Frame info decoding errors
//!
//! Every variant carries plain integers only, so building an error never
//! touches the heap. The restricted (allocation-free) decode path relies on it.

use thiserror::Error;

/// Errors that can occur while decoding frame info
///
/// None of these are retryable: the encoding is immutable, so an error means
/// the buffer is corrupt or the encoder and decoder disagree on the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameInfoError {
    /// A read ran past the end of the encoding buffer
    #[error("Unexpected end of frame info at offset {offset}")]
    UnexpectedEnd {
        /// Byte offset of the failed read
        offset: usize,
    },

    /// A variable-length integer used more than 64 bits
    #[error("Variable-length integer at offset {offset} overflows 64 bits")]
    VarIntOverflow {
        /// Byte offset where the integer starts
        offset: usize,
    },

    /// A decoded value does not fit the 32-bit field it is read into
    #[error("Value {value} does not fit in 32 bits")]
    IntOutOfRange {
        /// The offending value
        value: i64,
    },

    /// Representation tag of a value record is not a known value type
    #[error("Invalid value type tag: {tag}")]
    InvalidValueType {
        /// Raw tag bits
        tag: u8,
    },

    /// Kind bits of a value record name no value kind
    #[error("Invalid value kind: {kind}")]
    InvalidValueKind {
        /// Raw kind bits
        kind: u8,
    },

    /// A shared frame pointer leads to another shared frame pointer
    #[error("Shared frame at offset {offset} starts with another shared frame pointer ({value})")]
    SharedFramePointerChain {
        /// Offset of the shared frame
        offset: usize,
        /// Discriminator found there
        value: i32,
    },

    /// A negative discriminator is not below the uncompressed slice marker
    #[error("Invalid shared frame pointer: {value}")]
    InvalidSharedFramePointer {
        /// The discriminator
        value: i32,
    },

    /// A unique shared frame successor offset is negative
    #[error("Invalid shared frame successor offset: {value}")]
    InvalidSuccessorIndex {
        /// The offset as read
        value: i32,
    },

    /// Source class index outside the interned class table
    #[error("Source class index {index} out of range")]
    SourceClassIndex {
        /// The index
        index: i32,
    },

    /// Source method name index outside the interned name table
    #[error("Source method name index {index} out of range")]
    SourceMethodNameIndex {
        /// The index
        index: i32,
    },

    /// Object constant index outside the object constant table
    #[error("Object constant index {index} out of range")]
    ObjectConstantIndex {
        /// The index
        index: i64,
    },

    /// Deoptimization target reference does not name a method
    #[error("Object constant {index} is not a method")]
    NotAMethod {
        /// The index
        index: i64,
    },

    /// Saved cursor positions nested deeper than the format allows
    #[error("Cursor save depth {depth} exceeds the format limit")]
    CursorDepthExceeded {
        /// Depth that was attempted
        depth: usize,
    },
}

/// Result type for frame info operations
pub type Result<T> = std::result::Result<T, FrameInfoError>;
