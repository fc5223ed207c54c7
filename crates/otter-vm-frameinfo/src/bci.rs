//! Encoded source positions
//!
//! An encoded position packs the bytecode index with two flags:
//! `(bci << BCI_SHIFT) | (during_call << 1) | rethrow_exception`.

use std::fmt;

/// Shift of the bytecode index inside an encoded position
pub const BCI_SHIFT: u32 = 2;
/// Set when the frame is stopped inside a call
pub const DURING_CALL_MASK: i64 = 2;
/// Set when the frame rethrows an exception on resume
pub const RETHROW_EXCEPTION_MASK: i64 = 1;

/// Encoded position that ends an uncompressed slice
pub const NO_CALLER_BCI: i64 = -1;
/// Encoded position of a frame without local value info
pub const NO_LOCAL_INFO_BCI: i64 = -2;

/// Bytecode index of an encoded position
#[inline]
pub fn decode_bci(encoded_bci: i64) -> i32 {
    let value = encoded_bci >> BCI_SHIFT;
    debug_assert!(i32::try_from(value).is_ok(), "bci {value} out of range");
    value as i32
}

/// Whether an encoded position is inside a call
#[inline]
pub fn decode_during_call(encoded_bci: i64) -> bool {
    encoded_bci & DURING_CALL_MASK != 0
}

/// Whether an encoded position rethrows an exception
#[inline]
pub fn decode_rethrow_exception(encoded_bci: i64) -> bool {
    encoded_bci & RETHROW_EXCEPTION_MASK != 0
}

/// Build an encoded position
#[inline]
pub fn encode_bci(bci: i32, during_call: bool, rethrow_exception: bool) -> i64 {
    let mut encoded = i64::from(bci) << BCI_SHIFT;
    if during_call {
        encoded |= DURING_CALL_MASK;
    }
    if rethrow_exception {
        encoded |= RETHROW_EXCEPTION_MASK;
    }
    encoded
}

/// Human-readable form of an encoded position, e.g. `12 duringCall`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadableBci(pub i64);

impl fmt::Display for ReadableBci {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", decode_bci(self.0))?;
        if decode_during_call(self.0) {
            f.write_str(" duringCall")?;
        }
        if decode_rethrow_exception(self.0) {
            f.write_str(" rethrowException")?;
        }
        Ok(())
    }
}

/// Log an encoded position in readable form
#[cfg(feature = "frameinfo_logging")]
pub fn log_readable_bci(encoded_bci: i64) {
    tracing::debug!(
        target: "otter::frameinfo",
        bci = decode_bci(encoded_bci),
        during_call = decode_during_call(encoded_bci),
        rethrow_exception = decode_rethrow_exception(encoded_bci),
        "{}",
        ReadableBci(encoded_bci)
    );
}
