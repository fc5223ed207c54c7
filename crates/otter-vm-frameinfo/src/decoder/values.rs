//! Value records: one flags byte, then a signed payload for types that carry one

use crate::allocator::{FrameInfoQueryResultAllocator, ValueInfoAllocator};
use crate::error::Result;
use crate::flags::{
    extract_is_compressed_reference, extract_is_eliminated_monitor, extract_kind, extract_type,
};
use crate::frame::ValueInfo;
use crate::reader::TypeReader;

use super::Decoder;

impl<R, A, V> Decoder<'_, R, A, V>
where
    R: TypeReader + ?Sized,
    A: FrameInfoQueryResultAllocator + ?Sized,
    V: ValueInfoAllocator + ?Sized,
{
    /// Decode `len` value records. Records are always consumed; they are
    /// kept only if the value allocator provides storage.
    pub(super) fn decode_values(&mut self, len: usize) -> Result<Option<Vec<ValueInfo>>> {
        // a record is at least one byte, so a larger count runs out of input
        let capacity = len.min(self.reader.remaining());
        let mut value_infos = self.value_info_allocator.new_value_info_array(capacity);

        for _ in 0..len {
            let flags = self.reader.get_u1()?;
            let value_type = extract_type(flags)?;
            let mut value_info = ValueInfo {
                value_type,
                kind: extract_kind(flags)?,
                is_compressed_reference: extract_is_compressed_reference(flags),
                is_eliminated_monitor: extract_is_eliminated_monitor(flags),
                ..ValueInfo::new()
            };
            if value_type.has_data() {
                value_info.data = self.reader.get_sv()?;
            }
            self.value_info_allocator
                .decode_constant(&mut value_info, self.info)?;

            if let Some(values) = value_infos.as_mut() {
                values.push(value_info);
            }
        }

        Ok(value_infos)
    }
}
