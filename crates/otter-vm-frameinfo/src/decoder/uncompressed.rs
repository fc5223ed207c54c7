//! Uncompressed frame slices: positions, values and deoptimization targets
//!
//! ```text
//! frame entry:
//!   [encoded bci: SV]              -1 ends the slice, -2 means no local info
//!   if local info:
//!     [locks: UV] [locals: UV] [stack: UV]
//!     [deopt method: SV]           offset, or -(index + 1) into the object constants
//!     [value count: UV] [value record]*
//!   if local info and first frame of the walk:
//!     [virtual object count: UV] ([field count: UV] [value record]*)*
//!   if source references:
//!     [class index: SV] [method name index: SV] [line: SV] [method id: UV]
//! ```

use std::sync::Arc;

use crate::allocator::{FrameInfoQueryResultAllocator, ValueInfoAllocator};
use crate::bci::{NO_CALLER_BCI, NO_LOCAL_INFO_BCI};
use crate::error::{FrameInfoError, Result};
use crate::frame::{FrameInfoQueryResult, VirtualObjects};
use crate::reader::TypeReader;
use crate::state::FrameInfoState;

use super::Decoder;

impl<R, A, V> Decoder<'_, R, A, V>
where
    R: TypeReader + ?Sized,
    A: FrameInfoQueryResultAllocator + ?Sized,
    V: ValueInfoAllocator + ?Sized,
{
    pub(super) fn decode_uncompressed_frame_info(
        &mut self,
        is_deopt_entry: bool,
        state: &mut FrameInfoState,
    ) -> Result<Option<FrameInfoQueryResult>> {
        let mut result: Option<FrameInfoQueryResult> = None;
        let mut prev: Option<&mut FrameInfoQueryResult> = None;

        loop {
            let Some(mut cur) = self.result_allocator.new_frame_info_query_result() else {
                #[cfg(feature = "frameinfo_logging")]
                tracing::trace!(target: "otter::frameinfo", "frame allocator exhausted");
                break;
            };

            let encoded_bci = i64::from(self.reader.get_sv_int()?);
            if encoded_bci == NO_CALLER_BCI {
                break;
            }
            debug_assert!(
                state.is_first_frame || !is_deopt_entry,
                "deoptimization entry must not have inlined frames"
            );

            cur.encoded_bci = encoded_bci;
            cur.is_deopt_entry = is_deopt_entry;
            #[cfg(feature = "frameinfo_logging")]
            crate::bci::log_readable_bci(encoded_bci);

            let has_local_info = encoded_bci != NO_LOCAL_INFO_BCI;
            if has_local_info {
                self.decode_local_info(&mut cur)?;
            }

            if state.is_first_frame && has_local_info {
                state.virtual_objects = self.decode_virtual_objects()?;
            }
            cur.virtual_objects = state.virtual_objects.clone();

            if self.info.config().source_references {
                self.decode_source_reference(&mut cur)?;
            }

            prev = Some(match prev {
                None => result.insert(cur),
                Some(p) => &mut **p.caller.insert(Box::new(cur)),
            });
            state.is_first_frame = false;
        }

        Ok(result)
    }

    fn decode_local_info(&mut self, cur: &mut FrameInfoQueryResult) -> Result<()> {
        cur.num_locks = self.reader.get_uv_int()?;
        cur.num_locals = self.reader.get_uv_int()?;
        cur.num_stack = self.reader.get_uv_int()?;

        let deopt_method_index = self.reader.get_sv_int()?;
        if deopt_method_index < 0 {
            let method = self
                .info
                .deopt_method(-1 - i64::from(deopt_method_index))?;
            cur.deopt_method_offset = method.deopt_offset_in_image();
            cur.deopt_method = Some(method.clone());
        } else {
            cur.deopt_method_offset = deopt_method_index;
        }

        let num_values = self.reader.get_uv_int()? as usize;
        cur.value_infos = self.decode_values(num_values)?;
        Ok(())
    }

    fn decode_virtual_objects(&mut self) -> Result<Option<VirtualObjects>> {
        let num_virtual_objects = self.reader.get_uv_int()? as usize;
        let capacity = num_virtual_objects.min(self.reader.remaining());
        let mut virtual_objects = self
            .value_info_allocator
            .new_value_info_array_array(capacity);

        for _ in 0..num_virtual_objects {
            let num_values = self.reader.get_uv_int()? as usize;
            let fields = self.decode_values(num_values)?;
            if let Some(objects) = virtual_objects.as_mut() {
                objects.push(fields.unwrap_or_default());
            }
        }

        Ok(virtual_objects.map(Arc::from))
    }

    fn decode_source_reference(&mut self, cur: &mut FrameInfoQueryResult) -> Result<()> {
        let source_class_index = self.reader.get_sv_int()?;
        let source_method_name_index = self.reader.get_sv_int()?;
        let source_line_number = self.reader.get_sv_int()?;
        let method_id = self.reader.get_uv_int()?;

        cur.source_class = Some(self.info.source_class(source_class_index)?.clone());
        cur.source_method_name =
            Some(self.info.source_method_name(source_method_name_index)?.clone());
        cur.source_class_index = source_class_index;
        cur.source_method_name_index = source_method_name_index;
        cur.source_line_number = source_line_number;
        cur.method_id = i32::try_from(method_id).map_err(|_| FrameInfoError::IntOutOfRange {
            value: i64::from(method_id),
        })?;
        Ok(())
    }
}
