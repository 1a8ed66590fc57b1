// uv:write: ( h str -- ). Queue the bytes on the handle's ordered write
// queue. The string is consumed here; completion (success or not) only
// feeds the loop's activity accounting.

use tracing::warn;

use crate::interpreter::Interp;
use crate::uv::HandleKind;
use crate::value::RuntimeError;

pub fn uv_write_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let s = vm.pop_str()?;
    let id = vm.pop_handle(Some(HandleKind::Tcp))?;

    let Some(h) = vm.uv.handles.get_mut(&id) else {
        return Ok(());
    };
    match &h.writer {
        Some(writer) => {
            if writer.send(s.into_bytes()).is_ok() {
                h.pending_writes += 1;
            }
        }
        None => warn!(handle = %id, "uv:write: no connected stream"),
    }
    Ok(())
}
