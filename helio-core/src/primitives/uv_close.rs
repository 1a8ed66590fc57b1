// uv:close: ( h -- ). Begin asynchronous close: every event source on
// the handle is torn down now, and the registry record (including the
// callback quotation) is released when the loop dispatches the Closed
// confirmation. Using the handle after this word is undefined.

use crate::interpreter::Interp;
use crate::uv::Event;
use crate::value::RuntimeError;

pub fn uv_close_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let id = vm.pop_handle(None)?;
    let Some(h) = vm.uv.handles.get_mut(&id) else {
        return Ok(());
    };
    if h.closing {
        return Ok(());
    }
    h.begin_close();
    let _ = vm.uv.events.send(Event::Closed(id));
    Ok(())
}
