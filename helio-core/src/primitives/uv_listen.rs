// uv:listen: ( h backlog q -- ). Store the callback and start accepting.
// Each inbound connection becomes a freshly registered client handle
// pushed for the callback. Accept failures are logged and the listener
// keeps going.

use tracing::warn;

use crate::interpreter::Interp;
use crate::uv::{Event, HandleKind};
use crate::value::RuntimeError;

pub fn uv_listen_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let quote = vm.pop_quote()?;
    let backlog = vm.pop_int()?;
    let id = vm.pop_handle(Some(HandleKind::Tcp))?;

    let events = vm.uv.events.clone();
    let Some(h) = vm.uv.handles.get_mut(&id) else {
        return Ok(());
    };
    if h.closing {
        warn!(handle = %id, "uv:listen on closing handle");
        return Ok(());
    }

    h.set_callback(quote);
    let Some(socket) = h.socket.take() else {
        warn!(handle = %id, "uv:listen: handle has no socket");
        return Ok(());
    };
    let listener = match socket.listen(backlog.max(1) as u32) {
        Ok(listener) => listener,
        Err(error) => {
            warn!(%error, "uv:listen failed");
            return Ok(());
        }
    };

    h.accept_task = Some(tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _peer)) => {
                    if events.send(Event::Incoming { listener: id, stream }).is_err() {
                        return;
                    }
                }
                Err(error) => warn!(%error, "accept failed"),
            }
        }
    }));
    Ok(())
}
