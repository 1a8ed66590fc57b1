// uv:read-start: ( h q -- ). Store the callback and start reading the
// handle's stream. Data invokes the callback with (h bytes); EOF invokes
// it with (h "") and stops reading; other errors stop reading silently.

use tokio::io::AsyncReadExt;
use tracing::{trace, warn};

use crate::interpreter::Interp;
use crate::uv::{Event, HandleKind};
use crate::value::RuntimeError;

const READ_BUF_SIZE: usize = 64 * 1024;

pub fn uv_read_start_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let quote = vm.pop_quote()?;
    let id = vm.pop_handle(Some(HandleKind::Tcp))?;

    let events = vm.uv.events.clone();
    let Some(h) = vm.uv.handles.get_mut(&id) else {
        return Ok(());
    };
    if h.closing {
        warn!(handle = %id, "uv:read-start on closing handle");
        return Ok(());
    }

    h.set_callback(quote);
    if h.read_task.is_some() {
        // Already reading; only the callback changed.
        trace!(handle = %id, "uv:read-start while already reading");
        return Ok(());
    }
    let Some(mut reader) = h.reader.take() else {
        warn!(handle = %id, "uv:read-start: no connected stream");
        return Ok(());
    };

    h.read_task = Some(tokio::spawn(async move {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    let _ = events.send(Event::Eof(id));
                    return;
                }
                Ok(n) => {
                    let bytes = buf[..n].to_vec();
                    if events.send(Event::Data { handle: id, bytes }).is_err() {
                        return;
                    }
                }
                Err(error) => {
                    let _ = events.send(Event::ReadFailed { handle: id, error });
                    return;
                }
            }
        }
    }));
    Ok(())
}
