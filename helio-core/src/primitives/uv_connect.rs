// uv:tcp-connect: ( h ip port q -- ). Store the callback and start an
// outbound connect. Success pushes the handle and runs the callback;
// failure is suppressed apart from a log line.

use std::net::{Ipv4Addr, SocketAddr};

use tracing::warn;

use crate::interpreter::Interp;
use crate::uv::{Event, HandleKind};
use crate::value::RuntimeError;

pub fn uv_tcp_connect_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let quote = vm.pop_quote()?;
    let port = vm.pop_int()?;
    let ip = vm.pop_str()?;
    let id = vm.pop_handle(Some(HandleKind::Tcp))?;

    let events = vm.uv.events.clone();
    let Some(h) = vm.uv.handles.get_mut(&id) else {
        return Ok(());
    };
    if h.closing {
        warn!(handle = %id, "uv:tcp-connect on closing handle");
        return Ok(());
    }

    h.set_callback(quote);
    let addr: Ipv4Addr = match ip.parse() {
        Ok(addr) => addr,
        Err(_) => {
            warn!(ip = %ip, "uv:tcp-connect: invalid IPv4 address");
            return Ok(());
        }
    };
    let addr = SocketAddr::from((addr, port as u16));
    let Some(socket) = h.socket.take() else {
        warn!(handle = %id, "uv:tcp-connect: handle has no socket");
        return Ok(());
    };

    h.connect_task = Some(tokio::spawn(async move {
        match socket.connect(addr).await {
            Ok(stream) => {
                let _ = events.send(Event::Connected { handle: id, stream });
            }
            Err(error) => {
                let _ = events.send(Event::ConnectFailed { handle: id, error });
            }
        }
    }));
    Ok(())
}
