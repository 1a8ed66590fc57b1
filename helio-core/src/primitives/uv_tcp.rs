// TCP handle creation and binding: uv:tcp, uv:tcp-bind.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpSocket;
use tracing::warn;

use crate::interpreter::Interp;
use crate::uv::HandleKind;
use crate::value::{RuntimeError, Value};

// uv:tcp: ( -- h ). Register a fresh TCP handle with an unbound socket
// and push it.
pub fn uv_tcp_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let id = vm.uv.register(HandleKind::Tcp);
    match TcpSocket::new_v4() {
        Ok(socket) => {
            if let Some(h) = vm.uv.handles.get_mut(&id) {
                h.socket = Some(socket);
            }
        }
        Err(error) => warn!(%error, "uv:tcp: socket creation failed"),
    }
    vm.push(Value::Handle(id));
    Ok(())
}

// uv:tcp-bind: ( h ip port -- ). Parse the IPv4 address and bind.
pub fn uv_tcp_bind_impl(vm: &mut Interp) -> Result<(), RuntimeError> {
    let port = vm.pop_int()?;
    let ip = vm.pop_str()?;
    let id = vm.pop_handle(Some(HandleKind::Tcp))?;

    let addr: Ipv4Addr = match ip.parse() {
        Ok(addr) => addr,
        Err(_) => {
            warn!(ip = %ip, "uv:tcp-bind: invalid IPv4 address");
            return Ok(());
        }
    };
    let addr = SocketAddr::from((addr, port as u16));

    let Some(h) = vm.uv.handles.get(&id) else {
        return Ok(());
    };
    match &h.socket {
        Some(socket) => {
            if let Err(error) = socket.bind(addr) {
                warn!(%error, %addr, "uv:tcp-bind failed");
            }
        }
        None => warn!(handle = %id, "uv:tcp-bind: handle has no socket"),
    }
    Ok(())
}
