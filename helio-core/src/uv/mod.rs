//! Event-loop coupling.
//!
//! Timers and sockets run as tokio tasks that forward events over one
//! unbounded channel. `uv:run` drains that channel on the interpreter's
//! own task, re-entering the interpreter for each callback, until no
//! handle is active. All interpretation happens on the driving task; the
//! spawned tasks own nothing but sockets, sleeps, and channel endpoints.

mod handle;

pub use handle::{HandleId, HandleKind};
pub(crate) use handle::HandleState;

use std::collections::HashMap;

use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::interpreter::Interp;
use crate::value::{RuntimeError, Value};

/// What the provider tasks report back to the loop driver.
pub(crate) enum Event {
    TimerTick(HandleId),
    Incoming { listener: HandleId, stream: TcpStream },
    Connected { handle: HandleId, stream: TcpStream },
    ConnectFailed { handle: HandleId, error: std::io::Error },
    Data { handle: HandleId, bytes: Vec<u8> },
    Eof(HandleId),
    ReadFailed { handle: HandleId, error: std::io::Error },
    WroteChunk(HandleId),
    Closed(HandleId),
}

/// Registry of live handles plus the event channel they report on.
pub(crate) struct EventLoop {
    pub(crate) handles: HashMap<HandleId, HandleState>,
    pub(crate) events: UnboundedSender<Event>,
    // Taken while `uv:run` is driving; a nested `uv:run` finds it absent.
    receiver: Option<UnboundedReceiver<Event>>,
    next_id: u64,
}

impl EventLoop {
    pub(crate) fn new() -> Self {
        let (events, receiver) = mpsc::unbounded_channel();
        Self {
            handles: HashMap::new(),
            events,
            receiver: Some(receiver),
            next_id: 0,
        }
    }

    pub(crate) fn register(&mut self, kind: HandleKind) -> HandleId {
        let id = HandleId(self.next_id);
        self.next_id += 1;
        self.handles.insert(id, HandleState::new(kind));
        id
    }

    pub(crate) fn kind_of(&self, id: HandleId) -> Option<HandleKind> {
        self.handles.get(&id).map(|h| h.kind)
    }

    fn has_work(&self) -> bool {
        self.handles.values().any(|h| h.is_active())
    }
}

/// Drive the loop until no handle is active. Callbacks re-enter the
/// interpreter on the caller's task; a fatal script error aborts the
/// loop and propagates.
pub(crate) async fn run_loop(vm: &mut Interp) -> Result<(), RuntimeError> {
    let mut receiver = match vm.uv.receiver.take() {
        Some(receiver) => receiver,
        None => {
            warn!("uv:run from inside a callback is ignored");
            return Ok(());
        }
    };
    let result = drive(vm, &mut receiver).await;
    vm.uv.receiver = Some(receiver);
    result
}

async fn drive(
    vm: &mut Interp,
    receiver: &mut UnboundedReceiver<Event>,
) -> Result<(), RuntimeError> {
    while vm.uv.has_work() {
        let Some(event) = receiver.recv().await else {
            break;
        };
        dispatch(vm, event).await?;
    }
    Ok(())
}

/// Translate one event into stack pushes and a callback invocation.
/// Events for a closing or already-removed handle are dropped.
async fn dispatch(vm: &mut Interp, event: Event) -> Result<(), RuntimeError> {
    match event {
        Event::TimerTick(id) => {
            let callback = match vm.uv.handles.get_mut(&id) {
                Some(h) if !h.closing => {
                    if h.timer_task.is_none() {
                        // Disarmed between the tick and its dispatch.
                        return Ok(());
                    }
                    if h.repeat_ms == 0 {
                        // One-shot: the tick disarms the timer.
                        h.timer_task = None;
                    }
                    h.callback.clone()
                }
                _ => return Ok(()),
            };
            if let Some(quote) = callback {
                vm.push(Value::Handle(id));
                vm.run_quote(quote).await?;
            }
        }

        Event::Incoming { listener, stream } => {
            let callback = match vm.uv.handles.get(&listener) {
                Some(h) if !h.closing => h.callback.clone(),
                // Listener gone: dropping the stream closes the client.
                _ => return Ok(()),
            };
            let events = vm.uv.events.clone();
            let client = vm.uv.register(HandleKind::Tcp);
            if let Some(h) = vm.uv.handles.get_mut(&client) {
                h.install_stream(client, stream, events);
            }
            vm.push(Value::Handle(client));
            if let Some(quote) = callback {
                vm.run_quote(quote).await?;
            }
        }

        Event::Connected { handle, stream } => {
            let events = vm.uv.events.clone();
            let callback = match vm.uv.handles.get_mut(&handle) {
                Some(h) if !h.closing => {
                    h.connect_task = None;
                    h.install_stream(handle, stream, events);
                    h.callback.clone()
                }
                _ => return Ok(()),
            };
            vm.push(Value::Handle(handle));
            if let Some(quote) = callback {
                vm.run_quote(quote).await?;
            }
        }

        Event::ConnectFailed { handle, error } => {
            if let Some(h) = vm.uv.handles.get_mut(&handle) {
                h.connect_task = None;
                if !h.closing {
                    warn!(%error, handle = %handle, "uv:tcp-connect failed");
                }
            }
        }

        Event::Data { handle, bytes } => {
            let callback = match vm.uv.handles.get(&handle) {
                Some(h) if !h.closing => h.callback.clone(),
                _ => return Ok(()),
            };
            vm.push(Value::Handle(handle));
            vm.push(Value::Str(String::from_utf8_lossy(&bytes).into_owned()));
            if let Some(quote) = callback {
                vm.run_quote(quote).await?;
            }
        }

        Event::Eof(handle) => {
            let callback = match vm.uv.handles.get_mut(&handle) {
                Some(h) if !h.closing => {
                    // EOF stops reading.
                    h.read_task = None;
                    h.callback.clone()
                }
                _ => return Ok(()),
            };
            vm.push(Value::Handle(handle));
            vm.push(Value::Str(String::new()));
            if let Some(quote) = callback {
                vm.run_quote(quote).await?;
            }
        }

        Event::ReadFailed { handle, error } => {
            if let Some(h) = vm.uv.handles.get_mut(&handle) {
                h.read_task = None;
                if !h.closing {
                    debug!(%error, handle = %handle, "read stopped on error");
                }
            }
        }

        Event::WroteChunk(handle) => {
            if let Some(h) = vm.uv.handles.get_mut(&handle) {
                h.pending_writes = h.pending_writes.saturating_sub(1);
            }
        }

        Event::Closed(handle) => {
            // The loop has confirmed closure; the record (and with it the
            // callback quotation) is released here and nowhere else.
            vm.uv.handles.remove(&handle);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::Quotation;
    use std::rc::Rc;

    #[test]
    fn test_registered_handles_get_distinct_ids() {
        let mut uv = EventLoop::new();
        let a = uv.register(HandleKind::Timer);
        let b = uv.register(HandleKind::Tcp);
        assert_ne!(a, b);
        assert_eq!(uv.kind_of(a), Some(HandleKind::Timer));
        assert_eq!(uv.kind_of(b), Some(HandleKind::Tcp));
    }

    #[test]
    fn test_callback_replacement_releases_prior() {
        let mut uv = EventLoop::new();
        let id = uv.register(HandleKind::Timer);
        let first = Rc::new(Quotation::new(vec![]));
        let second = Rc::new(Quotation::new(vec![]));

        let h = uv.handles.get_mut(&id).unwrap();
        h.set_callback(first.clone());
        assert_eq!(Rc::strong_count(&first), 2);

        h.set_callback(second.clone());
        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(Rc::strong_count(&second), 2);
    }

    #[test]
    fn test_idle_handles_do_not_keep_the_loop_alive() {
        let mut uv = EventLoop::new();
        let id = uv.register(HandleKind::Tcp);
        // Registered but unarmed: nothing to wait for.
        assert!(!uv.has_work());

        // A closing handle is active until the loop confirms closure.
        uv.handles.get_mut(&id).unwrap().begin_close();
        assert!(uv.has_work());
        uv.handles.remove(&id);
        assert!(!uv.has_work());
    }
}
