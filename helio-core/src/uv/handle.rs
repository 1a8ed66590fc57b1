//! Per-handle registry state.
//!
//! A handle record owns everything the VM holds for one timer or TCP
//! endpoint: the callback quotation slot, the not-yet-armed socket, the
//! tasks forwarding events, and the write queue. The record outlives
//! every stack reference to it and is removed from the registry only
//! when the loop dispatches its `Closed` event.

use std::fmt;
use std::rc::Rc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::quote::Quotation;
use crate::uv::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub(crate) u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Timer,
    Tcp,
}

impl HandleKind {
    pub fn name(self) -> &'static str {
        match self {
            HandleKind::Timer => "timer",
            HandleKind::Tcp => "tcp",
        }
    }
}

pub(crate) struct HandleState {
    pub(crate) kind: HandleKind,
    /// At most one callback quotation; arming words replace it, dropping
    /// the displaced one.
    pub(crate) callback: Option<Rc<Quotation>>,
    /// Set by `uv:close`; a closing handle rejects further arming and
    /// stays in the registry until the loop confirms closure.
    pub(crate) closing: bool,

    // Timer
    pub(crate) repeat_ms: u64,
    pub(crate) timer_task: Option<JoinHandle<()>>,

    // TCP
    pub(crate) socket: Option<TcpSocket>,
    pub(crate) accept_task: Option<JoinHandle<()>>,
    pub(crate) connect_task: Option<JoinHandle<()>>,
    pub(crate) reader: Option<OwnedReadHalf>,
    pub(crate) read_task: Option<JoinHandle<()>>,
    pub(crate) writer: Option<UnboundedSender<Vec<u8>>>,
    pub(crate) pending_writes: usize,
}

impl HandleState {
    pub(crate) fn new(kind: HandleKind) -> Self {
        Self {
            kind,
            callback: None,
            closing: false,
            repeat_ms: 0,
            timer_task: None,
            socket: None,
            accept_task: None,
            connect_task: None,
            reader: None,
            read_task: None,
            writer: None,
            pending_writes: 0,
        }
    }

    /// Whether this handle keeps `uv:run` alive: an armed timer, a live
    /// listener, an in-progress read, an in-flight connect, unfinished
    /// writes, or a close awaiting confirmation.
    pub(crate) fn is_active(&self) -> bool {
        self.closing
            || self.timer_task.is_some()
            || self.accept_task.is_some()
            || self.connect_task.is_some()
            || self.read_task.is_some()
            || self.pending_writes > 0
    }

    pub(crate) fn set_callback(&mut self, quote: Rc<Quotation>) {
        self.callback = Some(quote);
    }

    /// Take ownership of a connected stream: keep the read half for a
    /// later `uv:read-start` and spin up the ordered write queue.
    pub(crate) fn install_stream(
        &mut self,
        id: HandleId,
        stream: TcpStream,
        events: UnboundedSender<Event>,
    ) {
        let (read_half, mut write_half) = stream.into_split();
        self.reader = Some(read_half);

        let (writer, mut queue) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();
        self.writer = Some(writer);
        // Detached on purpose: dropping the queue sender is what ends it.
        tokio::spawn(async move {
            while let Some(chunk) = queue.recv().await {
                if let Err(error) = write_half.write_all(&chunk).await {
                    trace!(%error, handle = %id, "tcp write failed");
                }
                // Completion is reported regardless of outcome; the bytes
                // are gone either way.
                let _ = events.send(Event::WroteChunk(id));
            }
        });
    }

    /// Tear down every event source. Queued writes are left to drain:
    /// dropping the queue sender lets the writer task finish what it has
    /// and exit.
    pub(crate) fn begin_close(&mut self) {
        self.closing = true;
        if let Some(task) = self.timer_task.take() {
            task.abort();
        }
        if let Some(task) = self.accept_task.take() {
            task.abort();
        }
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        if let Some(task) = self.read_task.take() {
            task.abort();
        }
        self.socket = None;
        self.reader = None;
        self.writer = None;
    }
}
