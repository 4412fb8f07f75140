//! Reconnecting message transport.
//!
//! A background task owns the connection: it connects with a timeout,
//! shuttles newline-delimited frames both ways, and reconnects with
//! exponential backoff ([`ReconnectPolicy`]) until closed explicitly or the
//! attempt limit is reached.
//!
//! The application side stays single-threaded. Incoming events are pulled
//! with [`TransportHandle::drain_into`], which turns them into actions of a
//! running [`AppInstance`]. Outgoing frames are effects handled by
//! [`transport_interpreter`].

mod close;
mod connection;
mod policy;

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app::{AppInstance, Component};
use crate::queue::{with_cont, Process, QueueHandle};

use close::CloseSignal;
use connection::Connection;

pub use policy::ReconnectPolicy;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection attempt timed out after {after:?}")]
    ConnectTimeout { after: Duration },

    #[error("Transport I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport is closed")]
    Closed,

    #[error("Gave up after {attempts} reconnect attempts")]
    AttemptsExhausted { attempts: u32 },
}

pub type ConnectFuture<'a, S> = Pin<Box<dyn Future<Output = io::Result<S>> + Send + 'a>>;

/// Opens a fresh byte stream for each connection attempt.
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    fn connect(&self) -> ConnectFuture<'_, Self::Stream>;
}

/// Connects to a `host:port` address; a leading `tcp://` is accepted.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(url: &str) -> Self {
        let addr = url.strip_prefix("tcp://").unwrap_or(url);
        Self {
            addr: addr.trim_end_matches('/').to_string(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self) -> ConnectFuture<'_, TcpStream> {
        Box::pin(TcpStream::connect(self.addr.as_str()))
    }
}

/// What the transport task reports to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    /// One frame, without its trailing newline.
    Message(Vec<u8>),
    Disconnected,
    /// The task stopped; no further events follow.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    Connecting { attempt: u32 },
    Connected,
    /// Sleeping before reconnect attempt `attempt`.
    Waiting { attempt: u32, delay: Duration },
    Closed,
}

/// Cloneable sending side of a transport.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl OutboundSender {
    /// Queue one frame. Frames queued while disconnected go out after the
    /// next successful connect.
    pub fn send(&self, frame: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.tx
            .send(frame.into())
            .map_err(|_| TransportError::Closed)
    }
}

pub struct ReconnectingTransport;

impl ReconnectingTransport {
    /// Spawn the connection task on the current tokio runtime.
    pub fn spawn<C: Connector>(connector: C, policy: ReconnectPolicy) -> TransportHandle {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let status = Arc::new(Mutex::new(TransportStatus::Connecting { attempt: 0 }));
        let close = CloseSignal::new();

        let connection = Connection {
            connector,
            policy,
            outbound: out_rx,
            events: event_tx,
            status: Arc::clone(&status),
            close: close.clone(),
        };
        let task = tokio::spawn(connection.run());

        TransportHandle {
            outbound: OutboundSender { tx: out_tx },
            events: event_rx,
            status,
            close,
            task,
        }
    }
}

pub struct TransportHandle {
    outbound: OutboundSender,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    status: Arc<Mutex<TransportStatus>>,
    close: CloseSignal,
    task: JoinHandle<()>,
}

impl TransportHandle {
    pub fn sender(&self) -> OutboundSender {
        self.outbound.clone()
    }

    pub fn send(&self, frame: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        if self.close.is_closed() {
            return Err(TransportError::Closed);
        }
        self.outbound.send(frame)
    }

    pub fn status(&self) -> TransportStatus {
        self.status.lock().clone()
    }

    /// Wait for the next event; `None` once the task is gone and every
    /// event was taken.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<TransportEvent> {
        self.events.try_recv().ok()
    }

    /// Stop reconnecting and drop the connection. Returns `false` if the
    /// transport was already closed.
    pub fn close(&self) -> bool {
        let first = self.close.signal();
        if first {
            tracing::debug!("transport close requested");
        }
        first
    }

    /// Close and wait for the task to finish.
    pub async fn shutdown(self) {
        self.close();
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "transport task failed");
        }
    }

    /// Push the actions `map` derives from every pending event onto `app`,
    /// then run the queue once. `map` may return an `Option` or any other
    /// iterable. Returns the number of actions pushed.
    pub fn drain_into<C, I>(&mut self, app: &AppInstance<C>, map: impl Fn(TransportEvent) -> I) -> usize
    where
        C: Component,
        I: IntoIterator<Item = C::Action>,
    {
        let mut pushed = 0;
        while let Ok(event) = self.events.try_recv() {
            for action in map(event) {
                app.push(action);
                pushed += 1;
            }
        }
        if pushed > 0 {
            app.run();
        }
        pushed
    }
}

/// Interpreter sending each effect as one outbound frame. Emits no actions.
pub fn transport_interpreter<A: 'static>(sender: OutboundSender) -> Process<Vec<u8>, A> {
    with_cont(move |_: &QueueHandle<A>, frame: Vec<u8>| {
        if let Err(err) = sender.send(frame) {
            tracing::warn!(error = %err, "outbound frame dropped");
        }
    })
}
