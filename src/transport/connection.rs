//! Background task owning the connection and its reconnect loop.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use super::close::CloseSignal;
use super::{Connector, ReconnectPolicy, TransportError, TransportEvent, TransportStatus};

#[derive(Debug, PartialEq, Eq)]
enum PumpEnd {
    /// Peer went away or the stream failed; reconnect.
    Disconnected,
    /// Explicit close, or every sender is gone; stop.
    Closed,
}

pub(crate) struct Connection<C: Connector> {
    pub(crate) connector: C,
    pub(crate) policy: ReconnectPolicy,
    pub(crate) outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    pub(crate) events: mpsc::UnboundedSender<TransportEvent>,
    pub(crate) status: Arc<Mutex<TransportStatus>>,
    pub(crate) close: CloseSignal,
}

impl<C: Connector> Connection<C> {
    pub(crate) async fn run(mut self) {
        let mut attempts: u32 = 0;
        loop {
            self.set_status(TransportStatus::Connecting { attempt: attempts });
            let outcome = tokio::select! {
                _ = self.close.wait() => break,
                outcome = self.connect_once() => outcome,
            };

            match outcome {
                Ok(stream) => {
                    attempts = 0;
                    self.set_status(TransportStatus::Connected);
                    self.emit(TransportEvent::Connected);
                    let end = self.pump(stream).await;
                    self.emit(TransportEvent::Disconnected);
                    if end == PumpEnd::Closed {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, attempt = attempts, "transport connect failed");
                }
            }

            if !self.policy.allows(attempts) {
                let err = TransportError::AttemptsExhausted { attempts };
                tracing::warn!(error = %err, "transport giving up");
                break;
            }
            let delay = self.policy.delay(attempts);
            attempts += 1;
            self.set_status(TransportStatus::Waiting {
                attempt: attempts,
                delay,
            });
            tracing::debug!(attempt = attempts, delay_ms = delay.as_millis() as u64, "transport reconnect scheduled");
            tokio::select! {
                _ = self.close.wait() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        self.set_status(TransportStatus::Closed);
        self.emit(TransportEvent::Closed);
    }

    async fn connect_once(&self) -> Result<C::Stream, TransportError> {
        let timeout = self.policy.timeout_interval;
        match tokio::time::timeout(timeout, self.connector.connect()).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(TransportError::Io(source)),
            Err(_) => Err(TransportError::ConnectTimeout { after: timeout }),
        }
    }

    /// Shuttle newline-delimited frames both ways until the stream ends.
    async fn pump(&mut self, stream: C::Stream) -> PumpEnd {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);
        let mut frame = Vec::new();

        loop {
            tokio::select! {
                _ = self.close.wait() => {
                    let _ = writer.shutdown().await;
                    return PumpEnd::Closed;
                }
                read = reader.read_until(b'\n', &mut frame) => match read {
                    Ok(0) => return PumpEnd::Disconnected,
                    Ok(_) => {
                        if frame.last() == Some(&b'\n') {
                            frame.pop();
                        }
                        self.emit(TransportEvent::Message(std::mem::take(&mut frame)));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "transport read failed");
                        return PumpEnd::Disconnected;
                    }
                },
                outgoing = self.outbound.recv() => match outgoing {
                    Some(mut bytes) => {
                        bytes.push(b'\n');
                        let written = async {
                            writer.write_all(&bytes).await?;
                            writer.flush().await
                        };
                        if let Err(err) = written.await {
                            tracing::warn!(error = %err, "transport write failed");
                            return PumpEnd::Disconnected;
                        }
                    }
                    None => return PumpEnd::Closed,
                },
            }
        }
    }

    fn set_status(&self, status: TransportStatus) {
        *self.status.lock() = status;
    }

    fn emit(&self, event: TransportEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("transport event dropped (receiver gone)");
        }
    }
}
