//! Framed IPC server
//!
//! Exposes the dispatcher over a Unix socket. Frames are length-prefixed:
//! `u32 LE length` followed by the frame body. A request body is the `u32 LE`
//! opcode plus the wire-encoded payload; a server-to-client body leads with a
//! frame-kind byte so responses and asynchronous event pushes can share the
//! connection. Caller identity comes from the socket's peer credentials, the
//! same uid the privileged reset check consumes.
//!
//! Finding the socket path is the platform's problem, not this server's;
//! clients are handed the path out of band.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wlanhal_core::protocol::{EventMessage, ServiceCommand};
use wlanhal_core::types::ClientId;

use crate::dispatch::{CallContext, CommandDispatcher};
use crate::lifecycle::WlanService;

// ----------------------------------------------------------------------------
// Frame Layout
// ----------------------------------------------------------------------------

/// Server-to-client frame kinds
pub const FRAME_RESPONSE: u8 = 0;
pub const FRAME_EVENT: u8 = 1;

/// Upper bound on any frame body
pub const MAX_FRAME_LEN: usize = 1 << 21;

/// Connection-layer errors, distinct from the HAL status taxonomy: these
/// kill the connection rather than travel over it.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame of {len} bytes exceeds the {max}-byte limit")]
    FrameTooLarge { len: usize, max: usize },
    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: &'static str },
    #[error("connection closed")]
    Closed,
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;

async fn write_frame(writer: &mut OwnedWriteHalf, kind: u8, body: &[u8]) -> ServerResult<()> {
    let len = (body.len() + 1) as u32;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(&[kind]).await?;
    writer.write_all(body).await?;
    Ok(())
}

// ----------------------------------------------------------------------------
// IPC Server
// ----------------------------------------------------------------------------

/// Unix-socket server feeding the command dispatcher
pub struct IpcServer {
    listener: UnixListener,
    dispatcher: Arc<CommandDispatcher>,
}

impl IpcServer {
    /// Bind the server socket. The path must not already exist.
    pub fn bind(path: impl AsRef<Path>, service: Arc<WlanService>) -> ServerResult<Self> {
        let listener = UnixListener::bind(path)?;
        Ok(Self {
            listener,
            dispatcher: Arc::new(CommandDispatcher::new(service)),
        })
    }

    /// Accept connections until the task is cancelled. Each connection runs
    /// independently; a failed one is logged and dropped.
    pub async fn run(self) -> ServerResult<()> {
        info!("ipc server accepting connections");
        loop {
            let (stream, _addr) = self.listener.accept().await?;
            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(dispatcher, stream).await {
                    debug!(%err, "connection ended");
                }
            });
        }
    }
}

async fn handle_connection(
    dispatcher: Arc<CommandDispatcher>,
    stream: UnixStream,
) -> ServerResult<()> {
    let cred = stream.peer_cred()?;
    let client = ClientId::new(cred.uid());
    debug!(%client, "connection opened");

    let (mut read_half, mut write_half) = stream.into_split();

    // All outbound frames funnel through one channel so responses and event
    // pushes never interleave mid-frame.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<(u8, Vec<u8>)>();
    let writer_task = tokio::spawn(async move {
        while let Some((kind, body)) = out_rx.recv().await {
            if let Err(err) = write_frame(&mut write_half, kind, &body).await {
                warn!(%err, "outbound write failed");
                break;
            }
        }
    });

    // Adapter from the subscriber table's event channel to outbound frames
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let event_out = out_tx.clone();
    tokio::spawn(async move {
        while let Some(frame) = event_rx.recv().await {
            if event_out.send((FRAME_EVENT, frame)).is_err() {
                break;
            }
        }
    });

    let ctx = CallContext::with_event_channel(client, event_tx);
    let result = read_loop(&dispatcher, &ctx, &mut read_half, &out_tx).await;

    // A vanished connection takes its subscription with it
    if dispatcher
        .service()
        .subscribers()
        .unregister(client)
        .is_ok()
    {
        debug!(%client, "dropped subscription of closed connection");
    }
    // Dropping the context releases the event channel, which ends the
    // adapter task, which releases its writer handle.
    drop(ctx);
    drop(out_tx);
    let _ = writer_task.await;
    result
}

async fn read_loop(
    dispatcher: &Arc<CommandDispatcher>,
    ctx: &CallContext,
    read_half: &mut tokio::net::unix::OwnedReadHalf,
    out_tx: &mpsc::UnboundedSender<(u8, Vec<u8>)>,
) -> ServerResult<()> {
    loop {
        let mut len_buf = [0u8; 4];
        match read_half.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_FRAME_LEN {
            return Err(ServerError::FrameTooLarge {
                len,
                max: MAX_FRAME_LEN,
            });
        }
        if len < 4 {
            return Err(ServerError::MalformedFrame {
                reason: "request shorter than its opcode",
            });
        }
        let mut body = vec![0u8; len];
        read_half.read_exact(&mut body).await?;
        let opcode = u32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let payload = body.split_off(4);

        // Dispatch synchronously off the reactor: handlers take blocking
        // locks and the driver reset blocks for its settle time.
        let dispatcher = dispatcher.clone();
        let ctx = ctx.clone();
        let response =
            tokio::task::spawn_blocking(move || dispatcher.dispatch(&ctx, opcode, &payload))
                .await
                .map_err(|_| ServerError::Closed)?;
        if out_tx.send((FRAME_RESPONSE, response)).is_err() {
            return Ok(());
        }
    }
}

// ----------------------------------------------------------------------------
// IPC Client
// ----------------------------------------------------------------------------

/// Minimal client side of the framed protocol, used by tests and tooling.
/// Event frames arriving between calls are buffered until `next_event`.
pub struct IpcClient {
    stream: UnixStream,
    pending_events: VecDeque<Vec<u8>>,
}

impl IpcClient {
    pub async fn connect(path: impl AsRef<Path>) -> ServerResult<Self> {
        Ok(Self {
            stream: UnixStream::connect(path).await?,
            pending_events: VecDeque::new(),
        })
    }

    /// Send one command and wait for its response frame
    pub async fn call(
        &mut self,
        command: ServiceCommand,
        body: &[u8],
    ) -> ServerResult<(i32, Vec<u8>)> {
        let payload = crate::dispatch::request_payload(body)
            .map_err(|_| ServerError::MalformedFrame { reason: "payload" })?;
        let len = (4 + payload.len()) as u32;
        self.stream.write_all(&len.to_le_bytes()).await?;
        self.stream.write_all(&command.as_u32().to_le_bytes()).await?;
        self.stream.write_all(&payload).await?;

        loop {
            let (kind, frame) = self.read_frame().await?;
            match kind {
                FRAME_RESPONSE => {
                    return crate::dispatch::split_response(&frame)
                        .map_err(|_| ServerError::MalformedFrame { reason: "response" });
                }
                FRAME_EVENT => self.pending_events.push_back(frame),
                _ => {
                    return Err(ServerError::MalformedFrame {
                        reason: "unknown frame kind",
                    })
                }
            }
        }
    }

    /// Wait for the next event push
    pub async fn next_event(&mut self) -> ServerResult<EventMessage> {
        let frame = match self.pending_events.pop_front() {
            Some(frame) => frame,
            None => loop {
                let (kind, frame) = self.read_frame().await?;
                if kind == FRAME_EVENT {
                    break frame;
                }
                // A response with no outstanding call is a protocol error
                return Err(ServerError::MalformedFrame {
                    reason: "response without a call",
                });
            },
        };
        EventMessage::decode(&frame).map_err(|_| ServerError::MalformedFrame { reason: "event" })
    }

    async fn read_frame(&mut self) -> ServerResult<(u8, Vec<u8>)> {
        let mut len_buf = [0u8; 4];
        match self.stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ServerError::Closed)
            }
            Err(err) => return Err(err.into()),
        }
        let len = u32::from_le_bytes(len_buf) as usize;
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(ServerError::MalformedFrame {
                reason: "bad frame length",
            });
        }
        let mut body = vec![0u8; len];
        self.stream.read_exact(&mut body).await?;
        let kind = body[0];
        Ok((kind, body.split_off(1)))
    }
}
