//! The sync server accept loop and per-connection tasks.

use crate::config::{BackpressurePolicy, ServerConfig};
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use campus_sync_protocol::{Connection, ConnectionReader, ConnectionWriter, WireMessage};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// The sync server.
///
/// Each accepted connection gets a reader task and a writer task joined by
/// a bounded FIFO queue. The reader decodes requests and queues them; the
/// writer executes them one at a time in arrival order and sends any
/// replies. Requests from one connection are never reordered. Requests from
/// different connections race at the file level.
///
/// # Example
///
/// ```no_run
/// use campus_sync_server::{ServerConfig, SyncServer};
///
/// # async fn run() -> campus_sync_server::ServerResult<()> {
/// let server = SyncServer::bind(ServerConfig::new("/srv/campus")).await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug)]
pub struct SyncServer {
    listener: TcpListener,
    handler: RequestHandler,
}

impl SyncServer {
    /// Binds the configured `bind_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is unavailable.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        let addr = config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let handler = RequestHandler::new(Arc::new(HandlerContext::new(config)));
        Ok(Self { listener, handler })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The request handler shared by all connections.
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Accepts connections until the process exits.
    pub async fn run(self) -> ServerResult<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes.
    ///
    /// Connections already accepted keep running to completion.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> ServerResult<()> {
        let addr = self.local_addr()?;
        info!(%addr, "sync server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!(%addr, "sync server stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let config = &self.handler.context().config;
                        let conn = match Connection::from_stream(stream, config.max_frame_len) {
                            Ok(conn) => conn,
                            Err(e) => {
                                warn!(%peer, error = %e, "failed to set up connection");
                                continue;
                            }
                        };
                        info!(%peer, "client connected");
                        let handler = self.handler.clone();
                        tokio::spawn(serve_connection(conn, handler));
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }
    }
}

async fn serve_connection(conn: Connection, handler: RequestHandler) {
    let peer = conn.peer_addr();
    let config = &handler.context().config;
    let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
    let (reader, writer) = conn.into_split();

    let reader_task = tokio::spawn(read_requests(reader, tx, config.backpressure, peer));
    execute_requests(writer, rx, handler, peer).await;
    reader_task.abort();
    info!(%peer, "client disconnected");
}

async fn read_requests(
    mut reader: ConnectionReader,
    queue: mpsc::Sender<WireMessage>,
    policy: BackpressurePolicy,
    peer: SocketAddr,
) {
    loop {
        let request = match reader.receive().await {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!(%peer, "end of stream");
                return;
            }
            Err(e) => {
                warn!(%peer, error = %e, "dropping connection after read error");
                return;
            }
        };
        if !request.is_sync_request() {
            warn!(%peer, kind = request.name(), "not a sync request, dropped");
            continue;
        }
        debug!(%peer, kind = request.name(), "request queued");

        match policy {
            BackpressurePolicy::Block => {
                if queue.send(request).await.is_err() {
                    return;
                }
            }
            BackpressurePolicy::Reject => match queue.try_send(request) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    warn!(%peer, kind = dropped.name(), "queue full, request rejected");
                }
                Err(TrySendError::Closed(_)) => return,
            },
        }
    }
}

async fn execute_requests(
    mut writer: ConnectionWriter,
    mut queue: mpsc::Receiver<WireMessage>,
    handler: RequestHandler,
    peer: SocketAddr,
) {
    while let Some(request) = queue.recv().await {
        let kind = request.name();
        let worker = handler.clone();
        let replies = match tokio::task::spawn_blocking(move || worker.handle(request)).await {
            Ok(Ok(replies)) => replies,
            Ok(Err(e)) => {
                warn!(
                    %peer,
                    kind,
                    error = %e,
                    client_error = e.is_client_error(),
                    "request failed"
                );
                continue;
            }
            Err(e) => {
                warn!(%peer, kind, error = %e, "request task failed");
                continue;
            }
        };
        debug!(%peer, kind, replies = replies.len(), "request executed");

        for reply in &replies {
            if let Err(e) = writer.send(reply).await {
                warn!(%peer, error = %e, "dropping connection after write error");
                return;
            }
        }
    }
}
