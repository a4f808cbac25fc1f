//! Framed message connections over TCP.

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::WireMessage;
use campus_codec::{encode_message, frame_len, from_cbor, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_LEN};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Reads one frame payload.
///
/// Returns `Ok(None)` on a clean EOF before the first header byte. An EOF
/// anywhere after that is an error.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_len: usize,
) -> ProtocolResult<Option<Vec<u8>>> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    let mut filled = 0;
    while filled < FRAME_HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
        filled += n;
    }

    let len = frame_len(header, max_len)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Writes one message as a frame and flushes.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &WireMessage,
    max_len: usize,
) -> ProtocolResult<()> {
    let frame = encode_message(message, max_len)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    trace!(kind = message.name(), len = frame.len(), "frame written");
    Ok(())
}

/// Receiving half of a [`Connection`].
#[derive(Debug)]
pub struct ConnectionReader {
    inner: BufReader<OwnedReadHalf>,
    max_frame_len: usize,
}

impl ConnectionReader {
    /// Waits for the next message. `Ok(None)` means the peer closed.
    pub async fn receive(&mut self) -> ProtocolResult<Option<WireMessage>> {
        match read_frame(&mut self.inner, self.max_frame_len).await? {
            Some(payload) => Ok(Some(from_cbor(&payload)?)),
            None => Ok(None),
        }
    }
}

/// Sending half of a [`Connection`].
#[derive(Debug)]
pub struct ConnectionWriter {
    inner: OwnedWriteHalf,
    max_frame_len: usize,
}

impl ConnectionWriter {
    /// Sends one message and flushes it.
    pub async fn send(&mut self, message: &WireMessage) -> ProtocolResult<()> {
        write_message(&mut self.inner, message, self.max_frame_len).await
    }

    /// Shuts down the write side.
    pub async fn close(&mut self) -> ProtocolResult<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// A duplex message connection.
///
/// `send` returns once the frame is flushed to the socket. `receive` waits
/// without a timeout until a whole message arrives or the peer closes.
#[derive(Debug)]
pub struct Connection {
    reader: ConnectionReader,
    writer: ConnectionWriter,
    peer: SocketAddr,
}

impl Connection {
    /// Dials `addr`, optionally bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ConnectFailure`] or
    /// [`ProtocolError::ConnectTimeout`].
    pub async fn connect(addr: SocketAddr, timeout: Option<Duration>) -> ProtocolResult<Self> {
        let dial = TcpStream::connect(addr);
        let stream = match timeout {
            Some(limit) => tokio::time::timeout(limit, dial).await.map_err(|_| {
                ProtocolError::ConnectTimeout {
                    addr: addr.to_string(),
                }
            })?,
            None => dial.await,
        }
        .map_err(|source| ProtocolError::ConnectFailure {
            addr: addr.to_string(),
            source,
        })?;
        debug!(%addr, "connected");
        Self::from_stream(stream, DEFAULT_MAX_FRAME_LEN)
    }

    /// Wraps an accepted stream.
    pub fn from_stream(stream: TcpStream, max_frame_len: usize) -> ProtocolResult<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let (read, write) = stream.into_split();
        Ok(Self {
            reader: ConnectionReader {
                inner: BufReader::new(read),
                max_frame_len,
            },
            writer: ConnectionWriter {
                inner: write,
                max_frame_len,
            },
            peer,
        })
    }

    /// Address of the remote end.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Sends one message and flushes it.
    pub async fn send(&mut self, message: &WireMessage) -> ProtocolResult<()> {
        self.writer.send(message).await
    }

    /// Waits for the next message. `Ok(None)` means the peer closed.
    pub async fn receive(&mut self) -> ProtocolResult<Option<WireMessage>> {
        self.reader.receive().await
    }

    /// Waits for a message that must arrive. EOF becomes
    /// [`ProtocolError::Closed`].
    pub async fn receive_required(&mut self) -> ProtocolResult<WireMessage> {
        self.receive().await?.ok_or(ProtocolError::Closed)
    }

    /// Shuts down the write side, signalling end-of-stream to the peer.
    pub async fn close(mut self) -> ProtocolResult<()> {
        self.writer.close().await
    }

    /// Splits into independently owned halves.
    pub fn into_split(self) -> (ConnectionReader, ConnectionWriter) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (Connection, Connection) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(Connection::connect(addr, None), listener.accept());
        let (stream, _) = accepted.unwrap();
        (
            client.unwrap(),
            Connection::from_stream(stream, DEFAULT_MAX_FRAME_LEN).unwrap(),
        )
    }

    #[tokio::test]
    async fn messages_arrive_in_order() {
        let (mut client, mut server) = pair().await;
        client.send(&WireMessage::write_line("database/a.txt", "1")).await.unwrap();
        client.send(&WireMessage::FetchAll).await.unwrap();

        assert_eq!(server.receive_required().await.unwrap().name(), "WriteLine");
        assert_eq!(server.receive_required().await.unwrap().name(), "FetchAll");
    }

    #[tokio::test]
    async fn close_is_end_of_stream() {
        let (client, mut server) = pair().await;
        client.close().await.unwrap();
        assert!(server.receive().await.unwrap().is_none());
        assert!(server.receive_required().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn eof_inside_frame_is_error() {
        let mut wire: &[u8] = &[0, 0, 0, 9, 1, 2];
        assert!(read_frame(&mut wire, 64).await.is_err());
        let mut short_header: &[u8] = &[0, 0];
        assert!(read_frame(&mut short_header, 64).await.is_err());
        let mut empty: &[u8] = &[];
        assert!(read_frame(&mut empty, 64).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_frame_rejected() {
        let mut wire: &[u8] = &[0, 0, 1, 0];
        let err = read_frame(&mut wire, 16).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Codec(_)));
    }

    #[tokio::test]
    async fn connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = Connection::connect(addr, Some(Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert!(err.is_connect_failure());
    }
}
