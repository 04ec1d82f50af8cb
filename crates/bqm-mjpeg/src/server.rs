//! Raw `multipart/x-mixed-replace` MJPEG server.
//!
//! This is deliberately not an axum service: the wire protocol needs
//! manual per-client socket writes (an HTTP/1.0 status line and headers
//! written once at connect, then a boundary-delimited JPEG chunk written
//! repeatedly afterward) rather than a single framed response body. The
//! shared `last_frame` buffer and the client registry are each behind
//! their own lock, and the broadcast loop always acquires `last_frame`
//! before `clients`, so a `write_frame` call and a broadcast tick can
//! never deadlock against each other.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::error::MjpegError;

const BOUNDARY: &str = "--mjpegstream";

const CONNECT_HEADER: &str = "HTTP/1.0 200 OK\r\n\
Server: bqm-mjpeg\r\n\
Connection: close\r\n\
Max-Age: 0\r\n\
Expires: 0\r\n\
Cache-Control: no-cache, private\r\n\
Pragma: no-cache\r\n\
Content-Type: multipart/x-mixed-replace; boundary=--mjpegstream\r\n\r\n";

struct ClientHandle {
    id: u64,
    writer: OwnedWriteHalf,
}

pub struct MjpegServer {
    last_frame: Arc<Mutex<Vec<u8>>>,
    clients: Arc<Mutex<Vec<ClientHandle>>>,
    max_clients: usize,
    black_list: Vec<String>,
    next_client_id: AtomicU64,
}

impl MjpegServer {
    pub fn new(max_clients: usize, black_list: Vec<String>) -> Self {
        MjpegServer {
            last_frame: Arc::new(Mutex::new(Vec::new())),
            clients: Arc::new(Mutex::new(Vec::new())),
            max_clients,
            black_list,
            next_client_id: AtomicU64::new(1),
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn write_frame(&self, jpeg: Vec<u8>) {
        *self.last_frame.lock().await = jpeg;
    }

    fn is_blacklisted(&self, addr: &SocketAddr) -> bool {
        self.black_list.iter().any(|entry| entry == &addr.ip().to_string())
    }

    /// Accepts connections until the listener closes. A blacklisted peer's
    /// socket is closed immediately with no HTTP response at all, matching
    /// `slotNewConnection()`'s early `client->close()` branch.
    pub async fn accept_loop(&self, listener: TcpListener) -> Result<(), MjpegError> {
        loop {
            let (stream, addr) = listener.accept().await?;

            if self.is_blacklisted(&addr) {
                tracing::info!(%addr, "rejected blacklisted client");
                drop(stream);
                continue;
            }

            if self.client_count().await >= self.max_clients {
                tracing::warn!(%addr, "rejected client, server at capacity");
                drop(stream);
                continue;
            }

            let (_read_half, mut write_half) = stream.into_split();
            if write_half.write_all(CONNECT_HEADER.as_bytes()).await.is_err() {
                continue;
            }

            let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
            self.clients.lock().await.push(ClientHandle { id, writer: write_half });
            tracing::info!(%addr, client_id = id, "mjpeg client connected");
        }
    }

    /// Sends the current last frame to every connected client, dropping
    /// any client whose write fails (a closed or dead socket).
    pub async fn broadcast_once(&self) {
        let frame_guard = self.last_frame.lock().await;
        if frame_guard.is_empty() {
            return;
        }

        let mut clients_guard = self.clients.lock().await;
        let mut alive = Vec::with_capacity(clients_guard.len());

        for mut client in clients_guard.drain(..) {
            if write_frame_chunk(&mut client.writer, &frame_guard).await.is_ok() {
                alive.push(client);
            } else {
                tracing::info!(client_id = client.id, "mjpeg client disconnected");
            }
        }

        *clients_guard = alive;
    }

    /// Runs `broadcast_once` on `rate`'s derived interval until canceled.
    pub async fn broadcast_loop(&self, delay: std::time::Duration) {
        let mut ticker = tokio::time::interval(delay);
        loop {
            ticker.tick().await;
            self.broadcast_once().await;
        }
    }
}

async fn write_frame_chunk(writer: &mut OwnedWriteHalf, jpeg: &[u8]) -> std::io::Result<()> {
    let header = format!("{BOUNDARY}\r\nContent-type: image/jpeg\r\nContent-length: {}\r\n\r\n", jpeg.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(jpeg).await?;
    writer.write_all(b"\r\n\r\n").await?;
    writer.flush().await
}
