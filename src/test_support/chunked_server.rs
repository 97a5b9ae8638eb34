//! Minimal HTTP/1.1 servers that stream a chunked body with no `Content-Length`.
//!
//! Model uncooperative origins: the client only learns the size by reading,
//! and a stall can happen after the headers are already through.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::skip_without_loopback;

#[derive(Debug, Clone, Copy)]
enum Body {
    /// `count` chunks of `size` bytes, then the terminator.
    Chunks { count: usize, size: usize },
    /// One chunk of `size` bytes, then silence for `stall`.
    StallAfter { size: usize, stall: Duration },
}

/// Starts a server that answers every GET with `chunks` chunks of `chunk_size` bytes.
///
/// Returns the base URL (e.g. `http://127.0.0.1:12345`), or `None` when local
/// sockets are unavailable. The server lives until the test runtime shuts down.
pub(crate) async fn spawn_chunked_server(chunks: usize, chunk_size: usize) -> Option<String> {
    spawn(Body::Chunks {
        count: chunks,
        size: chunk_size,
    })
    .await
}

/// Starts a server that sends one chunk of `first_chunk` bytes and then goes quiet.
pub(crate) async fn spawn_stalling_server(first_chunk: usize, stall: Duration) -> Option<String> {
    spawn(Body::StallAfter {
        size: first_chunk,
        stall,
    })
    .await
}

async fn spawn(body: Body) -> Option<String> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(e) => {
            skip_without_loopback(&e);
            return None;
        }
    };
    let port = listener.local_addr().ok()?.port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve(stream, body));
        }
    });

    Some(format!("http://127.0.0.1:{port}"))
}

async fn serve(mut stream: TcpStream, body: Body) {
    let mut buf = [0u8; 4096];
    // Request line and headers fit in one read for the clients under test.
    if !matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {
        return;
    }

    let head = "HTTP/1.1 200 OK\r\n\
                Content-Type: audio/mpeg\r\n\
                Transfer-Encoding: chunked\r\n\
                Connection: close\r\n\r\n";
    if stream.write_all(head.as_bytes()).await.is_err() {
        return;
    }

    match body {
        Body::Chunks { count, size } => {
            for _ in 0..count {
                // Client hangs up once it has seen enough; stop quietly.
                if write_chunk(&mut stream, size).await.is_err() {
                    return;
                }
            }
        }
        Body::StallAfter { size, stall } => {
            if write_chunk(&mut stream, size).await.is_err() {
                return;
            }
            tokio::time::sleep(stall).await;
        }
    }
    let _ = stream.write_all(b"0\r\n\r\n").await;
    let _ = stream.shutdown().await;
}

async fn write_chunk(stream: &mut TcpStream, size: usize) -> std::io::Result<()> {
    stream.write_all(format!("{size:x}\r\n").as_bytes()).await?;
    stream.write_all(&vec![b'a'; size]).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await
}
