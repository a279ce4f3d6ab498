//! Shared utilities for integration tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A mock HTTP server bound to an ephemeral port on 127.0.0.1.
pub struct MockServer {
    pub port: u16,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Stop accepting connections and release the port.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

/// Start a mock server answering every request with `status_line`, e.g. `"200 OK"`.
pub async fn start_mock_server(status_line: &'static str) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    start_on(listener, status_line)
}

/// Start a mock server on a specific, already reserved port.
pub async fn start_mock_server_on(port: u16, status_line: &'static str) -> MockServer {
    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    start_on(listener, status_line)
}

fn start_on(listener: TcpListener, status_line: &'static str) -> MockServer {
    let port = listener.local_addr().unwrap().port();

    let task = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nLocation: /elsewhere\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_line
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockServer { port, task }
}

/// Start a server that accepts connections but never answers.
pub async fn start_silent_server() -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let task = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    MockServer { port, task }
}

/// A port with nothing listening on it (bound once, then released).
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
