//! One-shot HTTP stub used by backend tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one HTTP request with a fixed JSON body, returning the API base.
pub(crate) async fn serve_once(status: u16, body: &'static str) -> String {
    serve_once_recording(status, body).await.0
}

/// Like [`serve_once`], also handing back the raw request once it is served.
pub(crate) async fn serve_once_recording(
    status: u16,
    body: &'static str,
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("should accept");
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        // Read headers, then as much body as Content-Length announces
        loop {
            let n = socket.read(&mut buf).await.expect("should read");
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&received);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if received.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }

        let reply = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket
            .write_all(reply.as_bytes())
            .await
            .expect("should write");
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&received).into_owned()
    });

    (format!("http://{}/v1", addr), handle)
}
