#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use reqwest::Client;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

pub const CODE_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<table>
  <tr><th>Country</th><th>FIPS 10-4</th><th>ISO 3166</th></tr>
  <tr><td>Germany</td><td>GM</td><td>DE</td></tr>
  <tr><td>Iraq</td><td>IZ</td><td>IQ</td></tr>
  <tr><td>Japan</td><td>JA</td><td>JP</td></tr>
</table>
</body></html>"#;

/// A one-route HTTP server answering every request with the same response.
pub struct FixtureServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl FixtureServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serves `body` with `status` (e.g. "200 OK") on an ephemeral local port.
pub async fn serve(status: &'static str, body: &'static str) -> FixtureServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                // read until end of request headers
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(response.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });

    FixtureServer {
        url: format!("http://{addr}/codes"),
        hits,
    }
}

/// Accepts connections and never answers.
pub async fn serve_silence() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    format!("http://{addr}/codes")
}

/// Client that bypasses any proxy configured in the environment.
pub fn local_client(timeout: Duration) -> Client {
    Client::builder()
        .no_proxy()
        .timeout(timeout)
        .build()
        .expect("client")
}
