//! Canned HTTP server for exercising the REST adapters without the network.

use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::cli::Backend;
use crate::config::Config;

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub authorization: Option<String>,
    pub body: String,
}

struct Route {
    method: &'static str,
    path: &'static str,
    status: u16,
    body: String,
}

/// Answers every request whose method matches and whose target contains a
/// route's path with that route's status and JSON body. Unmatched requests
/// get a 404.
pub struct StubServer {
    pub url: String,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

pub struct StubBuilder {
    routes: Vec<Route>,
}

impl StubServer {
    pub fn builder() -> StubBuilder {
        StubBuilder { routes: Vec::new() }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }

    /// A config pointing every endpoint at this stub.
    pub fn config(&self, session_file: &Path) -> Config {
        Config {
            backend: Backend::Firebase,
            project_id: "films".to_string(),
            api_key: "test-key".to_string(),
            collection: "videos".to_string(),
            session_file: session_file.to_path_buf(),
            firestore_url: self.url.clone(),
            identity_url: self.url.clone(),
            securetoken_url: self.url.clone(),
        }
    }
}

impl StubBuilder {
    pub fn route(mut self, method: &'static str, path: &'static str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method,
            path,
            status,
            body: body.to_string(),
        });
        self
    }

    pub async fn start(self) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let routes = Arc::new(self.routes);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let recorder = seen.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, routes.clone(), recorder.clone()));
            }
        });

        StubServer { url, seen }
    }
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

async fn serve(mut stream: TcpStream, routes: Arc<Vec<Route>>, seen: Arc<Mutex<Vec<Recorded>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_len = loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(end) = header_end(&buf) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_len]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buf.len() < head_len + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = buf.len().min(head_len + content_length);
    let body = String::from_utf8_lossy(&buf[head_len..body_end]).to_string();

    let (status, payload) = routes
        .iter()
        .find(|r| r.method == method && target.contains(r.path))
        .map(|r| (r.status, r.body.clone()))
        .unwrap_or((404, "{}".to_string()));

    seen.lock().unwrap().push(Recorded {
        method,
        target,
        authorization,
        body,
    });

    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        payload.len(),
        payload
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
