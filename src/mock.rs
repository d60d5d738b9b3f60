//! Local stand-in for the import backend and object storage, used by debug builds
//! so the UI can be worked on without a live backend.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use std::io;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const UPLOADS_PREFIX: &str = "/uploads/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path plus query string, as sent on the request line.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Reads one HTTP/1.1 request: the head, then `Content-Length` bytes of body.
pub async fn read_request<S>(stream: &mut S) -> io::Result<RecordedRequest>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed mid-request"));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(RecordedRequest {
        method,
        target,
        headers,
        body,
    })
}

pub async fn write_response(stream: &mut TcpStream, status: u16, body: &str) -> io::Result<()> {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Status",
    };
    let resp = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(resp.as_bytes()).await?;
    stream.shutdown().await
}

/// Answers destination requests with URLs pointing back at itself and accepts any upload.
pub struct MockBackend {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start(import_path: &str) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let base_url = format!("http://127.0.0.1:{port}");
        let requests = Arc::new(Mutex::new(Vec::new()));

        log::info!("Mock backend listening on {base_url}, serving {import_path}");

        let handle = tokio::spawn(serve(
            listener,
            base_url.clone(),
            import_path.to_string(),
            requests.clone(),
        ));

        Ok(Self {
            base_url,
            requests,
            handle,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    listener: TcpListener,
    base_url: String,
    import_path: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    loop {
        let (mut stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                log::warn!("Mock backend accept failed: {e}");
                continue;
            }
        };
        let base_url = base_url.clone();
        let import_path = import_path.clone();
        let requests = requests.clone();

        tokio::spawn(async move {
            let request = match read_request(&mut stream).await {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("Mock backend could not read request from {peer}: {e}");
                    return;
                }
            };
            log::debug!("Mock backend: {} {}", request.method, request.target);

            let (status, body) = respond(&request, &base_url, &import_path);
            if let Ok(mut recorded) = requests.lock() {
                recorded.push(request);
            }
            if let Err(e) = write_response(&mut stream, status, &body).await {
                log::warn!("Mock backend could not answer {peer}: {e}");
            }
        });
    }
}

fn respond(request: &RecordedRequest, base_url: &str, import_path: &str) -> (u16, String) {
    let (path, query) = request
        .target
        .split_once('?')
        .unwrap_or((request.target.as_str(), ""));

    match request.method.as_str() {
        "GET" if path == import_path => {
            let name = query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "name")
                .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().to_string());

            match name {
                Some(name) if !name.is_empty() => {
                    let destination = format!(
                        "{base_url}{UPLOADS_PREFIX}{}",
                        utf8_percent_encode(&name, NON_ALPHANUMERIC)
                    );
                    (200, serde_json::Value::String(destination).to_string())
                }
                _ => (400, r#"{"message":"name is required"}"#.to_string()),
            }
        }
        "PUT" if path.starts_with(UPLOADS_PREFIX) => (200, String::new()),
        _ => (404, r#"{"message":"not found"}"#.to_string()),
    }
}
