//! Wire layer of an upload: asking the backend where to put a file, then putting it there.

use super::credentials::CredentialProvider;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use std::sync::Arc;

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("request failed with status {status}")]
    Status { status: StatusCode },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("backend returned an empty destination")]
    EmptyDestination,

    #[error("authorization token is not a valid header value")]
    InvalidToken,
}

impl UploadError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UploadError::Status { status } => Some(*status),
            UploadError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Message shown to the user for a failed destination request.
    pub fn user_message(&self) -> &'static str {
        match self.status() {
            Some(StatusCode::UNAUTHORIZED) => "401 Unauthorized",
            Some(StatusCode::FORBIDDEN) => "403 Forbidden",
            _ => "Unknown error",
        }
    }
}

#[derive(Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    base_url: Option<Url>,
    credentials: Arc<dyn CredentialProvider>,
}

impl UploadClient {
    pub fn new(
        base_url: Option<&str>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, UploadError> {
        let base_url = base_url
            .filter(|url| !url.is_empty())
            .map(|url| Url::parse(url).map_err(|e| UploadError::InvalidUrl(format!("{url}: {e}"))))
            .transpose()?;

        Ok(Self::from_parts(
            reqwest::Client::builder().build()?,
            base_url,
            credentials,
        ))
    }

    pub fn from_parts(
        http: reqwest::Client,
        base_url: Option<Url>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    /// Absolute URL of a resource; relative paths are joined onto the API base URL.
    pub fn resolve(&self, resource_url: &str) -> Result<Url, UploadError> {
        match (Url::parse(resource_url), &self.base_url) {
            (Ok(url), _) => Ok(url),
            (Err(_), Some(base)) => base
                .join(resource_url)
                .map_err(|e| UploadError::InvalidUrl(format!("{resource_url}: {e}"))),
            (Err(e), None) => Err(UploadError::InvalidUrl(format!("{resource_url}: {e}"))),
        }
    }

    /// `Basic <token>` when a token is available. The scheme name is kept as the backend expects it.
    pub fn authorization_header(&self) -> Result<Option<HeaderValue>, UploadError> {
        self.credentials
            .token()
            .map(|token| {
                HeaderValue::from_str(&format!("Basic {token}")).map_err(|_| UploadError::InvalidToken)
            })
            .transpose()
    }

    /// Asks `resource_url` for a destination to write `file_name` to.
    pub async fn request_destination(
        &self,
        resource_url: &str,
        file_name: &str,
    ) -> Result<String, UploadError> {
        let mut url = self.resolve(resource_url)?;
        let name = utf8_percent_encode(file_name, URI_COMPONENT).to_string();
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&name={name}"),
            _ => format!("name={name}"),
        };
        url.set_query(Some(&query));

        let mut request = self.http.get(url);
        if let Some(value) = self.authorization_header()? {
            request = request.header(AUTHORIZATION, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status { status });
        }

        let body = response.text().await?;
        parse_destination(&body)
    }

    /// Sends the whole file to `destination_url` in one `PUT`.
    pub async fn transfer_file(&self, destination_url: &str, bytes: Vec<u8>) -> Result<(), UploadError> {
        if destination_url.is_empty() {
            return Err(UploadError::EmptyDestination);
        }
        let url = Url::parse(destination_url)
            .map_err(|e| UploadError::InvalidUrl(format!("{destination_url}: {e}")))?;

        let response = self.http.put(url).body(bytes).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status { status });
        }
        Ok(())
    }
}

/// The destination comes back either as a JSON string literal or as plain text.
fn parse_destination(body: &str) -> Result<String, UploadError> {
    let body = body.trim();
    let destination = serde_json::from_str::<String>(body).unwrap_or_else(|_| body.to_string());
    if destination.is_empty() {
        return Err(UploadError::EmptyDestination);
    }
    Ok(destination)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::upload::credentials::StaticToken;
    use crate::mock::{read_request, write_response, RecordedRequest};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one response with `status` and `body`, yielding the request it received.
    pub(crate) async fn capture_server(
        status: u16,
        body: &str,
    ) -> (String, JoinHandle<RecordedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await.unwrap();
            let _ = write_response(&mut stream, status, &body).await;
            request
        });

        (url, handle)
    }

    fn client(base: &str, token: StaticToken) -> UploadClient {
        UploadClient::new(Some(base), Arc::new(token)).unwrap()
    }

    #[tokio::test]
    async fn sends_basic_token_when_present() {
        let (url, handle) = capture_server(200, r#""https://storage/dest123""#).await;
        let client = client(&url, StaticToken::new("abc"));

        let destination = client
            .request_destination("/api/products/import", "data.csv")
            .await
            .unwrap();
        let request = handle.await.unwrap();

        assert_eq!(destination, "https://storage/dest123");
        assert_eq!(request.method, "GET");
        assert_eq!(request.target, "/api/products/import?name=data.csv");
        assert_eq!(request.header("authorization"), Some("Basic abc"));
    }

    #[tokio::test]
    async fn omits_authorization_without_token() {
        let (url, handle) = capture_server(200, "https://storage/plain").await;
        let client = client(&url, StaticToken::none());

        let destination = client.request_destination("/import", "data.csv").await.unwrap();
        let request = handle.await.unwrap();

        assert_eq!(destination, "https://storage/plain");
        assert_eq!(request.header("authorization"), None);
    }

    #[tokio::test]
    async fn escapes_file_name_once() {
        let (url, handle) = capture_server(200, r#""https://storage/x""#).await;
        let client = client(&url, StaticToken::none());

        client
            .request_destination("/import?kind=csv", "my data (v2).csv")
            .await
            .unwrap();
        let request = handle.await.unwrap();

        assert_eq!(request.target, "/import?kind=csv&name=my%20data%20(v2).csv");
    }

    #[tokio::test]
    async fn non_success_status_becomes_status_error() {
        for (code, message) in [
            (401, "401 Unauthorized"),
            (403, "403 Forbidden"),
            (400, "Unknown error"),
            (404, "Unknown error"),
            (500, "Unknown error"),
        ] {
            let (url, handle) = capture_server(code, "{}").await;
            let client = client(&url, StaticToken::new("abc"));

            let err = client.request_destination("/import", "a.csv").await.unwrap_err();
            handle.await.unwrap();

            assert_eq!(err.status().map(|s| s.as_u16()), Some(code));
            assert_eq!(err.user_message(), message);
        }
    }

    #[tokio::test]
    async fn network_failure_is_unknown_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = client(&format!("http://127.0.0.1:{port}"), StaticToken::none());
        let err = client.request_destination("/import", "a.csv").await.unwrap_err();

        assert!(matches!(err, UploadError::Transport(_)));
        assert_eq!(err.user_message(), "Unknown error");
    }

    #[tokio::test]
    async fn transfer_puts_raw_bytes() {
        let (url, handle) = capture_server(200, "").await;
        let client = client(&url, StaticToken::new("abc"));

        client
            .transfer_file(&format!("{url}/uploads/data.csv"), b"id,name\n1,Rust\n".to_vec())
            .await
            .unwrap();
        let request = handle.await.unwrap();

        assert_eq!(request.method, "PUT");
        assert_eq!(request.target, "/uploads/data.csv");
        assert_eq!(request.body, b"id,name\n1,Rust\n");
        assert_eq!(request.header("authorization"), None);
    }

    #[tokio::test]
    async fn transfer_reports_server_errors() {
        let (url, handle) = capture_server(500, "").await;
        let client = client(&url, StaticToken::none());

        let err = client
            .transfer_file(&format!("{url}/uploads/a"), vec![1, 2, 3])
            .await
            .unwrap_err();
        handle.await.unwrap();

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn transfer_requires_destination() {
        let client = client("http://127.0.0.1:9", StaticToken::none());
        let err = client.transfer_file("", vec![]).await.unwrap_err();
        assert!(matches!(err, UploadError::EmptyDestination));
    }

    #[test]
    fn destination_body_parsing() {
        assert_eq!(parse_destination(" \"https://s/d\"\n").unwrap(), "https://s/d");
        assert_eq!(parse_destination("https://s/d").unwrap(), "https://s/d");
        assert!(matches!(parse_destination("\"\""), Err(UploadError::EmptyDestination)));
    }

    #[test]
    fn resolves_relative_resources_against_base() {
        let client = client("http://localhost:4000/dev/", StaticToken::none());
        assert_eq!(
            client.resolve("/api/products/import").unwrap().as_str(),
            "http://localhost:4000/api/products/import"
        );
        assert_eq!(
            client.resolve("https://api.example.com/import").unwrap().as_str(),
            "https://api.example.com/import"
        );

        let unrooted = UploadClient::new(None, Arc::new(StaticToken::none())).unwrap();
        assert!(matches!(unrooted.resolve("/import"), Err(UploadError::InvalidUrl(_))));
    }
}
