//! Minimal HTTP/1.1 client for the payment provider and the table service.
//!
//! `https` URLs go through rustls with the webpki root store; plain `http`
//! URLs are accepted for local endpoints.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HOST, HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),
    #[error("http error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Deadline for one request, connect and TLS handshake included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A buffered response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Sends one request per connection; no pooling and no retries.
///
/// Every request is bounded by the client's timeout, so an endpoint that
/// accepts the connection but never answers fails with [`HttpError::Timeout`].
#[derive(Clone)]
pub struct HttpClient {
    tls: TlsConnector,
    timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        let mut root_cert_store = RootCertStore::empty();
        root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();
        Self {
            tls: TlsConnector::from(Arc::new(config)),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(HeaderName, HeaderValue)],
        body: Bytes,
    ) -> Result<HttpResponse, HttpError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        let host = uri
            .host()
            .ok_or_else(|| HttpError::InvalidUrl(format!("{url}: missing host")))?
            .to_string();
        let secure = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            _ => return Err(HttpError::InvalidUrl(format!("{url}: unsupported scheme"))),
        };
        let port = uri.port_u16().unwrap_or(if secure { 443 } else { 80 });
        let authority = uri
            .authority()
            .map(|a| a.as_str().to_string())
            .unwrap_or_else(|| host.clone());
        let path = uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, authority);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let request = builder.body(Full::new(body))?;

        let server_name = if secure {
            Some(
                ServerName::try_from(host.clone())
                    .map_err(|_| HttpError::InvalidUrl(format!("{url}: invalid dns name")))?,
            )
        } else {
            None
        };

        tracing::debug!(method = %request.method(), %host, path = %request.uri(), "sending request");
        let round_trip = self.round_trip(&host, port, server_name, request);
        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| {
                tracing::warn!(%host, timeout = ?self.timeout, "request timed out");
                HttpError::Timeout(self.timeout)
            })?
    }

    async fn round_trip(
        &self,
        host: &str,
        port: u16,
        server_name: Option<ServerName<'static>>,
        request: Request<Full<Bytes>>,
    ) -> Result<HttpResponse, HttpError> {
        let stream = TcpStream::connect((host, port)).await?;
        match server_name {
            Some(server_name) => {
                let stream = self.tls.connect(server_name, stream).await?;
                exchange(stream, request).await
            }
            None => exchange(stream, request).await,
        }
    }
}

async fn exchange<S>(stream: S, request: Request<Full<Bytes>>) -> Result<HttpResponse, HttpError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
    tokio::task::spawn(async move {
        if let Err(err) = conn.await {
            tracing::debug!(error = %err, "connection closed with error");
        }
    });

    let response = sender.send_request(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await?.to_bytes();
    tracing::debug!(%status, bytes = body.len(), "received response");

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
