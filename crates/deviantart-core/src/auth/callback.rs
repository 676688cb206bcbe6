use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::{Host, Url};

use super::AuthError;

const CLOSE_WINDOW_HTML: &str = "<script>window.close();</script>";
const ERROR_HTML: &str = r#"<html><body><h1>Authorization failed</h1><p>Please return to the application for details.</p></body></html>"#;
const NOT_FOUND_HTML: &str = "<html><body><h1>Not found</h1></body></html>";
const MAX_REQUEST_BYTES: usize = 8 * 1024;
/// How long a connection may take to deliver its request head.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Authorization code and state captured from the provider's redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCallback {
    pub code: String,
    pub state: String,
}

type CallbackResult = Result<CapturedCallback, AuthError>;

/// Loopback listener bound to the host, port and path of a redirect URL.
///
/// Binding happens before any task is spawned, so an occupied port or an
/// unusable redirect URL is reported to the caller instead of failing in the
/// background.
#[derive(Debug)]
pub struct CallbackListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    redirect_uri: Url,
}

impl CallbackListener {
    pub async fn bind(redirect_uri: &Url) -> Result<Self, AuthError> {
        if redirect_uri.scheme() != "http" {
            return Err(AuthError::InvalidRedirect(format!(
                "loopback redirect must use http, got '{}'",
                redirect_uri.scheme()
            )));
        }

        let host = match redirect_uri.host() {
            Some(Host::Domain(domain)) => domain.to_owned(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => {
                return Err(AuthError::InvalidRedirect(format!(
                    "redirect URL '{redirect_uri}' has no host"
                )))
            }
        };
        let port = redirect_uri.port_or_known_default().unwrap_or(80);

        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|source| AuthError::Bind {
                addr: format!("{host}:{port}"),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        // A configured port of 0 resolves to whatever the OS handed out.
        let mut redirect_uri = redirect_uri.clone();
        if port == 0 {
            redirect_uri
                .set_port(Some(local_addr.port()))
                .map_err(|_| AuthError::InvalidRedirect(redirect_uri.to_string()))?;
        }

        debug!(%local_addr, path = redirect_uri.path(), "callback listener bound");
        Ok(Self {
            listener,
            local_addr,
            redirect_uri,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Redirect URL the provider should send the browser to.
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Start serving in a background task.
    pub fn spawn(self) -> PendingCallback {
        let (tx, rx) = oneshot::channel();
        let path = self.redirect_uri.path().to_owned();
        let handle = tokio::spawn(serve(self.listener, path, tx));
        PendingCallback {
            rx,
            handle: Some(handle),
            local_addr: self.local_addr,
        }
    }
}

/// Handle to a running listener that resolves once with the captured callback.
///
/// Dropping the handle aborts the listener task and releases the port.
#[derive(Debug)]
pub struct PendingCallback {
    rx: oneshot::Receiver<CallbackResult>,
    handle: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl PendingCallback {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the redirect, a cancellation signal, or the optional deadline,
    /// whichever comes first. The listener is shut down before returning.
    pub async fn wait(
        mut self,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<CapturedCallback, AuthError> {
        let addr = self.local_addr;
        let deadline = async {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AuthError::Cancelled),
            received = &mut self.rx => match received {
                Ok(result) => result,
                Err(_) => Err(AuthError::ListenerClosed(addr)),
            },
            _ = deadline => Err(AuthError::Timeout),
        };

        self.shutdown().await;
        outcome
    }

    async fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        debug!(local_addr = %self.local_addr, "callback listener stopped");
    }
}

impl Drop for PendingCallback {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn serve(listener: TcpListener, path: String, tx: oneshot::Sender<CallbackResult>) {
    let path: Arc<str> = path.into();
    let (done_tx, mut done_rx) = mpsc::channel::<CallbackResult>(1);
    // Each connection is served on its own task so a client that connects
    // and never sends a request cannot hold up the real redirect.
    let mut connections = JoinSet::new();

    let result = loop {
        tokio::select! {
            biased;
            Some(result) = done_rx.recv() => break result,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let done = done_tx.clone();
                    connections.spawn(serve_connection(stream, peer, path.clone(), done));
                }
                Err(err) => break Err(AuthError::Io(err)),
            },
        }
    };

    // Release the port before the orchestrator observes the result; later
    // redirects are refused rather than delivered.
    drop(listener);
    connections.abort_all();
    let _ = tx.send(result);
}

async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    path: Arc<str>,
    done: mpsc::Sender<CallbackResult>,
) {
    let handled =
        tokio::time::timeout(REQUEST_TIMEOUT, handle_connection(&mut stream, &path)).await;
    match handled {
        Ok(Ok(Some(result))) => {
            let _ = stream.shutdown().await;
            let _ = done.send(result).await;
        }
        Ok(Ok(None)) => {}
        Ok(Err(err)) => warn!(%peer, error = %err, "discarding malformed callback request"),
        Err(_) => debug!(%peer, "closing idle callback connection"),
    }
}

/// Returns `Some` once a request hit the registered path.
async fn handle_connection(
    stream: &mut TcpStream,
    path: &str,
) -> Result<Option<CallbackResult>, AuthError> {
    let request = read_request_head(stream).await?;
    let (method, target) = parse_request_line(&request)?;

    let url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|err| AuthError::InvalidAuthorizationResponse(err.to_string()))?;
    if url.path() != path {
        respond(stream, 404, NOT_FOUND_HTML).await?;
        return Ok(None);
    }
    if method != "GET" {
        respond(stream, 405, ERROR_HTML).await?;
        return Ok(None);
    }

    let mut code: Option<String> = None;
    let mut state: Option<String> = None;
    let mut error: Option<String> = None;
    let mut error_description: Option<String> = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(err) = error {
        respond(stream, 400, ERROR_HTML).await?;
        let reason = match error_description {
            Some(description) => format!("{err}: {description}"),
            None => err,
        };
        return Ok(Some(Err(AuthError::AccessDenied(reason))));
    }

    let Some(code) = code.filter(|value| !value.is_empty()) else {
        respond(stream, 400, ERROR_HTML).await?;
        return Ok(Some(Err(AuthError::MissingAuthorizationCode)));
    };

    respond(stream, 200, CLOSE_WINDOW_HTML).await?;
    Ok(Some(Ok(CapturedCallback {
        code,
        state: state.unwrap_or_default(),
    })))
}

async fn read_request_head(stream: &mut TcpStream) -> Result<String, AuthError> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn parse_request_line(request: &str) -> Result<(&str, &str), AuthError> {
    let first_line = request
        .lines()
        .next()
        .ok_or_else(|| AuthError::InvalidAuthorizationResponse("missing request line".into()))?;
    let mut parts = first_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| AuthError::InvalidAuthorizationResponse("missing method".into()))?;
    let target = parts
        .next()
        .filter(|target| target.starts_with('/'))
        .ok_or_else(|| AuthError::InvalidAuthorizationResponse("missing path".into()))?;
    Ok((method, target))
}

async fn respond(stream: &mut TcpStream, status: u16, body: &str) -> Result<(), AuthError> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let response = format!(
        "{status_line}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    Ok(())
}
