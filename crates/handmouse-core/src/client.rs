//! Control client for the engine socket
//!
//! Every exchange opens a fresh connection, writes one request, reads one
//! response and closes. Only connection establishment is retried.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UnixStream;

use crate::codec::{read_record, write_record};
use crate::config::Config;
use crate::error::{ControlError, Result};
use crate::protocol::{commands, Argument, FeatureState, Request, Response, StatusReport};

/// Fixed-interval connect retry, no backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 10;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

    /// `attempts` is clamped to at least one
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            interval,
        }
    }

    /// Try once, never sleep
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound on time spent waiting for the engine to appear
    pub fn budget(&self) -> Duration {
        self.interval
            .checked_mul(self.attempts)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_INTERVAL)
    }
}

/// Connect to the engine socket, retrying while it is absent or refusing.
///
/// Sleeps `interval` between attempts but not after the last one.
pub async fn connect(path: &Path, policy: RetryPolicy) -> Result<Connection> {
    let mut attempt = 1;
    loop {
        match UnixStream::connect(path).await {
            Ok(stream) => {
                tracing::debug!("Connected to {} (attempt {})", path.display(), attempt);
                return Ok(Connection {
                    stream,
                    io_timeout: None,
                });
            }
            Err(e) if attempt >= policy.attempts => {
                return Err(ControlError::Unavailable {
                    path: path.to_path_buf(),
                    attempts: attempt,
                    source: e,
                });
            }
            Err(e) => {
                tracing::debug!(
                    "Connect attempt {}/{} to {} failed: {}",
                    attempt,
                    policy.attempts,
                    path.display(),
                    e
                );
            }
        }

        tokio::time::sleep(policy.interval).await;
        attempt += 1;
    }
}

/// One established connection, good for exactly one exchange
#[derive(Debug)]
pub struct Connection {
    stream: UnixStream,
    io_timeout: Option<Duration>,
}

impl Connection {
    /// Bound each read and write of the exchange
    pub fn with_io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Write one request and wait for one response. The connection is closed
    /// when this returns, successfully or not.
    pub async fn send(mut self, request: &Request) -> Result<Response> {
        let limit = self.io_timeout;
        within(limit, write_record(&mut self.stream, request)).await?;
        within(limit, read_record(&mut self.stream)).await
    }
}

async fn within<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            ControlError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no progress within {}ms", limit.as_millis()),
            ))
        })?,
    }
}

/// Engine control client; cheap to clone
#[derive(Debug, Clone)]
pub struct Client {
    socket_path: PathBuf,
    retry: RetryPolicy,
    io_timeout: Option<Duration>,
}

impl Client {
    pub fn new(socket_path: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            socket_path: socket_path.into(),
            retry,
            io_timeout: None,
        }
    }

    /// Client for one-shot commands as configured
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.socket_path(), config.retry_policy()).with_io_timeout(config.io_timeout())
    }

    pub fn with_io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn connect(&self) -> Result<Connection> {
        let conn = connect(&self.socket_path, self.retry).await?;
        Ok(conn.with_io_timeout(self.io_timeout))
    }

    /// Connect, send one request, read one response, close.
    ///
    /// A `status=error` response is returned as-is; the typed helpers below
    /// turn it into [`ControlError::Rejected`].
    pub async fn call(&self, request: &Request) -> Result<Response> {
        tracing::debug!("-> {} {:?}", request.name, request.argument);
        let response = self.connect().await?.send(request).await?;
        tracing::debug!("<- {} {:?}", request.name, response.status);
        Ok(response)
    }

    async fn call_checked(&self, request: &Request) -> Result<Response> {
        self.call(request).await?.into_result(&request.name)
    }

    pub async fn get_status(&self) -> Result<StatusReport> {
        let response = self.call_checked(&Request::get_status()).await?;
        Ok(StatusReport::from_response(&response))
    }

    pub async fn toggle_asl(&self) -> Result<FeatureState> {
        let response = self.call_checked(&Request::toggle_asl()).await?;
        Ok(FeatureState::from_response(&response, "asl_enabled"))
    }

    pub async fn set_asl(&self, enabled: bool) -> Result<FeatureState> {
        let response = self.set_feature(commands::SET_ASL, enabled).await?;
        Ok(FeatureState::from_response(&response, "asl_enabled"))
    }

    pub async fn set_camera(&self, index: i64) -> Result<Response> {
        self.set_parameter(commands::SET_CAMERA, index).await
    }

    /// Set a boolean engine feature by command name
    pub async fn set_feature(&self, command: &str, enabled: bool) -> Result<Response> {
        self.call_checked(&Request::with_argument(command, enabled)).await
    }

    /// Set a numeric engine parameter by command name
    pub async fn set_parameter(&self, command: &str, value: impl Into<Argument>) -> Result<Response> {
        self.call_checked(&Request::with_argument(command, value)).await
    }

    pub async fn start_processing(&self) -> Result<Response> {
        self.call_checked(&Request::start()).await
    }

    pub async fn stop_processing(&self) -> Result<Response> {
        self.call_checked(&Request::stop()).await
    }
}
