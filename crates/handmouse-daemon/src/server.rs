//! Unix socket listener serving the control protocol

use std::fs::{self, File, OpenOptions};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};

use handmouse_core::codec::{read_record, write_record};
use handmouse_core::protocol::{Request, Response};
use handmouse_core::{ControlError, ErrorKind};

use crate::handler::CommandHandler;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Another engine is already serving {0}")]
    AlreadyRunning(PathBuf),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// How long a client has to send its request once connected
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Engine-side endpoint. One request and one response per connection.
///
/// Holds an exclusive lock next to the socket so that a second engine cannot
/// unlink a socket that is still being served. The socket is removed on drop.
pub struct ControlServer {
    path: PathBuf,
    lock_path: PathBuf,
    listener: UnixListener,
    read_timeout: Duration,
    _lock: File,
}

impl ControlServer {
    /// Bind the socket, replacing a stale socket file left by a dead engine
    pub fn bind(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let lock_path = lock_path_for(&path);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        if lock.try_lock_exclusive().is_err() {
            return Err(ServerError::AlreadyRunning(path));
        }

        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed stale socket: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let listener = UnixListener::bind(&path)?;
        tracing::info!("Control socket listening: {}", path.display());

        Ok(Self {
            path,
            lock_path,
            listener,
            read_timeout: DEFAULT_READ_TIMEOUT,
            _lock: lock,
        })
    }

    /// Drop connections that have not delivered a request within `timeout`
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serve forever
    pub async fn serve<H: CommandHandler>(&self, handler: Arc<H>) -> Result<()> {
        self.serve_until(handler, std::future::pending()).await
    }

    /// Serve until `shutdown` resolves. Connections already accepted finish
    /// on their own tasks.
    pub async fn serve_until<H, F>(&self, handler: Arc<H>, shutdown: F) -> Result<()>
    where
        H: CommandHandler,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Control socket shutting down: {}", self.path.display());
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let handler = Arc::clone(&handler);
                        let read_timeout = self.read_timeout;
                        tokio::spawn(async move {
                            let served =
                                handle_connection(stream, handler.as_ref(), read_timeout).await;
                            if let Err(e) = served {
                                tracing::warn!("Dropped control connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Accept failed: {}", e);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                }
            }
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = fs::remove_file(&self.lock_path);
    }
}

async fn handle_connection<H: CommandHandler>(
    mut stream: UnixStream,
    handler: &H,
    read_timeout: Duration,
) -> handmouse_core::Result<()> {
    let request = tokio::time::timeout(read_timeout, read_record::<_, Request>(&mut stream))
        .await
        .map_err(|_| {
            ControlError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no request within {}ms", read_timeout.as_millis()),
            ))
        })?;

    let response = match request {
        Ok(request) => {
            tracing::debug!("Handling command: {}", request.name);
            handler.handle(&request)
        }
        Err(e) if e.kind() == ErrorKind::Protocol => Response::error(format!("Invalid request: {}", e)),
        Err(e) => return Err(e),
    };

    write_record(&mut stream, &response).await
}

fn lock_path_for(socket: &Path) -> PathBuf {
    let mut name = socket.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    socket.with_file_name(name)
}
