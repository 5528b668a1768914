use super::protocol::{AdminCommand, AdminReply};
use crate::registry::registry::ServiceRegistry;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;

const READ_BUFFER: usize = 4096;

pub struct AdminChannel {
    path: PathBuf,
    listener: UnixListener,
    registry: Arc<ServiceRegistry>,
}

impl AdminChannel {
    /// Binds the socket at `path`, replacing a stale socket file left by an
    /// earlier run.
    pub fn bind(path: impl AsRef<Path>, registry: Arc<ServiceRegistry>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        match std::fs::remove_file(&path) {
            Ok(()) => tracing::warn!("Removed stale admin socket {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let listener = UnixListener::bind(&path)?;
        tracing::info!("Admin socket listening at {}", path.display());

        Ok(Self {
            path,
            listener,
            registry,
        })
    }

    /// Accepts connections until `shutdown` flips to `true`, then removes the
    /// socket file. Connections already open are served to completion.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let registry = Arc::clone(&self.registry);
                            tokio::spawn(async move { handle_connection(stream, registry).await });
                        }
                        Err(e) => {
                            tracing::error!("Admin socket accept error: {}", e);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        drop(self.listener);
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove admin socket {}: {}", self.path.display(), e);
        }
        tracing::info!("Admin socket closed");
    }
}

async fn handle_connection(mut stream: UnixStream, registry: Arc<ServiceRegistry>) {
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!("Admin connection read error: {}", e);
                return;
            }
        };

        let input = String::from_utf8_lossy(&buf[..n]);
        let reply = dispatch(&registry, &input);

        if let Err(e) = stream.write_all(reply.to_wire().as_bytes()).await {
            tracing::debug!("Admin connection write error: {}", e);
            return;
        }
    }
}

/// Executes one admin command. A reload is scheduled and left running in the
/// background.
pub fn dispatch(registry: &Arc<ServiceRegistry>, input: &str) -> AdminReply {
    match AdminCommand::parse(input) {
        Some(AdminCommand::UpdateService(name)) if registry.contains(&name) => {
            tracing::info!("Admin socket: updating service {}", name);
            drop(registry.reload(&name));
            AdminReply::Updating
        }
        Some(AdminCommand::UpdateService(name)) => {
            tracing::warn!("Admin socket: service not found: {}", name);
            AdminReply::ServiceNotFound
        }
        None => {
            tracing::warn!("Admin socket: unrecognized command {:?}", input);
            AdminReply::UnrecognizedCommand
        }
    }
}
