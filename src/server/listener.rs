use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tracing::{error, info, warn};

use crate::config::{Config, ServerConfig};
use crate::http::connection::Connection;
use crate::web::application::Application;

/// Accepts connections for one application.
///
/// Every task the server starts is spawned on the runtime handle it was
/// given, never on an ambient runtime.
#[derive(Debug)]
pub struct Server {
    app: Arc<Application>,
    config: ServerConfig,
    runtime: Handle,
}

impl Server {
    pub fn new(app: Arc<Application>, config: ServerConfig, runtime: Handle) -> Self {
        Self { app, config, runtime }
    }

    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.listen_addr))?;

        self.serve(listener, shutdown).await
    }

    /// Runs the startup hooks, accepts connections on `listener` until
    /// `shutdown` resolves, then runs the shutdown hooks.
    ///
    /// Requests still being handled when `shutdown` fires are not waited for.
    pub async fn serve(self, listener: TcpListener, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        self.app.startup().await.context("startup hook failed")?;

        info!("Listening on {}", listener.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    info!("Accepted connection from {}", peer);

                    let conn = Connection::new(socket, Arc::clone(&self.app), self.runtime.clone());
                    self.runtime.spawn(async move {
                        if let Err(e) = conn.run().await {
                            error!("Connection error from {}: {}", peer, e);
                        }
                    });
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(listener);
        self.app.shutdown().await.context("shutdown hook failed")
    }
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Serves `app` on a single-threaded runtime until interrupted.
///
/// The runtime is built here and passed down explicitly; all connections
/// and handlers share its one worker thread.
pub fn run_app(app: Application, config: &Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    let server = Server::new(Arc::new(app), config.server.clone(), runtime.handle().clone());
    runtime.block_on(server.run(shutdown_signal()))
}
