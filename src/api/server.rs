//! HTTP server lifecycle.
//!
//! `bind` reserves the listener so callers learn the real port before
//! serving; `serve_until` runs the router until the shutdown future resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::api::router::clinic_api_router;
use crate::core_state::CoreState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },
    #[error("Server error: {0}")]
    Serve(String),
}

/// Bind a listener. Port 0 picks an ephemeral port.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr).await.map_err(|e| ServerError::Bind {
        addr,
        reason: e.to_string(),
    })
}

/// Serve in the current task until `shutdown` resolves.
pub async fn serve_until<F>(
    core: Arc<CoreState>,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Serve(e.to_string()))?;
    tracing::info!(%addr, "API server listening");

    axum::serve(listener, clinic_api_router(core))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    struct Running {
        port: u16,
        shutdown_tx: oneshot::Sender<()>,
        handle: JoinHandle<Result<(), ServerError>>,
        _tmp: tempfile::TempDir,
    }

    impl Running {
        async fn stop(self) {
            let _ = self.shutdown_tx.send(());
            self.handle.await.unwrap().unwrap();
        }
    }

    async fn spawn_server() -> Running {
        let tmp = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::new(tmp.path().join("clinic.db")).unwrap());
        let listener = bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .expect("listener should bind");
        let port = listener.local_addr().unwrap().port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve_until(core, listener, async move {
            let _ = shutdown_rx.await;
        }));

        Running {
            port,
            shutdown_tx,
            handle,
            _tmp: tmp,
        }
    }

    #[tokio::test]
    async fn serves_health_until_stopped() {
        let server = spawn_server().await;
        assert!(server.port > 0);

        let url = format!("http://127.0.0.1:{}/api/health", server.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");

        server.stop().await;
    }

    #[tokio::test]
    async fn protected_routes_reject_anonymous_callers() {
        let server = spawn_server().await;
        let port = server.port;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/appointments"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/nonexistent"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        server.stop().await;
    }

    #[tokio::test]
    async fn register_over_http() {
        let server = spawn_server().await;
        let port = server.port;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/users"))
            .json(&serde_json::json!({ "username": "ann", "email": "ann@example.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

        let user: serde_json::Value = resp.json().await.unwrap();
        let resp = client
            .get(format!("http://127.0.0.1:{port}/api/users/me"))
            .header("X-User-Id", user["id"].to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        server.stop().await;
    }

    #[tokio::test]
    async fn bind_reports_address_in_use() {
        let server = spawn_server().await;
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), server.port);
        assert!(matches!(bind(addr).await, Err(ServerError::Bind { .. })));
        server.stop().await;
    }
}
