//! Server traits for polymorphic server handling

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Core server trait.
///
/// `run` binds, serves until the token is cancelled, drains existing
/// connections, and returns `Ok(())` on clean shutdown.
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Name for logging and identification
    fn name(&self) -> &str;

    /// Bound address, once running
    fn address(&self) -> Option<SocketAddr>;

    fn is_running(&self) -> bool;

    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

/// Convenience methods, blanket-implemented for every [`Server`]
pub trait ServerExt: Server + Sized {
    /// Spawn the server on a new task; cancel the returned token to stop it
    fn spawn(self) -> (tokio::task::JoinHandle<Result<()>>, CancellationToken) {
        let token = CancellationToken::new();
        let token_clone = token.clone();
        let handle = tokio::spawn(async move { self.run(token_clone).await });
        (handle, token)
    }

    /// Run until Ctrl+C
    fn run_with_ctrl_c(self) -> impl std::future::Future<Output = Result<()>> + Send {
        async move {
            let shutdown = crate::shutdown::ShutdownController::with_ctrl_c();
            self.run(shutdown.token()).await
        }
    }
}

impl<T: Server + Sized> ServerExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockServer {
        name: String,
    }

    #[async_trait]
    impl Server for MockServer {
        fn name(&self) -> &str {
            &self.name
        }

        fn address(&self) -> Option<SocketAddr> {
            None
        }

        fn is_running(&self) -> bool {
            false
        }

        async fn run(&self, shutdown: CancellationToken) -> Result<()> {
            shutdown.cancelled().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_server_ext_spawn() {
        let server = MockServer {
            name: "test".to_string(),
        };

        let (handle, token) = server.spawn();
        token.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(1), handle).await;
        assert!(result.is_ok());
    }
}
