use anyhow::{Context, Result};
use clap::Parser;
use telemetry_viewer_rs::services::store::SampleStore;
use telemetry_viewer_rs::{cli, config, openapi, routes, state, static_assets};
use tokio::net::TcpListener;

/// Binds the API listener. A taken port becomes an error naming the flag
/// that moves the server elsewhere.
async fn listen(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::AddrInUse => anyhow::anyhow!(
                "{host}:{port} is already taken by another process; pass --port to serve the viewer elsewhere"
            ),
            _ => anyhow::Error::new(err).context(format!("cannot listen on {host}:{port}")),
        })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!(
            "{}",
            serde_json::to_string_pretty(&openapi::openapi_json())?
        );
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::ViewerConfig::from_env(args.static_root)?;
    let store = SampleStore::open(&config).await?;

    let state = state::AppState {
        config: config.clone(),
        store: store.clone(),
    };

    let app = routes::router(state)
        .fallback_service(static_assets::dashboard(config.static_root.clone())?);
    let listener = listen(&args.host, args.port).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        backend = store.backend_name(),
        "telemetry viewer listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("sample store closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::listen;

    #[tokio::test]
    async fn ephemeral_port_is_resolved() {
        let listener = listen("127.0.0.1", 0).await.expect("listen");
        assert_ne!(listener.local_addr().expect("addr").port(), 0);
    }

    #[tokio::test]
    async fn taken_port_points_at_the_port_flag() {
        let held = listen("127.0.0.1", 0).await.expect("listen");
        let port = held.local_addr().expect("addr").port();

        let message = listen("127.0.0.1", port).await.unwrap_err().to_string();
        assert!(message.contains(&format!("127.0.0.1:{port}")), "{message}");
        assert!(message.contains("already taken"), "{message}");
        assert!(message.contains("--port"), "{message}");
    }
}
