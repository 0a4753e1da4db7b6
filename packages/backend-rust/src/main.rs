use std::sync::Arc;

use engage_backend::adaptive::{AdaptiveEngine, EngineConfig, ModelStore};
use engage_backend::config::Config;
use engage_backend::logging::init_tracing;
use engage_backend::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let engine = Arc::new(AdaptiveEngine::new(EngineConfig::from_env()));
    let store = ModelStore::new(config.model_dir.clone());

    let loaded = {
        let engine = Arc::clone(&engine);
        let store = store.clone();
        tokio::task::spawn_blocking(move || engine.load_from(&store)).await
    };
    if let Err(err) = loaded {
        tracing::warn!(error = %err, "model load task failed, starting cold");
    }

    {
        let engine = Arc::clone(&engine);
        tokio::task::spawn_blocking(move || engine.warm_up());
    }

    let state = AppState::new(Arc::clone(&engine), store.clone());
    let app = engage_backend::build_app(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind listener");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "engage-backend listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, initiating graceful shutdown sequence");

    if config.model_autosave {
        let saved = tokio::task::spawn_blocking(move || engine.save_to(&store)).await;
        match saved {
            Ok(Ok(files)) => tracing::info!(files = ?files, "models saved on shutdown"),
            Ok(Err(err)) => tracing::error!(error = %err, "failed to save models on shutdown"),
            Err(err) => tracing::error!(error = %err, "model save task failed"),
        }
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
