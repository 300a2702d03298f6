use std::sync::Arc;

use todo_api::application::todo_service::TodoServiceImpl;
use todo_api::config::Config;
use todo_api::domain::repository::TodoRepository;
use todo_api::http::auth::TrustedHeaderAuthenticator;
use todo_api::http::routes::todos::{self, AppState};
use todo_api::http::routing;
use todo_api::infrastructure::sqlite_repo::SqliteTodoRepository;
use todo_api::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init();

    let config = Config::from_env()?;
    let repo = SqliteTodoRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TodoServiceImpl::new(repo);
    let authenticator = TrustedHeaderAuthenticator::new(&config.auth_header)?;
    let state = AppState::new(service, Arc::new(authenticator), config.expose_internal_errors());
    let router = routing::app(todos::router(state), config.request_timeout);

    let addr = config.bind_addr();
    tracing::info!(%addr, database = %config.database_url, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
