use anyhow::Result;
use hospital_server::{create_app, HospitalServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hospital_server=debug")),
        )
        .init();

    let server = HospitalServer::new().await?;
    let bind_address = server.config.bind_address.clone();
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(%bind_address, "hospital API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
