use tracing_subscriber::EnvFilter;
use wavelength::{ServerConfig, WavelengthError, WavelengthServerBuilder};

#[tokio::main]
async fn main() -> Result<(), WavelengthError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let server = WavelengthServerBuilder::from_config(&config).build().await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
