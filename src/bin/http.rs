#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::{net::SocketAddr, sync::Arc};

    use syllabus_planner::{HebcalDirectory, http_api};
    use tracing::info;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr: SocketAddr = std::env::var("SYLLABUS_PLANNER_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let state = match std::env::var("SYLLABUS_PLANNER_HOLIDAY_DIR") {
        Ok(dir) => {
            info!(%dir, "reading holiday feeds");
            http_api::AppState::new(Arc::new(HebcalDirectory::new(dir)))
        }
        Err(_) => http_api::AppState::without_holidays(),
    };

    info!(%addr, "syllabus-planner HTTP API listening");
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
