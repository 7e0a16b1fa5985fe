use live_chess::api::router::create_router;
use live_chess::api::state::AppState;
use live_chess::config::AppConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --health-check: probe a running instance (container HEALTHCHECK).
    if std::env::args().any(|a| a == "--health-check") {
        let code = match health_check(&AppConfig::from_env()).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Health check failed: {e}");
                1
            }
        };
        std::process::exit(code);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "live_chess=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr();
    tracing::info!(
        user_id_header = %config.user_id_header,
        "live-chess v{} starting on {bind_addr}",
        env!("CARGO_PKG_VERSION")
    );

    let app = create_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Send a raw HTTP/1.1 GET /health and require a 200.
async fn health_check(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("127.0.0.1:{}", config.port);
    let mut stream = tokio::net::TcpStream::connect(&addr).await?;
    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    let mut buf = vec![0u8; 1024];
    let n = stream.read(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf[..n]);
    match response.lines().next() {
        Some(status) if status.starts_with("HTTP/1.1 200") => Ok(()),
        other => Err(format!("Unexpected response: {}", other.unwrap_or("")).into()),
    }
}
