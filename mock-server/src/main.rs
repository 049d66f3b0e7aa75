use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let router = match std::env::var("MOCK_API_KEY") {
        Ok(key) if !key.is_empty() => mock_server::app_with_api_key(key),
        _ => mock_server::app(),
    };
    tracing::info!(%addr, "mock ReqRes listening; base URL http://{addr}/api");
    mock_server::serve(listener, router).await
}
