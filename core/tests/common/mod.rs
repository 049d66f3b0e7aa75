//! Shared setup for the integration tests.
//!
//! Each test binary starts one mock ReqRes server on a random port the first
//! time a client is requested, and every test builds its own `ApiClient`
//! against it. Extra servers (e.g. with an API key) are spawned on demand.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;

use axum::extract::ConnectInfo;
use reqres_core::{ApiClient, ClientConfig};
use serde_json::Value;

pub const API_KEY: &str = "reqres-free-v1";

/// Start `router` on a random local port in a background thread.
pub fn spawn(router: axum::Router) -> SocketAddr {
    in_background(|listener| mock_server::serve(listener, router))
}

/// Start a server whose `GET /peer` answers with the caller's socket address,
/// so tests can tell which TCP connection carried a request.
pub fn spawn_peer_echo() -> SocketAddr {
    let router = axum::Router::new().route(
        "/peer",
        axum::routing::get(|ConnectInfo(peer): ConnectInfo<SocketAddr>| async move { peer.to_string() }),
    );
    in_background(|listener| async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await
    })
}

fn in_background<F, Fut>(serve: F) -> SocketAddr
where
    F: FnOnce(tokio::net::TcpListener) -> Fut + Send + 'static,
    Fut: Future<Output = std::io::Result<()>>,
{
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            serve(listener).await
        })
        .unwrap();
    });

    addr
}

/// Address of the shared mock server for this test binary.
pub fn server() -> SocketAddr {
    static SERVER: OnceLock<SocketAddr> = OnceLock::new();
    *SERVER.get_or_init(|| spawn(mock_server::app()))
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}/api")
}

pub fn config() -> ClientConfig {
    ClientConfig::new(&base_url(server())).with_api_key(API_KEY)
}

pub fn client() -> ApiClient {
    ApiClient::new(config())
}

/// Load a contract schema from the workspace `schemas/` directory.
pub fn schema(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../schemas")
        .join(name);
    reqres_core::schema::load_schema(&path).unwrap()
}
