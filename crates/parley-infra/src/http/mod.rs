//! HTTP implementations of the completion backend and credit service.

pub mod completion;
pub mod credits;

pub use completion::HttpCompletionBackend;
pub use credits::HttpCreditService;

/// Spawn an axum router on an ephemeral localhost port and return its base URL.
#[cfg(test)]
pub(crate) async fn spawn_test_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
