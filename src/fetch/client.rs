use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam between the loader and the network, so tests and wrappers can stand
/// in for a real `reqwest::Client`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
