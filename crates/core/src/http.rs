use std::time::Duration;

use color_eyre::eyre::{self, WrapErr as _};
use serde::de::DeserializeOwned;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("tokenboard/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for the price API and the wallet indexer. Every request
/// made through it is bounded by `timeout`.
pub fn client(timeout: Duration) -> eyre::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .wrap_err("failed to build http client")
}

/// Sends `request` and decodes a successful response body as JSON.
pub async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    endpoint: &str,
) -> Result<T, FetchError> {
    request
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| FetchError::from_reqwest(endpoint, &e))?
        .json::<T>()
        .await
        .map_err(|e| FetchError::from_reqwest(endpoint, &e))
}

/// Local endpoint that accepts connections and never answers.
#[cfg(test)]
pub(crate) async fn hung_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{addr}")
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unanswered_request_times_out() {
        let endpoint = hung_endpoint().await;
        let http = client(Duration::from_secs(10)).expect("client");

        let err = get_json::<Value>(http.get(&endpoint), &endpoint)
            .await
            .expect_err("no response is ever sent");

        assert_eq!(err, FetchError::Timeout { endpoint });
    }
}
