use thiserror::Error;

/// Failure of a single request to an external source (price API, indexer, RPC).
///
/// Cloneable so one failed fetch can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} responded with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("contract call on {endpoint} failed: {message}")]
    Rpc { endpoint: String, message: String },
}

impl FetchError {
    pub fn from_reqwest(endpoint: &str, err: &reqwest::Error) -> Self {
        let endpoint = strip_query(endpoint);
        if err.is_timeout() {
            Self::Timeout { endpoint }
        } else if err.is_decode() {
            Self::Decode {
                endpoint,
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                endpoint,
                status: status.as_u16(),
            }
        } else {
            Self::Transport {
                endpoint,
                message: err.to_string(),
            }
        }
    }
}

// keeps wallet addresses and keys out of logs
fn strip_query(endpoint: &str) -> String {
    endpoint
        .split_once('?')
        .map_or(endpoint, |(path, _)| path)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("wallet request was rejected by the user")]
    UserRejected,

    #[error("no wallet provider is available")]
    ProviderAbsent,

    #[error("unsupported network `{0}`")]
    NetworkUnsupported(String),

    #[error(transparent)]
    FetchFailed(#[from] FetchError),

    #[error("no wallet connected")]
    NoWallet,

    #[error("no data returned")]
    EmptyResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_is_dropped_from_endpoint() {
        assert_eq!(
            strip_query("https://deep-index.moralis.io/api/v2.2/0xabc/erc20?chain=eth"),
            "https://deep-index.moralis.io/api/v2.2/0xabc/erc20"
        );
        assert_eq!(strip_query("https://gopulse.com/api/token/PLS"), "https://gopulse.com/api/token/PLS");
    }
}
