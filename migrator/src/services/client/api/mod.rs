//! Management API operation implementations
//!
//! - Model listing and deletion
//! - Copy authorization, copy initiation and operation polling

pub mod resources;
pub use resources::*;

pub mod transfer;
pub use transfer::*;

use reqwest::{Response, Url};

use super::errors::ClientError;
use super::types::ProviderErrorBody;

pub(crate) const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
pub(crate) const OPERATION_LOCATION: &str = "Operation-Location";

const MAX_DETAIL_LEN: usize = 512;

pub(crate) fn network_error(operation: &str, err: reqwest::Error) -> ClientError {
    ClientError::NetworkError {
        operation: operation.to_string(),
        message: err.to_string(),
    }
}

/// Turn a non-success response into an error carrying the provider's detail
pub(crate) async fn status_error(operation: &str, response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::HttpStatus {
        operation: operation.to_string(),
        status,
        detail: error_detail(&body),
    }
}

/// True when `candidate` has the scheme, host and port of `base`
pub(crate) fn same_origin(base: &str, candidate: &str) -> bool {
    match (Url::parse(base), Url::parse(candidate)) {
        (Ok(base), Ok(candidate)) => {
            base.scheme() == candidate.scheme()
                && base.host_str() == candidate.host_str()
                && base.port_or_known_default() == candidate.port_or_known_default()
        }
        _ => false,
    }
}

/// Extract readable detail from a provider error body
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(parsed) => Some(parsed.error.detail()),
        Err(_) => Some(body.chars().take(MAX_DETAIL_LEN).collect()),
    }
}
