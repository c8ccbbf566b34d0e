use std::fmt;

/// Management API call errors
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Request never produced an HTTP response
    NetworkError { operation: String, message: String },
    /// Provider answered with a non-success status
    HttpStatus {
        operation: String,
        status: u16,
        detail: Option<String>,
    },
    /// Response arrived but did not have the expected shape
    InvalidResponse { expected: String, got: String },
    /// Call issued under a context that does not own the target instance
    ContextMismatch {
        operation: String,
        active: String,
        required: String,
    },
    /// HTTP client could not be constructed
    ClientBuild { message: String },
}

impl ClientError {
    /// HTTP status observed, if the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Provider-supplied error text, when the response carried any
    pub fn provider_detail(&self) -> Option<&str> {
        match self {
            ClientError::HttpStatus { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::NetworkError { operation, message } => {
                write!(f, "Network error during {}: {}", operation, message)
            }
            ClientError::HttpStatus {
                operation,
                status,
                detail,
            } => match detail {
                Some(detail) => write!(f, "{} returned HTTP {}: {}", operation, status, detail),
                None => write!(f, "{} returned HTTP {}", operation, status),
            },
            ClientError::InvalidResponse { expected, got } => {
                write!(f, "Invalid response format: expected {}, got {}", expected, got)
            }
            ClientError::ContextMismatch {
                operation,
                active,
                required,
            } => write!(
                f,
                "{} must run under context {} but {} is active",
                operation, required, active
            ),
            ClientError::ClientBuild { message } => {
                write!(f, "Failed to create HTTP client: {}", message)
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_detection() {
        let err = ClientError::HttpStatus {
            operation: "authorize_copy".to_string(),
            status: 409,
            detail: Some("ModelExists: model already exists".to_string()),
        };
        assert!(err.is_conflict());
        assert_eq!(err.provider_detail(), Some("ModelExists: model already exists"));

        let network = ClientError::NetworkError {
            operation: "authorize_copy".to_string(),
            message: "connection reset".to_string(),
        };
        assert!(!network.is_conflict());
        assert_eq!(network.status(), None);
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ClientError::HttpStatus {
            operation: "delete_resource".to_string(),
            status: 403,
            detail: None,
        };
        assert_eq!(err.to_string(), "delete_resource returned HTTP 403");
    }
}
