use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// The core, typed error surface of the broker. Request handlers translate
/// these into HTTP status codes; nothing here is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("{0}")]
    Input(String),

    #[error("unknown topic or partition")]
    NotFound,

    #[error("schema compilation error: {0}")]
    SchemaCompile(String),

    #[error("message is not valid JSON for schema validation")]
    NotJson,

    #[error("schema validation failed: {0:?}")]
    SchemaValidation(Vec<String>),

    #[error("forward fail")]
    Forward(String),
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let status = match &self {
            BrokerError::Input(_) => StatusCode::BAD_REQUEST,
            BrokerError::NotFound => StatusCode::NOT_FOUND,
            BrokerError::SchemaCompile(_) => StatusCode::BAD_REQUEST,
            BrokerError::NotJson => StatusCode::BAD_REQUEST,
            BrokerError::SchemaValidation(_) => StatusCode::BAD_REQUEST,
            BrokerError::Forward(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
