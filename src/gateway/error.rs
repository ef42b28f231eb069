use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Gateway HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid gateway response: {message}")]
    InvalidResponse { message: String },
}
