use crate::db::error::DbError;
use crate::net::protocol::DecodeError;
use crate::services::ServiceError;
use thiserror::Error;

pub type AppResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("invalid configuration: {0}")]
    Env(#[source] ConfigErrorKind),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("user not found")]
    UserNotFound,
    #[error("invalid password")]
    InvalidPassword,
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("email or password is empty")]
    InvalidInput,
    #[error("user already exists")]
    AlreadyExists,
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Everything that can go wrong while handling one request. Each variant is
/// scoped to the connection that sent the request; none of them close it.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Frame could not be decoded
    #[error("protocol error: {0}")]
    Protocol(#[from] DecodeError),

    /// Required field missing or action not allowed in this state
    #[error("validation failed: {0}")]
    Validation(&'static str),

    /// Bad credentials or duplicate identity
    #[error("auth failed: {0}")]
    Auth(&'static str),

    /// Update or delete on an item that does not exist
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// Collaborator failure. The detail stays in the server log.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// The text sent to the client in the `error` field.
    pub fn client_message(&self) -> &'static str {
        match self {
            SessionError::Protocol(_) => "bad message",
            SessionError::Validation(msg) | SessionError::Auth(msg) | SessionError::NotFound(msg) => msg,
            SessionError::Internal(_) => "internal server error",
        }
    }
}

impl From<RegisterError> for SessionError {
    fn from(e: RegisterError) -> Self {
        match e {
            RegisterError::InvalidInput => SessionError::Validation("invalid email or password"),
            RegisterError::AlreadyExists => SessionError::Auth("user already exists"),
            RegisterError::InternalError(detail) => SessionError::Internal(detail),
        }
    }
}

impl From<LoginError> for SessionError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::UserNotFound => SessionError::Auth("invalid email or password"),
            LoginError::InvalidPassword => SessionError::Auth("invalid password"),
            LoginError::InternalError(detail) => SessionError::Internal(detail),
        }
    }
}

impl From<ServiceError> for SessionError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound { .. } => SessionError::NotFound("item not found"),
            ServiceError::InvalidInput(msg) => SessionError::Validation(msg),
            ServiceError::Database(e) => SessionError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_never_reaches_the_client() {
        let e = SessionError::Internal("connection refused to postgres at 10.0.0.3".into());
        assert_eq!(e.client_message(), "internal server error");
    }

    #[test]
    fn auth_errors_map_to_fixed_messages() {
        assert_eq!(SessionError::from(RegisterError::AlreadyExists).client_message(), "user already exists");
        assert_eq!(SessionError::from(RegisterError::InvalidInput).client_message(), "invalid email or password");
        assert_eq!(SessionError::from(LoginError::InvalidPassword).client_message(), "invalid password");
        assert_eq!(SessionError::from(LoginError::UserNotFound).client_message(), "invalid email or password");
    }

    #[test]
    fn missing_item_maps_to_not_found() {
        let e = SessionError::from(ServiceError::NotFound { entity: "item" });
        assert!(matches!(e, SessionError::NotFound(_)));
        assert_eq!(e.client_message(), "item not found");
    }
}
