use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// RPC レイヤーが返す機械可読なエラーコード
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ParseError,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    Timeout,
    Conflict,
    PreconditionFailed,
    PayloadTooLarge,
    UnprocessableContent,
    TooManyRequests,
    ClientClosedRequest,
    InternalServerError,
    NotImplemented,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::PreconditionFailed => "PRECONDITION_FAILED",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::UnprocessableContent => "UNPROCESSABLE_CONTENT",
            ErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorCode::ClientClosedRequest => "CLIENT_CLOSED_REQUEST",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
        }
    }

    /// HTTP ステータスからコードを推定する（JSON 以外のエラーボディ用）
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorCode::BadRequest,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            405 => ErrorCode::MethodNotSupported,
            408 => ErrorCode::Timeout,
            409 => ErrorCode::Conflict,
            412 => ErrorCode::PreconditionFailed,
            413 => ErrorCode::PayloadTooLarge,
            422 => ErrorCode::UnprocessableContent,
            429 => ErrorCode::TooManyRequests,
            499 => ErrorCode::ClientClosedRequest,
            501 => ErrorCode::NotImplemented,
            _ => ErrorCode::InternalServerError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PARSE_ERROR" => Ok(ErrorCode::ParseError),
            "BAD_REQUEST" => Ok(ErrorCode::BadRequest),
            "UNAUTHORIZED" => Ok(ErrorCode::Unauthorized),
            "FORBIDDEN" => Ok(ErrorCode::Forbidden),
            "NOT_FOUND" => Ok(ErrorCode::NotFound),
            "METHOD_NOT_SUPPORTED" => Ok(ErrorCode::MethodNotSupported),
            "TIMEOUT" => Ok(ErrorCode::Timeout),
            "CONFLICT" => Ok(ErrorCode::Conflict),
            "PRECONDITION_FAILED" => Ok(ErrorCode::PreconditionFailed),
            "PAYLOAD_TOO_LARGE" => Ok(ErrorCode::PayloadTooLarge),
            "UNPROCESSABLE_CONTENT" => Ok(ErrorCode::UnprocessableContent),
            "TOO_MANY_REQUESTS" => Ok(ErrorCode::TooManyRequests),
            "CLIENT_CLOSED_REQUEST" => Ok(ErrorCode::ClientClosedRequest),
            "INTERNAL_SERVER_ERROR" => Ok(ErrorCode::InternalServerError),
            "NOT_IMPLEMENTED" => Ok(ErrorCode::NotImplemented),
            _ => Err(()),
        }
    }
}

/// 入力フィールド名ごとのバリデーションメッセージ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    /// フィールドの最初のメッセージ（インライン表示用）
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, Vec<String>>> for FieldErrors {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    Rpc {
        code: ErrorCode,
        message: String,
        field_errors: Option<FieldErrors>,
    },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn rpc(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::Rpc {
            code,
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::rpc(ErrorCode::Unauthorized, message)
    }

    /// サーバー側バリデーション失敗（BAD_REQUEST + fieldErrors）
    pub fn validation(field_errors: FieldErrors) -> Self {
        AppError::Rpc {
            code: ErrorCode::BadRequest,
            message: "Input validation failed".to_string(),
            field_errors: Some(field_errors),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            AppError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code() == Some(ErrorCode::Unauthorized)
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Rpc {
                field_errors: Some(errors),
                ..
            } if !errors.is_empty() => Some(errors),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Migration(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AppError::rpc(ErrorCode::Timeout, err.to_string());
        }
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::DeserializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_round_trips_through_str() {
        for code in [
            ErrorCode::Unauthorized,
            ErrorCode::BadRequest,
            ErrorCode::InternalServerError,
            ErrorCode::TooManyRequests,
        ] {
            assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
        }
        assert!("NOPE".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn error_code_from_http_status_falls_back_to_internal() {
        assert_eq!(ErrorCode::from_http_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_http_status(400), ErrorCode::BadRequest);
        assert_eq!(
            ErrorCode::from_http_status(502),
            ErrorCode::InternalServerError
        );
    }

    #[test]
    fn field_errors_first_returns_first_message() {
        let errors = FieldErrors::new()
            .with("title", "Title is required")
            .with("title", "Title is too short");
        assert_eq!(errors.first("title"), Some("Title is required"));
        assert_eq!(errors.first("content"), None);
    }

    #[test]
    fn empty_field_errors_are_not_exposed() {
        let err = AppError::validation(FieldErrors::new());
        assert!(err.field_errors().is_none());
        assert_eq!(err.code(), Some(ErrorCode::BadRequest));
    }

    #[test]
    fn unauthorized_is_detected_only_for_rpc_errors() {
        assert!(AppError::unauthorized("nope").is_unauthorized());
        assert!(!AppError::Network("UNAUTHORIZED".into()).is_unauthorized());
    }

    #[test]
    fn display_includes_code() {
        let err = AppError::unauthorized("sign in first");
        assert_eq!(err.to_string(), "UNAUTHORIZED: sign in first");
    }
}
