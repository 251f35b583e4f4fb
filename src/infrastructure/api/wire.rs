//! tRPC HTTP エンベロープ（バッチ・トランスフォーマー無し）

use crate::shared::{AppError, ErrorCode, FieldErrors};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    pub result: ResultBody<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultBody<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            result: ResultBody { data: Some(data) },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorShape,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub data: Option<ErrorData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub http_status: Option<u16>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub zod_error: Option<ZodError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZodError {
    #[serde(default)]
    pub form_errors: Vec<String>,
    #[serde(default)]
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ErrorShape {
    /// `status` は `data.httpStatus` も `data.code` も無い場合の手掛かり
    pub fn into_app_error(self, status: u16) -> AppError {
        let data = self.data.unwrap_or_default();
        let code = data
            .code
            .as_deref()
            .and_then(|code| code.parse::<ErrorCode>().ok())
            .unwrap_or_else(|| ErrorCode::from_http_status(data.http_status.unwrap_or(status)));

        let field_errors = data
            .zod_error
            .map(|zod| FieldErrors::from(zod.field_errors))
            .filter(|errors| !errors.is_empty());

        AppError::Rpc {
            code,
            message: self.message,
            field_errors,
        }
    }

    /// サーバー側（テスト用モックを含む）で `AppError` をエンベロープ化する
    pub fn from_app_error(error: &AppError, path: &str) -> Self {
        let code = error.code().unwrap_or(ErrorCode::InternalServerError);
        let message = match error {
            AppError::Rpc { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let zod_error = error.field_errors().map(|errors| ZodError {
            form_errors: Vec::new(),
            field_errors: errors
                .fields()
                .map(|field| {
                    (
                        field.to_string(),
                        errors.get(field).map(<[String]>::to_vec).unwrap_or_default(),
                    )
                })
                .collect(),
        });

        Self {
            message,
            code: Some(json_rpc_code(code)),
            data: Some(ErrorData {
                code: Some(code.as_str().to_string()),
                http_status: Some(http_status(code)),
                path: Some(path.to_string()),
                zod_error,
            }),
        }
    }
}

pub fn json_rpc_code(code: ErrorCode) -> i64 {
    match code {
        ErrorCode::ParseError => -32700,
        ErrorCode::BadRequest => -32600,
        ErrorCode::InternalServerError | ErrorCode::NotImplemented => -32603,
        ErrorCode::Unauthorized => -32001,
        ErrorCode::Forbidden => -32003,
        ErrorCode::NotFound => -32004,
        ErrorCode::MethodNotSupported => -32005,
        ErrorCode::Timeout => -32008,
        ErrorCode::Conflict => -32009,
        ErrorCode::PreconditionFailed => -32012,
        ErrorCode::PayloadTooLarge => -32013,
        ErrorCode::UnprocessableContent => -32022,
        ErrorCode::TooManyRequests => -32029,
        ErrorCode::ClientClosedRequest => -32099,
    }
}

pub fn http_status(code: ErrorCode) -> u16 {
    match code {
        ErrorCode::ParseError | ErrorCode::BadRequest => 400,
        ErrorCode::Unauthorized => 401,
        ErrorCode::Forbidden => 403,
        ErrorCode::NotFound => 404,
        ErrorCode::MethodNotSupported => 405,
        ErrorCode::Timeout => 408,
        ErrorCode::Conflict => 409,
        ErrorCode::PreconditionFailed => 412,
        ErrorCode::PayloadTooLarge => 413,
        ErrorCode::UnprocessableContent => 422,
        ErrorCode::TooManyRequests => 429,
        ErrorCode::ClientClosedRequest => 499,
        ErrorCode::NotImplemented => 501,
        ErrorCode::InternalServerError => 500,
    }
}
