use super::wire::{ErrorEnvelope, SuccessEnvelope};
use crate::application::ports::PostApi;
use crate::domain::entities::{NewPost, Post};
use crate::shared::config::ApiConfig;
use crate::shared::{AppError, ErrorCode, Platform};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// tRPC の HTTP エンドポイントを叩く `PostApi` 実装
#[derive(Clone)]
pub struct HttpPostApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    source: &'static str,
}

impl HttpPostApi {
    pub fn new(config: &ApiConfig, platform: Platform) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|err| AppError::ConfigurationError(format!("HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            source: platform.trpc_source(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn procedure_url(&self, path: &str) -> String {
        format!("{}/api/trpc/{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.procedure_url(path))
            .header("x-trpc-source", self.source);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        path: &str,
        input: Option<Value>,
    ) -> Result<Option<T>, AppError> {
        let mut builder = self.request(Method::GET, path);
        if let Some(input) = input {
            builder = builder.query(&[("input", input.to_string())]);
        }
        debug!(procedure = path, "trpc query");
        request_json(builder).await
    }

    async fn mutation<T: DeserializeOwned>(
        &self,
        path: &str,
        input: &impl Serialize,
    ) -> Result<Option<T>, AppError> {
        debug!(procedure = path, "trpc mutation");
        request_json(self.request(Method::POST, path).json(input)).await
    }
}

#[async_trait]
impl PostApi for HttpPostApi {
    async fn all(&self) -> Result<Vec<Post>, AppError> {
        Ok(self.query("post.all", None).await?.unwrap_or_default())
    }

    async fn by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        self.query("post.byId", Some(json!({ "id": id }))).await
    }

    async fn create(&self, input: &NewPost) -> Result<Post, AppError> {
        self.mutation("post.create", input)
            .await?
            .ok_or_else(|| AppError::DeserializationError("post.create returned no data".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.mutation::<Value>("post.delete", &id).await?;
        Ok(())
    }
}

/// 送信してエンベロープを剥がす。`data` が無い成功応答は `None`
async fn request_json<T: DeserializeOwned>(
    builder: RequestBuilder,
) -> Result<Option<T>, AppError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| AppError::Network(err.to_string()))?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => envelope.error.into_app_error(status.as_u16()),
            Err(_) => AppError::rpc(
                ErrorCode::from_http_status(status.as_u16()),
                format!("API error ({status}): {body}"),
            ),
        });
    }

    let envelope: SuccessEnvelope<T> = serde_json::from_str(&body)?;
    Ok(envelope.result.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_url_trims_trailing_slash() {
        let config = ApiConfig {
            base_url: "http://localhost:3000/".into(),
            auth_token: None,
            request_timeout: 5,
        };
        let api = HttpPostApi::new(&config, Platform::Mobile).unwrap();
        assert_eq!(api.base_url(), "http://localhost:3000");
        assert_eq!(
            api.procedure_url("post.all"),
            "http://localhost:3000/api/trpc/post.all"
        );
        assert_eq!(api.source, "expo-react");
    }
}
