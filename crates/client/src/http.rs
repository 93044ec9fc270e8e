//! JSON-over-HTTP transport to the RetailERP backend.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use retailerp_auth::BearerToken;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Error body shape; the backend sends `message`, older endpoints `error`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Thin wrapper over `reqwest::Client` that knows the base URL and token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<BearerToken>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.auth_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(Method::GET, path, None::<&()>, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body), None).await
    }

    /// POST carrying an `Idempotency-Key`, for effects that must happen once.
    pub async fn post_idempotent<B, T>(&self, path: &str, body: &B, key: &str) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body), Some(key)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::PUT, path, Some(body), None).await
    }

    /// DELETE; any response body is ignored.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(Method::DELETE, path, None::<&()>, None).await?;
        Ok(())
    }

    async fn execute<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotency_key: Option<&str>,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.send(method.clone(), path, body, idempotency_key).await?;
        parse_body(&method, path, &text)
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotency_key: Option<&str>,
    ) -> ClientResult<String>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::now_v7().to_string();

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose());
        }
        if let Some(key) = idempotency_key {
            req = req.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        tracing::debug!(%method, path, request_id = %request_id, "sending request");

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        let message = error_message(status, &text);
        tracing::warn!(
            %method,
            path,
            request_id = %request_id,
            status = status.as_u16(),
            message = %message,
            "request failed"
        );

        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthenticated(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

fn parse_body<T: DeserializeOwned>(method: &Method, path: &str, body: &str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|e| ClientError::Schema {
        endpoint: format!("{method} {path}"),
        detail: e.to_string(),
    })
}

/// The backend's message verbatim, else the raw body, else the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty());

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_message_field() {
        let msg = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Rule overlaps an existing band","error":"Unprocessable"}"#,
        );
        assert_eq!(msg, "Rule overlaps an existing band");
    }

    #[test]
    fn error_message_falls_back_to_error_then_body_then_reason() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"bad weight"}"#),
            "bad weight"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "upstream down"
        );
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }

    #[test]
    fn parse_failure_names_the_endpoint() {
        let err = parse_body::<Vec<u32>>(&Method::GET, "/stocks", r#"{"oops":1}"#).unwrap_err();
        match err {
            ClientError::Schema { endpoint, .. } => assert_eq!(endpoint, "GET /stocks"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }
}
