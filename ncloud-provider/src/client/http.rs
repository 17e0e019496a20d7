//! Signed HTTP transport
//!
//! Two styles of API sit behind the gateway:
//! - query APIs: `GET <gateway>/<service>/v2/<action>?k=v&...`, answered
//!   with `{"<action>Response": {...}}`
//! - REST APIs (SourceBuild): JSON bodies answered with `{"result": ...}`

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::{Position, Url};

use super::signer::Signer;
use super::{ApiError, ApiResult};
use crate::logging::{log_common_request, log_error_response, log_response};

/// Ordered query parameters. List values are expanded as `name.1`, `name.2`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: impl ToString) -> Self {
        self.0.push((name.to_string(), value.to_string()));
        self
    }

    /// Set only when a value is present
    pub fn set_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(name, v),
            None => self,
        }
    }

    pub fn set_list(mut self, name: &str, values: &[String]) -> Self {
        for (i, value) in values.iter().enumerate() {
            self.0.push((format!("{}.{}", name, i + 1), value.clone()));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Client for one query-style service (e.g. `vpc`, `vautoscaling`)
#[derive(Debug, Clone)]
pub struct QueryApiClient {
    http: reqwest::Client,
    base_url: String,
    signer: Signer,
}

impl QueryApiClient {
    pub fn new(http: reqwest::Client, gateway: &str, service: &str, signer: Signer) -> Self {
        Self {
            http,
            base_url: format!("{}/{}/v2", gateway.trim_end_matches('/'), service),
            signer,
        }
    }

    /// Call `action` and decode the payload inside its response envelope
    pub async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &QueryParams,
    ) -> ApiResult<T> {
        log_common_request(action, params);
        self.execute(action, params).await.inspect_err(|e| {
            log_error_response(action, e, params);
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &QueryParams,
    ) -> ApiResult<T> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, action))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params.iter() {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("responseFormatType", "json");
        }
        let path_and_query = url[Position::BeforePath..].to_string();

        let mut request = self.http.get(url);
        for (name, value) in self.signer.headers("GET", &path_and_query) {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(query_error(status, &body));
        }

        let mut envelope: serde_json::Value =
            serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                operation: action.to_string(),
                source,
            })?;
        let payload = envelope
            .get_mut(format!("{}Response", action))
            .map(serde_json::Value::take)
            .unwrap_or(envelope);

        if let Some(code) = payload.get("returnCode").and_then(code_string)
            && code != "0"
        {
            return Err(ApiError::Api {
                status,
                code,
                message: payload
                    .get("returnMessage")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        log_response(action, &payload);
        serde_json::from_value(payload).map_err(|source| ApiError::Decode {
            operation: action.to_string(),
            source,
        })
    }
}

/// Client for a REST service rooted at `base_url` (e.g. `.../api/v1`)
#[derive(Debug, Clone)]
pub struct RestApiClient {
    http: reqwest::Client,
    base_url: String,
    signer: Signer,
}

impl RestApiClient {
    pub fn new(http: reqwest::Client, base_url: &str, signer: Signer) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let result = self.send(Method::GET, path, None).await?;
        decode(&format!("GET {}", path), result)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let operation = format!("POST {}", path);
        let body = encode(&operation, body)?;
        let result = self.send(Method::POST, path, Some(body)).await?;
        decode(&operation, result)
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let operation = format!("PATCH {}", path);
        let body = encode(&operation, body)?;
        let result = self.send(Method::PATCH, path, Some(body)).await?;
        decode(&operation, result)
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(Method::DELETE, path, None).await.map(|_| ())
    }

    /// Send a request and return the `result` member of the response
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<serde_json::Value> {
        let operation = format!("{} {}", method, path);
        log_common_request(&operation, &body);

        let result = self.execute(method, path, body.as_ref()).await;
        match &result {
            Ok(value) => log_response(&operation, value),
            Err(e) => log_error_response(&operation, e, &body),
        }
        result
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> ApiResult<serde_json::Value> {
        let url = Url::parse(&format!("{}{}", self.base_url, path))?;
        let path_and_query = url[Position::BeforePath..].to_string();

        let mut request = self.http.request(method.clone(), url);
        for (name, value) in self.signer.headers(method.as_str(), &path_and_query) {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(rest_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        let mut envelope: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| ApiError::Decode {
                operation: format!("{} {}", method, path),
                source,
            })?;
        Ok(envelope
            .get_mut("result")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null))
    }
}

fn encode<B: Serialize>(operation: &str, body: &B) -> ApiResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|source| ApiError::Decode {
        operation: operation.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(operation: &str, value: serde_json::Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        operation: operation.to_string(),
        source,
    })
}

/// Codes arrive as strings or numbers depending on the service
fn code_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `{"responseError": {"returnCode": ..., "returnMessage": ...}}`
fn query_error(status: u16, body: &str) -> ApiError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("responseError"));
    ApiError::Api {
        status,
        code: error
            .and_then(|e| e.get("returnCode"))
            .and_then(code_string)
            .unwrap_or_else(|| status.to_string()),
        message: error
            .and_then(|e| e.get("returnMessage"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
    }
}

/// `{"error": {"errorCode": ..., "message": ...}}`
fn rest_error(status: u16, body: &str) -> ApiError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    ApiError::Api {
        status,
        code: error
            .and_then(|e| e.get("errorCode"))
            .and_then(code_string)
            .unwrap_or_else(|| status.to_string()),
        message: error
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
    }
}
