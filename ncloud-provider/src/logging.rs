//! Request/response tracing for remote calls
//!
//! Payloads are rendered as JSON at debug level; failures are logged at
//! error level together with the parameters that produced them.

use serde::Serialize;

fn render<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

pub fn log_common_request<T: Serialize + ?Sized>(operation: &str, params: &T) {
    tracing::debug!(operation, params = %render(params), "request");
}

pub fn log_response<T: Serialize + ?Sized>(operation: &str, response: &T) {
    tracing::debug!(operation, response = %render(response), "response");
}

pub fn log_error_response<T: Serialize + ?Sized>(
    operation: &str,
    error: &dyn std::error::Error,
    params: &T,
) {
    tracing::error!(operation, error = %error, params = %render(params), "request failed");
}
