//! HTTP transport for the translation service API.
//!
//! Everything is blocking; the client is synchronous end to end. The
//! service is reached through the [`Transport`] trait so the request
//! layer can be swapped for a scripted one in tests.

use std::time::Duration;

use serde_json::Value;

use crate::error::{ShiftError, ShiftResult, TransportErrorKind};

/// Request timeout applied to every call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Generic request/response collaborator for the service API.
///
/// Implementations must report three distinguishable failure modes:
/// network-level trouble ([`ShiftError::Transport`]), non-2xx responses
/// ([`ShiftError::Http`]), and 2xx responses whose body is not JSON
/// ([`ShiftError::UnexpectedResponse`]).
pub trait Transport {
    /// Issue a GET request and decode the JSON response body.
    fn get(&self, url: &str, headers: &[(String, String)]) -> ShiftResult<Value>;

    /// Issue a POST request with a JSON body and decode the JSON response.
    fn post(&self, url: &str, headers: &[(String, String)], body: &Value) -> ShiftResult<Value>;
}

/// Production transport backed by `reqwest::blocking`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> ShiftResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(classify)?;
        Ok(Self { client })
    }

    fn finish(&self, response: reqwest::blocking::Response) -> ShiftResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ShiftError::Http {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<Value>()
            .map_err(|e| ShiftError::UnexpectedResponse(format!("invalid JSON body: {e}")))
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &[(String, String)]) -> ShiftResult<Value> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().map_err(classify)?;
        self.finish(response)
    }

    fn post(&self, url: &str, headers: &[(String, String)], body: &Value) -> ShiftResult<Value> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().map_err(classify)?;
        self.finish(response)
    }
}

/// Map a reqwest failure onto the transport error taxonomy.
fn classify(err: reqwest::Error) -> ShiftError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Request
    };
    ShiftError::Transport {
        kind,
        message: err.to_string(),
    }
}
