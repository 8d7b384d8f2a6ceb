//! HTTP transport for catalog reads.

use async_trait::async_trait;
use chlorofill_core::CatalogError;
use serde_json::Value;
use std::time::Duration;

/// Issues a GET and decodes the body as JSON.
///
/// Implementations map a non-success status to
/// [`CatalogError::RequestFailed`], an unparsable body to
/// [`CatalogError::DecodeFailed`] and connection problems to
/// [`CatalogError::Transport`].
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, CatalogError>;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| CatalogError::Transport {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Wrap an existing client, sharing its connection pool.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::RequestFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| CatalogError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&body).map_err(|e| CatalogError::DecodeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;
    use std::net::TcpListener;

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).expect("client builds")
    }

    #[tokio::test]
    async fn test_success_decodes_json() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/categories.php");
            then.status(200).json_body(json!({ "categories": [] }));
        });

        let value = transport()
            .get_json(&server.url("/categories.php"))
            .await
            .expect("request succeeds");
        assert_eq!(value, json!({ "categories": [] }));
    }

    #[tokio::test]
    async fn test_non_success_status_is_request_failed() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/lookup.php");
            then.status(404);
        });

        let err = transport()
            .get_json(&server.url("/lookup.php"))
            .await
            .expect_err("404 must fail");
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_failed() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/random.php");
            then.status(200).body("<html>oops</html>");
        });

        let err = transport()
            .get_json(&server.url("/random.php"))
            .await
            .expect_err("html is not json");
        assert!(matches!(err, CatalogError::DecodeFailed { .. }));
    }
}
