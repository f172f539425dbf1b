//! HTTP client abstraction for testability

use async_trait::async_trait;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// True for any 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body and extra headers
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| crate::AppError::Http(format!("GET {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::AppError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| crate::AppError::Http(format!("POST {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| crate::AppError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A URL that will always refuse connections (port 1 is reserved and unbound)
    const UNREACHABLE_URL: &str = "http://127.0.0.1:1/latest_sensor_data";

    #[tokio::test]
    async fn get_connection_refused_returns_http_error() {
        let client = ReqwestHttpClient::new();
        let err = client.get(UNREACHABLE_URL).await.unwrap_err();

        match &err {
            crate::AppError::Http(msg) => {
                assert!(
                    msg.starts_with("GET http://127.0.0.1:1/latest_sensor_data failed:"),
                    "{msg}"
                );
            }
            other => panic!("expected AppError::Http, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_json_connection_refused_returns_http_error() {
        let client = ReqwestHttpClient::new();
        let err = client
            .post_json(UNREACHABLE_URL, &[("X-CSRFToken", "abc")], "{}")
            .await
            .unwrap_err();

        match &err {
            crate::AppError::Http(msg) => {
                assert!(
                    msg.starts_with("POST http://127.0.0.1:1/latest_sensor_data failed:"),
                    "{msg}"
                );
            }
            other => panic!("expected AppError::Http, got {other:?}"),
        }
    }

    #[test]
    fn success_covers_the_2xx_range() {
        let ok = |status| HttpResponse {
            status,
            body: String::new(),
        };
        assert!(ok(200).is_success());
        assert!(ok(204).is_success());
        assert!(!ok(302).is_success());
        assert!(!ok(500).is_success());
    }
}
