//! HTTP client construction

use crate::config::HttpConfig;
use crate::errors::HttpError;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::Client;
use tracing::debug;

/// Build the client shared by every call of a run
///
/// There is no overall request timeout: only connection establishment is
/// bounded. Redirects are never followed since `Location` headers carry
/// resource identifiers.
pub fn build_client(config: &HttpConfig) -> Result<Client, HttpError> {
    debug!(
        "Creating HTTP client with {}ms connect budget, verify_tls={}",
        config.connect_timeout.as_millis(),
        config.verify_tls
    );

    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(!config.verify_tls)
        .redirect(reqwest::redirect::Policy::none());

    if !config.keep_alive {
        builder = builder.pool_max_idle_per_host(0);
    }

    Ok(builder.build()?)
}

/// Non-empty header value as an owned string
pub fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// The `Location` header, which names newly created resources
pub fn location(headers: &HeaderMap) -> Option<String> {
    header_value(headers, LOCATION.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::REPLAY_NONCE_HEADER;
    use reqwest::header::{HeaderName, HeaderValue};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_header_value() {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("replay-nonce"), HeaderValue::from_static("abc"));
        headers.insert(LOCATION, HeaderValue::from_static(""));

        assert_eq!(header_value(&headers, REPLAY_NONCE_HEADER), Some("abc".to_string()));
        assert_eq!(header_value(&headers, "replay-nonce"), Some("abc".to_string()));
        assert_eq!(location(&headers), None);
    }

    #[tokio::test]
    async fn test_client_does_not_follow_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/acme/cert/1"),
            )
            .mount(&server)
            .await;

        let client = build_client(&HttpConfig::default()).unwrap();
        let response = client.get(server.uri()).send().await.unwrap();

        assert_eq!(response.status().as_u16(), 302);
        assert_eq!(location(response.headers()), Some("/acme/cert/1".to_string()));
    }
}
