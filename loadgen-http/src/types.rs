//! HTTP types and enums

/// Response header carrying a fresh anti-replay nonce
pub const REPLAY_NONCE_HEADER: &str = "Replay-Nonce";

/// HTTP methods issued by the load generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
}

impl HttpMethod {
    /// Get the string representation of the HTTP method
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Latency call-class label for this method against an endpoint
    pub fn call_class(&self, endpoint: &str) -> String {
        format!("{} {}", self.as_str(), endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_class() {
        assert_eq!(HttpMethod::Head.call_class("/acme/new-reg"), "HEAD /acme/new-reg");
        assert_eq!(HttpMethod::Post.call_class("/acme/new-cert"), "POST /acme/new-cert");
        assert_eq!(HttpMethod::Get.call_class("/acme/cert"), "GET /acme/cert");
    }
}
