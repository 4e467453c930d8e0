//! Reqwest connection to the hosted backend.
//!
//! One client carries the project URL and anon key for both the PostgREST
//! data API (`/rest/v1`) and the auth API (`/auth/v1`). Adapters own the
//! request shapes; this module only builds authenticated requests and turns
//! error bodies into readable messages.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::BackendConfig;

#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: String,
}

impl SupabaseClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &BackendConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn rest_url(&self, table: &str) -> Result<Url, url::ParseError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    pub(crate) fn auth_url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.endpoint(&format!("auth/v1/{path}"))
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }

    /// Request carrying the project key, authorized as `bearer` when given
    /// and as the anonymous role otherwise.
    pub(crate) fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        self.http
            .request(method, url)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(token)
    }
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Best human-readable message from an error response.
pub(crate) async fn error_message(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, message_from_body(status, &body))
}

pub(crate) fn message_from_body(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> SupabaseClient {
        let config = BackendConfig::new(url, "anon".to_string()).expect("valid url");
        SupabaseClient::new(&config, Duration::from_secs(1)).expect("client builds")
    }

    #[test]
    fn endpoints_append_service_paths() {
        let client = client("https://demo.supabase.co");
        assert_eq!(
            client.rest_url("properties").expect("url").as_str(),
            "https://demo.supabase.co/rest/v1/properties"
        );
        assert_eq!(
            client.auth_url("token").expect("url").as_str(),
            "https://demo.supabase.co/auth/v1/token"
        );
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let client = client("http://127.0.0.1:54321/project/");
        assert_eq!(
            client.rest_url("favorites").expect("url").as_str(),
            "http://127.0.0.1:54321/project/rest/v1/favorites"
        );
    }

    #[test]
    fn error_messages_prefer_provider_text() {
        assert_eq!(
            message_from_body(StatusCode::BAD_REQUEST, r#"{"msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            message_from_body(
                StatusCode::BAD_REQUEST,
                r#"{"code":"PGRST100","message":"failed to parse filter"}"#
            ),
            "failed to parse filter"
        );
        assert_eq!(
            message_from_body(StatusCode::BAD_GATEWAY, "<html>"),
            "Bad Gateway"
        );
    }
}
