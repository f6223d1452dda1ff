//! HTTP client for the hosted backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use techlog_core::{ArticleId, Email};
use tracing::instrument;
use url::Url;

use super::{
    AdminUserView, Article, AuthBackend, AuthSession, AuthUser, BackendError, DataBackend,
    NewArticle, SignUpOutcome, Subscriber, TokenResponse,
};
use crate::config::{SupabaseConfig, anon_key};

/// Request timeout for every backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the auth service and the table REST API.
///
/// Every request carries the project's anon key as `apikey`. The
/// `Authorization` header holds the caller's access token when there is one,
/// otherwise the anon key, which the backend treats as an anonymous caller.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
}

impl SupabaseClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key(config))
                .map_err(|e| BackendError::Parse(format!("Invalid anon key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Resolve an endpoint path against the project URL.
    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }

    /// Start a request with the bearer token for `auth` (or the anon key).
    fn request(&self, method: Method, url: Url, auth: Option<&str>) -> RequestBuilder {
        let token = auth.unwrap_or_else(|| self.anon_key.expose_secret());
        self.client.request(method, url).bearer_auth(token)
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self
            .request(Method::POST, url, None)
            .json(&body)
            .send()
            .await?;
        let token: TokenResponse = parse_json(response).await?;
        Ok(token.into_session())
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        Ok(url)
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        auth: Option<&str>,
        function: &str,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{function}"))?;
        let response = self
            .request(Method::POST, url, auth)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        parse_json(response).await
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        self.token_grant(
            "password",
            serde_json::json!({
                "email": email.as_str(),
                "password": password.expose_secret(),
            }),
        )
        .await
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, BackendError> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .request(Method::POST, url, None)
            .json(&serde_json::json!({
                "email": email.as_str(),
                "password": password.expose_secret(),
            }))
            .send()
            .await?;
        let body: serde_json::Value = parse_json(response).await?;

        // With email confirmation enabled the backend returns the bare user
        // and no tokens.
        if body.get("access_token").is_some() {
            let token: TokenResponse =
                serde_json::from_value(body).map_err(|e| BackendError::Parse(e.to_string()))?;
            Ok(SignUpOutcome::SignedIn(token.into_session()))
        } else {
            Ok(SignUpOutcome::ConfirmationRequired {
                email: email.clone(),
            })
        }
    }

    #[instrument(skip_all)]
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .request(Method::GET, url, Some(access_token))
            .send()
            .await?;
        parse_json(response).await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        check_status(response).await.map(drop)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn send_password_recovery(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> Result<(), BackendError> {
        let mut url = self.endpoint("auth/v1/recover")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        let response = self
            .request(Method::POST, url, None)
            .json(&serde_json::json!({ "email": email.as_str() }))
            .send()
            .await?;
        check_status(response).await.map(drop)
    }
}

#[async_trait]
impl DataBackend for SupabaseClient {
    #[instrument(skip_all)]
    async fn select_articles(&self, auth: Option<&str>) -> Result<Vec<Article>, BackendError> {
        let url = self.table_url("articles")?;
        let response = self.request(Method::GET, url, auth).send().await?;
        parse_json(response).await
    }

    #[instrument(skip(self, auth, article), fields(title = %article.title))]
    async fn insert_article(
        &self,
        auth: Option<&str>,
        article: &NewArticle,
    ) -> Result<Article, BackendError> {
        let url = self.endpoint("rest/v1/articles")?;
        let response = self
            .request(Method::POST, url, auth)
            .header("Prefer", "return=representation")
            .json(article)
            .send()
            .await?;
        let rows: Vec<Article> = parse_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse("insert returned no row".to_string()))
    }

    #[instrument(skip(self, auth), fields(article_id = %id))]
    async fn delete_article(
        &self,
        auth: Option<&str>,
        id: &ArticleId,
    ) -> Result<(), BackendError> {
        let mut url = self.endpoint("rest/v1/articles")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"));
        let response = self.request(Method::DELETE, url, auth).send().await?;
        check_status(response).await.map(drop)
    }

    #[instrument(skip_all)]
    async fn select_subscribers(
        &self,
        auth: Option<&str>,
    ) -> Result<Vec<Subscriber>, BackendError> {
        let url = self.table_url("subscribers")?;
        let response = self.request(Method::GET, url, auth).send().await?;
        parse_json(response).await
    }

    #[instrument(skip(self, auth), fields(email = %email))]
    async fn insert_subscriber(
        &self,
        auth: Option<&str>,
        email: &Email,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("rest/v1/subscribers")?;
        let response = self
            .request(Method::POST, url, auth)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "email": email.as_str() }))
            .send()
            .await?;
        check_status(response).await.map(drop)
    }

    #[instrument(skip_all)]
    async fn rpc_is_admin(&self, auth: Option<&str>) -> Result<bool, BackendError> {
        self.rpc(auth, "is_admin").await
    }

    #[instrument(skip_all)]
    async fn rpc_get_admin_users(
        &self,
        auth: Option<&str>,
    ) -> Result<Vec<AdminUserView>, BackendError> {
        self.rpc(auth, "get_admin_users").await
    }
}

// =============================================================================
// Response handling
// =============================================================================

/// Turn a non-success response into [`BackendError::Api`].
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = parse_error_body(&body);
    Err(BackendError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|e| BackendError::Parse(e.to_string()))
}

/// Extract `(code, message)` from an error body.
///
/// The REST API reports `{code, message}`; the auth service uses either
/// `{code, msg}` or `{error, error_description}`. Anything else is passed
/// through as the message.
fn parse_error_body(body: &str) -> (Option<String>, String) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return (None, body.trim().to_string());
    };

    let code = ["code", "error_code", "error"]
        .iter()
        .find_map(|key| match value.get(key) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        });
    let message = ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map_or_else(|| body.trim().to_string(), String::from);

    (code, message)
}
