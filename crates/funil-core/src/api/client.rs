//! API client for the Funil Digital backend.
//!
//! Every view goes through `ApiClient`: it attaches the bearer token,
//! serializes JSON bodies and turns non-success responses into `ApiError`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{MemoryTokenStore, TokenStore};
use crate::models::{
    CheckoutConfig, CheckoutConfigInput, CheckoutPreview, CloneFunnelRequest, Credential,
    CredentialInput, DashboardStats, Funnel, FunnelDetail, FunnelInput, FunnelStep, LoginRequest,
    LoginResponse, MessageResponse, Payment, PaymentStats, PixelInput, RegisterRequest,
    ReorderStepsRequest, StepInput, TrackingPixel, User, Visitor, VisitorEvent,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend base URL used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// API client for the funnel backend.
/// Clone is cheap: the connection pool and token store are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a client, picking up any token left in `store` by a previous run.
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<dyn TokenStore>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to load stored token");
                None
            }
        };

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Hold `token` for subsequent requests without persisting it
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Drop the token from memory and from the store
    pub fn clear_token(&mut self) {
        self.token = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Empty bodies (204, bare 200) read as `null`
    fn parse_body(text: &str) -> Result<Value, ApiError> {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("malformed JSON: {}", e)))
    }

    fn to_body<T: Serialize>(input: &T) -> Result<Value, ApiError> {
        serde_json::to_value(input)
            .map_err(|e| ApiError::InvalidResponse(format!("could not encode request: {}", e)))
    }

    /// Issue one request against `path` (relative to the base URL) and
    /// return the decoded JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(%method, %url, "API request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?);
        if let Some(ref body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let response = match Self::check_response(response).await {
            Ok(response) => response,
            Err(e) => {
                debug!(%method, %url, error = %e, "API request rejected");
                return Err(e);
            }
        };

        let text = response.text().await?;
        Self::parse_body(&text)
    }

    /// `request` decoded into a typed response
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let value = self.request(method, path, body).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_as(Method::GET, path, None).await
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::to_body(body)?;
        self.request_as(method, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, path, None).await.map(|_| ())
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// Exchange credentials for a token. When the response carries
    /// `access_token` the client holds it and persists it.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response: LoginResponse = self
            .send(Method::POST, "/auth/login", &LoginRequest { email, password })
            .await?;

        if let Some(token) = response.access_token.as_deref().filter(|t| !t.is_empty()) {
            self.set_token(token.to_string());
            if let Err(e) = self.store.save(token) {
                warn!(error = %e, "Failed to persist token");
            }
            info!("Login succeeded");
        }
        Ok(response)
    }

    /// Best-effort server-side logout. The local token is cleared before the
    /// request goes out; the server's error, if any, is returned for logging.
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        match self.end_session() {
            Some(revoker) => revoker.revoke().await,
            None => Ok(()),
        }
    }

    /// Clear the local token now and return a detached client that still
    /// holds it, for calling `revoke` later. The detached client never
    /// touches this client's token store. `None` when no token was held.
    pub fn end_session(&mut self) -> Option<ApiClient> {
        let token = self.token.clone()?;
        self.clear_token();
        Some(ApiClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            store: Arc::new(MemoryTokenStore::new()),
        })
    }

    /// `POST /auth/logout` with the held token
    pub async fn revoke(&self) -> Result<(), ApiError> {
        self.request(Method::POST, "/auth/logout", None)
            .await
            .map(|_| ())
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/auth/me").await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, ApiError> {
        self.send(Method::POST, "/auth/register", request).await
    }

    // ========================================================================
    // Credentials
    // ========================================================================

    pub async fn credentials(&self) -> Result<Vec<Credential>, ApiError> {
        self.get("/credentials").await
    }

    pub async fn create_credential(&self, input: &CredentialInput) -> Result<Credential, ApiError> {
        self.send(Method::POST, "/credentials", input).await
    }

    pub async fn update_credential(
        &self,
        id: i64,
        input: &CredentialInput,
    ) -> Result<Credential, ApiError> {
        self.send(Method::PUT, &format!("/credentials/{}", id), input)
            .await
    }

    pub async fn delete_credential(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/credentials/{}", id)).await
    }

    // ========================================================================
    // Funnels
    // ========================================================================

    pub async fn funnels(&self) -> Result<Vec<Funnel>, ApiError> {
        self.get("/funnels").await
    }

    pub async fn funnel(&self, id: i64) -> Result<FunnelDetail, ApiError> {
        self.get(&format!("/funnels/{}", id)).await
    }

    pub async fn create_funnel(&self, input: &FunnelInput) -> Result<Funnel, ApiError> {
        self.send(Method::POST, "/funnels", input).await
    }

    pub async fn update_funnel(&self, id: i64, input: &FunnelInput) -> Result<Funnel, ApiError> {
        self.send(Method::PUT, &format!("/funnels/{}", id), input)
            .await
    }

    pub async fn delete_funnel(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/funnels/{}", id)).await
    }

    /// Clone a funnel. Without a request the server picks name and slug.
    pub async fn clone_funnel(
        &self,
        id: i64,
        request: Option<&CloneFunnelRequest>,
    ) -> Result<Value, ApiError> {
        let body = request.map(Self::to_body).transpose()?;
        self.request(Method::POST, &format!("/funnels/{}/clone", id), body)
            .await
    }

    pub async fn toggle_funnel(&self, id: i64) -> Result<Value, ApiError> {
        self.request(Method::POST, &format!("/funnels/{}/toggle", id), None)
            .await
    }

    // ========================================================================
    // Funnel steps
    // ========================================================================

    pub async fn steps(&self, funnel_id: i64) -> Result<Vec<FunnelStep>, ApiError> {
        self.get(&format!("/funnels/{}/steps", funnel_id)).await
    }

    pub async fn create_step(&self, funnel_id: i64, input: &StepInput) -> Result<FunnelStep, ApiError> {
        self.send(Method::POST, &format!("/funnels/{}/steps", funnel_id), input)
            .await
    }

    pub async fn update_step(
        &self,
        funnel_id: i64,
        step_id: i64,
        input: &StepInput,
    ) -> Result<FunnelStep, ApiError> {
        self.send(
            Method::PUT,
            &format!("/funnels/{}/steps/{}", funnel_id, step_id),
            input,
        )
        .await
    }

    pub async fn delete_step(&self, funnel_id: i64, step_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/funnels/{}/steps/{}", funnel_id, step_id))
            .await
    }

    pub async fn reorder_steps(&self, funnel_id: i64, step_ids: &[i64]) -> Result<Value, ApiError> {
        let body = Self::to_body(&ReorderStepsRequest { step_ids })?;
        self.request(
            Method::POST,
            &format!("/funnels/{}/steps/reorder", funnel_id),
            Some(body),
        )
        .await
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    pub async fn checkout_config(&self, funnel_id: i64) -> Result<CheckoutConfig, ApiError> {
        self.get(&format!("/checkout/{}", funnel_id)).await
    }

    pub async fn update_checkout_config(
        &self,
        funnel_id: i64,
        input: &CheckoutConfigInput,
    ) -> Result<CheckoutConfig, ApiError> {
        self.send(Method::PUT, &format!("/checkout/{}", funnel_id), input)
            .await
    }

    pub async fn checkout_preview(&self, funnel_id: i64) -> Result<CheckoutPreview, ApiError> {
        self.get(&format!("/checkout/{}/preview", funnel_id)).await
    }

    // ========================================================================
    // Monitoring
    // ========================================================================

    pub async fn visitors(&self) -> Result<Vec<Visitor>, ApiError> {
        self.get("/monitoring/visitors").await
    }

    pub async fn visitor_events(&self, visitor_id: i64) -> Result<Vec<VisitorEvent>, ApiError> {
        self.get(&format!("/monitoring/visitors/{}/events", visitor_id))
            .await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get("/monitoring/stats").await
    }

    // ========================================================================
    // Tracking pixels
    // ========================================================================

    pub async fn pixels(&self, funnel_id: i64) -> Result<Vec<TrackingPixel>, ApiError> {
        self.get(&format!("/tracking/{}/pixels", funnel_id)).await
    }

    pub async fn create_pixel(&self, funnel_id: i64, input: &PixelInput) -> Result<TrackingPixel, ApiError> {
        self.send(Method::POST, &format!("/tracking/{}/pixels", funnel_id), input)
            .await
    }

    pub async fn update_pixel(
        &self,
        funnel_id: i64,
        pixel_id: i64,
        input: &PixelInput,
    ) -> Result<TrackingPixel, ApiError> {
        self.send(
            Method::PUT,
            &format!("/tracking/{}/pixels/{}", funnel_id, pixel_id),
            input,
        )
        .await
    }

    pub async fn delete_pixel(&self, funnel_id: i64, pixel_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/tracking/{}/pixels/{}", funnel_id, pixel_id))
            .await
    }

    pub async fn toggle_pixel(&self, funnel_id: i64, pixel_id: i64) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            &format!("/tracking/{}/pixels/{}/toggle", funnel_id, pixel_id),
            None,
        )
        .await
    }

    // ========================================================================
    // Payments
    // ========================================================================

    pub async fn payments(&self, funnel_id: i64) -> Result<Vec<Payment>, ApiError> {
        self.get(&format!("/payments/{}", funnel_id)).await
    }

    pub async fn payment_stats(&self, funnel_id: i64) -> Result<PaymentStats, ApiError> {
        self.get(&format!("/payments/{}/stats", funnel_id)).await
    }
}
