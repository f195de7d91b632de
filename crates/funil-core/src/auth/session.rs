use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::User;

/// What the session needs from the API: the token lifecycle and the
/// "who am I" call.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    fn has_token(&self) -> bool;

    /// Returns whether the server issued a token (held and persisted)
    async fn login(&mut self, email: &str, password: &str) -> Result<bool, ApiError>;

    async fn current_user(&self) -> Result<User, ApiError>;

    /// Best-effort server logout; the local token is gone afterwards either way,
    /// even if the call never finishes
    async fn logout(&mut self) -> Result<(), ApiError>;

    fn clear_token(&mut self);
}

#[async_trait]
impl AuthBackend for ApiClient {
    fn has_token(&self) -> bool {
        ApiClient::has_token(self)
    }

    async fn login(&mut self, email: &str, password: &str) -> Result<bool, ApiError> {
        let response = ApiClient::login(self, email, password).await?;
        Ok(response.access_token.is_some_and(|t| !t.is_empty()))
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        ApiClient::current_user(self).await
    }

    async fn logout(&mut self) -> Result<(), ApiError> {
        ApiClient::logout(self).await
    }

    fn clear_token(&mut self) {
        ApiClient::clear_token(self)
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email e senha são obrigatórios")]
    MissingCredentials,

    #[error("A resposta de login não trouxe um token de acesso")]
    MissingToken,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Message for the login form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Api(e) if e.is_unauthorized() => "Email ou senha inválidos".to_string(),
            AuthError::Api(ApiError::Network(e)) if e.is_timeout() => {
                "Tempo de conexão esgotado. Tente novamente.".to_string()
            }
            AuthError::Api(e) if e.is_network() => {
                "Não foi possível conectar ao servidor. Verifique se o backend está em execução."
                    .to_string()
            }
            AuthError::Api(e) => format!("Falha no login: {}", e),
            other => other.to_string(),
        }
    }
}

/// Authentication state for the lifetime of the process.
///
/// Authenticated means a user was fetched with the current token; a token
/// alone is not enough.
pub struct Session<B: AuthBackend = ApiClient> {
    backend: B,
    current_user: Option<User>,
    is_loading: bool,
}

impl<B: AuthBackend> Session<B> {
    /// A fresh session starts loading until `restore` has run
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current_user: None,
            is_loading: true,
        }
    }

    /// Resume a previous run from the stored token. A token the server
    /// rejects is discarded. Returns whether the session is authenticated.
    pub async fn restore(&mut self) -> bool {
        let lookup = if self.backend.has_token() {
            Some(self.backend.current_user().await)
        } else {
            None
        };
        self.finish_restore(lookup)
    }

    /// Apply the outcome of a "who am I" lookup made elsewhere with the
    /// stored token (`None` when there was no token to check). Callers
    /// that cannot wait on `restore` run the lookup themselves.
    pub fn finish_restore(&mut self, lookup: Option<Result<User, ApiError>>) -> bool {
        match lookup {
            Some(Ok(user)) => {
                info!(user_id = user.id, "Session restored");
                self.current_user = Some(user);
            }
            Some(Err(e)) => {
                warn!(error = %e, "Stored token rejected, discarding it");
                self.backend.clear_token();
                self.current_user = None;
            }
            None => {}
        }
        self.is_loading = false;
        self.is_authenticated()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        self.current_user = None;
        match self.authenticate(email, password).await {
            Ok(user) => {
                info!(user_id = user.id, "Login successful");
                self.current_user = Some(user);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.backend.clear_token();
                Err(e)
            }
        }
    }

    async fn authenticate(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        if !self.backend.login(email, password).await? {
            return Err(AuthError::MissingToken);
        }
        Ok(self.backend.current_user().await?)
    }

    /// Drop the session. Server errors are logged, never returned.
    pub async fn logout(&mut self) {
        self.forget_user();
        if let Err(e) = self.backend.logout().await {
            warn!(error = %e, "Logout request failed");
        }
        self.backend.clear_token();
    }

    fn forget_user(&mut self) {
        if self.current_user.take().is_some() {
            info!("Logged out");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn api(&self) -> &B {
        &self.backend
    }

    pub fn api_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl Session<ApiClient> {
    /// Clear the local session at once and return the server-side logout
    /// as a standalone future, so an interactive caller can spawn it
    /// instead of waiting on the network.
    pub fn sign_out(&mut self) -> impl Future<Output = ()> + Send + 'static {
        self.forget_user();
        let revoker = self.backend.end_session();
        async move {
            if let Some(client) = revoker {
                if let Err(e) = client.revoke().await {
                    warn!(error = %e, "Logout request failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, TokenStore};
    use reqwest::StatusCode;
    use std::sync::Arc;

    /// Scripted backend over a real token store
    struct FakeBackend {
        store: Arc<MemoryTokenStore>,
        token: Option<String>,
        issue_token: Option<&'static str>,
        accepted_token: &'static str,
        logout_fails: bool,
        logout_calls: usize,
    }

    impl FakeBackend {
        fn new(store: Arc<MemoryTokenStore>) -> Self {
            let token = store.load().unwrap();
            Self {
                store,
                token,
                issue_token: Some("abc"),
                accepted_token: "abc",
                logout_fails: false,
                logout_calls: 0,
            }
        }
    }

    fn unauthorized() -> ApiError {
        ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"msg": "Bad username or password"}"#)
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        fn has_token(&self) -> bool {
            self.token.is_some()
        }

        async fn login(&mut self, _email: &str, password: &str) -> Result<bool, ApiError> {
            if password != "secret" {
                return Err(unauthorized());
            }
            match self.issue_token {
                Some(token) => {
                    self.token = Some(token.to_string());
                    self.store.save(token).unwrap();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn current_user(&self) -> Result<User, ApiError> {
            match self.token.as_deref() {
                Some(t) if t == self.accepted_token => Ok(User {
                    id: 1,
                    email: "admin@funil.com".to_string(),
                    name: None,
                    role: Some("admin".to_string()),
                }),
                _ => Err(unauthorized()),
            }
        }

        async fn logout(&mut self) -> Result<(), ApiError> {
            self.logout_calls += 1;
            self.clear_token();
            if self.logout_fails {
                Err(ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, ""))
            } else {
                Ok(())
            }
        }

        fn clear_token(&mut self) {
            self.token = None;
            self.store.clear().unwrap();
        }
    }

    #[tokio::test]
    async fn test_restore_without_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(FakeBackend::new(store));
        assert!(session.is_loading());

        assert!(!session.restore().await);
        assert!(!session.is_loading());
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_restore_with_valid_token() {
        let store = Arc::new(MemoryTokenStore::with_token("abc"));
        let mut session = Session::new(FakeBackend::new(store.clone()));

        assert!(session.restore().await);
        assert!(!session.is_loading());
        assert_eq!(session.current_user().unwrap().greeting(), "Olá, admin@funil.com");
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_restore_with_rejected_token_discards_it() {
        let store = Arc::new(MemoryTokenStore::with_token("expired"));
        let mut session = Session::new(FakeBackend::new(store.clone()));

        assert!(!session.restore().await);
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
        assert_eq!(store.load().unwrap(), None);
        assert!(!session.api().has_token());
    }

    #[tokio::test]
    async fn test_login_success() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(FakeBackend::new(store.clone()));
        session.restore().await;

        session.login(" admin@funil.com ", "secret").await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.current_user().unwrap().email, "admin@funil.com");
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(FakeBackend::new(store.clone()));

        let err = session.login("admin@funil.com", "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Email ou senha inválidos");
        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(FakeBackend::new(store));

        assert!(matches!(
            session.login("", "secret").await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            session.login("admin@funil.com", "").await,
            Err(AuthError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_without_token_in_response() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut backend = FakeBackend::new(store.clone());
        backend.issue_token = None;
        let mut session = Session::new(backend);

        let err = session.login("admin@funil.com", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_user_fetch_failure_clears_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut backend = FakeBackend::new(store.clone());
        backend.issue_token = Some("not-accepted");
        let mut session = Session::new(backend);

        assert!(session.login("admin@funil.com", "secret").await.is_err());
        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_swallows_server_error() {
        let store = Arc::new(MemoryTokenStore::with_token("abc"));
        let mut backend = FakeBackend::new(store.clone());
        backend.logout_fails = true;
        let mut session = Session::new(backend);
        assert!(session.restore().await);

        session.logout().await;
        assert!(!session.is_authenticated());
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(session.api().logout_calls, 1);
    }

    #[tokio::test]
    async fn test_logout_when_unauthenticated_is_noop() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(FakeBackend::new(store.clone()));
        session.restore().await;

        session.logout().await;
        session.logout().await;
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_user_message_passthrough() {
        let err = AuthError::Api(ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"msg": "Missing email or password"}"#,
        ));
        assert_eq!(err.user_message(), "Falha no login: Missing email or password");
        assert_eq!(
            AuthError::MissingCredentials.user_message(),
            "Email e senha são obrigatórios"
        );
    }

    #[tokio::test]
    async fn test_finish_restore_applies_outside_lookup() {
        let store = Arc::new(MemoryTokenStore::with_token("abc"));
        let mut session = Session::new(FakeBackend::new(store.clone()));
        let lookup = session.api().current_user().await;

        assert!(session.finish_restore(Some(lookup)));
        assert!(!session.is_loading());
        assert_eq!(session.current_user().unwrap().id, 1);

        let mut session = Session::new(FakeBackend::new(store.clone()));
        assert!(!session.finish_restore(Some(Err(unauthorized()))));
        assert_eq!(store.load().unwrap(), None);
        assert!(!session.finish_restore(None));
    }

    #[tokio::test]
    async fn test_sign_out_clears_before_the_request_runs() {
        let store = Arc::new(MemoryTokenStore::with_token("abc"));
        let client = ApiClient::new("http://127.0.0.1:9/api", store.clone(), None).unwrap();
        let mut session = Session::new(client);
        session.finish_restore(Some(Ok(User {
            id: 1,
            email: "admin@funil.com".to_string(),
            name: None,
            role: None,
        })));

        // The returned future is not polled here
        let _pending = session.sign_out();
        assert!(!session.is_authenticated());
        assert!(!session.api().has_token());
        assert_eq!(store.load().unwrap(), None);
    }
}
