//! In-memory backend for tests.
//!
//! Mirrors the access rules the hosted database enforces through its
//! row-level policies: anyone reads articles and inserts subscribers, only
//! admins write articles, read subscribers or list accounts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use techlog_core::{ArticleId, Email, Role, SubscriberId, UserId};

use super::{
    AdminUserView, AppMetadata, Article, AuthBackend, AuthSession, AuthUser, BackendError,
    DataBackend, NewArticle, SignUpOutcome, Subscriber,
};

/// Access token lifetime handed out by the fake auth service.
const TOKEN_LIFETIME_SECS: i64 = 3600;

struct FakeUser {
    id: UserId,
    email: Email,
    password: String,
    role: Role,
    created_at: DateTime<Utc>,
}

impl FakeUser {
    fn auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            email: Some(self.email.as_str().to_string()),
            app_metadata: AppMetadata {
                role: self.role.clone(),
            },
        }
    }
}

struct FakeState {
    users: Vec<FakeUser>,
    access_tokens: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, UserId>,
    articles: Vec<Article>,
    subscribers: Vec<Subscriber>,
    recovery_requests: Vec<(Email, String)>,
    clock: DateTime<Utc>,
}

impl FakeState {
    /// Next row timestamp; strictly increasing.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += Duration::minutes(1);
        self.clock
    }

    fn user_by_token(&self, auth: Option<&str>) -> Result<Option<&FakeUser>, BackendError> {
        let Some(token) = auth else {
            return Ok(None);
        };
        let id = self.access_tokens.get(token).ok_or_else(|| BackendError::Api {
            status: 401,
            code: Some("PGRST301".to_string()),
            message: "JWT expired".to_string(),
        })?;
        Ok(self.users.iter().find(|user| &user.id == id))
    }

    fn require_admin(&self, auth: Option<&str>) -> Result<&FakeUser, BackendError> {
        match self.user_by_token(auth)? {
            Some(user) if user.role.is_admin() => Ok(user),
            _ => Err(BackendError::Api {
                status: 403,
                code: Some("42501".to_string()),
                message: "new row violates row-level security policy".to_string(),
            }),
        }
    }

    fn issue_session(&mut self, user_id: &UserId) -> Result<AuthSession, BackendError> {
        let user = self
            .users
            .iter()
            .find(|user| &user.id == user_id)
            .map(FakeUser::auth_user)
            .ok_or_else(|| BackendError::Parse("unknown user".to_string()))?;
        let access_token = format!("access-{}", uuid::Uuid::new_v4());
        let refresh_token = format!("refresh-{}", uuid::Uuid::new_v4());
        self.access_tokens
            .insert(access_token.clone(), user_id.clone());
        self.refresh_tokens
            .insert(refresh_token.clone(), user_id.clone());
        Ok(AuthSession {
            access_token,
            refresh_token,
            expires_at: Utc::now().timestamp() + TOKEN_LIFETIME_SECS,
            user,
        })
    }
}

/// Backend that keeps accounts and rows in memory.
pub struct InMemoryBackend {
    state: Mutex<FakeState>,
    require_confirmation: AtomicBool,
    fail_list_articles: AtomicBool,
    fail_insert_article: AtomicBool,
    fail_delete_article: AtomicBool,
    fail_subscribers: AtomicBool,
    fail_admin_users: AtomicBool,
    fail_is_admin: AtomicBool,
    fail_sign_out: AtomicBool,
    is_admin_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    insert_article_calls: AtomicUsize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                users: Vec::new(),
                access_tokens: HashMap::new(),
                refresh_tokens: HashMap::new(),
                articles: Vec::new(),
                subscribers: Vec::new(),
                recovery_requests: Vec::new(),
                clock: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).single().unwrap_or_default(),
            }),
            require_confirmation: AtomicBool::new(false),
            fail_list_articles: AtomicBool::new(false),
            fail_insert_article: AtomicBool::new(false),
            fail_delete_article: AtomicBool::new(false),
            fail_subscribers: AtomicBool::new(false),
            fail_admin_users: AtomicBool::new(false),
            fail_is_admin: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            is_admin_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            insert_article_calls: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the state from the others.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register an account. Returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `email` is not a valid address.
    pub fn add_user(&self, email: &str, password: &str, role: Role) -> UserId {
        let mut state = self.lock();
        let id = UserId::new(uuid::Uuid::new_v4().to_string());
        let created_at = state.tick();
        state.users.push(FakeUser {
            id: id.clone(),
            email: Email::parse_input(email).expect("test account email must be valid"),
            password: password.to_string(),
            role,
            created_at,
        });
        id
    }

    /// Issue a session for an existing account without checking a password.
    ///
    /// # Errors
    ///
    /// Returns error if no account has this email.
    pub fn session_for(&self, email: &str) -> Result<AuthSession, BackendError> {
        let mut state = self.lock();
        let id = state
            .users
            .iter()
            .find(|user| user.email.as_str() == email.to_lowercase())
            .map(|user| user.id.clone())
            .ok_or_else(|| BackendError::Parse(format!("unknown user {email}")))?;
        state.issue_session(&id)
    }

    /// Store an article directly, bypassing access rules.
    pub fn insert_article_row(&self, title: &str, content: &str, user_id: &UserId) -> Article {
        let mut state = self.lock();
        let created_at = state.tick();
        let article = Article {
            id: ArticleId::new(uuid::Uuid::new_v4().to_string()),
            title: title.to_string(),
            content: content.to_string(),
            created_at,
            user_id: user_id.clone(),
        };
        state.articles.push(article.clone());
        article
    }

    /// Snapshot of stored articles, newest first.
    #[must_use]
    pub fn articles(&self) -> Vec<Article> {
        let mut articles = self.lock().articles.clone();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        articles
    }

    /// Snapshot of stored subscribers, newest first.
    #[must_use]
    pub fn subscribers(&self) -> Vec<Subscriber> {
        let mut subscribers = self.lock().subscribers.clone();
        subscribers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        subscribers
    }

    /// Emails that requested a password reset, with their redirect targets.
    #[must_use]
    pub fn recovery_requests(&self) -> Vec<(Email, String)> {
        self.lock().recovery_requests.clone()
    }

    /// Whether an access token is still accepted.
    #[must_use]
    pub fn is_token_active(&self, access_token: &str) -> bool {
        self.lock().access_tokens.contains_key(access_token)
    }

    /// Forget every refresh token, so the next refresh fails.
    pub fn revoke_refresh_tokens(&self) {
        self.lock().refresh_tokens.clear();
    }

    /// Require email confirmation on sign-up.
    pub fn set_require_confirmation(&self, on: bool) {
        self.require_confirmation.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_list_articles(&self, on: bool) {
        self.fail_list_articles.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_insert_article(&self, on: bool) {
        self.fail_insert_article.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_delete_article(&self, on: bool) {
        self.fail_delete_article.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_subscribers(&self, on: bool) {
        self.fail_subscribers.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_admin_users(&self, on: bool) {
        self.fail_admin_users.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_is_admin(&self, on: bool) {
        self.fail_is_admin.store(on, Ordering::SeqCst);
    }

    pub fn set_fail_sign_out(&self, on: bool) {
        self.fail_sign_out.store(on, Ordering::SeqCst);
    }

    /// Number of `is_admin` procedure calls so far.
    #[must_use]
    pub fn is_admin_calls(&self) -> usize {
        self.is_admin_calls.load(Ordering::SeqCst)
    }

    /// Number of article delete requests so far.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of article insert requests so far.
    #[must_use]
    pub fn insert_article_calls(&self) -> usize {
        self.insert_article_calls.load(Ordering::SeqCst)
    }
}

fn unavailable(what: &str) -> BackendError {
    BackendError::Unavailable(format!("{what} failed"))
}

fn auth_error(status: u16, code: &str, message: &str) -> BackendError {
    BackendError::Api {
        status,
        code: Some(code.to_string()),
        message: message.to_string(),
    }
}

#[async_trait]
impl AuthBackend for InMemoryBackend {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let mut state = self.lock();
        let id = state
            .users
            .iter()
            .find(|user| &user.email == email && user.password == password.expose_secret())
            .map(|user| user.id.clone())
            .ok_or_else(|| auth_error(400, "invalid_credentials", "Invalid login credentials"))?;
        state.issue_session(&id)
    }

    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SignUpOutcome, BackendError> {
        if password.expose_secret().chars().count() < 6 {
            return Err(auth_error(
                422,
                "weak_password",
                "Password should be at least 6 characters.",
            ));
        }
        let mut state = self.lock();
        if state.users.iter().any(|user| &user.email == email) {
            return Err(auth_error(
                422,
                "user_already_exists",
                "User already registered",
            ));
        }
        let id = UserId::new(uuid::Uuid::new_v4().to_string());
        let created_at = state.tick();
        state.users.push(FakeUser {
            id: id.clone(),
            email: email.clone(),
            password: password.expose_secret().to_string(),
            role: Role::None,
            created_at,
        });
        if self.require_confirmation.load(Ordering::SeqCst) {
            return Ok(SignUpOutcome::ConfirmationRequired {
                email: email.clone(),
            });
        }
        state.issue_session(&id).map(SignUpOutcome::SignedIn)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let mut state = self.lock();
        let id = state.refresh_tokens.remove(refresh_token).ok_or_else(|| {
            auth_error(
                400,
                "invalid_grant",
                "Invalid Refresh Token: Refresh Token Not Found",
            )
        })?;
        state.issue_session(&id)
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let state = self.lock();
        state
            .user_by_token(Some(access_token))?
            .map(FakeUser::auth_user)
            .ok_or_else(|| auth_error(404, "user_not_found", "User not found"))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(unavailable("logout"));
        }
        let mut state = self.lock();
        if let Some(id) = state.access_tokens.remove(access_token) {
            state.refresh_tokens.retain(|_, owner| owner != &id);
        }
        Ok(())
    }

    async fn send_password_recovery(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> Result<(), BackendError> {
        self.lock()
            .recovery_requests
            .push((email.clone(), redirect_to.to_string()));
        Ok(())
    }
}

#[async_trait]
impl DataBackend for InMemoryBackend {
    async fn select_articles(&self, auth: Option<&str>) -> Result<Vec<Article>, BackendError> {
        if self.fail_list_articles.load(Ordering::SeqCst) {
            return Err(unavailable("select articles"));
        }
        self.lock().user_by_token(auth)?;
        Ok(self.articles())
    }

    async fn insert_article(
        &self,
        auth: Option<&str>,
        article: &NewArticle,
    ) -> Result<Article, BackendError> {
        self.insert_article_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert_article.load(Ordering::SeqCst) {
            return Err(unavailable("insert article"));
        }
        let mut state = self.lock();
        state.require_admin(auth)?;
        if article.title.trim().is_empty() || article.content.trim().is_empty() {
            return Err(auth_error(
                400,
                "23514",
                "new row violates check constraint",
            ));
        }
        let created_at = match article.created_at {
            Some(at) => at,
            None => state.tick(),
        };
        let row = Article {
            id: ArticleId::new(uuid::Uuid::new_v4().to_string()),
            title: article.title.clone(),
            content: article.content.clone(),
            created_at,
            user_id: article.user_id.clone(),
        };
        state.articles.push(row.clone());
        Ok(row)
    }

    async fn delete_article(
        &self,
        auth: Option<&str>,
        id: &ArticleId,
    ) -> Result<(), BackendError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete_article.load(Ordering::SeqCst) {
            return Err(unavailable("delete article"));
        }
        let mut state = self.lock();
        state.require_admin(auth)?;
        state.articles.retain(|article| &article.id != id);
        Ok(())
    }

    async fn select_subscribers(
        &self,
        auth: Option<&str>,
    ) -> Result<Vec<Subscriber>, BackendError> {
        if self.fail_subscribers.load(Ordering::SeqCst) {
            return Err(unavailable("select subscribers"));
        }
        self.lock().require_admin(auth)?;
        Ok(self.subscribers())
    }

    async fn insert_subscriber(
        &self,
        auth: Option<&str>,
        email: &Email,
    ) -> Result<(), BackendError> {
        if self.fail_subscribers.load(Ordering::SeqCst) {
            return Err(unavailable("insert subscriber"));
        }
        let mut state = self.lock();
        state.user_by_token(auth)?;
        if state.subscribers.iter().any(|sub| &sub.email == email) {
            return Err(auth_error(
                409,
                "23505",
                "duplicate key value violates unique constraint \"subscribers_email_key\"",
            ));
        }
        let created_at = state.tick();
        state.subscribers.push(Subscriber {
            id: SubscriberId::new(uuid::Uuid::new_v4().to_string()),
            email: email.clone(),
            created_at,
        });
        Ok(())
    }

    async fn rpc_is_admin(&self, auth: Option<&str>) -> Result<bool, BackendError> {
        self.is_admin_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_is_admin.load(Ordering::SeqCst) {
            return Err(unavailable("is_admin"));
        }
        let state = self.lock();
        Ok(state
            .user_by_token(auth)?
            .is_some_and(|user| user.role.is_admin()))
    }

    async fn rpc_get_admin_users(
        &self,
        auth: Option<&str>,
    ) -> Result<Vec<AdminUserView>, BackendError> {
        if self.fail_admin_users.load(Ordering::SeqCst) {
            return Err(unavailable("get_admin_users"));
        }
        let state = self.lock();
        state.require_admin(auth)?;
        let mut users: Vec<AdminUserView> = state
            .users
            .iter()
            .map(|user| AdminUserView {
                id: user.id.clone(),
                email: Some(user.email.as_str().to_string()),
                role: user.role.clone(),
                created_at: user.created_at,
            })
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}
