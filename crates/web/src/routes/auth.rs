//! Authentication route handlers.
//!
//! Sign in, sign up and password recovery share one page whose `view` query
//! parameter picks the form. A successful sign-in shows a short interstitial
//! before the browser is sent home.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentViewer;
use crate::pages::{LoginController, LoginState, LoginView, Navbar};
use crate::state::AppState;

/// Login page query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub view: Option<String>,
}

/// Credentials form data (sign in and sign up).
#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    pub password: SecretString,
}

/// Password recovery form data.
#[derive(Debug, Deserialize)]
pub struct RecoverForm {
    #[serde(default)]
    pub email: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub navbar: Navbar,
    pub view: LoginView,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub email: String,
}

/// "Signing in" interstitial template.
#[derive(Template, WebTemplate)]
#[template(path = "login_redirect.html")]
pub struct LoginRedirectTemplate {
    pub redirect_to: &'static str,
    /// Whole seconds before the browser follows `redirect_to`.
    pub refresh_secs: u64,
}

fn render(navbar: Navbar, state: LoginState) -> Response {
    match state {
        LoginState::Form {
            view,
            error,
            notice,
            email,
        } => LoginTemplate {
            navbar,
            view,
            error,
            notice,
            email,
        }
        .into_response(),
        LoginState::SigningIn { redirect_to, delay } => {
            let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            LoginRedirectTemplate {
                redirect_to,
                refresh_secs: millis.div_ceil(1000),
            }
            .into_response()
        }
    }
}

/// Display the login page.
#[instrument(skip(viewer))]
pub async fn login_page(
    CurrentViewer(viewer): CurrentViewer,
    Query(query): Query<LoginQuery>,
) -> Response {
    if viewer.is_signed_in() {
        return Redirect::to("/").into_response();
    }
    let view = LoginView::from_param(query.view.as_deref());
    render(Navbar::for_viewer(&viewer), LoginState::form(view))
}

/// Sign in.
#[instrument(skip(state, viewer, session, form))]
pub async fn login(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let store = state.session_store(session);
    let controller = LoginController::new(&store, state.config().sign_in_delay);
    let result = controller.sign_in(form.email, form.password).await;
    render(Navbar::for_viewer(&viewer), result)
}

/// Create an account.
#[instrument(skip(state, viewer, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let store = state.session_store(session);
    let controller = LoginController::new(&store, state.config().sign_in_delay);
    let result = controller.sign_up(form.email, form.password).await;
    render(Navbar::for_viewer(&viewer), result)
}

/// Send a password recovery email.
#[instrument(skip(state, viewer, session, form))]
pub async fn recover(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    session: Session,
    Form(form): Form<RecoverForm>,
) -> Response {
    let store = state.session_store(session);
    let controller = LoginController::new(&store, state.config().sign_in_delay);
    let redirect_to = format!("{}/login", state.config().base_url.trim_end_matches('/'));
    let result = controller.recover(form.email, &redirect_to).await;
    render(Navbar::for_viewer(&viewer), result)
}

/// Sign out and go home.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    state.session_store(session).sign_out().await;
    Redirect::to("/")
}
