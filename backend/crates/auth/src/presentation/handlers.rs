//! HTTP Handlers
//!
//! Thin translation from use-case outcomes to responses: statuses,
//! redirect targets and Set-Cookie headers. All decisions live in the
//! application layer.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use kernel::id::UserId;
use kernel::principal::Principal;
use std::sync::Arc;

use platform::client::{extract_client_info, extract_client_ip};
use platform::cookie::{CookieConfig, extract_cookie};

use crate::application::config::AuthConfig;
use crate::application::outcome::{ConfirmOutcome, EnrollView, LoginOutcome, MfaOutcome};
use crate::application::{
    CheckSessionUseCase, EnrollMfaUseCase, LoginInput, LoginUseCase, SignOutUseCase,
    VerifyMfaUseCase,
};
use crate::domain::repository::{
    LoginEventRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::error::AuthResult;
use crate::presentation::dto::{
    EnrollResponse, LoginRequest, LoginResponse, MfaConfirmRequest, MfaConfirmResponse,
    MfaDisableRequest, MfaVerifyRequest, MfaVerifyResponse, SessionStatusResponse,
};

/// Bound required of the repository behind the auth handlers
pub trait AuthStore:
    UserRepository
    + LoginEventRepository
    + SessionRepository
    + SettingsRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + LoginEventRepository
        + SessionRepository
        + SettingsRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R: AuthStore> {
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let client = extract_client_info(&headers, client_ip);

    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let input = LoginInput {
        username: req.username,
        password: req.password,
    };

    let outcome = use_case.execute(input, client).await?;
    let redirect_to = outcome.redirect_to();

    let response = match outcome {
        LoginOutcome::SignedIn { session_token } => {
            let cookie = session_cookie(&state.config).build_set_cookie(&session_token);
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(LoginResponse {
                    redirect_to,
                    mfa_required: false,
                }),
            )
                .into_response()
        }
        LoginOutcome::MfaRequired { ticket } => {
            let cookie = ticket_cookie(&state.config).build_set_cookie(&ticket);
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(LoginResponse {
                    redirect_to,
                    mfa_required: true,
                }),
            )
                .into_response()
        }
    };

    Ok(response)
}

// ============================================================================
// MFA Verification
// ============================================================================

/// POST /api/auth/mfa/verify
pub async fn mfa_verify<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<MfaVerifyRequest>,
) -> AuthResult<impl IntoResponse> {
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let client = extract_client_info(&headers, client_ip);

    let ticket = extract_cookie(&headers, &state.config.ticket_cookie_name);

    let use_case = VerifyMfaUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    // An invalid code surfaces as a 401 here with the ticket cookie left
    // in place, so the user can retry until the ticket expires.
    let outcome = use_case.execute(ticket.as_deref(), &req.code, client).await?;
    let redirect_to = outcome.redirect_to();

    let response = match outcome {
        MfaOutcome::SignedIn { session_token } => {
            let set_session = session_cookie(&state.config).build_set_cookie(&session_token);
            let clear_ticket = ticket_cookie(&state.config).build_delete_cookie();
            (
                StatusCode::OK,
                axum::response::AppendHeaders([
                    (header::SET_COOKIE, set_session),
                    (header::SET_COOKIE, clear_ticket),
                ]),
                Json(MfaVerifyResponse { redirect_to }),
            )
                .into_response()
        }
        MfaOutcome::BackToLogin => {
            let clear_ticket = ticket_cookie(&state.config).build_delete_cookie();
            (
                StatusCode::OK,
                [(header::SET_COOKIE, clear_ticket)],
                Json(MfaVerifyResponse { redirect_to }),
            )
                .into_response()
        }
    };

    Ok(response)
}

// ============================================================================
// MFA Enrollment (requires session)
// ============================================================================

/// GET /api/auth/mfa/enroll
pub async fn mfa_enroll<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    axum::Extension(principal): axum::Extension<Principal>,
) -> AuthResult<Json<EnrollResponse>> {
    let use_case = EnrollMfaUseCase::new(state.repo.clone(), state.config.clone());

    let view = use_case.enroll(&principal).await?;

    let response = match view {
        EnrollView::AlreadyEnabled => EnrollResponse {
            already_enabled: true,
            secret: None,
            otpauth_url: None,
            qr_code: None,
        },
        EnrollView::Pending(provisioning) => EnrollResponse {
            already_enabled: false,
            secret: Some(provisioning.secret_base32),
            otpauth_url: Some(provisioning.otpauth_url),
            qr_code: Some(provisioning.qr_png_base64),
        },
    };

    Ok(Json(response))
}

/// POST /api/auth/mfa/confirm
pub async fn mfa_confirm<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    axum::Extension(principal): axum::Extension<Principal>,
    Json(req): Json<MfaConfirmRequest>,
) -> AuthResult<impl IntoResponse> {
    let use_case = EnrollMfaUseCase::new(state.repo.clone(), state.config.clone());

    let outcome = use_case.confirm(&principal, &req.code).await?;

    let response = match outcome {
        ConfirmOutcome::Enabled => (
            StatusCode::OK,
            Json(MfaConfirmResponse {
                enabled: true,
                error: None,
                secret: None,
                otpauth_url: None,
                qr_code: None,
            }),
        ),
        ConfirmOutcome::Rejected(provisioning) => (
            StatusCode::UNAUTHORIZED,
            Json(MfaConfirmResponse {
                enabled: false,
                error: Some("Invalid code"),
                secret: Some(provisioning.secret_base32),
                otpauth_url: Some(provisioning.otpauth_url),
                qr_code: Some(provisioning.qr_png_base64),
            }),
        ),
    };

    Ok(response)
}

/// POST /api/auth/mfa/disable
pub async fn mfa_disable<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    axum::Extension(principal): axum::Extension<Principal>,
    Json(req): Json<MfaDisableRequest>,
) -> AuthResult<StatusCode> {
    let use_case = EnrollMfaUseCase::new(state.repo.clone(), state.config.clone());

    use_case
        .disable(&principal, &UserId::from_uuid(req.user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    if let Some(token) = extract_cookie(&headers, &state.config.session_cookie_name) {
        let use_case = SignOutUseCase::new(state.repo.clone());
        // Revocation is idempotent; a failure only means the cookie is cleared
        if let Err(e) = use_case.execute(&token).await {
            tracing::warn!(error = %e, "Session revocation failed during logout");
        }
    }

    let cookie = session_cookie(&state.config).build_delete_cookie();

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/session
pub async fn session_status<R: AuthStore>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<Json<SessionStatusResponse>> {
    let token = extract_cookie(&headers, &state.config.session_cookie_name);

    let principal = match token {
        Some(token) => {
            let use_case = CheckSessionUseCase::new(state.repo.clone(), state.repo.clone());
            use_case.enforce(&token).await.ok()
        }
        None => None,
    };

    let response = match principal {
        Some(p) => SessionStatusResponse {
            authenticated: true,
            username: Some(p.username),
            is_superadmin: Some(p.is_superadmin),
        },
        None => SessionStatusResponse {
            authenticated: false,
            username: None,
            is_superadmin: None,
        },
    };

    Ok(Json(response))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn session_cookie(config: &AuthConfig) -> CookieConfig {
    CookieConfig {
        name: config.session_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(config.absolute_timeout_seconds()),
    }
}

fn ticket_cookie(config: &AuthConfig) -> CookieConfig {
    CookieConfig {
        name: config.ticket_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(config.ticket_ttl.as_secs() as i64),
    }
}
