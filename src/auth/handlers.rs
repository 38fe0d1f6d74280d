use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, MeResponse, RefreshRequest, RefreshResponse,
            RegisterRequest, RegisterResponse, RegisteredUser,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    email::Mailer,
    error::ApiError,
    state::AppState,
    users::{NewUser, Role, UserStore},
};

const VERIFY_SUBJECT: &str = "Verify your email address";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(register))
        .route("/sign-up/", post(register))
        .route("/login", post(login))
        .route("/login/", post(login))
        .route("/verify/:user_id/:code", get(verify_email))
        .route("/verify/:user_id/:code/", get(verify_email))
        .route("/token/refresh", post(refresh))
        .route("/token/refresh/", post(refresh))
        .route("/me", get(me))
        .route("/me/", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    // Role is checked first and reported distinctly from other validation.
    let role = match payload.role.as_deref() {
        Some(r) if !r.is_empty() => r
            .parse::<Role>()
            .map_err(|_| ApiError::validation("Invalid role"))?,
        _ => {
            warn!("registration without role");
            return Err(ApiError::validation("Role is required"));
        }
    };

    let (email, password) = match (payload.email, payload.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e.trim().to_lowercase(), p),
        _ => return Err(ApiError::validation("Email and password are required")),
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if password.len() < 8 {
        return Err(ApiError::validation("Password too short"));
    }
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::validation("Email already registered"));
    }

    let password_hash = hash_password(&password)?;
    let verification_code = Uuid::new_v4().to_string();
    let user = state
        .users
        .create(NewUser {
            email,
            password_hash,
            verification_code: verification_code.clone(),
        })
        .await?;

    let verification_url = format!(
        "{}/api/verify/{}/{}/",
        state.config.api_base_url, user.id, verification_code
    );
    let body = format!("Click the link to verify your email: {verification_url}");
    if let Err(e) = state.mailer.send(&user.email, VERIFY_SUBJECT, &body).await {
        if state.config.email_fail_hard {
            error!(error = %e, user_id = %user.id, "verification email failed");
            return Err(ApiError::Dependency(e));
        }
        warn!(error = %e, user_id = %user.id, "verification email failed, continuing");
    }

    state.users.set_role(user.id, role).await?;

    let keys = JwtKeys::from_ref(&state);
    let access = keys.sign_access(user.id)?;
    let refresh = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, role = %role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: RegisteredUser {
                email: user.email,
                is_verified: user.is_verified,
                role: Some(role),
            },
            refresh,
            access,
        }),
    ))
}

/// Login gates run in a fixed order; unknown email and wrong password
/// produce the same response so callers cannot enumerate accounts.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (email, password) = match (payload.email, payload.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e.trim().to_lowercase(), p),
        _ => return Err(ApiError::validation("Please provide both email and password")),
    };

    let user = match state.users.find_by_email(&email).await? {
        Some(u) if verify_password(&password, &u.password_hash) => u,
        _ => {
            warn!(email = %email, "login with invalid credentials");
            return Err(ApiError::authentication("Invalid Credentials"));
        }
    };

    if !user.is_verified {
        warn!(user_id = %user.id, "login before email verification");
        return Err(ApiError::authorization("Email not verified"));
    }

    let Some(role) = user.role else {
        warn!(user_id = %user.id, "login without a role set");
        return Err(ApiError::authorization("User role not set"));
    };

    let keys = JwtKeys::from_ref(&state);
    let access = keys.sign_access(user.id)?;
    let refresh = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        access,
        refresh,
        role,
        id: user.id,
    }))
}

/// Consumes the one-time verification code and redirects to the frontend.
/// The conditional update in the store guarantees a code is consumed at
/// most once, even under concurrent requests.
#[instrument(skip(state))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path((user_id, code)): Path<(Uuid, String)>,
) -> Result<Redirect, ApiError> {
    if state.users.find_by_id(user_id).await?.is_none() {
        return Err(ApiError::not_found("Invalid verification link"));
    }

    if state.users.consume_verification_code(user_id, &code).await? {
        info!(user_id = %user_id, "email verified");
        Ok(Redirect::temporary(&format!(
            "{}/signin",
            state.config.frontend_url
        )))
    } else {
        warn!(user_id = %user_id, "verification failed, wrong or consumed code");
        Ok(Redirect::temporary(&format!(
            "{}/verify-error",
            state.config.frontend_url
        )))
    }
}

/// Mints a new access token from a valid refresh token. The refresh token
/// itself is not rotated or invalidated.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh)
        .map_err(|_| ApiError::authentication("Invalid or expired token"))?;
    let access = keys.sign_access(claims.sub)?;
    Ok(Json(RefreshResponse { access }))
}

#[instrument(skip(user))]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        email: user.email,
        is_verified: user.is_verified,
        role: user.role,
        id: user.id,
    })
}
