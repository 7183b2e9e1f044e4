use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use crate::{
    auth::{
        dto::{
            ErrorResponse, LoginRequest, LoginResponse, MeResponse, MessageResponse,
            RegisterRequest,
        },
        error::AuthError,
        extractors::AuthUser,
        jwt::JwtKeys,
        services::{self, Registration},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), (StatusCode, Json<MessageResponse>)> {
    let reg = Registration {
        first_name: payload.first_name,
        last_name: payload.last_name,
        username: payload.username,
        password: payload.password,
    };

    match services::register(state.users.as_ref(), reg).await {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(MessageResponse::new("User registered successfully")),
        )),
        Err(AuthError::DuplicateAccount) => Err((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("User already exists")),
        )),
        Err(e) if e.is_client_fault() => {
            Err((StatusCode::BAD_REQUEST, Json(MessageResponse::new(e.to_string()))))
        }
        Err(e) => {
            error!(error = %e, "registration failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new("Error registering user")),
            ))
        }
    }
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    let keys = JwtKeys::from_ref(&state);
    let generic = state.config.login_generic_errors;

    match services::login(state.users.as_ref(), &keys, &payload.username, &payload.password).await
    {
        Ok(token) => Ok(Json(LoginResponse {
            message: "Login successful".into(),
            token,
        })),
        Err(e) => Err(login_failure(e, generic)),
    }
}

fn login_failure(e: AuthError, generic: bool) -> (StatusCode, Json<ErrorResponse>) {
    let body = match e {
        AuthError::AccountNotFound | AuthError::InvalidCredentials if generic => {
            "Invalid credentials"
        }
        AuthError::AccountNotFound => "User not found",
        AuthError::InvalidCredentials => "Invalid password",
        AuthError::MissingCredentials => "username and password are required",
        ref other => {
            error!(error = %other, "login failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Login failed")),
            );
        }
    };
    warn!(reason = %e, "login rejected");
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(body)))
}

#[instrument]
pub async fn logout() -> Json<MessageResponse> {
    services::logout();
    Json(MessageResponse::new("Logged out"))
}

#[instrument(skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, (StatusCode, String)> {
    let user = state
        .users
        .find_by_id(claims.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "user lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
        })?
        .ok_or_else(|| {
            warn!("token for unknown user");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;

    Ok(Json(MeResponse {
        user_id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}
