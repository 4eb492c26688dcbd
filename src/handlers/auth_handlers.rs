use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{
    digest_reset_token, generate_reset_token, hash_password_blocking, password_problems,
    verify_dummy_password_blocking, verify_password_blocking, CurrentUser,
};
use crate::dto::{
    LoginDto, LoginIdentifier, MessageDto, PasswordResetConfirmDto, PasswordResetRequestDto,
    RegisterDto, RegisteredDto, TokenDto,
};
use crate::errors::{is_unique_violation, ApiError, FieldErrors};
use crate::repo;
use crate::AppState;

pub const LOGOUT_MESSAGE: &str = "Successfully logged out.";
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a reset token has been issued.";
pub const RESET_DONE_MESSAGE: &str = "Password has been reset successfully.";
pub const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token.";

/// Handler for registering a new account
///
/// This function handles POST requests to `/register/`.
///
/// ### Arguments
///
/// * `state` - The application state
/// * `payload` - The username, email and password
///
/// ### Returns
///
/// 201 with the username, email and a fresh auth token
#[instrument(skip(state, payload))]
pub async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterDto>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredDto>), ApiError> {
    let Json(payload) = payload?;
    let account = payload.validate()?;

    info!("Registering user {}", account.username);
    let password_hash = hash_password_blocking(account.password).await?;

    let user = repo::create_user(&state.pool, &account.username, &account.email, &password_hash)
        .map_err(|err| {
            let mut errors = FieldErrors::new();
            if is_unique_violation(&err, "users.username") {
                errors.insert(
                    "username".to_string(),
                    vec!["A user with that username already exists.".to_string()],
                );
            }
            if is_unique_violation(&err, "users.email") {
                errors.insert(
                    "email".to_string(),
                    vec!["user with this email already exists.".to_string()],
                );
            }
            if errors.is_empty() { ApiError::Database(err) } else { ApiError::Validation(errors) }
        })?;

    let token = repo::get_or_create_token(&state.pool, user.get_id())?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredDto {
            username: user.get_username(),
            email: user.get_email(),
            token,
        }),
    ))
}

/// Handler for logging in
///
/// This function handles POST requests to `/login/`. The `username` field
/// may hold an email address instead, recognised by its `@`.
///
/// ### Returns
///
/// The user's auth token, or 401 if the credentials do not match
#[instrument(skip(state, payload))]
pub async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginDto>, JsonRejection>,
) -> Result<Json<TokenDto>, ApiError> {
    let Json(payload) = payload?;
    let (identifier, password) = payload.validate()?;

    let user = match &identifier {
        LoginIdentifier::Email(email) => repo::find_user_by_email(&state.pool, email)?,
        LoginIdentifier::Username(username) => repo::find_user_by_username(&state.pool, username)?,
    };

    let Some(user) = user else {
        debug!("Login for unknown account");
        verify_dummy_password_blocking(password).await;
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password_blocking(password, user.get_password_hash().to_string()).await? {
        warn!(user_id = user.get_id(), "Login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = repo::get_or_create_token(&state.pool, user.get_id())?;

    info!(user_id = user.get_id(), "User logged in");
    Ok(Json(TokenDto { token }))
}

/// Handler for logging out
///
/// This function handles POST requests to `/logout/`. The caller's token is
/// deleted, so every later request with it is rejected.
#[instrument(skip(state, current), fields(user_id = current.user.get_id()))]
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<MessageDto>, ApiError> {
    repo::delete_token(&state.pool, &current.token)?;

    info!("User logged out");
    Ok(Json(MessageDto::new(LOGOUT_MESSAGE)))
}

/// Handler for requesting a password reset
///
/// This function handles POST requests to `/password_reset/`. When the email
/// belongs to an account, a reset token is issued through the configured
/// notifier. The response is the same either way.
#[instrument(skip(state, payload))]
pub async fn password_reset_request_handler(
    State(state): State<AppState>,
    payload: Result<Json<PasswordResetRequestDto>, JsonRejection>,
) -> Result<Json<MessageDto>, ApiError> {
    let Json(payload) = payload?;
    let email = payload.validate()?;

    match repo::find_user_by_email(&state.pool, &email)? {
        Some(user) => {
            let token = generate_reset_token();
            let expires_at = Utc::now()
                .checked_add_signed(state.reset_token_ttl)
                .ok_or_else(|| anyhow::anyhow!("Reset token expiry out of range"))?;
            repo::store_reset_token(&state.pool, user.get_id(), &digest_reset_token(&token), expires_at)?;

            if let Err(e) = state.notifier.send_reset_token(&user, &token) {
                error!(user_id = user.get_id(), "Failed to deliver reset token: {:#}", e);
            } else {
                info!(user_id = user.get_id(), "Issued password reset token");
            }
        }
        None => debug!("Password reset requested for unknown email"),
    }

    Ok(Json(MessageDto::new(RESET_REQUESTED_MESSAGE)))
}

/// Handler for completing a password reset
///
/// This function handles POST requests to `/password_reset/confirm/`.
///
/// ### Returns
///
/// A confirmation message, or 400 if the token is wrong or expired or the
/// new password is unacceptable
#[instrument(skip(state, payload))]
pub async fn password_reset_confirm_handler(
    State(state): State<AppState>,
    payload: Result<Json<PasswordResetConfirmDto>, JsonRejection>,
) -> Result<Json<MessageDto>, ApiError> {
    let Json(payload) = payload?;
    let reset = payload.validate()?;

    let digest = digest_reset_token(&reset.token);
    let user = repo::find_user_by_email(&state.pool, &reset.email)?
        .filter(|user| user.reset_token_matches(&digest, Utc::now()))
        .ok_or_else(|| {
            warn!("Password reset with invalid or expired token");
            ApiError::field("token", INVALID_RESET_TOKEN)
        })?;

    let problems = password_problems(&reset.new_password, Some(user.get_username().as_str()), None);
    if !problems.is_empty() {
        let mut errors = FieldErrors::new();
        errors.insert("new_password".to_string(), problems);
        return Err(ApiError::Validation(errors));
    }

    let password_hash = hash_password_blocking(reset.new_password).await?;
    if !repo::complete_password_reset(&state.pool, user.get_id(), &digest, Utc::now(), &password_hash)? {
        warn!(user_id = user.get_id(), "Reset token was used or replaced during confirmation");
        return Err(ApiError::field("token", INVALID_RESET_TOKEN));
    }

    Ok(Json(MessageDto::new(RESET_DONE_MESSAGE)))
}
