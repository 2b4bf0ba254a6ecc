/// Account Routes
///
/// Registration, login, token refresh, logout, password change, current user
/// and avatar replacement under `/api/v1/users`.

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, AuthenticatedUser, Credentials, Registration, TokenPair};
use crate::cookies::{cleared_session_cookies, session_cookies, REFRESH_TOKEN_COOKIE};
use crate::error::{AppError, ErrorContext};
use crate::response::ApiResponse;
use crate::upload::{MultipartForm, UploadLimit};
use crate::user::PublicUser;

/// User login request; either identifier may be used
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token refresh request, used when the refresh cookie is absent
#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token", rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "old_password", rename = "oldPassword")]
    pub old_password: Option<String>,
    #[serde(alias = "new_password", rename = "newPassword")]
    pub new_password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct Empty {}

fn with_session_cookies(status: StatusCode, tokens: &TokenPair) -> HttpResponseBuilder {
    let mut builder = HttpResponse::build(status);
    for cookie in session_cookies(tokens) {
        builder.cookie(cookie);
    }
    builder
}

/// POST /api/v1/users/register
///
/// Multipart form with `fullName`, `email`, `username`, `password`, an
/// `avatar` file and an optional `coverImage` file.
///
/// # Errors
/// - 400: Missing or blank field, malformed email, missing avatar
/// - 409: Username or email already registered
/// - 500: Avatar upload or database failure
pub async fn register(
    payload: Multipart,
    service: web::Data<AuthService>,
    limit: web::Data<UploadLimit>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");
    let form = MultipartForm::read(payload, limit.0).await?;

    let user = service
        .register(Registration {
            full_name: form.text("fullName"),
            email: form.text("email"),
            username: form.text("username"),
            password: form.text("password"),
            avatar: form.file_path("avatar").map(|p| p.to_path_buf()),
            cover_image: form.file_path("coverImage").map(|p| p.to_path_buf()),
        })
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(ApiResponse::new(
        StatusCode::CREATED,
        user,
        "User registered successfully",
    )))
}

/// POST /api/v1/users/login
///
/// Returns both tokens in the body and as HTTP-only cookies.
///
/// # Errors
/// - 400: Neither username nor email, or no password
/// - 404: No such user
/// - 401: Wrong password
pub async fn login(
    body: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let body = body.into_inner();

    let outcome = service
        .login(Credentials {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %outcome.user.id,
        "User logged in successfully"
    );

    Ok(with_session_cookies(StatusCode::OK, &outcome.tokens).json(ApiResponse::new(
        StatusCode::OK,
        LoginResponse {
            user: outcome.user,
            access_token: outcome.tokens.access_token,
            refresh_token: outcome.tokens.refresh_token,
        },
        "User logged in successfully",
    )))
}

/// POST /api/v1/users/logout (guarded)
pub async fn logout(
    user: web::ReqData<AuthenticatedUser>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedUser(user) = user.into_inner();
    let context = ErrorContext::new("user_logout").with_user_id(user.id.to_string());

    service.logout(user.id).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        "User logged out"
    );

    let mut builder = HttpResponse::Ok();
    for cookie in cleared_session_cookies() {
        builder.cookie(cookie);
    }
    Ok(builder.json(ApiResponse::new(StatusCode::OK, Empty {}, "User logged out")))
}

/// POST /api/v1/users/refresh-token
///
/// Takes the refresh token from the `refreshToken` cookie, falling back to
/// the JSON body. Rotates the stored token.
///
/// # Errors
/// - 401: Missing, invalid or already rotated refresh token
pub async fn refresh_token(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let incoming = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token));

    let tokens = service.refresh(incoming.as_deref()).await?;

    tracing::info!(request_id = %context.request_id, "Access token refreshed");

    Ok(with_session_cookies(StatusCode::OK, &tokens).json(ApiResponse::new(
        StatusCode::OK,
        tokens.clone(),
        "Access token refreshed",
    )))
}

/// POST /api/v1/users/change-password (guarded)
///
/// # Errors
/// - 400: Blank old or new password
/// - 401: Old password does not match
pub async fn change_password(
    user: web::ReqData<AuthenticatedUser>,
    body: web::Json<ChangePasswordRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedUser(user) = user.into_inner();
    let context = ErrorContext::new("change_password").with_user_id(user.id.to_string());

    service
        .change_password(
            user.id,
            body.old_password.as_deref(),
            body.new_password.as_deref(),
        )
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        "Password changed"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        Empty {},
        "Password changed successfully",
    )))
}

/// GET /api/v1/users/current-user (guarded)
pub async fn current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    let AuthenticatedUser(user) = user.into_inner();
    HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        user,
        "Current user fetched successfully",
    ))
}

/// PATCH /api/v1/users/avatar (guarded)
///
/// Multipart form with a single `avatar` file.
pub async fn update_avatar(
    user: web::ReqData<AuthenticatedUser>,
    payload: Multipart,
    service: web::Data<AuthService>,
    limit: web::Data<UploadLimit>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedUser(user) = user.into_inner();
    let context = ErrorContext::new("update_avatar").with_user_id(user.id.to_string());
    let form = MultipartForm::read(payload, limit.0).await?;

    let updated = service
        .update_avatar(user.id, form.file_path("avatar"))
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        "Avatar updated"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        StatusCode::OK,
        updated,
        "Avatar updated successfully",
    )))
}
