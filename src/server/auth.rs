//! Registration, token issue and bearer-token middleware.

use crate::auth::UserRecord;
use crate::server::error::ApiError;
use crate::server::AppContext;
use axum::{
    body::Body,
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::Request,
    middleware::Next,
    response::Response,
    Extension, Form, Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeader,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Form-encoded login, as OAuth2 password-flow clients send it.
#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(ctx): State<AppContext>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let auth = ctx.auth.clone();
    let record = tokio::task::spawn_blocking(move || {
        auth.register(&payload.username, &payload.password, &payload.email)
    })
    .await??;

    Ok(Json(MessageResponse {
        message: format!("User {} registered successfully", record.username),
    }))
}

pub async fn token(
    State(ctx): State<AppContext>,
    payload: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Json<crate::auth::AccessToken>, ApiError> {
    let Form(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let auth = ctx.auth.clone();
    let token =
        tokio::task::spawn_blocking(move || auth.login(&payload.username, &payload.password))
            .await??;
    Ok(Json(token))
}

pub async fn users_me(Extension(user): Extension<UserRecord>) -> Json<UserRecord> {
    Json(user)
}

/// Resolve the bearer token to a user and attach it to the request.
pub async fn require_auth(
    State(ctx): State<AppContext>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ApiError::unauthorized());
    };

    let user = ctx.auth.authenticate(bearer.token())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
