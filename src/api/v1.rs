pub mod articles;
pub mod comments;
pub mod health;
pub mod profiles;
pub mod tags;
pub mod users;

use crate::auth::{AuthError, Principal, StoreError, Tokens};
use bcrypt::BcryptError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request},
    response::{self, status::Custom, Responder},
    serde::json::Json,
    tokio::task::{self, JoinError},
    Catcher,
};
use serde::{Deserialize, Serialize};
use std::{error::Error, result::Result};
use validator::ValidationErrors;

#[derive(Debug, Serialize, Deserialize)]
pub struct Resp<T> {
    status: String,
    contents: T,
}

#[derive(Debug)]
pub struct ApiError(Custom<Json<Resp<String>>>);
impl ApiError {
    fn new(status: Status, contents: String) -> ApiError {
        ApiError(Custom(
            status,
            Json(Resp {
                status: "error".into(),
                contents,
            }),
        ))
    }

    fn internal(error: &dyn Error) -> ApiError {
        log::error!("{}", error);
        ApiError::new(
            Status::InternalServerError,
            String::from("Internal error"),
        )
    }

    pub fn unprocessable<S: Into<String>>(message: S) -> ApiError {
        ApiError::new(Status::UnprocessableEntity, message.into())
    }

    pub fn not_found() -> ApiError {
        ApiError::new(Status::NotFound, String::from("Not found"))
    }

    pub fn unauthorized() -> ApiError {
        ApiError::new(Status::Unauthorized, String::from("Unauthorized"))
    }

    pub fn status(&self) -> Status {
        self.0 .0
    }
}

/// Allow error handling with `?`. Missing rows are 404s and uniqueness
/// clashes are the caller's fault; everything else is a 500.
impl From<DieselError> for ApiError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::NotFound => ApiError::not_found(),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                log::debug!("Unique violation: {}", info.message());
                ApiError::unprocessable(match info.constraint_name() {
                    Some(constraint) if constraint.contains("email") => "email has already been taken",
                    Some(constraint) if constraint.contains("username") => "username has already been taken",
                    Some(constraint) if constraint.contains("slug") => "an article with this title already exists",
                    _ => "already exists",
                })
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, ref info) => {
                log::debug!("Check violation: {}", info.message());
                ApiError::unprocessable("request violates a data constraint")
            }
            e => ApiError::internal(&e),
        }
    }
}

impl From<BcryptError> for ApiError {
    fn from(error: BcryptError) -> Self {
        ApiError::internal(&error)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        if error.is_rejection() {
            log::debug!("Rejected token: {}", error);
            ApiError::unauthorized()
        } else {
            ApiError::internal(&error)
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(error: JoinError) -> Self {
        ApiError::internal(&error)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::unprocessable(describe(&errors))
    }
}

/// `field: problem` pairs, sorted by field.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, problems)| {
            let problems: Vec<String> = problems
                .iter()
                .map(|p| match &p.message {
                    Some(message) => message.to_string(),
                    None => p.code.to_string(),
                })
                .collect();
            format!("{}: {}", field, problems.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        self.0.respond_to(req)
    }
}

pub type JSONResp<T> = Result<Json<Resp<T>>, ApiError>;

pub fn ok_resp<T: Serialize>(x: T) -> JSONResp<T> {
    Ok(Json(Resp {
        status: "ok".into(),
        contents: x,
    }))
}

pub fn user_err_resp<U: Into<String>, T>(x: U) -> JSONResp<T> {
    Err(ApiError::unprocessable(x))
}

/// Signs a token off the async executor; the revocation store may block.
pub async fn issue(tokens: &Tokens, principal: Principal) -> Result<String, ApiError> {
    let tokens = tokens.clone();
    let token = task::spawn_blocking(move || tokens.issue(&principal)).await??;
    Ok(token)
}

/// `Token <jwt>` or `Bearer <jwt>`.
fn header_token(header: &str) -> Option<&str> {
    let mut parts = header.split_ascii_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") =>
        {
            Some(token)
        }
        _ => None,
    }
}

/// An authenticated caller. Take `Option<AuthUser>` where anonymous access
/// is allowed.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
    pub token: String,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.principal.id
    }
}

async fn authenticate(request: &Request<'_>) -> Result<AuthUser, AuthError> {
    let token = request
        .headers()
        .get_one("Authorization")
        .and_then(header_token)
        .ok_or(AuthError::Missing)?
        .to_owned();

    let tokens = match request.rocket().state::<Tokens>() {
        Some(tokens) => tokens.clone(),
        None => {
            log::error!("Token state is not managed");
            return Err(AuthError::Store(StoreError::Backend(
                "token state missing".into(),
            )));
        }
    };

    let presented = token.clone();
    let verified = task::spawn_blocking(move || tokens.validate(&presented))
        .await
        .map_err(|e| {
            log::error!("Token validation task failed: {}", e);
            AuthError::Store(StoreError::Backend(e.to_string()))
        })??;

    Ok(AuthUser {
        principal: verified.principal,
        token,
    })
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match authenticate(request).await {
            Ok(user) => Outcome::Success(user),
            Err(e) if e.is_rejection() => {
                log::debug!("Rejected token: {}", e);
                Outcome::Error((Status::Unauthorized, e))
            }
            Err(e) => {
                log::error!("{}", e);
                Outcome::Error((Status::InternalServerError, e))
            }
        }
    }
}

/// Optional authentication. A missing or rejected token means an anonymous
/// viewer; a failure to check the token is still a 500.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn viewer(&self) -> Option<i64> {
        self.0.as_ref().map(AuthUser::id)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for MaybeAuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match authenticate(request).await {
            Ok(user) => Outcome::Success(MaybeAuthUser(Some(user))),
            Err(e) if e.is_rejection() => {
                log::debug!("Treating request as anonymous: {}", e);
                Outcome::Success(MaybeAuthUser(None))
            }
            Err(e) => {
                log::error!("{}", e);
                Outcome::Error((Status::InternalServerError, e))
            }
        }
    }
}

#[catch(401)]
fn unauthorized() -> ApiError {
    ApiError::unauthorized()
}

#[catch(404)]
fn not_found() -> ApiError {
    ApiError::not_found()
}

#[catch(422)]
fn unprocessable() -> ApiError {
    ApiError::unprocessable("Malformed request body")
}

#[catch(500)]
fn internal() -> ApiError {
    ApiError::new(Status::InternalServerError, String::from("Internal error"))
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, not_found, unprocessable, internal]
}
