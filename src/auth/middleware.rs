use actix_web::{dev::Payload, http::header::Header, web::Data, FromRequest, HttpMessage, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future::LocalBoxFuture;
use log::warn;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    app::{AppError, AppState},
    database::models::User,
};

const NO_TOKEN: &str = "Not authorized - no token provided";
const USER_NOT_FOUND: &str = "Not authorized - user not found";
const ADMIN_ONLY: &str = "Access denied - admin only";

/// The authenticated user bound to a request. Carries no password.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for Caller {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

/// A caller that passed [`admin_only`].
#[derive(Debug, Clone)]
pub struct AdminCaller(pub Caller);

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    Authorization::<Bearer>::parse(req)
        .map(|auth| auth.into_scheme().token().to_string())
        .map_err(|_| AppError::Unauthenticated(String::from(NO_TOKEN)))
}

/// Resolves the bearer token of `req` to a user and binds it to the request.
///
/// A caller already bound to the request is returned as is, so several
/// extractors on one handler verify the token only once.
pub async fn protect(req: &HttpRequest) -> Result<Caller, AppError> {
    if let Some(caller) = req.extensions().get::<Caller>() {
        return Ok(caller.clone());
    }

    let token = bearer_token(req)?;
    let app_state = req
        .app_data::<Data<AppState>>()
        .ok_or_else(|| AppError::Internal(String::from("application state not configured")))?;

    let claims = app_state.authenticator.verify(&token).map_err(|err| {
        warn!("rejected bearer token on {}: {err}", req.path());
        err
    })?;
    let user_id = claims.sub;
    let user = app_state
        .run(move |store| store.find_user_by_id(user_id))
        .await?
        .ok_or_else(|| {
            warn!("token subject {user_id} does not exist");
            AppError::Unauthenticated(String::from(USER_NOT_FOUND))
        })?;

    let caller = Caller::from(user);
    req.extensions_mut().insert(caller.clone());

    Ok(caller)
}

pub fn admin_only(caller: Option<&Caller>) -> Result<(), AppError> {
    match caller {
        Some(caller) if caller.is_admin => Ok(()),
        _ => Err(AppError::Forbidden(String::from(ADMIN_ONLY))),
    }
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { protect(&req).await })
    }
}

impl FromRequest for AdminCaller {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let caller = protect(&req).await?;
            admin_only(Some(&caller))?;
            Ok(AdminCaller(caller))
        })
    }
}
