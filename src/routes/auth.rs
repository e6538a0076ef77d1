use actix_web::{
    get, post,
    web::{Data, Json},
    HttpResponse,
};

use crate::{
    app::{AppError, AppState},
    users::{self, Credentials, Registration},
};

#[get("/")]
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().body("API is running...")
}

/// Pipe for creating an user
/// - url: `{domain}/api/auth/register`
///
/// # HTTP request requirements
/// ## body
/// - json containing `name`, `email` and `password` keys
/// - `password` must be at least 6 characters long
///
/// # Response
/// ## Created
/// ```
/// { "_id": "…", "name": "Ana", "email": "ana@blog.dev", "isAdmin": false, "token": "eyJ…" }
/// ```
/// ## Error
/// - Bad request
#[post("/api/auth/register")]
pub async fn register(
    app_state: Data<AppState>,
    body: Json<Registration>,
) -> Result<HttpResponse, AppError> {
    let registration = body.into_inner();
    let authenticator = app_state.authenticator.clone();

    let session = app_state
        .run(move |store| users::register(store, &authenticator, registration))
        .await?;

    Ok(HttpResponse::Created().json(session))
}

/// Pipe for logging in as user
/// - url: `{domain}/api/auth/login`
///
/// # HTTP request requirements
/// ## body
/// - json containing `email` and `password` keys
///
/// # Response
/// ## Ok
/// - the same session document as register
/// ## Error
/// - Unauthorized
#[post("/api/auth/login")]
pub async fn login(
    app_state: Data<AppState>,
    body: Json<Credentials>,
) -> Result<HttpResponse, AppError> {
    let credentials = body.into_inner();
    let authenticator = app_state.authenticator.clone();

    let session = app_state
        .run(move |store| users::login(store, &authenticator, credentials))
        .await?;

    Ok(HttpResponse::Ok().json(session))
}
