use actix_web::{get, web::Data, HttpResponse};

use crate::{
    app::{AppError, AppState},
    auth::AdminCaller,
    blogs, users,
};

/// Pipe for the admin dashboard: every blog, unpaginated
/// - url: `{domain}/api/admin/blogs`
#[get("/api/admin/blogs")]
pub async fn get_all_blogs(
    _admin: AdminCaller,
    app_state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let all = app_state.run(|store| blogs::list_all(store)).await?;

    Ok(HttpResponse::Ok().json(all))
}

/// Pipe for the admin dashboard: every user without passwords
/// - url: `{domain}/api/admin/users`
#[get("/api/admin/users")]
pub async fn get_all_users(
    _admin: AdminCaller,
    app_state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let all = app_state.run(|store| users::list_all(store)).await?;

    Ok(HttpResponse::Ok().json(all))
}
