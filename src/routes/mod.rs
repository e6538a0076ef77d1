pub mod admin;
pub mod auth;
pub mod blog;
pub mod comment;

use actix_cors::Cors;
use actix_web::{error, web, HttpRequest};

use crate::app::AppError;

fn payload_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid request body: {err}")).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid query string: {err}")).into()
}

const CORS_MAX_AGE: usize = 3600;

/// CORS layer for the SPA. With no configured origins every origin is allowed.
pub fn cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }

    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .max_age(CORS_MAX_AGE)
}

/// Registers every route of the API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(payload_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(auth::index)
        //Auth routes
        .service(auth::register)
        .service(auth::login)
        //Blog routes
        .service(blog::list_all_blogs)
        .service(blog::list_blogs)
        .service(blog::create_blog)
        .service(blog::get_blog)
        .service(blog::update_blog)
        .service(blog::delete_blog)
        .service(blog::like_blog)
        //Comment routes
        .service(comment::create_comment)
        //Admin routes
        .service(admin::get_all_blogs)
        .service(admin::get_all_users);
}
