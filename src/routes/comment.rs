use actix_web::{
    post,
    web::{Data, Json, Path},
    HttpResponse,
};

use crate::{
    app::{AppError, AppState},
    auth::Caller,
    blogs::{self, CommentDraft},
};

/// Pipe for commenting on a blog
/// - url: `{domain}/api/blogs/{blog_id}/comments`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`
/// ## body
/// ```
/// { "text": "comment text" }
/// ```
///
/// # Response
/// ## Created
/// ```
/// {
///     "_id": "ef7a71b8-53bf-4c01-a3ad-39c332adbb39",
///     "user": "e60a0f7b-381c-46b7-8736-1f204b329727",
///     "text": "comment text",
///     "createdAt": "2024-05-01T10:00:00Z"
/// }
/// ```
/// ## Error
/// - Bad request
/// - Unauthorized
/// - Not found
#[post("/api/blogs/{blog_id}/comments")]
pub async fn create_comment(
    caller: Caller,
    app_state: Data<AppState>,
    blog_id: Path<String>,
    body: Json<CommentDraft>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();
    let text = body.into_inner().text;
    let comment = app_state
        .run(move |store| blogs::add_comment(store, &blog_id, &caller, text))
        .await?;

    Ok(HttpResponse::Created().json(comment))
}
