use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path, Query},
    HttpResponse,
};
use serde_json::json;

use crate::{
    app::{AppError, AppState},
    auth::{AdminCaller, Caller},
    blogs::{self, BlogDraft, ListQuery},
};

/// Pipe for listing blogs, five per page, newest first
/// - url: `{domain}/api/blogs?page=1&category=Tech&search=rust`
///
/// # HTTP request requirements
/// - every query parameter is optional
///
/// # Response
/// ## Ok
/// ```
/// { "blogs": [ … ], "totalPages": 3 }
/// ```
#[get("/api/blogs")]
pub async fn list_blogs(
    app_state: Data<AppState>,
    query: Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let page = app_state.run(move |store| blogs::list(store, &query)).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Pipe for creating a new blog
/// - url: `{domain}/api/blogs`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`
/// ## body
/// - json with `title` (at least 3 characters) and `content`,
///   optionally `category` and `image`
///
/// # Response
/// ## Created
/// - the new blog with its author joined
/// ## Error
/// - Bad request
/// - Unauthorized
#[post("/api/blogs")]
pub async fn create_blog(
    caller: Caller,
    app_state: Data<AppState>,
    body: Json<BlogDraft>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner();
    let blog = app_state
        .run(move |store| blogs::create(store, &caller, draft))
        .await?;

    Ok(HttpResponse::Created().json(blog))
}

#[get("/api/blogs/{blog_id}")]
pub async fn get_blog(
    app_state: Data<AppState>,
    blog_id: Path<String>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();
    let blog = app_state
        .run(move |store| blogs::get_by_id(store, &blog_id))
        .await?;

    Ok(HttpResponse::Ok().json(blog))
}

/// Pipe for editing a blog; only its author or an admin may do it
/// - url: `{domain}/api/blogs/{blog_id}`
///
/// # HTTP request requirements
/// ## header
/// - `Authorization: Bearer <token>`
/// ## body
/// - json with any of `title`, `content`, `category`, `image`;
///   omitted or empty fields keep their value
///
/// # Response
/// ## Ok
/// - the edited blog
/// ## Error
/// - Unauthorized
/// - Forbidden
/// - Not found
/// - Bad request
#[put("/api/blogs/{blog_id}")]
pub async fn update_blog(
    caller: Caller,
    app_state: Data<AppState>,
    blog_id: Path<String>,
    body: Json<BlogDraft>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();
    let draft = body.into_inner();
    let blog = app_state
        .run(move |store| blogs::update(store, &blog_id, &caller, draft))
        .await?;

    Ok(HttpResponse::Ok().json(blog))
}

#[delete("/api/blogs/{blog_id}")]
pub async fn delete_blog(
    caller: Caller,
    app_state: Data<AppState>,
    blog_id: Path<String>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();
    app_state
        .run(move |store| blogs::delete(store, &blog_id, &caller))
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Blog deleted successfully" })))
}

/// Pipe for liking or unliking a blog: if the caller hasn't liked it yet it
/// becomes liked, otherwise the like is removed
/// - url: `{domain}/api/blogs/{blog_id}/like`
///
/// # Response
/// ## Ok
/// ```
/// { "liked": true, "likeCount": 1 }
/// ```
#[put("/api/blogs/{blog_id}/like")]
pub async fn like_blog(
    caller: Caller,
    app_state: Data<AppState>,
    blog_id: Path<String>,
) -> Result<HttpResponse, AppError> {
    let blog_id = blog_id.into_inner();
    let state = app_state
        .run(move |store| blogs::toggle_like(store, &blog_id, &caller))
        .await?;

    Ok(HttpResponse::Ok().json(state))
}

#[get("/api/blogs/admin/all")]
pub async fn list_all_blogs(
    _admin: AdminCaller,
    app_state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let all = app_state.run(|store| blogs::list_all(store)).await?;

    Ok(HttpResponse::Ok().json(all))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::header,
        test::{self, call_service},
        App,
    };
    use serde_json::Value;

    use super::*;
    use crate::{
        auth::password::hash_password,
        database::models::{NewUser, User},
    };

    fn seed_user(app_state: &AppState, email: &str, is_admin: bool) -> (User, String) {
        let user = app_state
            .store
            .insert_user(NewUser::new("Tester", email, hash_password("test_password123").unwrap(), is_admin))
            .unwrap();
        let token = app_state.authenticator.issue(user.id).unwrap();
        (user, token)
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    fn create_req(token: &str, title: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/blogs")
            .insert_header(bearer(token))
            .set_json(json!({ "title": title, "content": "<p>x</p>" }))
    }

    #[actix_rt::test]
    async fn test_blog_create_requires_token() {
        let app_state = AppState::in_memory();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(crate::routes::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/blogs")
            .set_json(json!({ "title": "Hi There", "content": "<p>x</p>" }))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status().as_u16(), 401);

        let req = test::TestRequest::post()
            .uri("/api/blogs")
            .insert_header(bearer("forged.token.value"))
            .set_json(json!({ "title": "Hi There", "content": "<p>x</p>" }))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status().as_u16(), 401);

        pretty_assertions::assert_eq!(
            app_state.store.count_blogs(&Default::default()).unwrap(),
            0
        );
    }

    #[actix_rt::test]
    async fn test_blog_create_like_scenario() {
        let app_state = AppState::in_memory();
        let (author, author_token) = seed_user(&app_state, "a@blog.dev", false);
        let (_, reader_token) = seed_user(&app_state, "b@blog.dev", false);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(crate::routes::configure),
        )
        .await;

        let resp = call_service(&app, create_req(&author_token, "Hi There").to_request()).await;
        pretty_assertions::assert_eq!(resp.status().as_u16(), 201);
        let blog: Value = test::read_body_json(resp).await;
        let uri = format!("/api/blogs/{}", blog["_id"].as_str().unwrap());

        let req = test::TestRequest::get().uri(&uri).to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        pretty_assertions::assert_eq!(fetched["author"]["_id"], author.id.to_string());
        pretty_assertions::assert_eq!(fetched["author"]["email"], "a@blog.dev");
        pretty_assertions::assert_eq!(fetched["likes"], json!([]));
        pretty_assertions::assert_eq!(fetched["comments"], json!([]));

        let req = test::TestRequest::put()
            .uri(&format!("{uri}/like"))
            .insert_header(bearer(&reader_token))
            .to_request();
        let liked: Value = test::call_and_read_body_json(&app, req).await;
        pretty_assertions::assert_eq!(liked, json!({ "liked": true, "likeCount": 1 }));

        let req = test::TestRequest::put()
            .uri(&format!("{uri}/like"))
            .insert_header(bearer(&reader_token))
            .to_request();
        let unliked: Value = test::call_and_read_body_json(&app, req).await;
        pretty_assertions::assert_eq!(unliked, json!({ "liked": false, "likeCount": 0 }));
    }

    #[actix_rt::test]
    async fn test_blog_list_pages() {
        let app_state = AppState::in_memory();
        let (_, token) = seed_user(&app_state, "a@blog.dev", false);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(crate::routes::configure),
        )
        .await;

        for i in 0..12 {
            let title = if i % 3 == 0 { format!("Foo post {i}") } else { format!("Other post {i}") };
            call_service(&app, create_req(&token, &title).to_request()).await;
        }

        let req = test::TestRequest::get().uri("/api/blogs?page=1").to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        pretty_assertions::assert_eq!(page["blogs"].as_array().unwrap().len(), 5);
        pretty_assertions::assert_eq!(page["totalPages"], 3);

        let req = test::TestRequest::get().uri("/api/blogs?search=FOO").to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        let titles: Vec<&str> = page["blogs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|blog| blog["title"].as_str().unwrap())
            .collect();
        pretty_assertions::assert_eq!(titles.len(), 4);
        assert!(titles.iter().all(|title| title.starts_with("Foo")));
        pretty_assertions::assert_eq!(page["totalPages"], 1);
    }

    #[actix_rt::test]
    async fn test_blog_edit_and_delete_rules() {
        let app_state = AppState::in_memory();
        let (_, author_token) = seed_user(&app_state, "a@blog.dev", false);
        let (_, stranger_token) = seed_user(&app_state, "b@blog.dev", false);
        let (_, admin_token) = seed_user(&app_state, "root@blog.dev", true);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(crate::routes::configure),
        )
        .await;

        let blog: Value =
            test::call_and_read_body_json(&app, create_req(&author_token, "Test title").to_request()).await;
        let uri = format!("/api/blogs/{}", blog["_id"].as_str().unwrap());

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&stranger_token))
            .set_json(json!({ "title": "edited test title" }))
            .to_request();
        pretty_assertions::assert_eq!(call_service(&app, req).await.status().as_u16(), 403);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&author_token))
            .set_json(json!({ "title": "edited test title", "content": "edited test body" }))
            .to_request();
        let edited: Value = test::call_and_read_body_json(&app, req).await;
        pretty_assertions::assert_eq!(edited["title"], "edited test title");
        pretty_assertions::assert_eq!(edited["content"], "edited test body");
        pretty_assertions::assert_eq!(edited["author"], blog["author"]);

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&stranger_token))
            .to_request();
        pretty_assertions::assert_eq!(call_service(&app, req).await.status().as_u16(), 403);

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&admin_token))
            .to_request();
        let resp = call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        pretty_assertions::assert_eq!(body["message"], "Blog deleted successfully");

        let req = test::TestRequest::get().uri(&uri).to_request();
        pretty_assertions::assert_eq!(call_service(&app, req).await.status().as_u16(), 404);
    }

    #[actix_rt::test]
    async fn test_admin_all_requires_admin() {
        let app_state = AppState::in_memory();
        let (_, user_token) = seed_user(&app_state, "a@blog.dev", false);
        let (_, admin_token) = seed_user(&app_state, "root@blog.dev", true);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(app_state.clone()))
                .configure(crate::routes::configure),
        )
        .await;

        for i in 0..7 {
            call_service(&app, create_req(&user_token, &format!("Post number {i}")).to_request()).await;
        }

        let req = test::TestRequest::get()
            .uri("/api/blogs/admin/all")
            .insert_header(bearer(&user_token))
            .to_request();
        pretty_assertions::assert_eq!(call_service(&app, req).await.status().as_u16(), 403);

        let req = test::TestRequest::get()
            .uri("/api/blogs/admin/all")
            .insert_header(bearer(&admin_token))
            .to_request();
        let all: Value = test::call_and_read_body_json(&app, req).await;
        pretty_assertions::assert_eq!(all.as_array().unwrap().len(), 7);
    }
}
