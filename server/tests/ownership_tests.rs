mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use quill::auth;
use quill::mail::LogMailer;
use quill::posts::Post;
use quill::state::{AppState, Config};
use quill::tokens::DEFAULT_RESET_TOKEN_MAX_AGE;

use common::test_pool;

/// A full router over an in-memory database, plus the state so tests can
/// reach the store directly.
async fn test_app() -> (Router, AppState) {
    let pool = test_pool().await;

    let state = AppState::new(
        pool,
        b"ownership test secret",
        DEFAULT_RESET_TOKEN_MAX_AGE,
        Arc::new(LogMailer),
        Config {
            base_url: "http://localhost:3000".to_string(),
            port: 3000,
            uploads_dir: std::env::temp_dir(),
        },
    );

    (quill::routes::routes(state.clone()), state)
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request build failed")
}

fn form_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request build failed")
}

/// Drive the login handler and hand back the session cookie it set.
async fn login(router: &Router, email: &str, password: &str) -> String {
    let body = format!(
        "email={}&password={}",
        urlencoding::encode(email),
        urlencoding::encode(password)
    );
    let response = router
        .clone()
        .oneshot(form_request("/login", None, &body))
        .await
        .expect("login request failed");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("quill_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_owned)
        .expect("login set no session cookie")
}

#[tokio::test]
async fn only_the_author_may_update_or_delete_a_post() {
    let (router, state) = test_app().await;

    auth::register(&state.db, "alice", "alice@example.com", "password-a")
        .await
        .expect("registering alice failed");
    auth::register(&state.db, "mallory", "mallory@example.com", "password-b")
        .await
        .expect("registering mallory failed");

    let alice = login(&router, "alice@example.com", "password-a").await;
    let mallory = login(&router, "mallory@example.com", "password-b").await;

    // Alice writes a post through the handler
    let response = router
        .clone()
        .oneshot(form_request(
            "/post/new",
            Some(&alice),
            "title=mine&content=hello",
        ))
        .await
        .expect("create request failed");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let post_id = Post::recent_page(&state.db, 1).await.unwrap().posts[0]
        .post
        .post_id;

    // Mallory cannot load the edit form...
    let response = router
        .clone()
        .oneshot(get_request(
            &format!("/post/{post_id}/update"),
            Some(&mallory),
        ))
        .await
        .expect("edit page request failed");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // ...nor submit an update...
    let response = router
        .clone()
        .oneshot(form_request(
            &format!("/post/{post_id}/update"),
            Some(&mallory),
            "title=stolen&content=rewritten",
        ))
        .await
        .expect("update request failed");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // ...nor delete it
    let response = router
        .clone()
        .oneshot(form_request(
            &format!("/post/{post_id}/delete"),
            Some(&mallory),
            "",
        ))
        .await
        .expect("delete request failed");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The post is untouched
    let post = Post::get_by_id(&state.db, post_id)
        .await
        .unwrap()
        .expect("post vanished");
    assert_eq!(post.title, "mine");

    // The author still can
    let response = router
        .clone()
        .oneshot(form_request(
            &format!("/post/{post_id}/update"),
            Some(&alice),
            "title=updated&content=hello",
        ))
        .await
        .expect("author update request failed");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let post = Post::get_by_id(&state.db, post_id)
        .await
        .unwrap()
        .expect("post vanished");
    assert_eq!(post.title, "updated");

    let response = router
        .clone()
        .oneshot(form_request(
            &format!("/post/{post_id}/delete"),
            Some(&alice),
            "",
        ))
        .await
        .expect("author delete request failed");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(Post::get_by_id(&state.db, post_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn anonymous_writers_are_sent_to_login() {
    let (router, _state) = test_app().await;

    let response = router
        .clone()
        .oneshot(get_request("/post/new", None))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("redirect carries no location");
    assert!(location.starts_with("/login?next="));
}

#[tokio::test]
async fn missing_posts_are_not_found() {
    let (router, _state) = test_app().await;

    let response = router
        .clone()
        .oneshot(get_request("/post/4242", None))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
