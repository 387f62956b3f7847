use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use crate::auth::OptionalUser;
use crate::components::layout::Page;
use crate::errors::ServerResult;
use crate::flash::FlashJar;
use crate::posts::Post;
use crate::state::AppState;
use crate::static_assets::profile_pic_url;

pub mod account;
pub mod posts;

/// Build the application router with all routes
pub fn routes(app_state: AppState) -> axum::Router {
    axum::Router::new()
        // Public pages
        .route("/", get(home_page))
        .route("/about", get(about_page))
        // Account flows
        .route(
            "/register",
            get(account::register_page).post(account::register),
        )
        .route("/login", get(account::login_page).post(account::login))
        .route("/logout", get(account::logout))
        .route(
            "/account",
            get(account::account_page).post(account::update_account),
        )
        .route(
            "/reset_password",
            get(account::reset_request_page).post(account::reset_request),
        )
        .route(
            "/reset_password/:token",
            get(account::reset_token_page).post(account::reset_token),
        )
        // Posts
        .route(
            "/post/new",
            get(posts::new_post_page).post(posts::create_post),
        )
        .route("/post/:post_id", get(posts::post_page))
        .route(
            "/post/:post_id/update",
            get(posts::edit_post_page).post(posts::update_post),
        )
        .route("/post/:post_id/delete", post(posts::delete_post))
        // Static files route
        .route(
            "/static/*path",
            get(crate::static_assets::serve_static_file),
        )
        // Add trace layer for debugging
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_cookies::CookieManagerLayer::new())
        .with_state(app_state)
}

#[derive(Deserialize)]
struct HomeParams {
    page: Option<i64>,
}

/// Home page: the paginated feed, newest posts first.
async fn home_page(
    OptionalUser(user): OptionalUser,
    flash: FlashJar,
    State(state): State<AppState>,
    Query(params): Query<HomeParams>,
) -> ServerResult<Page, StatusCode> {
    let feed = Post::recent_page(&state.db, params.page.unwrap_or(1)).await?;

    let content = maud::html! {
        @for entry in &feed.posts {
            article class="bg-white rounded-xl border border-gray-100 shadow-sm p-6 mb-4" {
                div class="flex items-center gap-3 mb-3" {
                    img src=(profile_pic_url(&entry.author_image))
                        alt=""
                        class="w-10 h-10 rounded-full object-cover";
                    div {
                        span class="font-medium text-gray-800" { (entry.author_username) }
                        p class="text-xs text-gray-500" { (entry.post.date_posted.format("%B %d, %Y")) }
                    }
                }

                h2 class="text-xl font-semibold" {
                    a href=(format!("/post/{}", entry.post.post_id))
                        class="text-indigo-700 hover:text-indigo-900" {
                        (entry.post.title)
                    }
                }
                p class="mt-2 text-gray-700 whitespace-pre-line" { (entry.post.content) }
            }
        }

        @if feed.posts.is_empty() {
            div class="text-center text-gray-500 py-12" {
                "Nothing here yet. Be the first to write something."
            }
        }

        @if feed.total_pages > 1 {
            nav class="flex items-center justify-center gap-4 mt-6 text-sm" {
                @if feed.has_prev() {
                    a href=(format!("/?page={}", feed.page - 1)) class="text-indigo-600 hover:underline" { "Newer" }
                }
                span class="text-gray-500" { "Page " (feed.page) " of " (feed.total_pages) }
                @if feed.has_next() {
                    a href=(format!("/?page={}", feed.page + 1)) class="text-indigo-600 hover:underline" { "Older" }
                }
            }
        }
    };

    Ok(Page::new("Quill".to_string(), Box::new(content))
        .with_user(user.as_ref())
        .with_flashes(flash.take()))
}

/// About page handler
async fn about_page(OptionalUser(user): OptionalUser, flash: FlashJar) -> Page {
    use crate::components::{
        layout::{Card, ContentSection},
        ui::heading::Heading,
    };
    use maud::Render;

    let content = maud::html! {
        (ContentSection::new(maud::html! {
            (Heading::h1("About Quill")
                .with_color("text-indigo-700")
                .render())

            div class="mt-6 space-y-4 text-gray-700" {
                p class="leading-relaxed" {
                    "Quill is a small, unhurried place to write. No feeds tuned "
                    "for outrage, no follower counts. Just posts, in the order "
                    "they were written."
                }
                p class="leading-relaxed" {
                    "Make an account, pick a picture, and start writing. "
                    "Everything you publish shows up on the front page for "
                    "anyone to read."
                }
            }
        }).render())
    };

    Page::new(
        "About - Quill".to_string(),
        Box::new(Card::new(content).with_max_width("max-w-2xl")),
    )
    .with_user(user.as_ref())
    .with_flashes(flash.take())
}
