use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use color_eyre::eyre::eyre;
use serde::Deserialize;

use crate::auth::{AuthUser, OptionalUser};
use crate::components::layout::Page;
use crate::errors::{ServerResult, WithStatus};
use crate::flash::FlashJar;
use crate::posts::Post;
use crate::state::AppState;
use crate::static_assets::profile_pic_url;
use crate::user::User;

#[derive(Deserialize)]
pub struct PostForm {
    title: String,
    content: String,
}

fn post_form_page(
    legend: &str,
    action: &str,
    post: Option<&Post>,
    user: &User,
    flash: FlashJar,
) -> Page {
    use crate::components::{
        form::{Form, InputField, TextAreaField},
        layout::{Card, ContentSection},
        ui::{button::Button, heading::Heading},
    };
    use maud::Render;

    let form = maud::html! {
        (Heading::h1(legend).render())

        div class="mt-4" {
            (Form::new(action, "post", maud::html! {
                (InputField::new("title")
                    .label("Title")
                    .value(post.map(|p| p.title.as_str()).unwrap_or(""))
                    .required(true)
                    .render())
                (TextAreaField::new("content")
                    .label("Content")
                    .value(post.map(|p| p.content.as_str()).unwrap_or(""))
                    .required(true)
                    .render())
                (Button::primary(legend).render())
            }).render())
        }
    };

    Page::new(
        format!("{legend} - Quill"),
        Box::new(Card::new(ContentSection::new(form)).with_max_width("max-w-2xl")),
    )
    .with_user(Some(user))
    .with_flashes(flash.take())
}

/// Form for writing a new post
pub async fn new_post_page(AuthUser(user): AuthUser, flash: FlashJar) -> Page {
    post_form_page("New Post", "/post/new", None, &user, flash)
}

/// Create a post owned by the current user
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: FlashJar,
    Form(form): Form<PostForm>,
) -> ServerResult<Response, StatusCode> {
    Post::create(&state.db, user.user_id, &form.title, &form.content).await?;

    flash.success("Your post has been created!");
    Ok(Redirect::to("/").into_response())
}

/// A single post, with edit controls for its author
pub async fn post_page(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: FlashJar,
    Path(post_id): Path<i64>,
) -> ServerResult<Page, StatusCode> {
    use crate::components::ui::button::Button;
    use maud::Render;

    let post = Post::get_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| eyre!("post {post_id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;
    let author = User::get_by_id(&state.db, post.user_id).await?;

    let is_author = user
        .as_ref()
        .map(|u| u.user_id == post.user_id)
        .unwrap_or(false);

    let content = maud::html! {
        article class="bg-white rounded-xl border border-gray-100 shadow-sm p-6" {
            div class="flex items-center gap-3 mb-4" {
                @if let Some(author) = &author {
                    img src=(profile_pic_url(&author.image_file))
                        alt=""
                        class="w-10 h-10 rounded-full object-cover";
                    div {
                        span class="font-medium text-gray-800" { (author.username) }
                        p class="text-xs text-gray-500" { (post.date_posted.format("%B %d, %Y")) }
                    }
                }
            }

            h1 class="text-2xl font-bold text-gray-900" { (post.title) }
            p class="mt-4 text-gray-700 whitespace-pre-line" { (post.content) }

            @if is_author {
                div class="mt-6 pt-4 border-t border-gray-100 flex gap-3" {
                    (Button::secondary("Update").href(&format!("/post/{post_id}/update")).render())
                    form action=(format!("/post/{post_id}/delete")) method="post" {
                        (Button::danger("Delete").render())
                    }
                }
            }
        }
    };

    Ok(Page::new(format!("{} - Quill", post.title), Box::new(content))
        .with_user(user.as_ref())
        .with_flashes(flash.take()))
}

/// Form for editing an existing post; only the author gets this far.
pub async fn edit_post_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: FlashJar,
    Path(post_id): Path<i64>,
) -> ServerResult<Page, StatusCode> {
    let post = Post::get_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| eyre!("post {post_id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    if post.user_id != user.user_id {
        return Err(eyre!(
            "user {} cannot edit post {post_id}",
            user.user_id
        ))
        .with_status(StatusCode::FORBIDDEN);
    }

    Ok(post_form_page(
        "Update Post",
        &format!("/post/{post_id}/update"),
        Some(&post),
        &user,
        flash,
    ))
}

/// Update a post; only the author may.
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: FlashJar,
    Path(post_id): Path<i64>,
    Form(form): Form<PostForm>,
) -> ServerResult<Response, StatusCode> {
    let post = Post::get_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| eyre!("post {post_id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    if post.user_id != user.user_id {
        return Err(eyre!(
            "user {} cannot edit post {post_id}",
            user.user_id
        ))
        .with_status(StatusCode::FORBIDDEN);
    }

    Post::update(&state.db, post_id, &form.title, &form.content).await?;

    flash.success("Your post has been updated!");
    Ok(Redirect::to(&format!("/post/{post_id}")).into_response())
}

/// Delete a post; only the author may.
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: FlashJar,
    Path(post_id): Path<i64>,
) -> ServerResult<Response, StatusCode> {
    let post = Post::get_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| eyre!("post {post_id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    if post.user_id != user.user_id {
        return Err(eyre!(
            "user {} cannot delete post {post_id}",
            user.user_id
        ))
        .with_status(StatusCode::FORBIDDEN);
    }

    Post::delete(&state.db, post_id).await?;

    flash.success("Your post has been deleted!");
    Ok(Redirect::to("/").into_response())
}
