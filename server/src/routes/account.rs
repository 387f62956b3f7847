use axum::{
    extract::{Form, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use color_eyre::eyre::WrapErr;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{self, AuthError, AuthUser, OptionalUser};
use crate::components::layout::Page;
use crate::cookies::CookieJar;
use crate::errors::{ServerResult, WithRedirect};
use crate::flash::FlashJar;
use crate::state::AppState;
use crate::static_assets::{profile_pic_url, store_profile_picture};
use crate::user::User;

/// Registration page - displays the sign-up form
pub async fn register_page(OptionalUser(user): OptionalUser, flash: FlashJar) -> Response {
    use crate::components::{
        form::{Form, InputField},
        layout::{Card, ContentSection},
        ui::{button::Button, heading::Heading},
    };
    use maud::Render;

    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let form = maud::html! {
        (Heading::h1("Join Quill").with_classes("text-center").render())
        p class="text-gray-600 mb-6 text-center" { "Create an account to start writing" }

        (Form::new("/register", "post", maud::html! {
            (InputField::new("username").label("Username").required(true).render())
            (InputField::new("email").label("Email").input_type("email").required(true).render())
            (InputField::new("password").label("Password").input_type("password").required(true).render())
            (InputField::new("confirm_password").label("Confirm Password").input_type("password").required(true).render())
            (Button::primary("Sign Up").full_width(true).render())
        }).render())

        div class="mt-6 pt-4 border-t border-gray-200 text-center text-sm text-gray-600" {
            "Already have an account? "
            a href="/login" class="text-indigo-600 hover:text-indigo-800" { "Log in" }
        }
    };

    let content = Card::new(ContentSection::new(form)).with_max_width("max-w-md");
    Page::new("Register - Quill".to_string(), Box::new(content))
        .with_flashes(flash.take())
        .into_response()
}

#[derive(Deserialize)]
pub struct RegisterForm {
    username: String,
    email: String,
    password: String,
    confirm_password: String,
}

/// Create a new account. Success leads to the login page; it does not log
/// the new user in.
pub async fn register(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: FlashJar,
    Form(form): Form<RegisterForm>,
) -> ServerResult<Response, StatusCode> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    if form.password != form.confirm_password {
        flash.danger("Passwords do not match.");
        return Ok(Redirect::to("/register").into_response());
    }

    match auth::register(&state.db, &form.username, &form.email, &form.password).await {
        Ok(_) => {
            flash.success("Your account has been created, you can now log in.");
            Ok(Redirect::to("/login").into_response())
        }
        Err(AuthError::DuplicateKey) => {
            flash.danger("That username or email is already taken.");
            Ok(Redirect::to("/register").into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Deserialize)]
pub struct NextParams {
    next: Option<String>,
}

/// Login page - displays the login form
pub async fn login_page(
    OptionalUser(user): OptionalUser,
    flash: FlashJar,
    Query(params): Query<NextParams>,
) -> Response {
    use crate::components::{
        form::{CheckboxField, Form, InputField},
        layout::{Card, ContentSection},
        ui::{button::Button, heading::Heading},
    };
    use maud::Render;

    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let form = maud::html! {
        (Heading::h1("Welcome back").with_classes("text-center").render())
        p class="text-gray-600 mb-6 text-center" { "Log in to your account" }

        (Form::new("/login", "post", maud::html! {
            (InputField::new("email").label("Email").input_type("email").required(true).render())
            (InputField::new("password").label("Password").input_type("password").required(true).render())
            (CheckboxField::new("remember", "Remember me").render())
            (InputField::new("next").value(params.next.as_deref().unwrap_or("")).hidden(true).render())
            (Button::primary("Log In").full_width(true).render())
        }).render())

        div class="mt-6 pt-4 border-t border-gray-200 text-center text-sm text-gray-600 space-y-2" {
            p {
                a href="/reset_password" class="text-indigo-600 hover:text-indigo-800" { "Forgot your password?" }
            }
            p {
                "Need an account? "
                a href="/register" class="text-indigo-600 hover:text-indigo-800" { "Sign up" }
            }
        }
    };

    let content = Card::new(ContentSection::new(form)).with_max_width("max-w-md");
    Page::new("Login - Quill".to_string(), Box::new(content))
        .with_flashes(flash.take())
        .into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
    remember: Option<String>,
    next: Option<String>,
}

/// Log a user in. On success the deferred `next` destination is honored for
/// local paths; a bad email and a bad password are indistinguishable in the
/// outcome.
pub async fn login(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    cookies: CookieJar,
    flash: FlashJar,
    Form(form): Form<LoginForm>,
) -> ServerResult<Response, StatusCode> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    match auth::authenticate(&state.db, &form.email, &form.password).await {
        Ok(user) => {
            auth::create_session_and_set_cookie(
                &state,
                &cookies,
                user.user_id,
                form.remember.is_some(),
            )
            .await?;

            // Only local paths; the login form is not an open redirect
            let dest = form
                .next
                .as_deref()
                .filter(|next| next.starts_with('/'))
                .unwrap_or("/");
            Ok(Redirect::to(dest).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            flash.danger("Login unsuccessful. Please check email and password.");
            let back = match form.next.as_deref() {
                Some(next) if next.starts_with('/') => {
                    format!("/login?next={}", urlencoding::encode(next))
                }
                _ => "/login".to_string(),
            };
            Ok(Redirect::to(&back).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// Logout route - clears the session and redirects to home
pub async fn logout(
    State(state): State<AppState>,
    cookies: CookieJar,
) -> ServerResult<impl IntoResponse, StatusCode> {
    auth::end_session(&state, &cookies)
        .await
        .wrap_err("Failed to end user session")?;

    info!("User logged out");
    Ok(Redirect::to("/"))
}

/// Account page - profile details and the update form
pub async fn account_page(AuthUser(user): AuthUser, flash: FlashJar) -> Page {
    use crate::components::{
        form::{Form, InputField},
        layout::{Card, ContentSection},
        ui::{button::Button, heading::Heading},
    };
    use maud::Render;

    let form = maud::html! {
        div class="flex items-center gap-4 mb-6" {
            img src=(profile_pic_url(&user.image_file))
                alt="Profile picture"
                class="w-24 h-24 rounded-full object-cover border border-gray-200";
            div {
                (Heading::h2(&user.username).render())
                p class="text-gray-500" { (user.email) }
            }
        }

        (Form::new("/account", "post", maud::html! {
            (InputField::new("username").label("Username").value(&user.username).required(true).render())
            (InputField::new("email").label("Email").input_type("email").value(&user.email).required(true).render())

            div class="mb-4" {
                label for="picture" class="block text-sm font-medium text-gray-700 mb-1" { "Profile Picture" }
                input type="file" name="picture" id="picture" accept=".png,.jpg,.jpeg"
                    class="block w-full text-sm text-gray-600";
            }

            (Button::primary("Update").render())
        }).multipart(true).render())
    };

    let content = Card::new(ContentSection::new(form)).with_max_width("max-w-lg");
    Page::new("Account - Quill".to_string(), Box::new(content))
        .with_user(Some(&user))
        .with_flashes(flash.take())
}

/// Update the profile. The picture is optional; when present it is resized
/// and stored before the row is touched.
pub async fn update_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: FlashJar,
    mut multipart: Multipart,
) -> ServerResult<Response, Redirect> {
    let mut username = user.username.clone();
    let mut email = user.email.clone();
    let mut picture: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .wrap_err("invalid multipart form")
        .with_redirect(Redirect::to("/account"))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("username") => {
                username = field
                    .text()
                    .await
                    .wrap_err("invalid username field")
                    .with_redirect(Redirect::to("/account"))?;
            }
            Some("email") => {
                email = field
                    .text()
                    .await
                    .wrap_err("invalid email field")
                    .with_redirect(Redirect::to("/account"))?;
            }
            Some("picture") => {
                let file_name = field.file_name().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .wrap_err("invalid picture field")
                    .with_redirect(Redirect::to("/account"))?;
                if let Some(name) = file_name {
                    // Browsers submit an empty part when no file was chosen
                    if !name.is_empty() && !data.is_empty() {
                        picture = Some((name, data.to_vec()));
                    }
                }
            }
            _ => {}
        }
    }

    let image_file = match picture {
        Some((original_name, data)) => {
            match store_profile_picture(&state.config.uploads_dir, &original_name, &data).await {
                Ok(filename) => Some(filename),
                Err(err) => {
                    warn!(error = ?err, "rejected profile picture upload");
                    flash.danger("That picture could not be processed. Use a PNG or JPEG.");
                    return Ok(Redirect::to("/account").into_response());
                }
            }
        }
        None => None,
    };

    match User::update_profile(
        &state.db,
        user.user_id,
        &username,
        &email,
        image_file.as_deref(),
    )
    .await
    {
        Ok(()) => {
            flash.success("Your account has been updated.");
            Ok(Redirect::to("/account").into_response())
        }
        Err(AuthError::DuplicateKey) => {
            flash.danger("That username or email is already taken.");
            Ok(Redirect::to("/account").into_response())
        }
        Err(err) => Err(err).with_redirect(Redirect::to("/account")),
    }
}

/// Reset request page - asks for the account email
pub async fn reset_request_page(OptionalUser(user): OptionalUser, flash: FlashJar) -> Response {
    use crate::components::{
        form::{Form, InputField},
        layout::{Card, ContentSection},
        ui::{button::Button, heading::Heading},
    };
    use maud::Render;

    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let form = maud::html! {
        (Heading::h1("Reset Password").with_classes("text-center").render())
        p class="text-gray-600 mb-6 text-center" {
            "Enter your email and we will send you a link to reset your password."
        }

        (Form::new("/reset_password", "post", maud::html! {
            (InputField::new("email").label("Email").input_type("email").required(true).render())
            (Button::primary("Request Password Reset").full_width(true).render())
        }).render())
    };

    let content = Card::new(ContentSection::new(form)).with_max_width("max-w-md");
    Page::new("Reset Password - Quill".to_string(), Box::new(content))
        .with_flashes(flash.take())
        .into_response()
}

#[derive(Deserialize)]
pub struct ResetRequestForm {
    email: String,
}

/// Kick off a password reset. The outcome looks the same whether or not the
/// email belongs to an account.
pub async fn reset_request(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: FlashJar,
    Form(form): Form<ResetRequestForm>,
) -> ServerResult<Response, StatusCode> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    auth::request_password_reset(
        &state.db,
        &state.tokens,
        state.mailer.as_ref(),
        &state.config.base_url,
        &form.email,
    )
    .await?;

    flash.info("An email has been sent with instructions to reset your password.");
    Ok(Redirect::to("/login").into_response())
}

/// Reset form behind an emailed token. The token is checked up front so a
/// stale link fails before the user types a new password.
pub async fn reset_token_page(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: FlashJar,
    Path(token): Path<String>,
) -> Response {
    use crate::components::{
        form::{Form, InputField},
        layout::{Card, ContentSection},
        ui::{button::Button, heading::Heading},
    };
    use maud::Render;

    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    if state.tokens.verify(&token).is_err() {
        flash.warning("That is an invalid or expired token.");
        return Redirect::to("/reset_password").into_response();
    }

    let form = maud::html! {
        (Heading::h1("Choose a new password").with_classes("text-center mb-6").render())

        (Form::new(&format!("/reset_password/{token}"), "post", maud::html! {
            (InputField::new("password").label("New Password").input_type("password").required(true).render())
            (InputField::new("confirm_password").label("Confirm Password").input_type("password").required(true).render())
            (Button::primary("Reset Password").full_width(true).render())
        }).render())
    };

    let content = Card::new(ContentSection::new(form)).with_max_width("max-w-md");
    Page::new("Reset Password - Quill".to_string(), Box::new(content))
        .with_flashes(flash.take())
        .into_response()
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    password: String,
    confirm_password: String,
}

/// Complete a password reset with a token from the emailed link.
pub async fn reset_token(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    flash: FlashJar,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> ServerResult<Response, StatusCode> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    if form.password != form.confirm_password {
        flash.danger("Passwords do not match.");
        return Ok(Redirect::to(&format!("/reset_password/{token}")).into_response());
    }

    match auth::complete_password_reset(&state.db, &state.tokens, &token, &form.password).await {
        Ok(_) => {
            flash.success("Your password has been updated! You are now able to log in.");
            Ok(Redirect::to("/login").into_response())
        }
        Err(AuthError::InvalidToken | AuthError::NotFound) => {
            flash.warning("That is an invalid or expired token.");
            Ok(Redirect::to("/reset_password").into_response())
        }
        Err(err) => Err(err.into()),
    }
}
