use maud::{html, Markup, Render};

use crate::flash::Flash;
use crate::static_assets::profile_pic_url;
use crate::user::User;

/// The fields the navigation bar needs from the signed-in user.
struct NavUser {
    username: String,
    image_file: String,
}

pub struct Page {
    pub title: String,
    pub content: Box<dyn Render>,
    flashes: Vec<Flash>,
    nav_user: Option<NavUser>,
}

impl Page {
    pub fn new(title: String, content: Box<dyn Render>) -> Self {
        Self {
            title,
            content,
            flashes: Vec::new(),
            nav_user: None,
        }
    }

    /// One-shot messages to render above the content.
    pub fn with_flashes(mut self, flashes: Vec<Flash>) -> Self {
        self.flashes = flashes;
        self
    }

    /// Who the navigation bar should treat as signed in.
    pub fn with_user(mut self, user: Option<&User>) -> Self {
        self.nav_user = user.map(|user| NavUser {
            username: user.username.clone(),
            image_file: user.image_file.clone(),
        });
        self
    }
}

impl Render for Page {
    fn render(&self) -> Markup {
        html! {
            head {
                title { (self.title) }
                script src="https://unpkg.com/@tailwindcss/browser@4" {}
                meta name="viewport" content="width=device-width, initial-scale=1.0";
            }

            div class="min-h-screen bg-gray-50" {
                nav class="bg-indigo-700 text-white shadow-md" {
                    div class="max-w-3xl mx-auto px-4 py-3 flex items-center justify-between" {
                        a href="/" class="text-xl font-semibold tracking-tight" { "Quill" }

                        div class="flex items-center gap-4 text-sm" {
                            a href="/" class="hover:text-indigo-200" { "Home" }
                            a href="/about" class="hover:text-indigo-200" { "About" }

                            @if let Some(user) = &self.nav_user {
                                a href="/post/new" class="hover:text-indigo-200" { "New Post" }
                                a href="/account" class="flex items-center gap-2 hover:text-indigo-200" {
                                    img src=(profile_pic_url(&user.image_file))
                                        alt="Profile picture"
                                        class="w-7 h-7 rounded-full object-cover border border-indigo-300";
                                    (user.username)
                                }
                                a href="/logout" class="hover:text-indigo-200" { "Logout" }
                            } @else {
                                a href="/login" class="hover:text-indigo-200" { "Login" }
                                a href="/register" class="hover:text-indigo-200" { "Register" }
                            }
                        }
                    }
                }

                main class="max-w-3xl mx-auto px-4 py-6" {
                    @for flash in &self.flashes {
                        div class={"border-l-4 rounded-md px-4 py-3 mb-4 " (flash.level.banner_classes())} {
                            (flash.message)
                        }
                    }

                    (self.content.render())
                }

                footer class="mt-8 pb-6 text-center text-sm text-gray-500" {
                    p { "Quill - a small place to write" }
                }
            }
        }
    }
}

impl axum::response::IntoResponse for Page {
    fn into_response(self) -> axum::response::Response {
        self.render().into_response()
    }
}

pub struct Card {
    pub content: Box<dyn Render>,
    pub max_width: Option<String>,
}

impl Card {
    pub fn new(content: impl Render + 'static) -> Self {
        Self {
            content: Box::new(content),
            max_width: None,
        }
    }

    pub fn with_max_width(mut self, max_width: &str) -> Self {
        self.max_width = Some(max_width.to_string());
        self
    }
}

impl Render for Card {
    fn render(&self) -> Markup {
        let width_class = self.max_width.as_deref().unwrap_or("max-w-md");

        html! {
            div class={(width_class) " mx-auto bg-white rounded-xl border border-gray-100 shadow-md overflow-hidden w-full"} {
                (self.content.render())
            }
        }
    }
}

pub struct ContentSection {
    pub padding: String,
    pub content: Box<dyn Render>,
}

impl ContentSection {
    pub fn new(content: impl Render + 'static) -> Self {
        Self {
            padding: "px-8 py-6".to_string(),
            content: Box::new(content),
        }
    }
}

impl Render for ContentSection {
    fn render(&self) -> Markup {
        html! {
            div class=(self.padding) {
                (self.content.render())
            }
        }
    }
}
