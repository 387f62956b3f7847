pub mod auth;
pub mod components;
pub mod cookies;
pub mod errors;
pub mod flash;
pub mod mail;
pub mod password;
pub mod posts;
pub mod routes;
pub mod state;
pub mod static_assets;
pub mod tokens;
pub mod user;
