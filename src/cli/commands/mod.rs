pub mod auth;
pub mod browse;
pub mod list;
pub mod server;
pub mod url;
