pub mod config;
pub mod fanout;
pub mod i18n;
pub mod models;
pub mod resources;
pub mod response;
pub mod routing;
pub mod server;
pub mod store;
pub mod translation;
