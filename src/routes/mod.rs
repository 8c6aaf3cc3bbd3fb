pub mod admin_api;
pub mod api;
