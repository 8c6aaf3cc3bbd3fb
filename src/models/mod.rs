pub mod analytics;
pub mod engagement;
pub mod portfolio;
pub mod session;
pub mod settings;
