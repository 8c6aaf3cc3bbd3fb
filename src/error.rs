use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Item already exists: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("Upload failed: {0}")]
    Upload(String),
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::NotFound(_) => Status::NotFound,
            AppError::Conflict(_) => Status::Conflict,
            AppError::Validation(_) => Status::BadRequest,
            AppError::StoreUnavailable(_) => Status::ServiceUnavailable,
            AppError::Unauthorized => Status::Unauthorized,
            AppError::RateLimited => Status::TooManyRequests,
            AppError::Upload(_) => Status::BadGateway,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        match self {
            AppError::StoreUnavailable(_) | AppError::Upload(_) => {
                log::warn!("{} {} failed: {}", req.method(), req.uri().path(), self)
            }
            _ => log::debug!("{} {} rejected: {}", req.method(), req.uri().path(), self),
        }
        let body = Json(json!({ "error": self.to_string() }));
        response::Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
