use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// `CatchPanicLayer` hook: a panicking handler answers with the unknown tier
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!("Handler panicked: {}", details);
    ApiError::unknown(details).into_response()
}
