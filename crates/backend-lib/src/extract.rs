// ============================
// santhe-backend-lib/src/extract.rs
// ============================
//! Extractors whose rejections use the service's error body.
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// Like [`axum::Json`], but a malformed or mistyped body becomes
/// [`AppError::Validation`] instead of axum's plain-text 4xx.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Like [`axum::extract::Path`], but an unparsable segment becomes
/// [`AppError::Validation`].
#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
