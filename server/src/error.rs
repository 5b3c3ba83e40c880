//! Aggregate HTTP error type: every downstream crate's error folds into one `{error, code,
//! details?}` envelope (spec §7), grounded on `ravituringworks-generic-ai-agent`'s
//! `ApiError`/`IntoResponse` pattern (`src/api.rs`).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Every error this server can return to a client, aggregated from the crates underneath it.
#[derive(Debug, Error)]
pub enum DocmindError {
    /// A request path/body failed a structural or semantic check before any downstream crate
    /// was even called (e.g. a malformed `doc_id`, an out-of-range `limit`).
    #[error("{0}")]
    BadRequest(String),
    /// The requested document does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    /// The requested page image does not exist or the filename failed the allow-list check
    /// (spec §6 `GET /images/{doc_id}/{filename}`).
    #[error("image not found: {0}")]
    ImageNotFound(String),
    /// Document parsing, embedding, or storage failed (spec §4.6).
    #[error(transparent)]
    Pipeline(#[from] docmind_pipeline::PipelineError),
    /// A research question could not be answered (spec §4.9).
    #[error(transparent)]
    Research(#[from] docmind_research::ResearchError),
    /// Retrieval failed outright (embedding or vector store error, outside a research call).
    #[error(transparent)]
    Retrieval(#[from] docmind_retrieval::RetrievalError),
    /// A direct vector store operation failed (e.g. `DELETE /documents/{doc_id}`).
    #[error(transparent)]
    VectorStore(#[from] docmind_vectorstore::VectorStoreError),
    /// The uploaded file exceeds the configured size limit.
    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),
    /// The uploaded file's extension is not one of the supported types.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    /// Reading the uploaded file's bytes from disk failed (spec §6 `POST /process`).
    #[error("upload failed: {0}")]
    UploadFailed(#[source] std::io::Error),
}

/// Stable machine-readable codes accompanying every error response (spec §7).
impl DocmindError {
    const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_DOC_ID",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::ImageNotFound(_) => "IMAGE_NOT_FOUND",
            Self::Pipeline(docmind_pipeline::PipelineError::QueueFull(_)) => "QUEUE_FULL",
            Self::Pipeline(_) | Self::Retrieval(_) | Self::VectorStore(_) => "DATABASE_ERROR",
            Self::Research(_) => "DATABASE_ERROR",
            Self::FileTooLarge(_) => "FILE_TOO_LARGE",
            Self::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            Self::UploadFailed(_) => "UPLOAD_FAILED",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            Self::DocumentNotFound(_) | Self::ImageNotFound(_) => StatusCode::NOT_FOUND,
            Self::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Pipeline(docmind_pipeline::PipelineError::QueueFull(_)) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Pipeline(_)
            | Self::Research(_)
            | Self::Retrieval(_)
            | Self::VectorStore(_)
            | Self::UploadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for DocmindError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let error = self.to_string();
        tracing::warn!(code, %error, "request failed");
        let body = ErrorBody {
            error,
            code,
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Result alias for request handlers.
pub type Result<T> = std::result::Result<T, DocmindError>;
