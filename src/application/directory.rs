//! Collaborator traits describing the authenticated upstream adapter.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{Comment, Post, User};

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The token endpoint was unreachable or returned no usable token.
    /// Fatal to any subsequent authenticated call.
    #[error("authentication failed: {detail}")]
    Auth {
        status: Option<u16>,
        detail: String,
        payload: Option<serde_json::Value>,
    },
    /// A proxied call timed out or returned an error status. The upstream
    /// status and payload are carried so callers can relay them verbatim.
    #[error("upstream unavailable: {detail}")]
    Unavailable {
        status: Option<u16>,
        detail: String,
        payload: Option<serde_json::Value>,
    },
    /// The upstream answered with a shape the schema layer does not accept.
    #[error("malformed upstream response: {context}")]
    Malformed { context: String },
}

impl DirectoryError {
    pub fn auth(detail: impl Into<String>) -> Self {
        Self::Auth {
            status: None,
            detail: detail.into(),
            payload: None,
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::Unavailable {
            status: None,
            detail: detail.into(),
            payload: None,
        }
    }

    pub fn malformed(context: impl Into<String>) -> Self {
        Self::Malformed {
            context: context.into(),
        }
    }

    /// Upstream status to mirror when relaying this failure, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Unavailable { status, .. } => *status,
            Self::Malformed { .. } => None,
        }
    }
}

/// Read access to the upstream user/post/comment directory.
///
/// Implementations attach whatever authentication the upstream requires;
/// callers never see credentials. All three operations are idempotent and
/// side-effect-free from the caller's perspective.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every known user, in the upstream's enumeration order.
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError>;

    /// Every post by the given user; empty when the user has none.
    async fn list_posts(&self, user_id: &str) -> Result<Vec<Post>, DirectoryError>;

    /// Every comment on the given post; empty when the post has none.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DirectoryError>;
}
