//! Domain entities mirrored from the upstream evaluation service.
//!
//! All entities are transient: they are rebuilt on every pipeline run and
//! never persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(rename = "postId")]
    pub post_id: i64,
    pub content: String,
}

/// A user annotated with the derived post count, produced by the ranking
/// pipeline. The count reflects whatever state the upstream had when each
/// per-user fetch returned; no transaction spans the fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedUser {
    pub id: String,
    pub name: String,
    pub post_count: u64,
}
