//! Validation of upstream response shapes into typed entities.
//!
//! The upstream is known to answer `GET /users` either as
//! `{ "users": { "<id>": "<name>", ... } }` or as the bare map. Posts and
//! comments arrive under `posts` / `comments` keys. Anything else is a
//! `Malformed` failure rather than a silent coercion.

use serde_json::Value;

use crate::application::directory::DirectoryError;
use crate::domain::entities::{Comment, Post, User};

/// Normalize a `/users` body. Map iteration preserves the document order,
/// which downstream ranking uses as the tie-break order.
pub fn users_from_value(value: Value) -> Result<Vec<User>, DirectoryError> {
    let object = value
        .as_object()
        .ok_or_else(|| DirectoryError::malformed("users response is not a JSON object"))?;

    let map = match object.get("users") {
        Some(nested) => nested
            .as_object()
            .ok_or_else(|| DirectoryError::malformed("`users` field is not a JSON object"))?,
        None => object,
    };

    let mut users = Vec::with_capacity(map.len());
    for (id, name) in map {
        let name = name.as_str().ok_or_else(|| {
            DirectoryError::malformed(format!("user `{id}` has a non-string name"))
        })?;
        users.push(User {
            id: id.clone(),
            name: name.to_string(),
        });
    }
    Ok(users)
}

/// Normalize a `/users/{id}/posts` body. An absent `posts` key means the
/// user has no posts; it is not an error.
pub fn posts_from_value(value: Value) -> Result<Vec<Post>, DirectoryError> {
    entries_from_value(value, "posts")
}

/// Normalize a `/posts/{id}/comments` body.
pub fn comments_from_value(value: Value) -> Result<Vec<Comment>, DirectoryError> {
    entries_from_value(value, "comments")
}

fn entries_from_value<T: serde::de::DeserializeOwned>(
    value: Value,
    key: &str,
) -> Result<Vec<T>, DirectoryError> {
    let object = value
        .as_object()
        .ok_or_else(|| DirectoryError::malformed(format!("{key} response is not a JSON object")))?;

    let entries = match object.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(entries) => entries,
    };

    serde_json::from_value(entries.clone())
        .map_err(|err| DirectoryError::malformed(format!("`{key}` field failed to parse: {err}")))
}
