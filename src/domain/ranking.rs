//! Pure ranking over `(User, post_count)` pairs.

use crate::domain::entities::{RankedUser, User};

/// Rank users by post count, highest first, keeping at most `limit` entries.
///
/// The sort is stable: users with equal counts keep the order in which the
/// upstream enumerated them, which is the order of `counted`.
pub fn rank_users(counted: Vec<(User, u64)>, limit: usize) -> Vec<RankedUser> {
    let mut ranked: Vec<RankedUser> = counted
        .into_iter()
        .map(|(user, post_count)| RankedUser {
            id: user.id,
            name: user.name,
            post_count,
        })
        .collect();

    ranked.sort_by(|a, b| b.post_count.cmp(&a.post_count));
    ranked.truncate(limit);
    ranked
}
