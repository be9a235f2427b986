//! The top-users ranking pipeline: fetch, aggregate, rank.

use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::application::directory::{DirectoryError, UserDirectory};
use crate::domain::entities::{RankedUser, User};
use crate::domain::ranking::rank_users;

#[derive(Clone)]
pub struct RankingService {
    directory: Arc<dyn UserDirectory>,
    fan_out: usize,
    leaderboard_size: usize,
}

impl RankingService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        fan_out: NonZeroUsize,
        leaderboard_size: NonZeroUsize,
    ) -> Self {
        Self {
            directory,
            fan_out: fan_out.get(),
            leaderboard_size: leaderboard_size.get(),
        }
    }

    /// Produce the leaderboard: users ranked by post count, highest first.
    ///
    /// A failing user list aborts the run. A failing per-user post fetch is
    /// recovered locally: the user stays in the ranking with a count of
    /// zero, so one unreachable user cannot blank the whole leaderboard.
    pub async fn top_users(&self) -> Result<Vec<RankedUser>, DirectoryError> {
        let users = self.directory.list_users().await?;
        let total = users.len();

        // `buffered` (not `buffer_unordered`) keeps the upstream enumeration
        // order, which is the tie-break order for equal counts.
        let counted: Vec<(User, u64)> = futures::stream::iter(users)
            .map(|user| self.count_posts(user))
            .buffered(self.fan_out)
            .collect()
            .await;

        debug!(
            target = "pulseboard::ranking",
            users = total,
            kept = self.leaderboard_size.min(total),
            "ranking computed"
        );

        Ok(rank_users(counted, self.leaderboard_size))
    }

    async fn count_posts(&self, user: User) -> (User, u64) {
        match self.directory.list_posts(&user.id).await {
            Ok(posts) => {
                let count = posts.len() as u64;
                (user, count)
            }
            Err(err) => {
                warn!(
                    target = "pulseboard::ranking",
                    user_id = %user.id,
                    error = %err,
                    "post fetch failed, counting zero posts"
                );
                (user, 0)
            }
        }
    }
}
