use std::sync::Arc;

use crate::application::directory::UserDirectory;
use crate::application::ranking::RankingService;
use crate::config::RankingSettings;
use crate::infra::upstream::EvaluationClient;

#[derive(Clone)]
pub struct ApiState {
    pub upstream: Arc<EvaluationClient>,
    pub directory: Arc<dyn UserDirectory>,
    pub ranking: Arc<RankingService>,
}

impl ApiState {
    pub fn new(upstream: Arc<EvaluationClient>, ranking: &RankingSettings) -> Self {
        let directory: Arc<dyn UserDirectory> = upstream.clone();
        let ranking_service = Arc::new(RankingService::new(
            directory.clone(),
            ranking.fan_out,
            ranking.leaderboard_size,
        ));

        Self {
            upstream,
            directory,
            ranking: ranking_service,
        }
    }
}
