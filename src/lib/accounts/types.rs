use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::lib::resources::types::{Team, TeamId};

pub type UserId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub current_team_id: Option<TeamId>,
}

impl User {
    /// The team the user is working in, falling back to their first team.
    pub fn current_team(&self) -> Option<&Team> {
        self.current_team_id
            .and_then(|id| self.teams.iter().find(|team| team.id == id))
            .or_else(|| self.teams.first())
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find(&self, id: UserId) -> Option<User>;
}
