use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::{User, UserDirectory, UserId};

#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        MemoryUserDirectory {
            users: RwLock::new(users.into_iter().map(|user| (user.id, user)).collect()),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find(&self, id: UserId) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::resources::types::Team;

    fn team(id: u64) -> Team {
        Team {
            id,
            name: format!("team-{id}"),
        }
    }

    #[tokio::test]
    async fn resolves_current_team() {
        let directory = MemoryUserDirectory::new(vec![User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            teams: vec![team(10), team(11)],
            current_team_id: Some(11),
        }]);

        let user = directory.find(1).await.unwrap();
        assert_eq!(user.current_team().map(|t| t.id), Some(11));
        assert!(directory.find(2).await.is_none());
    }

    #[test]
    fn falls_back_to_first_team() {
        let mut user = User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            teams: vec![team(10), team(11)],
            current_team_id: Some(99),
        };
        assert_eq!(user.current_team().map(|t| t.id), Some(10));

        user.teams.clear();
        assert!(user.current_team().is_none());
    }
}
