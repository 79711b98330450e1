use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

use super::types::GuardScope;
use crate::lib::activity::types::OperationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GuardKey {
    Operation(OperationId),
    WatcherKind,
}

/// Remembers which completions have already been dispatched.
#[derive(Debug, Default)]
pub struct DispatchGuard {
    scope: GuardScope,
    claimed: Mutex<HashSet<GuardKey>>,
}

impl DispatchGuard {
    pub fn new(scope: GuardScope) -> Self {
        DispatchGuard {
            scope,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    fn key(&self, id: OperationId) -> GuardKey {
        match self.scope {
            GuardScope::PerOperation => GuardKey::Operation(id),
            GuardScope::PerWatcherKind => GuardKey::WatcherKind,
        }
    }

    /// Returns true for exactly one caller per key; check and set happen
    /// under the same lock.
    pub fn claim(&self, id: OperationId) -> bool {
        let key = self.key(id);
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    #[cfg(test)]
    pub fn is_claimed(&self, id: OperationId) -> bool {
        let key = self.key(id);
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }
}
