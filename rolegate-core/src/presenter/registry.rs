// File: rolegate-core/src/presenter/registry.rs

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::pagination::{AdvanceRejected, Direction, Page, PresentationSession};

struct SessionEntry<C> {
    session: PresentationSession,
    context: C,
}

/// Live presentation sessions keyed by id. `C` is whatever the gateway needs
/// to reach the rendered message again (interaction token, scan metadata).
pub struct SessionRegistry<C> {
    sessions: DashMap<Uuid, SessionEntry<C>>,
}

impl<C> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

impl<C: Clone> SessionRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, session: PresentationSession, context: C) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, SessionEntry { session, context });
        id
    }

    pub fn current(&self, id: Uuid) -> Option<Page> {
        self.sessions.get(&id).map(|e| e.session.current())
    }

    /// An expired session is removed on the way out.
    pub fn advance(
        &self,
        id: Uuid,
        actor_id: u64,
        direction: Direction,
        now: DateTime<Utc>,
    ) -> Result<(Page, C), AdvanceRejected> {
        let result = {
            let mut entry = self.sessions.get_mut(&id).ok_or(AdvanceRejected::Unknown)?;
            entry
                .session
                .advance(actor_id, direction, now)
                .map(|page| (page, entry.context.clone()))
        };

        if matches!(result, Err(AdvanceRejected::Expired)) {
            self.sessions.remove(&id);
        }
        result
    }

    pub fn update_context(&self, id: Uuid, update: impl FnOnce(&mut C)) -> bool {
        match self.sessions.get_mut(&id) {
            Some(mut entry) => {
                update(&mut entry.context);
                true
            }
            None => false,
        }
    }

    /// Removes every expired session and hands back their contexts so the
    /// caller can disable the controls.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Vec<(Uuid, C)> {
        let expired: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|e| e.session.is_expired(now))
            .map(|e| *e.key())
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some((id, entry)) = self.sessions.remove(&id) {
                removed.push((id, entry.context));
            }
        }
        if !removed.is_empty() {
            debug!("Removed {} expired inventory sessions", removed.len());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
