use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as SessionLock;

use super::controller::FunnelController;
use super::upstream::JsonGateway;

/// One funnel session: the equivalent of a single browser tab. Nothing here
/// outlives the process.
pub struct FunnelSession<G> {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub controller: FunnelController<G>,
}

type SessionHandle<G> = Arc<SessionLock<FunnelSession<G>>>;

/// In-memory registry of live sessions.
///
/// The outer mutex only guards the map; each session has its own async lock
/// so a slow upstream call never blocks unrelated sessions.
pub struct SessionStore<G> {
    sessions: Mutex<HashMap<u64, SessionHandle<G>>>,
    next_id: AtomicU64,
}

impl<G: JsonGateway> SessionStore<G> {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn create(&self, controller: FunnelController<G>) -> SessionHandle<G> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(SessionLock::new(FunnelSession {
            id,
            created_at: Utc::now(),
            controller,
        }));
        self.map().insert(id, session.clone());
        session
    }

    pub fn get(&self, id: u64) -> Option<SessionHandle<G>> {
        self.map().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<u64, SessionHandle<G>>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<G: JsonGateway> Default for SessionStore<G> {
    fn default() -> Self {
        Self::new()
    }
}
