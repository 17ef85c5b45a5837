//! Server-side session store: opaque token -> user id.
//!
//! Sessions live in process memory. An entry is created at login (and
//! signup), consulted by the auth middleware on every protected request,
//! and removed at logout. Entries also expire after [`SESSION_TTL`]:
//! an expired token stops resolving, and each login sweeps out dead
//! entries so the map cannot grow without bound.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand_core::{OsRng, RngCore};
use uuid::Uuid;

pub const SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

struct Session {
    user_id: Uuid,
    created_at: Instant,
}

pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session for the user and hand back its opaque token.
    pub fn create(&self, user_id: Uuid) -> String {
        let mut buf = [0u8; 32];
        OsRng.fill_bytes(&mut buf);
        let token = hex::encode(buf);

        let mut sessions = self.lock();
        // Logins are rare enough that a linear sweep here is fine.
        sessions.retain(|_, session| session.created_at.elapsed() < self.ttl);
        sessions.insert(
            token.clone(),
            Session {
                user_id,
                created_at: Instant::now(),
            },
        );
        token
    }

    /// The user id behind a token, if the session is live and unexpired.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let mut sessions = self.lock();
        match sessions.get(token) {
            Some(session) if session.created_at.elapsed() < self.ttl => Some(session.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Close a session. Returns false when the token was unknown.
    pub fn revoke(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        // A poisoned map is still a valid map; keep serving.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
