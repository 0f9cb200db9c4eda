use bilagssamler_core::AssemblyConfig;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A finished bundle held for download.
pub struct BundleSession {
    /// The assembled PDF. `Bytes` so handing a copy to a response is cheap.
    pub bundle: Bytes,
    /// Suggested download filename.
    pub filename: String,
    pub page_count: usize,
    pub created_at: std::time::Instant,
}

/// Global application state
pub struct AppState {
    /// Finished bundles indexed by UUID
    sessions: RwLock<HashMap<Uuid, BundleSession>>,
    /// Assembly settings applied to every upload
    pub config: AssemblyConfig,
}

impl AppState {
    pub fn new(config: AssemblyConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Store a finished bundle, returning its session ID for URL embedding.
    pub async fn store_bundle(
        &self,
        bundle: Vec<u8>,
        filename: String,
        page_count: usize,
    ) -> String {
        let id = Uuid::new_v4();
        let session = BundleSession {
            bundle: Bytes::from(bundle),
            filename,
            page_count,
            created_at: std::time::Instant::now(),
        };
        self.sessions.write().await.insert(id, session);
        id.to_string()
    }

    /// Look up a bundle by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or the session expired.
    pub async fn get_bundle(&self, id: &str) -> Option<(Bytes, String, usize)> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        sessions
            .get(&uuid)
            .map(|s| (s.bundle.clone(), s.filename.clone(), s.page_count))
    }

    /// Drop bundles older than 1 hour.
    pub async fn cleanup_old_sessions(&self) {
        let mut sessions = self.sessions.write().await;
        let now = std::time::Instant::now();
        let max_age = std::time::Duration::from_secs(3600);

        sessions.retain(|_, session| now.duration_since(session.created_at) < max_age);
    }
}
