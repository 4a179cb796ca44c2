//! Per-datacenter session cache and authorization handshake.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use crate::error::TransportError;
use crate::transport::{BlobTransport, TransportSession};
use crate::types::DatacenterId;

/// Tuning for session handshakes and chunk reads.
#[derive(Debug, Clone, TypedBuilder)]
pub struct SessionConfig {
    /// How many authorization imports to attempt before giving up.
    #[builder(default = 6)]
    pub max_import_attempts: usize,
    /// Pause between rejected imports.
    #[builder(default = Duration::from_millis(100))]
    pub import_retry_delay: Duration,
    /// Upper bound for a single chunk fetch.
    #[builder(default = Duration::from_secs(60))]
    pub chunk_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

type SessionCell = Arc<OnceCell<Arc<dyn TransportSession>>>;

/// Owns one authorized session per datacenter for the life of the process.
///
/// Concurrent callers needing the same datacenter share a single handshake:
/// the first caller runs it while the others await the same cell. A failed
/// handshake leaves the cell empty, so a later request starts a new one.
pub struct SessionManager {
    transport: Arc<dyn BlobTransport>,
    config: SessionConfig,
    sessions: Mutex<HashMap<DatacenterId, SessionCell>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("home_datacenter", &self.transport.home_datacenter())
            .field("config", &self.config)
            .field("sessions", &self.sessions.lock().len())
            .finish()
    }
}

impl SessionManager {
    /// Create a manager over `transport`.
    pub fn new(transport: Arc<dyn BlobTransport>, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn BlobTransport> {
        &self.transport
    }

    /// The manager's configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of datacenters with an established session.
    #[must_use]
    pub fn established_sessions(&self) -> usize {
        self.sessions
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    /// Return the session for `datacenter`, creating it on first use.
    pub async fn session(
        &self,
        datacenter: DatacenterId,
    ) -> Result<Arc<dyn TransportSession>, TransportError> {
        let cell = Arc::clone(self.sessions.lock().entry(datacenter).or_default());

        cell.get_or_try_init(|| self.establish(datacenter))
            .await
            .map(Arc::clone)
    }

    async fn establish(
        &self,
        datacenter: DatacenterId,
    ) -> Result<Arc<dyn TransportSession>, TransportError> {
        if datacenter == self.transport.home_datacenter() {
            info!(datacenter, "Opening home datacenter session");
            return self.transport.connect_home().await;
        }

        info!(datacenter, "Opening foreign datacenter session");
        let session = self.transport.connect(datacenter).await?;
        match self.import_authorization(session.as_ref(), datacenter).await {
            Ok(()) => Ok(session),
            Err(err) => {
                session.stop().await;
                Err(err)
            }
        }
    }

    async fn import_authorization(
        &self,
        session: &dyn TransportSession,
        datacenter: DatacenterId,
    ) -> Result<(), TransportError> {
        let attempts = self.config.max_import_attempts;

        for attempt in 1..=attempts {
            let exported = self.transport.export_authorization(datacenter).await?;
            match session.import_authorization(exported).await {
                Ok(()) => {
                    debug!(datacenter, attempt, "Authorization imported");
                    return Ok(());
                }
                Err(TransportError::AuthBytesInvalid) => {
                    warn!(datacenter, attempt, "Authorization bytes rejected, retrying");
                    if attempt < attempts && !self.config.import_retry_delay.is_zero() {
                        tokio::time::sleep(self.config.import_retry_delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(TransportError::HandshakeExhausted {
            datacenter,
            attempts,
        })
    }
}
