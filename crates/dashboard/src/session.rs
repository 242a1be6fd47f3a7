//! Per-user sessions.
//!
//! A session holds the user's state slices and the task set owning every
//! timeline started on their behalf. Tearing a session down aborts them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::Duration;

use call_simulator::{
    ActivationSimulator, CallSimulator, Notifications, PendingWrite, SimulationTiming, TaskSet,
    UploadSimulator,
};
use profile_store::{
    load_snapshot, AgentConfig, AgentField, BusinessField, BusinessProfile, ProfileStore,
};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, Result};

/// Local copy of the two forms.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormMirror {
    /// Profile row id, once one exists.
    pub business_id: Option<String>,
    pub business: BusinessProfile,
    pub agent: AgentConfig,
}

/// Everything shown for one user.
pub struct Session {
    pub user_id: String,
    pub forms: Mutex<FormMirror>,
    pub uploads: UploadSimulator,
    pub activation: ActivationSimulator,
    pub calls: CallSimulator,
    pub notifications: Arc<Notifications>,
    store: Arc<dyn ProfileStore>,
    tasks: Arc<TaskSet>,
    last_seen: StdMutex<Instant>,
}

impl Session {
    /// Hydrate a session from the store.
    pub async fn load(
        store: Arc<dyn ProfileStore>,
        timing: SimulationTiming,
        user_id: &str,
    ) -> Result<Self> {
        let snapshot = load_snapshot(store.as_ref(), user_id)
            .await
            .map_err(DashboardError::StoreRead)?;

        let notifications = Arc::new(Notifications::new());
        let tasks = Arc::new(TaskSet::new());
        let calls = CallSimulator::new(timing);

        let uploads = UploadSimulator::new(
            store.clone(),
            notifications.clone(),
            timing,
            tasks.clone(),
            snapshot.document,
        );
        let activation = ActivationSimulator::new(
            store.clone(),
            notifications.clone(),
            timing,
            tasks.clone(),
            calls.clone(),
            snapshot.activation,
        );

        Ok(Self {
            user_id: user_id.to_string(),
            forms: Mutex::new(FormMirror {
                business_id: snapshot.business_id,
                business: snapshot.business,
                agent: snapshot.agent,
            }),
            uploads,
            activation,
            calls,
            notifications,
            store,
            tasks,
            last_seen: StdMutex::new(Instant::now()),
        })
    }

    /// Mark the session as used now.
    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Time since the session was last used.
    pub fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    pub fn store(&self) -> &dyn ProfileStore {
        self.store.as_ref()
    }

    /// Abort every timeline. Returns how many were running.
    pub fn shutdown(&self) -> usize {
        self.tasks.shutdown()
    }

    /// The profile id, creating an empty profile when the user has none yet.
    pub async fn business_id(&self) -> Result<String> {
        if let Some(id) = self.forms.lock().await.business_id.clone() {
            return Ok(id);
        }

        let record = self
            .store
            .ensure_business_profile(&self.user_id)
            .await
            .map_err(|err| DashboardError::RemoteWriteFailed {
                retryable: err.is_transient(),
                message: err.to_string(),
                notification: None,
            })?;

        self.forms.lock().await.business_id = Some(record.id.clone());
        Ok(record.id)
    }

    /// Apply a business field locally, then upsert it.
    pub async fn set_business_field(&self, field: BusinessField, value: &str) -> Result<FormMirror> {
        {
            let mut forms = self.forms.lock().await;
            field.apply(&mut forms.business, value);
        }

        let write = PendingWrite::BusinessField {
            user_id: self.user_id.clone(),
            field,
            value: value.to_string(),
        };

        match self
            .store
            .upsert_business_field(&self.user_id, field, value)
            .await
        {
            Ok(record) => {
                debug!(user_id = %self.user_id, column = field.column_name(), "Business field saved");
                self.notifications.supersede(&write);
                let mut forms = self.forms.lock().await;
                forms.business_id = Some(record.id);
                Ok(forms.clone())
            }
            Err(err) => Err(self.write_failed(write, err)),
        }
    }

    /// Check and apply an agent field locally, then upsert it.
    pub async fn set_agent_field(&self, field: AgentField, value: &str) -> Result<FormMirror> {
        let value = field.normalize(value)?;
        let business_id = self.business_id().await?;

        {
            let mut forms = self.forms.lock().await;
            field.apply(&mut forms.agent, &value)?;
        }

        match self
            .store
            .upsert_agent_field(&business_id, field, &value)
            .await
        {
            Ok(_) => {
                debug!(business_id = %business_id, column = field.column_name(), "Agent field saved");
                self.notifications.supersede(&PendingWrite::AgentField {
                    business_id,
                    field,
                    value,
                });
                Ok(self.forms.lock().await.clone())
            }
            Err(err) => Err(self.write_failed(
                PendingWrite::AgentField {
                    business_id,
                    field,
                    value,
                },
                err,
            )),
        }
    }

    fn write_failed(&self, write: PendingWrite, err: profile_store::StoreError) -> DashboardError {
        warn!(user_id = %self.user_id, error = %err, "Form write failed");
        let id = self.notifications.write_failed(write, &err);
        DashboardError::RemoteWriteFailed {
            retryable: err.is_transient(),
            message: err.to_string(),
            notification: Some(id),
        }
    }
}

/// Sessions unused for this long are dropped by the sweeper.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Live sessions keyed by user id.
pub struct SessionRegistry {
    store: Arc<dyn ProfileStore>,
    timing: SimulationTiming,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn ProfileStore>, timing: SimulationTiming) -> Self {
        Self {
            store,
            timing,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Evict sessions after `idle_timeout` without a request.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// The user's session, loading it from the store on first use.
    pub async fn get_or_load(&self, user_id: &str) -> Result<Arc<Session>> {
        if let Some(session) = self.sessions.read().await.get(user_id) {
            session.touch();
            return Ok(session.clone());
        }

        let loaded = Session::load(self.store.clone(), self.timing, user_id).await?;

        let mut sessions = self.sessions.write().await;
        // Another request may have loaded it meanwhile; keep the first.
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                info!(user_id, "Session loaded");
                Arc::new(loaded)
            })
            .clone();
        Ok(session)
    }

    /// Drop a user's session, aborting its timelines. Returns how many were aborted.
    pub async fn teardown(&self, user_id: &str) -> usize {
        let Some(session) = self.sessions.write().await.remove(user_id) else {
            return 0;
        };
        let aborted = session.shutdown();
        info!(user_id, aborted, "Session torn down");
        aborted
    }

    /// Tear down every session.
    pub async fn teardown_all(&self) -> usize {
        let sessions: Vec<_> = self.sessions.write().await.drain().collect();
        sessions.iter().map(|(_, s)| s.shutdown()).sum()
    }

    /// Tear down sessions idle for at least `idle_timeout`. Returns how many were evicted.
    pub async fn evict_idle(&self) -> usize {
        let evicted: Vec<_> = {
            let mut sessions = self.sessions.write().await;
            let idle: Vec<String> = sessions
                .iter()
                .filter(|(_, s)| s.idle_for() >= self.idle_timeout)
                .map(|(user_id, _)| user_id.clone())
                .collect();
            idle.into_iter()
                .filter_map(|user_id| sessions.remove(&user_id))
                .collect()
        };

        for session in &evicted {
            let aborted = session.shutdown();
            info!(user_id = %session.user_id, aborted, "Idle session evicted");
        }
        evicted.len()
    }

    /// Run [`evict_idle`](Self::evict_idle) every `every` until the registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let registry: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;

                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let evicted = registry.evict_idle().await;
                if evicted > 0 {
                    let remaining = registry.len().await;
                    debug!(evicted, remaining, "Session sweep");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
