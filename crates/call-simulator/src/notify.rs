//! Non-blocking failure notifications with replayable writes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use profile_store::{
    ActivationStatus, AgentField, BusinessField, DocumentStatus, ProfileStore, StoreError,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Notifications kept per session; older ones are dropped first.
pub const MAX_NOTIFICATIONS: usize = 20;

/// A store write that can be issued again after it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    BusinessField {
        user_id: String,
        field: BusinessField,
        value: String,
    },
    AgentField {
        business_id: String,
        field: AgentField,
        value: String,
    },
    DocumentProgress {
        document_id: String,
        progress: u8,
    },
    DocumentStatus {
        document_id: String,
        status: DocumentStatus,
    },
    Activation {
        business_id: String,
        status: ActivationStatus,
    },
}

impl PendingWrite {
    /// Issue the write.
    pub async fn apply(&self, store: &dyn ProfileStore) -> Result<(), StoreError> {
        match self {
            PendingWrite::BusinessField {
                user_id,
                field,
                value,
            } => store
                .upsert_business_field(user_id, *field, value)
                .await
                .map(|_| ()),
            PendingWrite::AgentField {
                business_id,
                field,
                value,
            } => store
                .upsert_agent_field(business_id, *field, value)
                .await
                .map(|_| ()),
            PendingWrite::DocumentProgress {
                document_id,
                progress,
            } => store.update_document_progress(document_id, *progress).await,
            PendingWrite::DocumentStatus {
                document_id,
                status,
            } => store.update_document_status(document_id, *status).await,
            PendingWrite::Activation {
                business_id,
                status,
            } => match store.insert_activation(business_id, status).await {
                // A retry after a lost response lands here; the row is what we wanted.
                Ok(_) | Err(StoreError::AlreadyExists { .. }) => Ok(()),
                Err(err) => Err(err),
            },
        }
    }

    /// Whether a successful `self` makes an earlier `other` stale.
    ///
    /// Field writes replace the column outright, so a newer value wins. Document
    /// and activation writes never move backwards and are left alone.
    pub fn supersedes(&self, other: &PendingWrite) -> bool {
        match (self, other) {
            (
                PendingWrite::BusinessField { user_id, field, .. },
                PendingWrite::BusinessField {
                    user_id: other_user,
                    field: other_field,
                    ..
                },
            ) => user_id == other_user && field == other_field,
            (
                PendingWrite::AgentField {
                    business_id, field, ..
                },
                PendingWrite::AgentField {
                    business_id: other_business,
                    field: other_field,
                    ..
                },
            ) => business_id == other_business && field == other_field,
            _ => false,
        }
    }

    /// Short human description for the notification text.
    pub fn describe(&self) -> String {
        match self {
            PendingWrite::BusinessField { field, .. } => {
                format!("saving {}", field.column_name().replace('_', " "))
            }
            PendingWrite::AgentField { field, .. } => {
                format!("saving agent {}", field.column_name().replace('_', " "))
            }
            PendingWrite::DocumentProgress { progress, .. } => {
                format!("saving upload progress ({}%)", progress)
            }
            PendingWrite::DocumentStatus { status, .. } => {
                format!("marking document {}", status)
            }
            PendingWrite::Activation { .. } => "saving activation".to_string(),
        }
    }
}

/// A failure shown to the user without interrupting them.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    /// Whether the failed write can be replayed.
    pub retryable: bool,
    #[serde(skip)]
    pub write: Option<PendingWrite>,
}

/// Outcome of a retry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The write went through and the notification was removed.
    Applied,
    /// The notification has no write attached.
    NotRetryable,
    /// No notification with that id.
    Unknown,
}

/// The notification slice of a session.
#[derive(Default)]
pub struct Notifications {
    next_id: AtomicU64,
    items: Mutex<VecDeque<Notification>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a notification. Returns its id.
    pub fn push(&self, message: impl Into<String>, write: Option<PendingWrite>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut items = self.lock();
        items.push_back(Notification {
            id,
            message: message.into(),
            retryable: write.is_some(),
            write,
        });
        while items.len() > MAX_NOTIFICATIONS {
            items.pop_front();
        }
        id
    }

    /// Record a failed write. Only transient failures keep the write for a retry.
    pub fn write_failed(&self, write: PendingWrite, err: &StoreError) -> u64 {
        self.supersede(&write);
        let message = format!("Failed {}: {}", write.describe(), err);
        let write = err.is_transient().then_some(write);
        self.push(message, write)
    }

    /// Drop notifications whose write is made stale by `write`. Returns how many.
    pub fn supersede(&self, write: &PendingWrite) -> usize {
        let mut items = self.lock();
        let before = items.len();
        items.retain(|n| !n.write.as_ref().is_some_and(|w| write.supersedes(w)));
        let dropped = before - items.len();
        if dropped > 0 {
            debug!(dropped, "Superseded stale failed writes");
        }
        dropped
    }

    /// All current notifications, oldest first.
    pub fn list(&self) -> Vec<Notification> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove a notification. Returns false if it did not exist.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut items = self.lock();
        let before = items.len();
        items.retain(|n| n.id != id);
        items.len() != before
    }

    /// Replay the write attached to a notification.
    ///
    /// On success the notification is removed; on failure it stays so the user
    /// can try again.
    pub async fn retry(&self, id: u64, store: &dyn ProfileStore) -> Result<RetryOutcome, StoreError> {
        let write = {
            let items = self.lock();
            match items.iter().find(|n| n.id == id) {
                None => return Ok(RetryOutcome::Unknown),
                Some(n) => match &n.write {
                    None => return Ok(RetryOutcome::NotRetryable),
                    Some(w) => w.clone(),
                },
            }
        };

        write.apply(store).await?;
        info!(notification = id, "Retried write succeeded");
        self.dismiss(id);
        Ok(RetryOutcome::Applied)
    }
}

/// Issue a write, turning a failure into a retryable notification.
pub async fn persist(store: &dyn ProfileStore, notifications: &Notifications, write: PendingWrite) {
    match write.apply(store).await {
        Ok(()) => {
            notifications.supersede(&write);
        }
        Err(err) => {
            warn!(error = %err, write = ?write, "Background write failed");
            notifications.write_failed(write, &err);
        }
    }
}
