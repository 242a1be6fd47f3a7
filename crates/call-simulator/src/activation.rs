//! Simulated payment verification and agent activation.

use std::sync::Arc;

use chrono::Utc;
use profile_store::{ActivationStatus, ProfileStore};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::calls::CallSimulator;
use crate::error::SimulationError;
use crate::notify::{persist, Notifications, PendingWrite};
use crate::payment::{generate_phone_number, PaymentDetails};
use crate::tasks::TaskSet;
use crate::timing::SimulationTiming;

/// Where a session is in the activation flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ActivationPhase {
    /// Waiting for payment details.
    Form,
    /// The last submission was rejected; the form can be resubmitted.
    FailedValidation { field: String, message: String },
    Verifying,
    Success,
    Activated {
        phone_number: String,
        activated_at: String,
    },
}

impl ActivationPhase {
    /// Whether activation has been accepted. There is no way back from here.
    pub fn is_started(&self) -> bool {
        matches!(
            self,
            ActivationPhase::Verifying | ActivationPhase::Success | ActivationPhase::Activated { .. }
        )
    }

    pub fn phone_number(&self) -> Option<&str> {
        match self {
            ActivationPhase::Activated { phone_number, .. } => Some(phone_number),
            _ => None,
        }
    }
}

impl Default for ActivationPhase {
    fn default() -> Self {
        ActivationPhase::Form
    }
}

/// Activation flow for one session.
pub struct ActivationSimulator {
    store: Arc<dyn ProfileStore>,
    notifications: Arc<Notifications>,
    timing: SimulationTiming,
    tasks: Arc<TaskSet>,
    calls: CallSimulator,
    slice: Arc<watch::Sender<ActivationPhase>>,
}

impl ActivationSimulator {
    /// Start in `activated` when the store already holds an active row.
    ///
    /// A restored activation does not replay the call script.
    pub fn new(
        store: Arc<dyn ProfileStore>,
        notifications: Arc<Notifications>,
        timing: SimulationTiming,
        tasks: Arc<TaskSet>,
        calls: CallSimulator,
        restored: Option<ActivationStatus>,
    ) -> Self {
        let phase = match restored {
            Some(status) if status.is_active => ActivationPhase::Activated {
                phone_number: status.phone_number,
                activated_at: status.activated_at,
            },
            _ => ActivationPhase::Form,
        };
        let (slice, _) = watch::channel(phase);
        Self {
            store,
            notifications,
            timing,
            tasks,
            calls,
            slice: Arc::new(slice),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ActivationPhase> {
        self.slice.subscribe()
    }

    pub fn phase(&self) -> ActivationPhase {
        self.slice.borrow().clone()
    }

    /// Submit the payment form.
    ///
    /// Once activation has started this returns the current phase and does
    /// nothing else.
    #[instrument(skip(self, details), fields(backend = self.store.name()))]
    pub async fn activate(
        &self,
        business_id: &str,
        details: &PaymentDetails,
    ) -> Result<ActivationPhase, SimulationError> {
        let current = self.phase();
        if current.is_started() {
            return Ok(current);
        }

        if let Err(err) = details.validate() {
            self.slice.send_replace(ActivationPhase::FailedValidation {
                field: err.field().to_string(),
                message: err.to_string(),
            });
            return Err(err.into());
        }

        let mut already = None;
        self.slice.send_if_modified(|phase| {
            if phase.is_started() {
                already = Some(phase.clone());
                false
            } else {
                *phase = ActivationPhase::Verifying;
                true
            }
        });
        if let Some(phase) = already {
            return Ok(phase);
        }

        let timeline = run_activation(
            self.store.clone(),
            self.notifications.clone(),
            self.timing,
            self.slice.clone(),
            self.calls.clone(),
            business_id.to_string(),
        );
        if !self.tasks.spawn("activation", timeline) {
            self.slice.send_replace(ActivationPhase::Form);
            return Err(SimulationError::Closed);
        }

        info!(business_id, "Payment verification started");
        Ok(ActivationPhase::Verifying)
    }
}

/// Verification, success, then activation and the demo call.
///
/// The call script runs inside this task so that tearing down the session
/// stops it too.
async fn run_activation(
    store: Arc<dyn ProfileStore>,
    notifications: Arc<Notifications>,
    timing: SimulationTiming,
    slice: Arc<watch::Sender<ActivationPhase>>,
    calls: CallSimulator,
    business_id: String,
) {
    tokio::time::sleep(timing.verify_delay).await;
    slice.send_replace(ActivationPhase::Success);

    tokio::time::sleep(timing.success_delay).await;
    let status = ActivationStatus {
        is_active: true,
        phone_number: generate_phone_number(&mut rand::thread_rng()),
        activated_at: Utc::now().to_rfc3339(),
    };
    persist(
        store.as_ref(),
        &notifications,
        PendingWrite::Activation {
            business_id: business_id.clone(),
            status: status.clone(),
        },
    )
    .await;

    info!(business_id = %business_id, phone_number = %status.phone_number, "Agent activated");
    slice.send_replace(ActivationPhase::Activated {
        phone_number: status.phone_number,
        activated_at: status.activated_at,
    });

    calls.reset_metrics();
    calls.run_script().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::CallKind;
    use crate::payment::is_placeholder_number;
    use profile_store::MemoryStore;
    use std::time::Duration;

    struct Harness {
        store: Arc<MemoryStore>,
        notifications: Arc<Notifications>,
        tasks: Arc<TaskSet>,
        calls: CallSimulator,
        activation: ActivationSimulator,
    }

    fn harness(restored: Option<ActivationStatus>) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let notifications = Arc::new(Notifications::new());
        let tasks = Arc::new(TaskSet::new());
        let timing = SimulationTiming::default();
        let calls = CallSimulator::new(timing);
        let activation = ActivationSimulator::new(
            store.clone(),
            notifications.clone(),
            timing,
            tasks.clone(),
            calls.clone(),
            restored,
        );
        Harness {
            store,
            notifications,
            tasks,
            calls,
            activation,
        }
    }

    fn card() -> PaymentDetails {
        PaymentDetails {
            card_holder: "John Doe".to_string(),
            card_number: "1234567890123456".to_string(),
            expiry: "1225".to_string(),
            cvv: "123".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_timeline() {
        let h = harness(None);
        assert_eq!(h.activation.phase(), ActivationPhase::Form);

        let phase = h.activation.activate("biz-1", &card()).await.unwrap();
        assert_eq!(phase, ActivationPhase::Verifying);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(h.activation.phase(), ActivationPhase::Success);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let phase = h.activation.phase();
        let number = phase.phone_number().unwrap();
        assert!(is_placeholder_number(number), "{}", number);

        let stored = h.store.find_activation("biz-1").await.unwrap().unwrap();
        assert!(stored.status.is_active);
        assert_eq!(stored.status.phone_number, number);

        // The demo call follows.
        tokio::time::sleep(SimulationTiming::default().call_total()).await;
        let feed = h.calls.snapshot();
        assert_eq!(feed.entries[0].kind, CallKind::Ended);
        assert_eq!(feed.metrics.total_calls_today, 1);
        assert_eq!(feed.metrics.avg_duration, "2:15");
        assert!(h.notifications.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_form_never_activates() {
        let h = harness(None);
        let mut form = card();
        form.cvv.clear();

        let err = h.activation.activate("biz-1", &form).await.unwrap_err();
        assert!(matches!(err, SimulationError::Validation(_)));
        match h.activation.phase() {
            ActivationPhase::FailedValidation { field, .. } => assert_eq!(field, "cvv"),
            other => panic!("unexpected phase: {:?}", other),
        }

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(h.store.find_activation("biz-1").await.unwrap().is_none());
        assert_eq!(h.tasks.active(), 0);

        // Correcting the form is allowed.
        let phase = h.activation.activate("biz-1", &card()).await.unwrap();
        assert_eq!(phase, ActivationPhase::Verifying);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_request_does_not_restart() {
        let h = harness(None);
        h.activation.activate("biz-1", &card()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let phase = h.activation.activate("biz-1", &card()).await.unwrap();
        assert_eq!(phase, ActivationPhase::Success);
        assert_eq!(h.tasks.active(), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        let number = h.activation.phase().phone_number().unwrap().to_string();
        let again = h.activation.activate("biz-1", &PaymentDetails::default()).await.unwrap();
        assert_eq!(again.phone_number(), Some(number.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restored_activation_skips_script() {
        let restored = ActivationStatus {
            is_active: true,
            phone_number: "+1 437 555 1234".to_string(),
            activated_at: "2026-01-01T00:00:00+00:00".to_string(),
        };
        let h = harness(Some(restored));
        assert_eq!(h.activation.phase().phone_number(), Some("+1 437 555 1234"));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(h.calls.snapshot().entries.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_insert_still_activates_and_is_retryable() {
        let h = harness(None);
        h.activation.activate("biz-1", &card()).await.unwrap();
        h.store.fail_writes(true);

        tokio::time::sleep(SimulationTiming::default().activation_total() + Duration::from_millis(10)).await;
        assert!(h.activation.phase().phone_number().is_some());

        let list = h.notifications.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].message.split(':').next(), Some("Failed saving activation"));

        h.store.fail_writes(false);
        h.notifications.retry(list[0].id, h.store.as_ref()).await.unwrap();
        assert!(h.store.find_activation("biz-1").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_call_script() {
        let h = harness(None);
        h.activation.activate("biz-1", &card()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(h.activation.phase().phone_number().is_some());

        h.tasks.shutdown();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(h.calls.snapshot().entries.len(), 1);
    }
}
