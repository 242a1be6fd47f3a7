//! Timed simulations behind the call-agent dashboard.
//!
//! Every simulation runs as a spawned timeline owned by a session's
//! [`TaskSet`]. Local state advances first and the matching store write
//! follows; a failed write never stops a timeline but lands in
//! [`Notifications`] with a [`PendingWrite`] the user can retry.
//!
//! - [`UploadSimulator`]: `processing` in 20% steps, then `indexed`, then `ready`
//! - [`ActivationSimulator`]: payment verification, a fabricated number, then the demo call
//! - [`CallSimulator`]: the activity feed and its metrics
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use call_simulator::{Notifications, SimulationTiming, TaskSet, UploadSimulator};
//! use profile_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let uploads = UploadSimulator::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(Notifications::new()),
//!         SimulationTiming::default(),
//!         Arc::new(TaskSet::new()),
//!         None,
//!     );
//!
//!     let view = uploads.start("business-1", "faq.pdf", "application/pdf").await?;
//!     println!("uploading {} ({}%)", view.file_name, view.progress);
//!     Ok(())
//! }
//! ```

pub mod activation;
pub mod calls;
pub mod error;
pub mod notify;
pub mod payment;
pub mod tasks;
pub mod timing;
pub mod upload;

pub use activation::{ActivationPhase, ActivationSimulator};
pub use calls::{CallActivityEntry, CallFeed, CallKind, CallMetrics, CallSimulator};
pub use error::SimulationError;
pub use notify::{persist, Notification, Notifications, PendingWrite, RetryOutcome};
pub use payment::PaymentDetails;
pub use tasks::TaskSet;
pub use timing::SimulationTiming;
pub use upload::{UploadSimulator, UploadView};
