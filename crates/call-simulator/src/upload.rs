//! Simulated knowledge-document upload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use profile_store::validation::validate_document_type;
use profile_store::{DocumentStatus, KnowledgeDocument, ProfileStore};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::error::SimulationError;
use crate::notify::{persist, Notifications, PendingWrite};
use crate::tasks::TaskSet;
use crate::timing::SimulationTiming;

/// Progress increment per step.
pub const PROGRESS_STEP: u8 = 20;

/// The surfaced document as the dashboard shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadView {
    pub document_id: String,
    pub file_name: String,
    pub status: DocumentStatus,
    pub progress: u8,
}

impl From<KnowledgeDocument> for UploadView {
    fn from(doc: KnowledgeDocument) -> Self {
        Self {
            document_id: doc.id,
            file_name: doc.file_name,
            status: doc.status,
            progress: doc.upload_progress,
        }
    }
}

/// Drives uploads for one session.
///
/// One upload runs at a time. The upload slice holds the most recent document,
/// whether it was restored from the store or started here.
pub struct UploadSimulator {
    store: Arc<dyn ProfileStore>,
    notifications: Arc<Notifications>,
    timing: SimulationTiming,
    tasks: Arc<TaskSet>,
    slice: Arc<watch::Sender<Option<UploadView>>>,
    running: Arc<AtomicBool>,
}

impl UploadSimulator {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        notifications: Arc<Notifications>,
        timing: SimulationTiming,
        tasks: Arc<TaskSet>,
        restored: Option<KnowledgeDocument>,
    ) -> Self {
        let (slice, _) = watch::channel(restored.map(UploadView::from));
        Self {
            store,
            notifications,
            timing,
            tasks,
            slice: Arc::new(slice),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UploadView>> {
        self.slice.subscribe()
    }

    pub fn current(&self) -> Option<UploadView> {
        self.slice.borrow().clone()
    }

    /// Whether an upload started by this session has not reached `ready`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Validate the file, record it and start the progress timeline.
    ///
    /// Nothing is written and the slice is untouched when the file is rejected
    /// or another upload is still running.
    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn start(
        &self,
        business_id: &str,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadView, SimulationError> {
        validate_document_type(file_name, content_type)?;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SimulationError::Busy("upload"));
        }

        let doc = match self.store.insert_document(business_id, file_name.trim()).await {
            Ok(doc) => doc,
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(err.into());
            }
        };

        let view = UploadView::from(doc);
        self.slice.send_replace(Some(view.clone()));
        info!(document_id = %view.document_id, "Upload started");

        let timeline = run_upload(
            self.store.clone(),
            self.notifications.clone(),
            self.timing,
            self.slice.clone(),
            self.running.clone(),
            view.document_id.clone(),
        );
        if !self.tasks.spawn("upload", timeline) {
            self.running.store(false, Ordering::SeqCst);
            return Err(SimulationError::Closed);
        }

        Ok(view)
    }
}

fn set_slice(slice: &watch::Sender<Option<UploadView>>, f: impl FnOnce(&mut UploadView)) {
    slice.send_modify(|current| {
        if let Some(view) = current.as_mut() {
            f(view);
        }
    });
}

async fn run_upload(
    store: Arc<dyn ProfileStore>,
    notifications: Arc<Notifications>,
    timing: SimulationTiming,
    slice: Arc<watch::Sender<Option<UploadView>>>,
    running: Arc<AtomicBool>,
    document_id: String,
) {
    for progress in (0..=100).step_by(PROGRESS_STEP as usize) {
        tokio::time::sleep(timing.upload_step).await;
        let progress = progress as u8;
        set_slice(&slice, |view| view.progress = view.progress.max(progress));
        persist(
            store.as_ref(),
            &notifications,
            PendingWrite::DocumentProgress {
                document_id: document_id.clone(),
                progress,
            },
        )
        .await;
    }

    set_slice(&slice, |view| view.status = DocumentStatus::Indexed);
    persist(
        store.as_ref(),
        &notifications,
        PendingWrite::DocumentStatus {
            document_id: document_id.clone(),
            status: DocumentStatus::Indexed,
        },
    )
    .await;

    tokio::time::sleep(timing.index_delay).await;
    set_slice(&slice, |view| view.status = DocumentStatus::Ready);
    persist(
        store.as_ref(),
        &notifications,
        PendingWrite::DocumentStatus {
            document_id: document_id.clone(),
            status: DocumentStatus::Ready,
        },
    )
    .await;

    running.store(false, Ordering::SeqCst);
    info!(document_id = %document_id, "Upload ready");
}
