use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};

use crate::error::{PagesmithError, PagesmithResult};
use crate::model::version::{SiteCode, VersionRecord};
use crate::store::client::{PersistRequest, VersionClient};

// ---------------------------------------------------------------------------
// PersistQueue: strictly ordered background persistence per site
// ---------------------------------------------------------------------------

/// Outcome of one queued persist.
pub type PersistOutcome = PagesmithResult<Option<VersionRecord>>;

struct PersistJob {
    request: PersistRequest,
    reply: oneshot::Sender<PersistOutcome>,
}

/// Handle to a queued persist. Dropping it does not cancel the write.
pub struct PersistTicket {
    reply: oneshot::Receiver<PersistOutcome>,
}

impl PersistTicket {
    /// Wait for the write to finish.
    pub async fn wait(self) -> PersistOutcome {
        self.reply
            .await
            .map_err(|_| PagesmithError::Internal("persist lane stopped before replying".to_string()))?
    }
}

/// Runs history persistence in the background with one FIFO lane per site.
///
/// Each lane has at most one write in flight, so records reach the store in
/// the order entries were pushed and `get_head` always sees the previous
/// write. Failures are logged and reported on the ticket only.
#[derive(Clone)]
pub struct PersistQueue {
    client: Arc<VersionClient>,
    /// One sender per site ever queued for. Lanes are not removed, so the
    /// map grows by one entry per distinct site.
    lanes: Arc<Mutex<HashMap<SiteCode, mpsc::UnboundedSender<PersistJob>>>>,
}

impl PersistQueue {
    pub fn new(client: Arc<VersionClient>) -> Self {
        Self {
            client,
            lanes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn client(&self) -> &Arc<VersionClient> {
        &self.client
    }

    /// Queue a persist behind every earlier one for the same site.
    pub async fn enqueue(&self, request: PersistRequest) -> PersistTicket {
        let (reply, receiver) = oneshot::channel();
        let site_code = request.site_code.clone();
        let mut job = PersistJob { request, reply };

        let mut lanes = self.lanes.lock().await;
        if let Some(lane) = lanes.get(&site_code) {
            match lane.send(job) {
                Ok(()) => return PersistTicket { reply: receiver },
                Err(mpsc::error::SendError(returned)) => {
                    warn!(site = %site_code, "persist lane closed, restarting");
                    job = returned;
                }
            }
        }

        let lane = self.spawn_lane(site_code.clone());
        if lane.send(job).is_err() {
            warn!(site = %site_code, "new persist lane rejected job");
        }
        lanes.insert(site_code, lane);

        PersistTicket { reply: receiver }
    }

    fn spawn_lane(&self, site_code: SiteCode) -> mpsc::UnboundedSender<PersistJob> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<PersistJob>();
        let client = self.client.clone();

        debug!(site = %site_code, "starting persist lane");
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let outcome = client.persist_history_step(&job.request).await;
                if let Err(err) = &outcome {
                    warn!(site = %site_code, error = %err, "history persistence failed");
                }
                // The caller may have dropped its ticket.
                let _ = job.reply.send(outcome);
            }
        });

        sender
    }
}
