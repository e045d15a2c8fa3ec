//! Bounded polling for asynchronously indexed documents
//!
//! Documents are submitted once, then the receipts that are still pending are
//! looked up in a single batched request per tick until all of them are
//! terminal or the deadline fixed at submission time has passed.

use crate::client::Client;
use crate::{ClientError, Result};
use entsearch_core::{Document, DocumentReceipt, PollingConfig};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

pub struct AsyncIndexPoller<'a> {
    client: &'a Client,
    config: PollingConfig,
}

impl<'a> AsyncIndexPoller<'a> {
    pub fn new(client: &'a Client, config: PollingConfig) -> Self {
        Self { client, config }
    }

    /// Submit `documents` and wait for every receipt to reach a terminal state.
    ///
    /// Fails with [`ClientError::Timeout`] when receipts are still pending once
    /// the configured timeout has elapsed, and with the underlying error as
    /// soon as any lookup fails.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn index(
        &self,
        source_key: &str,
        documents: &[Document],
    ) -> Result<Vec<DocumentReceipt>> {
        let receipts = self.client.submit_documents(source_key, documents).await?;
        let submitted_at = Instant::now();

        info!(receipts = receipts.len(), "documents submitted, polling receipts");

        self.wait(receipts, submitted_at).await
    }

    /// Poll until `receipts` are all terminal, with the deadline counted from `submitted_at`
    pub async fn wait(
        &self,
        mut receipts: Vec<DocumentReceipt>,
        submitted_at: Instant,
    ) -> Result<Vec<DocumentReceipt>> {
        let deadline = submitted_at + self.config.timeout();

        // Dropped with this future on every return path
        let mut interval = time::interval(self.config.interval().max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let pending: Vec<String> = receipts
                .iter()
                .filter(|r| !r.is_terminal())
                .map(|r| r.id.clone())
                .collect();

            if pending.is_empty() {
                info!(receipts = receipts.len(), "all receipts resolved");
                return Ok(receipts);
            }

            interval.tick().await;

            if Instant::now() > deadline {
                warn!(pending = pending.len(), "receipt polling timed out");
                return Err(ClientError::Timeout {
                    waited: submitted_at.elapsed(),
                    pending,
                });
            }

            // A lookup in flight at the deadline is abandoned, not awaited
            let lookup = time::timeout_at(deadline, self.client.document_receipts(&pending)).await;
            let updates = match lookup {
                Ok(updates) => updates?,
                Err(_) => {
                    warn!(pending = pending.len(), "receipt lookup outlived the deadline");
                    return Err(ClientError::Timeout {
                        waited: submitted_at.elapsed(),
                        pending,
                    });
                }
            };
            for update in updates {
                if let Some(slot) = receipts.iter_mut().find(|r| r.id == update.id) {
                    *slot = update;
                }
            }

            debug!(
                "Receipt poll: {} of {} still pending",
                receipts.iter().filter(|r| !r.is_terminal()).count(),
                receipts.len()
            );
        }
    }
}
