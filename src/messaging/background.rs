//! Background worker: long-lived entry store behind the bridge
//!
//! Collects every record seen in `SCRAPE_PROGRESS` / `SCRAPE_DONE` messages,
//! deduplicated by identity, and answers snapshot queries so a UI that
//! missed messages can resynchronize.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::bus::Messenger;
use super::errors::MessengerError;
use super::types::{Envelope, MessageSource, MessageType};
use crate::ingest::{IngestError, LeadSink, build_requests};
use crate::leads::{IdentityKey, LeadKind, LeadRecord, Platform};

const QUERY_BUFFER: usize = 32;

/// Result of shipping the stored entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadSummary {
    pub requests: usize,
    pub leads: usize,
}

enum Query {
    GetEntries(oneshot::Sender<Vec<LeadRecord>>),
    ClearEntries(oneshot::Sender<()>),
    UploadEntries {
        key_prefix: Option<String>,
        reply: oneshot::Sender<Result<UploadSummary, IngestError>>,
    },
}

/// Cloneable handle for querying a running worker
#[derive(Clone)]
pub struct BackgroundHandle {
    queries: mpsc::Sender<Query>,
}

impl BackgroundHandle {
    /// `GET_ENTRIES`: snapshot of every stored record, in arrival order
    pub async fn get_entries(&self) -> Result<Vec<LeadRecord>, MessengerError> {
        let (tx, rx) = oneshot::channel();
        self.send(Query::GetEntries(tx)).await?;
        rx.await.map_err(|_| MessengerError::WorkerGone)
    }

    /// `CLEAR_ENTRIES`
    pub async fn clear_entries(&self) -> Result<(), MessengerError> {
        let (tx, rx) = oneshot::channel();
        self.send(Query::ClearEntries(tx)).await?;
        rx.await.map_err(|_| MessengerError::WorkerGone)
    }

    /// `UPLOAD_ENTRIES`: ship all entries, batched per platform and kind
    pub async fn upload_entries(
        &self,
        key_prefix: Option<String>,
    ) -> Result<Result<UploadSummary, IngestError>, MessengerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Query::UploadEntries { key_prefix, reply }).await?;
        rx.await.map_err(|_| MessengerError::WorkerGone)
    }

    async fn send(&self, query: Query) -> Result<(), MessengerError> {
        self.queries
            .send(query)
            .await
            .map_err(|_| MessengerError::WorkerGone)
    }
}

pub struct BackgroundWorker {
    entries: Vec<LeadRecord>,
    keys: HashSet<IdentityKey>,
    sink: Arc<dyn LeadSink>,
    batch_size: usize,
}

impl BackgroundWorker {
    /// Subscribe to `messenger` and run the worker on a new task
    ///
    /// The subscription is taken before this returns, so every scraper
    /// message published afterwards reaches the store.
    pub fn spawn(
        messenger: &Messenger,
        sink: Arc<dyn LeadSink>,
        batch_size: usize,
    ) -> (BackgroundHandle, JoinHandle<()>) {
        let bridge = messenger.subscribe_from(MessageSource::Scraper);
        let (tx, mut rx) = mpsc::channel(QUERY_BUFFER);
        let mut worker = Self {
            entries: Vec::new(),
            keys: HashSet::new(),
            sink,
            batch_size,
        };

        let task = tokio::spawn(async move {
            let mut bridge = bridge;
            let mut bridge_open = true;
            loop {
                tokio::select! {
                    biased;
                    message = bridge.recv(), if bridge_open => match message {
                        Ok(envelope) => worker.observe(&envelope),
                        Err(MessengerError::ReceiverLagged(n)) => {
                            warn!("Background worker missed {n} bridge messages");
                        }
                        Err(_) => bridge_open = false,
                    },
                    query = rx.recv() => match query {
                        Some(query) => worker.answer(query).await,
                        None => break,
                    },
                }
            }
            debug!("Background worker stopped");
        });

        (BackgroundHandle { queries: tx }, task)
    }

    fn observe(&mut self, envelope: &Envelope) {
        if !matches!(envelope.kind, MessageType::ScrapeProgress | MessageType::ScrapeDone) {
            return;
        }
        for record in envelope.payload.records() {
            self.store(record);
        }
    }

    fn store(&mut self, record: LeadRecord) {
        let Some(key) = record.identity_key() else {
            return;
        };
        if self.keys.insert(key) {
            self.entries.push(record);
        }
    }

    async fn answer(&mut self, query: Query) {
        match query {
            Query::GetEntries(reply) => {
                let _ = reply.send(self.entries.clone());
            }
            Query::ClearEntries(reply) => {
                self.entries.clear();
                self.keys.clear();
                let _ = reply.send(());
            }
            Query::UploadEntries { key_prefix, reply } => {
                let result = self.upload(key_prefix.as_deref()).await;
                let _ = reply.send(result);
            }
        }
    }

    async fn upload(&self, key_prefix: Option<&str>) -> Result<UploadSummary, IngestError> {
        let mut groups: BTreeMap<(&str, &str), (Platform, LeadKind, Vec<LeadRecord>)> = BTreeMap::new();
        for record in &self.entries {
            groups
                .entry((record.platform.as_wire(), record.kind.as_str()))
                .or_insert_with(|| (record.platform, record.kind, Vec::new()))
                .2
                .push(record.clone());
        }

        let mut summary = UploadSummary::default();
        for ((platform_name, kind_name), (platform, kind, records)) in groups {
            let prefix = key_prefix.map(|p| format!("{p}-{platform_name}-{kind_name}"));
            for request in build_requests(platform, kind, &records, self.batch_size, prefix.as_deref()) {
                self.sink.ingest(&request).await?;
                summary.requests += 1;
                summary.leads += request.leads.len();
            }
        }
        info!(requests = summary.requests, leads = summary.leads, "Uploaded stored entries");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DoneReason;
    use crate::testing::MemorySink;

    fn lead(name: &str) -> LeadRecord {
        LeadRecord::new(name, Platform::WhatsApp, LeadKind::GroupMembership, "https://web.whatsapp.com/")
    }

    #[tokio::test]
    async fn stores_deduplicated_entries_and_uploads() {
        let messenger = Messenger::default();
        let sink = Arc::new(MemorySink::new());
        let (handle, _task) = BackgroundWorker::spawn(&messenger, sink.clone(), 2);

        messenger.emit(Envelope::progress(LeadKind::GroupMembership, 1, None, lead("Ana")));
        messenger.emit(Envelope::progress(LeadKind::GroupMembership, 2, None, lead("Bruno")));
        messenger.emit(Envelope::done(
            LeadKind::GroupMembership,
            DoneReason::Completed,
            vec![lead("Ana"), lead("Bruno"), lead("Carla")],
        ));

        let entries = handle.get_entries().await.expect("worker");
        let names: Vec<_> = entries.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Bruno", "Carla"]);

        let summary = handle
            .upload_entries(Some("bg".into()))
            .await
            .expect("worker")
            .expect("upload");
        assert_eq!(summary, UploadSummary { requests: 2, leads: 3 });
        assert_eq!(sink.calls(), 2);

        handle.clear_entries().await.expect("worker");
        assert!(handle.get_entries().await.expect("worker").is_empty());
    }
}
