#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::Level;

use palaver_core::{CandidateInit, ClientMessage, SessionDescription};
use palaver_session::{
    EndpointError, LocalTracks, MediaEndpoint, MediaProfile, MediaSource, SignalSink,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn candidate(n: u16) -> CandidateInit {
    CandidateInit {
        candidate: format!("candidate:{n} 1 udp 2122260223 10.0.0.{n} 54321 typ host"),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    }
}

#[derive(Default)]
struct EndpointRecord {
    applied: Vec<CandidateInit>,
    local: Vec<SessionDescription>,
    remote: Vec<SessionDescription>,
    rollbacks: usize,
    restarts: usize,
    closed: bool,
}

/// Mock media endpoint that fabricates SDP blobs and records everything
/// applied to it.
#[derive(Clone)]
pub struct MockEndpoint {
    label: String,
    counter: Arc<AtomicUsize>,
    fail_candidates: Arc<AtomicBool>,
    fail_restart: Arc<AtomicBool>,
    record: Arc<Mutex<EndpointRecord>>,
}

impl MockEndpoint {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            counter: Arc::new(AtomicUsize::new(0)),
            fail_candidates: Arc::new(AtomicBool::new(false)),
            fail_restart: Arc::new(AtomicBool::new(false)),
            record: Arc::new(Mutex::new(EndpointRecord::default())),
        }
    }

    pub fn fail_candidates(&self) {
        self.fail_candidates.store(true, Ordering::SeqCst);
    }

    pub fn fail_restart(&self) {
        self.fail_restart.store(true, Ordering::SeqCst);
    }

    pub async fn applied_candidates(&self) -> Vec<CandidateInit> {
        self.record.lock().await.applied.clone()
    }

    pub async fn local_descriptions(&self) -> Vec<SessionDescription> {
        self.record.lock().await.local.clone()
    }

    pub async fn remote_descriptions(&self) -> Vec<SessionDescription> {
        self.record.lock().await.remote.clone()
    }

    pub async fn rollbacks(&self) -> usize {
        self.record.lock().await.rollbacks
    }

    pub async fn restarts(&self) -> usize {
        self.record.lock().await.restarts
    }

    pub async fn is_closed(&self) -> bool {
        self.record.lock().await.closed
    }

    fn next_blob(&self, kind: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}-{}", self.label, kind, n)
    }
}

#[async_trait]
impl MediaEndpoint for MockEndpoint {
    async fn create_offer(&self) -> Result<SessionDescription, EndpointError> {
        Ok(SessionDescription::offer(self.next_blob("offer")))
    }

    async fn create_answer(&self) -> Result<SessionDescription, EndpointError> {
        Ok(SessionDescription::answer(self.next_blob("answer")))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EndpointError> {
        self.record.lock().await.local.push(desc);
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EndpointError> {
        self.record.lock().await.remote.push(desc);
        Ok(())
    }

    async fn add_candidate(&self, candidate: CandidateInit) -> Result<(), EndpointError> {
        if self.fail_candidates.load(Ordering::SeqCst) {
            return Err(EndpointError::new("candidate rejected"));
        }
        self.record.lock().await.applied.push(candidate);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), EndpointError> {
        let mut record = self.record.lock().await;
        record.rollbacks += 1;
        record.local.pop();
        Ok(())
    }

    async fn restart_connectivity(&self) -> Result<(), EndpointError> {
        if self.fail_restart.load(Ordering::SeqCst) {
            return Err(EndpointError::new("restart rejected"));
        }
        self.record.lock().await.restarts += 1;
        Ok(())
    }

    async fn close(&self) {
        self.record.lock().await.closed = true;
    }
}

/// Mock relay handle capturing every outbound signaling message.
#[derive(Clone, Default)]
pub struct MockSink {
    sent: Arc<Mutex<Vec<ClientMessage>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<ClientMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl SignalSink for MockSink {
    async fn send(&self, msg: ClientMessage) {
        self.sent.lock().await.push(msg);
    }
}

/// How a mock capture device behaves across profiles.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CaptureBehavior {
    AlwaysOk,
    PreferredFails,
    AlwaysFails,
}

#[derive(Clone)]
pub struct MockSource {
    behavior: CaptureBehavior,
    requests: Arc<Mutex<Vec<MediaProfile>>>,
}

impl MockSource {
    pub fn new(behavior: CaptureBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn requests(&self) -> Vec<MediaProfile> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl MediaSource for MockSource {
    async fn acquire(&self, profile: MediaProfile) -> Result<LocalTracks, EndpointError> {
        self.requests.lock().await.push(profile);
        let fail = match self.behavior {
            CaptureBehavior::AlwaysOk => false,
            CaptureBehavior::PreferredFails => profile == MediaProfile::Preferred,
            CaptureBehavior::AlwaysFails => true,
        };
        if fail {
            return Err(EndpointError::new("capture constraints not satisfiable"));
        }
        Ok(LocalTracks {
            audio: true,
            video: profile == MediaProfile::Preferred,
        })
    }
}
