//! Scripted build service shared by the session tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use build_api::models::DeployPayload;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::StreamExt;
use minici::errors::DeployError;
use minici::models::presets::AppType;
use minici::models::request::DeploymentRequest;
use minici::session::notify::{Notification, Notifier};
use minici::session::runner::{SessionRunner, StreamOptions};
use minici::session::service::{BuildService, ChunkStream};
use minici::stream::classifier::{Classifier, ClassifierSettings};

/// What the fake service answers with
pub enum Script {
    /// These chunks, then the stream closes
    Chunks(Vec<&'static str>),
    /// These chunks, then the stream stays open
    ChunksThenHang(Vec<&'static str>),
    /// Chunks pushed by the test through the returned sender
    Channel(Mutex<Option<mpsc::UnboundedReceiver<Result<Bytes, DeployError>>>>),
    /// The request fails with this transport error
    Fail(&'static str),
}

pub struct FakeService {
    script: Script,
    calls: AtomicUsize,
    payloads: Mutex<Vec<DeployPayload>>,
}

impl FakeService {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        })
    }

    pub fn channel() -> (Arc<Self>, mpsc::UnboundedSender<Result<Bytes, DeployError>>) {
        let (tx, rx) = mpsc::unbounded();
        (Self::new(Script::Channel(Mutex::new(Some(rx)))), tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<DeployPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

fn chunk_stream(chunks: &[&'static str]) -> impl futures::Stream<Item = Result<Bytes, DeployError>> {
    let chunks: Vec<_> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
        .collect();
    futures::stream::iter(chunks)
}

#[async_trait]
impl BuildService for FakeService {
    async fn start_build(&self, payload: &DeployPayload) -> Result<ChunkStream, DeployError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());

        match &self.script {
            Script::Chunks(chunks) => Ok(chunk_stream(chunks).boxed()),
            Script::ChunksThenHang(chunks) => Ok(chunk_stream(chunks)
                .chain(futures::stream::pending())
                .boxed()),
            Script::Channel(rx) => match rx.lock().unwrap().take() {
                Some(rx) => Ok(rx.boxed()),
                None => Err(DeployError::TransportError("already streamed".to_string())),
            },
            Script::Fail(message) => Err(DeployError::TransportError(message.to_string())),
        }
    }
}

/// Records every notification in order
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen.lock().unwrap().push(notification.clone());
    }
}

pub fn request() -> DeploymentRequest {
    DeploymentRequest::from_preset("https://github.com/acme/shop.git", AppType::Node)
}

pub fn runner(service: Arc<FakeService>) -> (SessionRunner, Arc<RecordingNotifier>) {
    runner_with(service, StreamOptions::default())
}

pub fn runner_with(
    service: Arc<FakeService>,
    options: StreamOptions,
) -> (SessionRunner, Arc<RecordingNotifier>) {
    let classifier = Arc::new(Classifier::new(&ClassifierSettings::default()).unwrap());
    let notifier = Arc::new(RecordingNotifier::default());
    let runner = SessionRunner::new(service, classifier, notifier.clone(), options);
    (runner, notifier)
}

pub fn idle_only(secs: u64) -> StreamOptions {
    StreamOptions {
        idle_timeout: Some(Duration::from_secs(secs)),
        total_timeout: None,
    }
}
