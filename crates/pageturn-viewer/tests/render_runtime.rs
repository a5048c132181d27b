//! Runtime tests against a scripted document whose renders finish only when
//! the test releases them, so coalescing can be observed deterministically.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use pageturn_core::{ClientMessage, PageNumber, ServerMessage};
use pageturn_viewer::infrastructure::{ViewerEvent, ViewerRuntime, ViewerSnapshot};
use pageturn_viewer::{
    Dimensions, Document, DocumentLoader, DocumentSource, NavDirection, Page, RenderError,
    Surface,
};

const WAIT: Duration = Duration::from_secs(5);

// ── Scripted rendering library ────────────────────────────────────────────────

/// Shared controls: each render reports its page on `started`, then waits
/// for one permit on `gate`.
struct Script {
    gate: Semaphore,
    started: UnboundedSender<u32>,
    fail_pages: Mutex<HashSet<u32>>,
}

struct ScriptedPage {
    number: u32,
    script: Arc<Script>,
}

#[async_trait]
impl Page for ScriptedPage {
    fn viewport(&self, scale: f64) -> Dimensions {
        Dimensions::new(600.0, 800.0).scaled(scale)
    }

    async fn render(
        &self,
        _surface: &mut dyn Surface,
        _viewport: Dimensions,
    ) -> Result<(), RenderError> {
        let _ = self.script.started.send(self.number);
        match self.script.gate.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(RenderError::Draw("gate closed".to_string())),
        }
        if self.script.fail_pages.lock().unwrap().contains(&self.number) {
            return Err(RenderError::Draw(format!("page {} is corrupt", self.number)));
        }
        Ok(())
    }
}

struct ScriptedDocument {
    pages: u32,
    script: Arc<Script>,
}

#[async_trait]
impl Document for ScriptedDocument {
    fn page_count(&self) -> u32 {
        self.pages
    }

    async fn page(&self, number: PageNumber) -> Result<Box<dyn Page>, RenderError> {
        Ok(Box::new(ScriptedPage {
            number: number.get(),
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedLoader {
    result: Result<u32, String>,
    script: Arc<Script>,
}

#[async_trait]
impl DocumentLoader for ScriptedLoader {
    async fn load(&self, _source: DocumentSource) -> Result<Arc<dyn Document>, RenderError> {
        match &self.result {
            Ok(pages) => Ok(Arc::new(ScriptedDocument {
                pages: *pages,
                script: Arc::clone(&self.script),
            })),
            Err(reason) => Err(RenderError::DocumentLoad(reason.clone())),
        }
    }
}

struct RecordingSurface {
    resizes: Arc<Mutex<Vec<Dimensions>>>,
}

impl Surface for RecordingSurface {
    fn available(&self) -> Dimensions {
        Dimensions::new(1200.0, 800.0)
    }

    fn resize(&mut self, size: Dimensions) {
        self.resizes.lock().unwrap().push(size);
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

struct Harness {
    events: UnboundedSender<ViewerEvent>,
    snapshots: watch::Receiver<ViewerSnapshot>,
    started: UnboundedReceiver<u32>,
    outbound: UnboundedReceiver<ClientMessage>,
    script: Arc<Script>,
    resizes: Arc<Mutex<Vec<Dimensions>>>,
    _task: JoinHandle<()>,
}

impl Harness {
    fn start(load_result: Result<u32, String>) -> Self {
        let (started_tx, started) = unbounded_channel();
        let script = Arc::new(Script {
            gate: Semaphore::new(0),
            started: started_tx,
            fail_pages: Mutex::new(HashSet::new()),
        });
        let loader = Arc::new(ScriptedLoader {
            result: load_result,
            script: Arc::clone(&script),
        });
        let resizes = Arc::new(Mutex::new(Vec::new()));
        let surface = Box::new(RecordingSurface {
            resizes: Arc::clone(&resizes),
        });

        let (outbound_tx, outbound) = unbounded_channel();
        let (runtime, snapshots) = ViewerRuntime::new(loader, surface, outbound_tx);
        let (events, events_rx) = unbounded_channel();
        let task = tokio::spawn(runtime.run(events_rx));

        Self {
            events,
            snapshots,
            started,
            outbound,
            script,
            resizes,
            _task: task,
        }
    }

    fn send(&self, event: ViewerEvent) {
        self.events.send(event).unwrap();
    }

    fn page_change(&self, n: u32) {
        self.send(ViewerEvent::Server(ServerMessage::PageChange {
            page: PageNumber::new(n).unwrap(),
        }));
    }

    fn fail_page(&self, n: u32) {
        self.script.fail_pages.lock().unwrap().insert(n);
    }

    /// Lets the oldest waiting render finish.
    fn release(&self) {
        self.script.gate.add_permits(1);
    }

    async fn next_started(&mut self) -> u32 {
        timeout(WAIT, self.started.recv())
            .await
            .expect("timed out waiting for a render to start")
            .expect("script dropped")
    }

    async fn wait_for(&mut self, what: impl FnMut(&ViewerSnapshot) -> bool) -> ViewerSnapshot {
        let snapshot = timeout(WAIT, self.snapshots.wait_for(what))
            .await
            .expect("timed out waiting for viewer state")
            .expect("runtime stopped");
        snapshot.clone()
    }

    /// Loads a document and lets page 1 render.
    async fn load(&mut self) {
        self.send(ViewerEvent::Load(DocumentSource::Url("/score.pdf".to_string())));
        assert_eq!(self.next_started().await, 1);
        self.release();
        self.wait_for(|s| s.rendered_page == Some(PageNumber::FIRST) && !s.rendering)
            .await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_renders_first_page_fitted_to_surface() {
    // Arrange
    let mut h = Harness::start(Ok(4));

    // Act
    h.load().await;

    // Assert: 600x800 into 1200x800 is height bound, scale 1.0 * 0.98
    let snapshot = h.wait_for(|s| s.indicator.is_some()).await;
    assert_eq!(snapshot.indicator.as_deref(), Some("1 / 4"));
    assert_eq!(
        *h.resizes.lock().unwrap(),
        vec![Dimensions::new(588.0, 784.0)]
    );
}

#[tokio::test]
async fn test_burst_during_render_draws_only_latest_page() {
    // Arrange: page 3 is being drawn
    let mut h = Harness::start(Ok(10));
    h.load().await;
    h.page_change(3);
    assert_eq!(h.next_started().await, 3);

    // Act: 5 then 6 arrive before 3 finishes
    h.page_change(5);
    h.page_change(6);
    h.wait_for(|s| s.current_page == PageNumber::new(6).unwrap())
        .await;
    h.release();

    // Assert: 6 is drawn directly after 3, and 5 never is
    assert_eq!(h.next_started().await, 6);
    h.release();
    let snapshot = h.wait_for(|s| !s.rendering).await;
    assert_eq!(snapshot.indicator.as_deref(), Some("6 / 10"));
    assert!(h.started.try_recv().is_err());
}

#[tokio::test]
async fn test_out_of_range_page_is_not_rendered() {
    let mut h = Harness::start(Ok(3));
    h.load().await;

    h.page_change(4);
    h.page_change(2);

    assert_eq!(h.next_started().await, 2);
    h.release();
    let snapshot = h.wait_for(|s| !s.rendering).await;
    assert_eq!(snapshot.indicator.as_deref(), Some("2 / 3"));
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn test_failed_render_still_drains_pending_page() {
    // Arrange
    let mut h = Harness::start(Ok(5));
    h.load().await;
    h.fail_page(2);
    h.page_change(2);
    assert_eq!(h.next_started().await, 2);
    h.page_change(3);
    h.wait_for(|s| s.current_page == PageNumber::new(3).unwrap())
        .await;

    // Act
    h.release();

    // Assert: the failure is shown while 3 draws, and cleared once it has
    assert_eq!(h.next_started().await, 3);
    let snapshot = h.wait_for(|s| s.error.is_some()).await;
    assert_eq!(
        snapshot.error.as_deref(),
        Some("Error rendering page 2: draw failed: page 2 is corrupt")
    );
    assert!(snapshot.rendering);
    h.release();
    let snapshot = h.wait_for(|s| !s.rendering).await;
    assert_eq!(snapshot.indicator.as_deref(), Some("3 / 5"));
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn test_failed_render_does_not_block_later_pages() {
    let mut h = Harness::start(Ok(5));
    h.load().await;
    h.fail_page(2);

    h.page_change(2);
    assert_eq!(h.next_started().await, 2);
    h.release();
    h.wait_for(|s| s.error.is_some() && !s.rendering).await;

    h.page_change(4);
    assert_eq!(h.next_started().await, 4);
    h.release();
    let snapshot = h.wait_for(|s| s.rendered_page == PageNumber::new(4)).await;
    assert_eq!(snapshot.indicator.as_deref(), Some("4 / 5"));
}

#[tokio::test]
async fn test_load_failure_shows_message_and_ignores_pages() {
    // Arrange
    let mut h = Harness::start(Err("Missing PDF".to_string()));

    // Act
    h.send(ViewerEvent::Load(DocumentSource::Url("/missing.pdf".to_string())));
    let snapshot = h.wait_for(|s| s.error.is_some()).await;

    // Assert
    assert_eq!(snapshot.error.as_deref(), Some("Error loading PDF: Missing PDF"));

    h.page_change(1);
    h.send(ViewerEvent::OpenSettings);
    h.wait_for(|s| s.settings_open).await;
    assert!(h.started.try_recv().is_err());
    assert!(!h.snapshots.borrow().rendering);
}

#[tokio::test]
async fn test_tap_turns_pages_through_the_scheduler() {
    let mut h = Harness::start(Ok(3));
    h.load().await;

    h.send(ViewerEvent::Tap {
        x: 950.0,
        width: 1000.0,
    });
    assert_eq!(h.next_started().await, 2);
    h.send(ViewerEvent::Navigate(NavDirection::Next));
    h.wait_for(|s| s.current_page == PageNumber::new(3).unwrap())
        .await;
    h.release();

    assert_eq!(h.next_started().await, 3);
    h.release();
    let snapshot = h.wait_for(|s| !s.rendering).await;
    assert_eq!(snapshot.indicator.as_deref(), Some("3 / 3"));
}

#[tokio::test]
async fn test_device_panel_round_trip() {
    // Arrange
    let mut h = Harness::start(Ok(1));

    // Act
    h.send(ViewerEvent::OpenSettings);
    h.send(ViewerEvent::Server(ServerMessage::MidiPortsList {
        ports: vec!["IAC Driver Bus 1".to_string(), "USB MIDI".to_string()],
        active: Some("IAC Driver Bus 1".to_string()),
    }));
    h.send(ViewerEvent::SelectPort("USB MIDI".to_string()));

    // Assert
    assert_eq!(h.outbound.recv().await, Some(ClientMessage::GetMidiPorts));
    assert_eq!(
        h.outbound.recv().await,
        Some(ClientMessage::SetMidiPort("USB MIDI".to_string()))
    );
    let snapshot = h
        .wait_for(|s| s.devices.connected.is_some())
        .await;
    assert_eq!(snapshot.devices.available.len(), 2);
    // Choosing a port leaves the panel open until it is closed.
    assert!(snapshot.settings_open);
    h.send(ViewerEvent::CloseSettings);
    h.wait_for(|s| !s.settings_open).await;
}

#[tokio::test]
async fn test_connection_state_is_published() {
    let mut h = Harness::start(Ok(1));

    h.send(ViewerEvent::Connected);
    assert!(h.wait_for(|s| s.connected).await.connected);

    h.send(ViewerEvent::Disconnected);
    assert!(!h.wait_for(|s| !s.connected).await.connected);
}
