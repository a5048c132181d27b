//! ViewerRuntime: the async event loop around [`Viewer`].
//!
//! The runtime owns the viewer state, the drawing surface and the loaded
//! document, and is the only place that awaits the rendering library.  It
//! runs on a single task:
//!
//! ```text
//! ViewerEvent (server, taps, loads) ─┐
//! render completion ─────────────────┼──► select! ──► Viewer ──► ViewerAction
//! load completion ───────────────────┘                              │
//!         ▲                                                         │
//!         └──── start render / start load / send to server ◄────────┘
//! ```
//!
//! At most one render future exists at a time.  The surface is moved into it
//! and handed back when it completes, so a second concurrent render cannot
//! even be expressed.
//!
//! After every step the runtime publishes a [`ViewerSnapshot`] on a `watch`
//! channel for whatever displays the indicator, error and device panel.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use pageturn_core::{ClientMessage, DeviceStatus, PageNumber, ServerMessage};

use crate::application::document::{
    render_page, Document, DocumentLoader, DocumentSource, RenderError, Surface,
};
use crate::application::viewer::{Viewer, ViewerAction};
use crate::domain::layout::{Dimensions, NavDirection};

/// Input to the runtime.
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    /// An event from the server.
    Server(ServerMessage),
    /// The server connection came up.
    Connected,
    /// The server connection dropped.
    Disconnected,
    /// A tap at `x` on a surface `width` wide.
    Tap { x: f64, width: f64 },
    Navigate(NavDirection),
    /// Load a new document, replacing the current one.
    Load(DocumentSource),
    OpenSettings,
    CloseSettings,
    SelectPort(String),
}

/// What a display needs to show, published after every step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerSnapshot {
    pub connected: bool,
    pub page_count: Option<u32>,
    pub current_page: PageNumber,
    pub rendered_page: Option<PageNumber>,
    pub indicator: Option<String>,
    pub error: Option<String>,
    pub devices: DeviceStatus,
    pub settings_open: bool,
    pub rendering: bool,
}

struct RenderDone {
    generation: u64,
    page: PageNumber,
    surface: Box<dyn Surface>,
    result: Result<Dimensions, RenderError>,
}

struct LoadDone {
    generation: u64,
    result: Result<Arc<dyn Document>, RenderError>,
}

type InFlight<T> = Option<BoxFuture<'static, T>>;

/// Drives one [`Viewer`] against the rendering library.
pub struct ViewerRuntime {
    viewer: Viewer,
    loader: Arc<dyn DocumentLoader>,
    document: Option<Arc<dyn Document>>,
    surface: Option<Box<dyn Surface>>,
    outbound: UnboundedSender<ClientMessage>,
    snapshots: watch::Sender<ViewerSnapshot>,
}

impl ViewerRuntime {
    /// Creates a runtime drawing onto `surface`.
    ///
    /// Events for the server are sent on `outbound`.  The returned receiver
    /// observes every state change.
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        surface: Box<dyn Surface>,
        outbound: UnboundedSender<ClientMessage>,
    ) -> (Self, watch::Receiver<ViewerSnapshot>) {
        let viewer = Viewer::new();
        let (snapshots, rx) = watch::channel(snapshot_of(&viewer));
        let runtime = Self {
            viewer,
            loader,
            document: None,
            surface: Some(surface),
            outbound,
            snapshots,
        };
        (runtime, rx)
    }

    /// Processes events until `events` is closed.
    ///
    /// A render still in flight at that point is dropped.
    pub async fn run(mut self, mut events: UnboundedReceiver<ViewerEvent>) {
        let mut render: InFlight<RenderDone> = None;
        let mut load: InFlight<LoadDone> = None;

        loop {
            tokio::select! {
                biased;

                event = events.recv() => {
                    let Some(event) = event else { break };
                    let action = self.handle_event(event);
                    self.apply(action, &mut render, &mut load);
                }
                done = poll_slot(&mut render), if render.is_some() => {
                    render = None;
                    let action = self.finish_render(done);
                    self.apply(action, &mut render, &mut load);
                }
                done = poll_slot(&mut load), if load.is_some() => {
                    load = None;
                    let action = self.finish_load(done);
                    self.apply(action, &mut render, &mut load);
                }
            }
        }

        info!("viewer event stream closed; runtime stopped");
    }

    fn handle_event(&mut self, event: ViewerEvent) -> Option<ViewerAction> {
        match event {
            ViewerEvent::Server(msg) => {
                debug!("server → viewer: {}", msg.event_name());
                self.viewer.on_server_message(msg)
            }
            ViewerEvent::Connected => {
                self.viewer.set_connected(true);
                None
            }
            ViewerEvent::Disconnected => {
                self.viewer.set_connected(false);
                None
            }
            ViewerEvent::Tap { x, width } => self.viewer.tap(x, width),
            ViewerEvent::Navigate(direction) => self.viewer.navigate(direction),
            ViewerEvent::Load(source) => {
                self.document = None;
                Some(self.viewer.begin_load(source))
            }
            ViewerEvent::OpenSettings => Some(self.viewer.open_settings()),
            ViewerEvent::CloseSettings => {
                self.viewer.close_settings();
                None
            }
            ViewerEvent::SelectPort(port) => self.viewer.select_port(&port),
        }
    }

    /// Carries out `action` and any follow-up it immediately produces, then
    /// publishes the new state.
    fn apply(
        &mut self,
        action: Option<ViewerAction>,
        render: &mut InFlight<RenderDone>,
        load: &mut InFlight<LoadDone>,
    ) {
        let mut next = action;
        while let Some(action) = next.take() {
            match action {
                ViewerAction::StartRender(page) => match self.begin_render(page) {
                    Ok(fut) => *render = Some(fut),
                    Err(e) => {
                        next = self
                            .viewer
                            .on_render_finished(self.viewer.generation(), page, Err(e))
                    }
                },
                ViewerAction::LoadDocument { generation, source } => {
                    *load = Some(self.begin_load(generation, source));
                }
                ViewerAction::Send(msg) => {
                    if self.outbound.send(msg).is_err() {
                        warn!("server connection is gone; dropping outbound event");
                    }
                }
            }
        }
        self.snapshots.send_replace(snapshot_of(&self.viewer));
    }

    fn begin_render(&mut self, page: PageNumber) -> Result<BoxFuture<'static, RenderDone>, RenderError> {
        let document = self
            .document
            .clone()
            .ok_or_else(|| RenderError::Draw("no document loaded".to_string()))?;
        let mut surface = self
            .surface
            .take()
            .ok_or_else(|| RenderError::Draw("surface is busy".to_string()))?;
        let generation = self.viewer.generation();

        debug!("rendering page {page}");
        Ok(Box::pin(async move {
            let result = render_page(document.as_ref(), page, surface.as_mut()).await;
            RenderDone {
                generation,
                page,
                surface,
                result,
            }
        }))
    }

    fn finish_render(&mut self, done: RenderDone) -> Option<ViewerAction> {
        self.surface = Some(done.surface);
        if let Ok(size) = &done.result {
            debug!(
                "rendered page {} at {:.0}x{:.0}",
                done.page, size.width, size.height
            );
        }
        self.viewer
            .on_render_finished(done.generation, done.page, done.result.map(|_| ()))
    }

    fn begin_load(&self, generation: u64, source: DocumentSource) -> BoxFuture<'static, LoadDone> {
        let loader = Arc::clone(&self.loader);
        Box::pin(async move {
            let result = loader.load(source).await;
            LoadDone { generation, result }
        })
    }

    fn finish_load(&mut self, done: LoadDone) -> Option<ViewerAction> {
        let result = match done.result {
            Ok(document) => {
                let count = document.page_count();
                if done.generation == self.viewer.generation() {
                    self.document = Some(document);
                }
                Ok(count)
            }
            Err(e) => Err(e),
        };
        self.viewer.on_document_loaded(done.generation, result)
    }
}

/// Awaits the future in `slot`.  Only polled while the slot is occupied.
async fn poll_slot<T>(slot: &mut InFlight<T>) -> T {
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

fn snapshot_of(viewer: &Viewer) -> ViewerSnapshot {
    ViewerSnapshot {
        connected: viewer.connected(),
        page_count: viewer.page_count(),
        current_page: viewer.current_page(),
        rendered_page: viewer.rendered_page(),
        indicator: viewer.indicator(),
        error: viewer.error().map(str::to_string),
        devices: viewer.devices().clone(),
        settings_open: viewer.settings_open(),
        rendering: viewer.is_rendering(),
    }
}
