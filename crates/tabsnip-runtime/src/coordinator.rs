//! The background coordinator context.
//!
//! One spawned task owns the live session, the overlay listener registry,
//! the frame source, and the screenshot slot. Everything else holds a
//! [`CoordinatorHandle`] and talks to the task over its inbox, so no state
//! is ever shared across contexts.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::timeout;

use tabsnip_core::config::RuntimeConfig;
use tabsnip_core::error::{Result, SnipError};
use tabsnip_core::frame::{Artifact, FrameSource, FullFrame, TabId};
use tabsnip_core::geometry::SelectionRect;
use tabsnip_core::protocol::{CaptureEvent, ForwardOutcome, OverlayCommand};
use tabsnip_core::session::{OverlayPhase, Session};
use tabsnip_core::slot::SlotStore;

use crate::overlay::OverlayMsg;

/// Capacity of the coordinator inbox and of each overlay inbox.
pub(crate) const CHANNEL_CAPACITY: usize = 32;
/// Capacity of the capture notification channel.
const EVENT_CAPACITY: usize = 16;

/// Whether a new session may proceed on the requested tab.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionGrant {
    /// A fresh session was created for the requested tab
    Granted(Session),
    /// The requested tab already holds the live session
    AlreadyActive(Session),
    /// Another tab holds the live session; the request is refused
    Busy(Session),
}

enum CoordinatorMsg {
    BeginSession {
        tab: TabId,
        reply: oneshot::Sender<SessionGrant>,
    },
    EndSession {
        tab: TabId,
        reply: oneshot::Sender<()>,
    },
    CurrentSession {
        reply: oneshot::Sender<Option<Session>>,
    },
    PhaseReport {
        tab: TabId,
        phase: OverlayPhase,
        selection: Option<SelectionRect>,
    },
    RegisterOverlay {
        tab: TabId,
        sender: mpsc::Sender<OverlayMsg>,
        reply: oneshot::Sender<bool>,
    },
    TabClosed {
        tab: TabId,
        reply: oneshot::Sender<()>,
    },
    ForwardCommand {
        tab: TabId,
        command: OverlayCommand,
        reply: oneshot::Sender<ForwardOutcome>,
    },
    RequestFullFrame {
        tab: TabId,
        reply: oneshot::Sender<Result<FullFrame>>,
    },
    StoreArtifact {
        artifact: Artifact,
        reply: oneshot::Sender<Result<()>>,
    },
    ClearSlot {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Spawns the coordinator task.
pub struct Coordinator;

impl Coordinator {
    /// Starts the background context and returns a handle to it.
    ///
    /// The task ends once every handle is dropped.
    pub fn spawn(
        frame_source: Arc<dyn FrameSource>,
        slot: Arc<dyn SlotStore>,
        config: RuntimeConfig,
    ) -> CoordinatorHandle {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let actor = CoordinatorActor {
            frame_source,
            slot,
            config,
            session: None,
            overlays: HashMap::new(),
            events: events.clone(),
        };
        tokio::spawn(actor.run(rx));

        CoordinatorHandle { tx, events }
    }
}

/// Cloneable handle to the coordinator task.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordinatorMsg>,
    events: broadcast::Sender<CaptureEvent>,
}

impl CoordinatorHandle {
    /// Asks for a new session on `tab`.
    pub async fn begin_session(&self, tab: TabId) -> Result<SessionGrant> {
        self.request(|reply| CoordinatorMsg::BeginSession { tab, reply })
            .await
    }

    /// Destroys the live session if it belongs to `tab`. Used by the
    /// launcher when a start attempt never reaches an overlay.
    pub(crate) async fn end_session(&self, tab: TabId) -> Result<()> {
        self.request(|reply| CoordinatorMsg::EndSession { tab, reply })
            .await
    }

    /// Returns the live session, if any.
    pub async fn session(&self) -> Result<Option<Session>> {
        self.request(|reply| CoordinatorMsg::CurrentSession { reply })
            .await
    }

    /// Reports an overlay phase change. Fire-and-forget: a report that no
    /// longer has anyone to receive it is dropped silently.
    pub(crate) async fn report_phase(
        &self,
        tab: TabId,
        phase: OverlayPhase,
        selection: Option<SelectionRect>,
    ) {
        let _ = self
            .tx
            .send(CoordinatorMsg::PhaseReport {
                tab,
                phase,
                selection,
            })
            .await;
    }

    /// Registers an overlay listener for `tab`. Returns false when a live
    /// listener is already registered, in which case the caller must not
    /// spawn a second overlay.
    pub(crate) async fn register_overlay(
        &self,
        tab: TabId,
        sender: mpsc::Sender<OverlayMsg>,
    ) -> Result<bool> {
        self.request(|reply| CoordinatorMsg::RegisterOverlay { tab, sender, reply })
            .await
    }

    /// Removes `tab` from the runtime: its listener is shut down and a
    /// session living there is destroyed.
    pub async fn tab_closed(&self, tab: TabId) -> Result<()> {
        self.request(|reply| CoordinatorMsg::TabClosed { tab, reply })
            .await
    }

    /// Forwards `command` to the overlay on `tab`, waiting a bounded time
    /// for the ack. A tab with no registered listener, a listener that
    /// died, and a listener that stays silent all come back as
    /// [`ForwardOutcome::NoListener`].
    pub async fn forward_command(
        &self,
        tab: TabId,
        command: OverlayCommand,
    ) -> Result<ForwardOutcome> {
        self.request(|reply| CoordinatorMsg::ForwardCommand {
            tab,
            command,
            reply,
        })
        .await
    }

    /// Captures the currently visible frame of `tab`.
    pub async fn request_full_frame(&self, tab: TabId) -> Result<FullFrame> {
        self.request(|reply| CoordinatorMsg::RequestFullFrame { tab, reply })
            .await?
    }

    /// Persists `artifact` to the slot, then notifies subscribers. The
    /// write is complete before anyone hears about it.
    pub async fn store_artifact(&self, artifact: Artifact) -> Result<()> {
        self.request(|reply| CoordinatorMsg::StoreArtifact { artifact, reply })
            .await?
    }

    /// Empties the screenshot slot without notifying anyone.
    pub async fn clear_slot(&self) -> Result<()> {
        self.request(|reply| CoordinatorMsg::ClearSlot { reply })
            .await?
    }

    /// Subscribes to capture notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> CoordinatorMsg,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| SnipError::internal("coordinator task is gone"))?;
        rx.await
            .map_err(|_| SnipError::internal("coordinator task dropped the request"))
    }
}

struct CoordinatorActor {
    frame_source: Arc<dyn FrameSource>,
    slot: Arc<dyn SlotStore>,
    config: RuntimeConfig,
    session: Option<Session>,
    overlays: HashMap<TabId, mpsc::Sender<OverlayMsg>>,
    events: broadcast::Sender<CaptureEvent>,
}

impl CoordinatorActor {
    async fn run(mut self, mut rx: mpsc::Receiver<CoordinatorMsg>) {
        tracing::debug!("[Coordinator] task started");
        while let Some(msg) = rx.recv().await {
            self.handle(msg).await;
        }
        tracing::debug!("[Coordinator] all handles dropped, task ending");
    }

    async fn handle(&mut self, msg: CoordinatorMsg) {
        match msg {
            CoordinatorMsg::BeginSession { tab, reply } => {
                let _ = reply.send(self.begin_session(tab));
            }
            CoordinatorMsg::EndSession { tab, reply } => {
                self.end_session(tab);
                let _ = reply.send(());
            }
            CoordinatorMsg::CurrentSession { reply } => {
                let _ = reply.send(self.session.clone());
            }
            CoordinatorMsg::PhaseReport {
                tab,
                phase,
                selection,
            } => {
                self.apply_phase_report(tab, phase, selection);
            }
            CoordinatorMsg::RegisterOverlay { tab, sender, reply } => {
                let _ = reply.send(self.register_overlay(tab, sender));
            }
            CoordinatorMsg::TabClosed { tab, reply } => {
                self.tab_closed(tab);
                let _ = reply.send(());
            }
            CoordinatorMsg::ForwardCommand {
                tab,
                command,
                reply,
            } => {
                let Some(overlay) = self.overlays.get(&tab).cloned() else {
                    tracing::debug!("[Coordinator] forward {command:?} to {tab}: no listener");
                    let _ = reply.send(ForwardOutcome::NoListener);
                    return;
                };
                // Relayed off the main loop so a slow or silent overlay
                // never stalls other coordinator traffic.
                let wait = self.config.reply_timeout();
                tokio::spawn(async move {
                    let _ = reply.send(relay_command(overlay, tab, command, wait).await);
                });
            }
            CoordinatorMsg::RequestFullFrame { tab, reply } => {
                let source = Arc::clone(&self.frame_source);
                tokio::spawn(async move {
                    let result = source.capture_visible(tab).await;
                    if let Err(e) = &result {
                        tracing::error!("[Coordinator] full-frame capture for {tab} failed: {e}");
                    }
                    let _ = reply.send(result);
                });
            }
            CoordinatorMsg::StoreArtifact { artifact, reply } => {
                // Stores stay on the main loop: writes serialize, and each
                // notification goes out only after its write completed.
                let _ = reply.send(self.store_artifact(artifact).await);
            }
            CoordinatorMsg::ClearSlot { reply } => {
                let result = self.slot.clear().await;
                if result.is_ok() {
                    tracing::info!("[Coordinator] slot cleared");
                }
                let _ = reply.send(result);
            }
        }
    }

    fn begin_session(&mut self, tab: TabId) -> SessionGrant {
        if let Some(existing) = &self.session {
            if existing.tab == tab {
                tracing::debug!(
                    "[Coordinator] begin_session: {tab} already holds session {}",
                    existing.id
                );
                return SessionGrant::AlreadyActive(existing.clone());
            }
            tracing::info!(
                "[Coordinator] begin_session: {tab} refused, session {} lives on {}",
                existing.id,
                existing.tab
            );
            return SessionGrant::Busy(existing.clone());
        }

        let session = Session::new(tab);
        tracing::info!("[Coordinator] session {} started for {tab}", session.id);
        self.session = Some(session.clone());
        SessionGrant::Granted(session)
    }

    fn end_session(&mut self, tab: TabId) {
        if let Some(session) = self.session.take() {
            if session.tab == tab {
                tracing::info!("[Coordinator] session {} ended for {tab}", session.id);
            } else {
                // Not ours to end; put it back.
                self.session = Some(session);
            }
        }
    }

    fn apply_phase_report(
        &mut self,
        tab: TabId,
        phase: OverlayPhase,
        selection: Option<SelectionRect>,
    ) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("[Coordinator] phase report {phase} from {tab}: no live session");
            return;
        };
        if session.tab != tab {
            tracing::debug!(
                "[Coordinator] phase report {phase} from {tab} ignored, session belongs to {}",
                session.tab
            );
            return;
        }

        session.apply_phase(phase, selection);
        tracing::debug!("[Coordinator] session {} now {phase}", session.id);

        if !session.is_live() {
            let id = session.id.clone();
            self.session = None;
            tracing::info!("[Coordinator] session {id} destroyed after teardown");
        }
    }

    fn register_overlay(&mut self, tab: TabId, sender: mpsc::Sender<OverlayMsg>) -> bool {
        match self.overlays.entry(tab) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_closed() {
                    // Stale registration from a dead task; replace it.
                    entry.insert(sender);
                    tracing::debug!("[Coordinator] replaced dead overlay listener for {tab}");
                    true
                } else {
                    tracing::debug!("[Coordinator] overlay listener for {tab} already registered");
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(sender);
                tracing::info!("[Coordinator] overlay listener registered for {tab}");
                true
            }
        }
    }

    fn tab_closed(&mut self, tab: TabId) {
        if let Some(sender) = self.overlays.remove(&tab) {
            let _ = sender.try_send(OverlayMsg::Shutdown);
            tracing::info!("[Coordinator] {tab} closed, overlay listener dropped");
        }
        if self.session.as_ref().is_some_and(|s| s.tab == tab) {
            let session = self.session.take();
            if let Some(session) = session {
                tracing::info!(
                    "[Coordinator] session {} destroyed, {tab} went away",
                    session.id
                );
            }
        }
    }

    async fn store_artifact(&mut self, artifact: Artifact) -> Result<()> {
        let (width, height) = (artifact.width, artifact.height);

        // The slot write must complete before anyone hears about it.
        self.slot.put(artifact.clone()).await?;

        let notified = self
            .events
            .send(CaptureEvent::ScreenshotCaptured { artifact })
            .unwrap_or(0);
        tracing::info!(
            "[Coordinator] stored {width}x{height} artifact, notified {notified} subscriber(s)"
        );
        Ok(())
    }
}

/// Delivers one command to one overlay and waits for the ack, all inside
/// the bounded wait.
async fn relay_command(
    overlay: mpsc::Sender<OverlayMsg>,
    tab: TabId,
    command: OverlayCommand,
    wait: Duration,
) -> ForwardOutcome {
    let attempt = async {
        let (ack_tx, ack_rx) = oneshot::channel();
        overlay
            .send(OverlayMsg::Command {
                command,
                ack: ack_tx,
            })
            .await
            .ok()?;
        ack_rx.await.ok()
    };

    match timeout(wait, attempt).await {
        Ok(Some(ack)) => ForwardOutcome::Acked(ack),
        Ok(None) => {
            tracing::debug!("[Coordinator] forward {command:?} to {tab}: listener gone");
            ForwardOutcome::NoListener
        }
        Err(_) => {
            tracing::debug!(
                "[Coordinator] forward {command:?} to {tab}: no ack within {wait:?}"
            );
            ForwardOutcome::NoListener
        }
    }
}
