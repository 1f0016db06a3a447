//! The page-side drawing overlay.
//!
//! Each injected overlay is one task owning its drag state machine. It
//! receives forwarded commands from the coordinator and local pointer and
//! keyboard input from the page, and reports phase changes back. On a valid
//! pointer-up it hands the capture pipeline off to a detached task and
//! tears itself down immediately, so teardown never waits on the capture
//! and a racing cancel cannot abort it.

use tokio::sync::{mpsc, oneshot};

use tabsnip_core::codec;
use tabsnip_core::error::{Result, SnipError};
use tabsnip_core::frame::TabId;
use tabsnip_core::geometry::{Point, SelectionRect};
use tabsnip_core::protocol::{OverlayAck, OverlayCommand};
use tabsnip_core::session::OverlayPhase;

use crate::coordinator::{CHANNEL_CAPACITY, CoordinatorHandle};

/// Per-page options fixed at injection time.
#[derive(Debug, Clone, Copy)]
pub struct OverlayOptions {
    /// Ratio between device pixels and viewport pixels on this page
    pub device_pixel_ratio: f64,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
        }
    }
}

/// Everything an overlay task reacts to.
pub(crate) enum OverlayMsg {
    /// A command forwarded by the coordinator, acked synchronously
    Command {
        command: OverlayCommand,
        ack: oneshot::Sender<OverlayAck>,
    },
    /// Local page input
    Input(OverlayInput),
    /// Phase probe, answered from the task's own view
    Phase { reply: oneshot::Sender<OverlayPhase> },
    /// The page is going away
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum OverlayInput {
    PointerDown(Point),
    PointerMoved(Point),
    PointerUp,
    Escape,
}

/// Result of [`OverlayController::inject`].
pub enum InjectOutcome {
    /// The overlay script was injected and is now listening
    Injected(OverlayHandle),
    /// A listener for this tab already exists; nothing was injected
    AlreadyPresent,
}

/// Injects overlay scripts into pages.
pub struct OverlayController;

impl OverlayController {
    /// Registers an overlay listener for `tab` and spawns its task.
    ///
    /// Injection is idempotent per tab: when a live listener is already
    /// registered this is a no-op and the existing listener keeps serving.
    pub async fn inject(
        coordinator: &CoordinatorHandle,
        tab: TabId,
        options: OverlayOptions,
    ) -> Result<InjectOutcome> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        if !coordinator.register_overlay(tab, tx.clone()).await? {
            tracing::debug!("[Overlay] {tab} already has a listener, skipping injection");
            return Ok(InjectOutcome::AlreadyPresent);
        }

        let actor = OverlayActor {
            tab,
            coordinator: coordinator.clone(),
            options,
            phase: OverlayPhase::Idle,
            drag_origin: None,
            live_rect: None,
        };
        tokio::spawn(actor.run(rx));
        tracing::info!(
            "[Overlay] injected into {tab} (device pixel ratio {})",
            options.device_pixel_ratio
        );

        Ok(InjectOutcome::Injected(OverlayHandle { tx }))
    }
}

/// Drives page input into an overlay task, the way a user would.
#[derive(Debug, Clone)]
pub struct OverlayHandle {
    tx: mpsc::Sender<OverlayMsg>,
}

impl OverlayHandle {
    pub async fn pointer_down(&self, x: f64, y: f64) -> Result<()> {
        self.input(OverlayInput::PointerDown(Point::new(x, y))).await
    }

    pub async fn pointer_moved(&self, x: f64, y: f64) -> Result<()> {
        self.input(OverlayInput::PointerMoved(Point::new(x, y))).await
    }

    pub async fn pointer_up(&self) -> Result<()> {
        self.input(OverlayInput::PointerUp).await
    }

    pub async fn escape(&self) -> Result<()> {
        self.input(OverlayInput::Escape).await
    }

    /// Current phase as the overlay task sees it. Because the task handles
    /// its inbox in order, this also acts as a barrier: once it answers,
    /// all input sent earlier through this handle has been processed.
    pub async fn phase(&self) -> Result<OverlayPhase> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(OverlayMsg::Phase { reply })
            .await
            .map_err(|_| Self::gone())?;
        rx.await.map_err(|_| Self::gone())
    }

    async fn input(&self, input: OverlayInput) -> Result<()> {
        self.tx
            .send(OverlayMsg::Input(input))
            .await
            .map_err(|_| Self::gone())
    }

    fn gone() -> SnipError {
        SnipError::internal("overlay task is gone")
    }
}

struct OverlayActor {
    tab: TabId,
    coordinator: CoordinatorHandle,
    options: OverlayOptions,
    phase: OverlayPhase,
    drag_origin: Option<Point>,
    live_rect: Option<SelectionRect>,
}

impl OverlayActor {
    async fn run(mut self, mut rx: mpsc::Receiver<OverlayMsg>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                OverlayMsg::Command { command, ack } => {
                    let response = self.handle_command(command).await;
                    let _ = ack.send(response);
                }
                OverlayMsg::Input(input) => self.handle_input(input).await,
                OverlayMsg::Phase { reply } => {
                    let _ = reply.send(self.phase);
                }
                OverlayMsg::Shutdown => break,
            }
        }
        tracing::debug!("[Overlay] listener for {} shut down", self.tab);
    }

    /// Commands are acked immediately; an ack confirms acceptance, never
    /// that a capture finished.
    async fn handle_command(&mut self, command: OverlayCommand) -> OverlayAck {
        match command {
            OverlayCommand::StartDrawing => {
                match self.phase {
                    OverlayPhase::Idle | OverlayPhase::TornDown => {
                        self.phase = OverlayPhase::Armed;
                        self.report(None).await;
                        tracing::info!("[Overlay] {} armed", self.tab);
                    }
                    // A second start while live leaves the overlay untouched.
                    OverlayPhase::Armed | OverlayPhase::Dragging | OverlayPhase::Finalized => {
                        tracing::debug!(
                            "[Overlay] {} start ignored, already {}",
                            self.tab,
                            self.phase
                        );
                    }
                }
                OverlayAck::Started
            }
            OverlayCommand::CancelDrawing => {
                self.teardown("cancelled").await;
                OverlayAck::Cancelled
            }
        }
    }

    async fn handle_input(&mut self, input: OverlayInput) {
        match input {
            OverlayInput::PointerDown(point) => {
                if self.phase != OverlayPhase::Armed {
                    tracing::trace!("[Overlay] {} pointer down ignored while {}", self.tab, self.phase);
                    return;
                }
                self.drag_origin = Some(point);
                self.live_rect = Some(SelectionRect::from_corners(point, point));
                self.phase = OverlayPhase::Dragging;
                self.report(None).await;
            }
            OverlayInput::PointerMoved(point) => {
                if self.phase != OverlayPhase::Dragging {
                    return;
                }
                let Some(origin) = self.drag_origin else {
                    return;
                };
                let rect = SelectionRect::from_corners(origin, point);
                tracing::trace!("[Overlay] {} live rect {rect}", self.tab);
                self.live_rect = Some(rect);
            }
            OverlayInput::PointerUp => {
                if self.phase != OverlayPhase::Dragging {
                    tracing::trace!("[Overlay] {} pointer up ignored while {}", self.tab, self.phase);
                    return;
                }
                self.finalize().await;
            }
            OverlayInput::Escape => {
                if matches!(self.phase, OverlayPhase::Armed | OverlayPhase::Dragging) {
                    self.teardown("escape").await;
                }
            }
        }
    }

    async fn finalize(&mut self) {
        let Some(rect) = self.live_rect else {
            self.teardown("empty drag").await;
            return;
        };

        self.phase = OverlayPhase::Finalized;
        self.report(Some(rect)).await;

        if !rect.meets_minimum() {
            tracing::info!(
                "[Overlay] {} selection {rect} below minimum, treating as a stray click",
                self.tab
            );
            self.teardown("selection too small").await;
            return;
        }

        // The pipeline outlives the overlay: teardown never waits on it,
        // and a cancel arriving from here on cannot abort it.
        let coordinator = self.coordinator.clone();
        let tab = self.tab;
        let scale = self.options.device_pixel_ratio;
        tokio::spawn(async move {
            run_capture_pipeline(coordinator, tab, rect, scale).await;
        });

        self.teardown("selection handed off").await;
    }

    /// Removes the overlay and resets drag state. Safe to call repeatedly;
    /// a teardown with nothing up finds nothing to remove.
    async fn teardown(&mut self, reason: &str) {
        if self.phase == OverlayPhase::Idle {
            tracing::debug!("[Overlay] {} teardown ({reason}): nothing to remove", self.tab);
            return;
        }

        self.phase = OverlayPhase::TornDown;
        self.drag_origin = None;
        self.live_rect = None;
        self.report(None).await;

        // The page rests at Idle; the listener itself stays registered.
        self.phase = OverlayPhase::Idle;
        tracing::info!("[Overlay] {} torn down ({reason})", self.tab);
    }

    async fn report(&self, selection: Option<SelectionRect>) {
        self.coordinator
            .report_phase(self.tab, self.phase, selection)
            .await;
    }
}

/// Full-frame capture, crop, store. Failures are logged and abandon the
/// attempt; the slot keeps its previous content and the page is already
/// free for a fresh try.
async fn run_capture_pipeline(
    coordinator: CoordinatorHandle,
    tab: TabId,
    selection: SelectionRect,
    device_pixel_ratio: f64,
) {
    let frame = match coordinator.request_full_frame(tab).await {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("[Overlay] capture for {tab} failed: {e}");
            return;
        }
    };

    let artifact = match codec::crop_frame(&frame, &selection, device_pixel_ratio) {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::error!("[Overlay] crop of {selection} for {tab} failed: {e}");
            return;
        }
    };

    if let Err(e) = coordinator.store_artifact(artifact).await {
        tracing::error!("[Overlay] storing artifact for {tab} failed: {e}");
    }
}
