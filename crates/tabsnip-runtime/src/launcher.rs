//! The popup-side launcher.
//!
//! A popup lives exactly long enough to start (or cancel) a capture. It
//! asks the coordinator for a session, forwards `start-drawing`, and when
//! the tab turns out to have no listener yet it injects the overlay, waits
//! a fixed beat, and retries once. Only an explicit `started` ack lets the
//! popup close.

use tabsnip_core::config::RuntimeConfig;
use tabsnip_core::error::Result;
use tabsnip_core::frame::TabId;
use tabsnip_core::protocol::{ForwardOutcome, OverlayAck, OverlayCommand};

use crate::coordinator::{CoordinatorHandle, SessionGrant};
use crate::overlay::{InjectOutcome, OverlayController, OverlayHandle, OverlayOptions};

/// How a capture start attempt ended, from the popup's point of view.
#[derive(Debug)]
pub enum StartOutcome {
    /// The overlay acknowledged; the popup can close
    Started {
        /// The handle when this call injected the overlay; `None` when an
        /// earlier injection was already listening
        overlay: Option<OverlayHandle>,
        /// The session this start belongs to
        session_id: String,
    },
    /// Another tab holds the live session; nothing was started
    Busy { other_tab: TabId },
    /// No listener acknowledged even after injection; the popup stays
    /// open and no session is left behind
    Failed { attempts: u32 },
}

/// Starts and cancels capture sessions the way the popup button does.
pub struct Launcher {
    coordinator: CoordinatorHandle,
    config: RuntimeConfig,
}

impl Launcher {
    pub fn new(coordinator: CoordinatorHandle, config: RuntimeConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Asks `tab` to start drawing, injecting the overlay when the first
    /// attempt finds no listener.
    ///
    /// The retry after injection waits a fixed delay so the fresh listener
    /// has time to register. When every attempt stays unanswered the
    /// pending session is destroyed again, leaving no phantom drawing
    /// state.
    pub async fn start_capture(&self, tab: TabId, options: OverlayOptions) -> Result<StartOutcome> {
        let session = match self.coordinator.begin_session(tab).await? {
            SessionGrant::Granted(session) => session,
            SessionGrant::AlreadyActive(session) => session,
            SessionGrant::Busy(session) => {
                tracing::info!(
                    "[Launcher] start for {tab} refused, session live on {}",
                    session.tab
                );
                return Ok(StartOutcome::Busy {
                    other_tab: session.tab,
                });
            }
        };

        if self.forward_start(tab).await? {
            tracing::info!("[Launcher] {tab} started drawing without injection");
            return Ok(StartOutcome::Started {
                overlay: None,
                session_id: session.id,
            });
        }

        // First visit: the page has no listener yet.
        tracing::info!("[Launcher] no listener on {tab}, injecting overlay");
        let injected = match OverlayController::inject(&self.coordinator, tab, options).await? {
            InjectOutcome::Injected(handle) => Some(handle),
            InjectOutcome::AlreadyPresent => None,
        };

        let retry = self.config.inject_retry;
        let mut attempts = 1;
        for _ in 0..retry.attempts {
            tokio::time::sleep(retry.delay()).await;
            attempts += 1;
            if self.forward_start(tab).await? {
                tracing::info!("[Launcher] {tab} started drawing after injection");
                return Ok(StartOutcome::Started {
                    overlay: injected,
                    session_id: session.id,
                });
            }
        }

        tracing::warn!(
            "[Launcher] {tab} never acknowledged after {attempts} attempts, aborting session {}",
            session.id
        );
        self.coordinator.end_session(tab).await?;
        Ok(StartOutcome::Failed { attempts })
    }

    /// Cancels whatever overlay is live on `tab`. Safe when none is: the
    /// outcome is [`ForwardOutcome::NoListener`] and nothing breaks.
    pub async fn cancel_capture(&self, tab: TabId) -> Result<ForwardOutcome> {
        self.coordinator
            .forward_command(tab, OverlayCommand::CancelDrawing)
            .await
    }

    async fn forward_start(&self, tab: TabId) -> Result<bool> {
        match self
            .coordinator
            .forward_command(tab, OverlayCommand::StartDrawing)
            .await?
        {
            ForwardOutcome::Acked(OverlayAck::Started) => Ok(true),
            ForwardOutcome::Acked(ack) => {
                tracing::warn!("[Launcher] {tab} answered start with unexpected {ack:?}");
                Ok(false)
            }
            ForwardOutcome::NoListener => Ok(false),
        }
    }
}
