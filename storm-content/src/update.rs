// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Update coordination
//!
//! The coordinator decides between a full bundle and a timestamp-based
//! delta, runs the download, and hands the result to the installer. At most
//! one request is in flight; a concurrent check is refused rather than
//! queued. Cancelling drops the download future, so the transport aborts
//! its transfer and no result reaches the installer or the caller. Once
//! installation has started the request can no longer be cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::fetcher::{BundleTransport, FetchError};
use super::installer::{BundleInstaller, InstallError};
use super::manifest::TimestampSource;
use super::types::{Bundle, BundleKind, UpdateOutcome, UpdateReport, UpdateState};

struct InFlight {
    id: u64,
    token: CancellationToken,
    /// Past the point of cancellation
    installing: bool,
}

/// Clears the in-flight slot when the request ends, however it ends
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<InFlight>>,
    id: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|f| f.id == self.id) {
            *slot = None;
        }
    }
}

/// Drives bundle downloads to completion or cancellation
pub struct UpdateCoordinator {
    timestamps: Arc<dyn TimestampSource>,
    transport: Arc<dyn BundleTransport>,
    installer: Arc<dyn BundleInstaller>,
    in_flight: Mutex<Option<InFlight>>,
    next_id: AtomicU64,
}

impl UpdateCoordinator {
    /// Create a coordinator over the given collaborators
    pub fn new(
        timestamps: Arc<dyn TimestampSource>,
        transport: Arc<dyn BundleTransport>,
        installer: Arc<dyn BundleInstaller>,
    ) -> Self {
        Self {
            timestamps,
            transport,
            installer,
            in_flight: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Download and install the latest full bundle
    ///
    /// Ignores the local timestamp, so the result may be a bundle published
    /// for a newer app binary.
    pub async fn check_for_bundle(&self) -> Result<UpdateOutcome, UpdateError> {
        self.run(BundleKind::Full).await
    }

    /// Download and install changes since the installed bundle's timestamp
    ///
    /// Fails with [`UpdateError::InvalidState`] without touching the
    /// network when no timestamp is available.
    pub async fn check_for_updates(&self) -> Result<UpdateOutcome, UpdateError> {
        let Some(since) = self.timestamps.read_timestamp() else {
            warn!("Cannot check for updates without a timestamp");
            return Err(UpdateError::InvalidState(
                "cannot check for updates without a timestamp",
            ));
        };
        self.check_for_updates_since(since).await
    }

    /// Download and install changes published after `since`
    pub async fn check_for_updates_since(&self, since: i64) -> Result<UpdateOutcome, UpdateError> {
        self.run(BundleKind::Delta { since }).await
    }

    /// Cancel the in-flight request, if any
    ///
    /// Returns true if a request was cancelled, in which case that request
    /// resolves to [`UpdateOutcome::Cancelled`]. A request that is already
    /// installing is not cancelled.
    pub fn cancel_pending_requests(&self) -> bool {
        match self.in_flight.lock().as_ref() {
            Some(flight) if !flight.installing && !flight.token.is_cancelled() => {
                debug!("Cancelling update request {}", flight.id);
                flight.token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Current request state
    pub fn state(&self) -> UpdateState {
        match self.in_flight.lock().as_ref() {
            None => UpdateState::Idle,
            Some(flight) if flight.installing => UpdateState::Installing,
            Some(_) => UpdateState::Requesting,
        }
    }

    fn begin(&self) -> Result<(InFlightGuard<'_>, CancellationToken), UpdateError> {
        let mut slot = self.in_flight.lock();
        if slot.is_some() {
            return Err(UpdateError::AlreadyInProgress);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        *slot = Some(InFlight {
            id,
            token: token.clone(),
            installing: false,
        });
        Ok((
            InFlightGuard {
                slot: &self.in_flight,
                id,
            },
            token,
        ))
    }

    /// Make request `id` non-cancellable unless it was cancelled first
    ///
    /// Checked and set under the same lock `cancel_pending_requests` takes,
    /// so a cancel either lands before this point or reports false.
    fn settle(&self, id: u64) -> bool {
        let mut slot = self.in_flight.lock();
        match slot.as_mut() {
            Some(flight) if flight.id == id && !flight.token.is_cancelled() => {
                flight.installing = true;
                true
            }
            _ => false,
        }
    }

    async fn run(&self, kind: BundleKind) -> Result<UpdateOutcome, UpdateError> {
        let (guard, token) = self.begin()?;
        info!("Requesting {}", kind);

        let fetched = {
            let fetch = async {
                match kind {
                    BundleKind::Full => self.transport.fetch_full().await,
                    BundleKind::Delta { since } => self.transport.fetch_delta(since).await,
                }
            };
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = fetch => Some(result),
            }
        };

        // A cancel that raced the end of the download still wins
        let result = match fetched {
            Some(result) if self.settle(guard.id) => result,
            _ => {
                info!("Request for {} cancelled", kind);
                return Ok(UpdateOutcome::Cancelled);
            }
        };

        let data = match result {
            Err(e) => {
                warn!("Fetching {} failed: {}", kind, e);
                return Err(e.into());
            }
            Ok(None) => {
                info!("Content is up to date ({})", kind);
                return Ok(UpdateOutcome::UpToDate);
            }
            Ok(Some(data)) => data,
        };

        let report = UpdateReport {
            kind,
            size_bytes: data.len() as u64,
        };
        let installer = Arc::clone(&self.installer);
        let bundle = Bundle::new(kind, data);
        tokio::task::spawn_blocking(move || installer.apply(&bundle))
            .await
            .map_err(|e| UpdateError::Install(InstallError::Interrupted(e.to_string())))??;

        Ok(UpdateOutcome::Completed(report))
    }
}

/// Errors surfaced by update checks
#[derive(Debug, Error)]
pub enum UpdateError {
    /// A precondition for the request was not met
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    /// Another update request is still running
    #[error("An update request is already in progress")]
    AlreadyInProgress,

    /// Download failed
    #[error("Transport error: {0}")]
    Transport(#[from] FetchError),

    /// Installation failed
    #[error("Install error: {0}")]
    Install(#[from] InstallError),
}
