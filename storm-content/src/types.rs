// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bundle and update result types

use std::fmt;

/// Kind of bundle requested from the CMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    /// Complete content snapshot
    Full,
    /// Changes published after `since`
    Delta {
        /// Timestamp of the last applied update
        since: i64,
    },
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleKind::Full => write!(f, "full bundle"),
            BundleKind::Delta { since } => write!(f, "delta since {}", since),
        }
    }
}

/// Downloaded bundle awaiting installation
#[derive(Debug, Clone)]
pub struct Bundle {
    /// What was requested
    pub kind: BundleKind,
    /// Compressed archive bytes
    pub data: Vec<u8>,
}

impl Bundle {
    /// Create a bundle
    pub fn new(kind: BundleKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }
}

/// Summary of an installed update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Bundle kind that was installed
    pub kind: BundleKind,
    /// Size of the downloaded archive in bytes
    pub size_bytes: u64,
}

/// How an update check ended, when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A bundle was downloaded and installed
    Completed(UpdateReport),
    /// The server had nothing newer
    UpToDate,
    /// The request was cancelled before the download finished
    Cancelled,
}

impl UpdateOutcome {
    /// Whether new content was installed
    pub fn is_completed(&self) -> bool {
        matches!(self, UpdateOutcome::Completed(_))
    }
}

/// Whether the coordinator has a request in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    /// No request outstanding
    Idle,
    /// A bundle request is in progress
    Requesting,
    /// A downloaded bundle is being installed; no longer cancellable
    Installing,
}
