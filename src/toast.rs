//! Transient notifications.
//!
//! Toasts stack independently: no deduplication, no rate limiting. Each one
//! stays fully visible for `ttl`, fades for `fade`, then is gone. Every toast
//! is also emitted as a tracing event.

use crate::markup::plain;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_TTL: Duration = Duration::from_millis(3000);
pub const FADE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastKind::Success => "✔",
            ToastKind::Error => "✖",
            ToastKind::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Fading,
    Gone,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub created: Instant,
}

#[derive(Debug)]
pub struct ToastManager {
    toasts: Vec<Toast>,
    next_id: u64,
    ttl: Duration,
    fade: Duration,
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ToastManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 0,
            ttl,
            fade: FADE,
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl AsRef<str>) -> u64 {
        self.push_at(kind, message, Instant::now())
    }

    /// Push a toast created at `now`, dropping those already gone by then.
    pub fn push_at(&mut self, kind: ToastKind, message: impl AsRef<str>, now: Instant) -> u64 {
        self.sweep(now);
        let message = plain(message.as_ref()).into_owned();
        match kind {
            ToastKind::Error => warn!(toast = %message, "Toast"),
            _ => info!(toast = %message, "Toast"),
        }

        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            kind,
            message,
            created: now,
        });
        id
    }

    pub fn success(&mut self, message: impl AsRef<str>) -> u64 {
        self.push(ToastKind::Success, message)
    }

    pub fn error(&mut self, message: impl AsRef<str>) -> u64 {
        self.push(ToastKind::Error, message)
    }

    pub fn info(&mut self, message: impl AsRef<str>) -> u64 {
        self.push(ToastKind::Info, message)
    }

    pub fn phase(&self, toast: &Toast, now: Instant) -> ToastPhase {
        let age = now.saturating_duration_since(toast.created);
        if age < self.ttl {
            ToastPhase::Visible
        } else if age < self.ttl + self.fade {
            ToastPhase::Fading
        } else {
            ToastPhase::Gone
        }
    }

    /// Drop toasts whose fade has finished.
    pub fn sweep(&mut self, now: Instant) {
        let (ttl, fade) = (self.ttl, self.fade);
        self.toasts
            .retain(|t| now.saturating_duration_since(t.created) < ttl + fade);
    }

    /// Toasts still on screen at `now`, oldest first.
    pub fn visible(&self, now: Instant) -> impl Iterator<Item = (&Toast, ToastPhase)> {
        self.toasts
            .iter()
            .map(move |t| (t, self.phase(t, now)))
            .filter(|(_, p)| *p != ToastPhase::Gone)
    }

    /// Remove and return every pending toast regardless of age.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn last(&self) -> Option<&Toast> {
        self.toasts.last()
    }
}
