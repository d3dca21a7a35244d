//! Operator notices with a fixed time-to-live.

use std::fmt;

use chrono::{DateTime, Utc};

/// How long a notice stays visible before the next tick clears it.
pub const NOTICE_TTL_MS: i64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient message shown to the operator.
///
/// Notices never expire themselves; the owner checks [`Notice::is_expired`]
/// on its clock tick and drops them. At most one notice is live at a time,
/// so posting a new one replaces whatever was showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub posted_at: DateTime<Utc>,
}

impl Notice {
    pub fn success(text: impl Into<String>, posted_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Success,
            posted_at,
        }
    }

    pub fn error(text: impl Into<String>, posted_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Error,
            posted_at,
        }
    }

    pub fn info(text: impl Into<String>, posted_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Info,
            posted_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl_ms: i64) -> bool {
        (now - self.posted_at).num_milliseconds() >= ttl_ms
    }
}
