//! Transient toast notifications with auto-expiry.

use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long a toast stays up unless dismissed earlier.
pub const TOAST_TTL: Duration = Duration::from_secs(6);

/// Visual kind of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// One notification in the overlay stack.
#[derive(Clone, Debug)]
pub struct Toast {
    /// Stable id used for manual dismissal.
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    /// When the toast was pushed; expiry is measured from here.
    pub created: Instant,
}

/// Stack of live toasts, newest last.
#[derive(Debug, Default)]
pub struct ToastStack {
    toasts: Vec<Toast>,
}

impl ToastStack {
    /// Push a new toast and return its id.
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created: Instant::now(),
        };
        let id = toast.id;
        self.toasts.push(toast);
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Error, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> Uuid {
        self.push(ToastKind::Info, message)
    }

    /// Dismiss one toast by id. Dismissing an already-removed toast is a
    /// no-op, so manual close racing the expiry timer is harmless.
    pub fn dismiss(&mut self, id: Uuid) {
        self.toasts.retain(|t| t.id != id);
    }

    /// Dismiss the oldest live toast, the one the close key targets.
    pub fn dismiss_oldest(&mut self) {
        if !self.toasts.is_empty() {
            self.toasts.remove(0);
        }
    }

    /// Drop every toast older than the TTL. Called once per draw tick.
    pub fn expire(&mut self, now: Instant) {
        self.toasts
            .retain(|t| now.duration_since(t.created) < TOAST_TTL);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_ttl() {
        let mut stack = ToastStack::default();
        stack.success("uploaded");
        assert_eq!(stack.len(), 1);

        // Just before the deadline the toast survives.
        let almost = Instant::now() + TOAST_TTL - Duration::from_secs(1);
        stack.expire(almost);
        assert_eq!(stack.len(), 1);

        // Past the deadline it is gone.
        let past = Instant::now() + TOAST_TTL + Duration::from_secs(1);
        stack.expire(past);
        assert!(stack.is_empty());
    }

    #[test]
    fn manual_dismiss_is_idempotent() {
        let mut stack = ToastStack::default();
        let id = stack.error("upload failed");
        stack.dismiss(id);
        assert!(stack.is_empty());
        // Second dismissal of the same id must be a quiet no-op.
        stack.dismiss(id);
        assert!(stack.is_empty());
    }

    #[test]
    fn dismiss_only_targets_the_given_id() {
        let mut stack = ToastStack::default();
        let first = stack.info("one");
        let _second = stack.info("two");
        stack.dismiss(first);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.iter().next().unwrap().message, "two");
    }

    #[test]
    fn dismiss_oldest_pops_front() {
        let mut stack = ToastStack::default();
        stack.info("one");
        stack.info("two");
        stack.dismiss_oldest();
        assert_eq!(stack.iter().next().unwrap().message, "two");
        stack.dismiss_oldest();
        stack.dismiss_oldest(); // empty stack is a no-op
        assert!(stack.is_empty());
    }
}
