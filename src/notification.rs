//! Non-fatal findings of load, repair and merge operations.
//!
//! Recoverable anomalies (duplicate table records, healed files, skipped
//! merge sources) are recorded here instead of failing the operation.
//! After loading, inspect [`Document::notifications`](crate::Document).

use std::fmt;

/// Category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// Input was inconsistent and something was dropped or ignored
    Warning,
    /// A repair pass changed the document
    Repaired,
    /// Content skipped because the operation cannot handle it
    NotSupported,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "Warning"),
            Self::Repaired => write!(f, "Repaired"),
            Self::NotSupported => write!(f, "NotSupported"),
        }
    }
}

/// One recorded finding
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub notification_type: NotificationType,
    pub message: String,
}

impl Notification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.notification_type, self.message)
    }
}

/// Ordered list of notifications
#[derive(Debug, Clone, Default)]
pub struct NotificationCollection {
    items: Vec<Notification>,
}

impl NotificationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        self.items.push(Notification::new(notification_type, message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notify(NotificationType::Warning, message);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }

    /// Notifications of one category
    pub fn of_type(&self, nt: NotificationType) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.notification_type == nt).collect()
    }

    pub fn has_type(&self, nt: NotificationType) -> bool {
        self.items.iter().any(|n| n.notification_type == nt)
    }

    /// Append all notifications of `other`.
    pub fn append(&mut self, other: NotificationCollection) {
        self.items.extend(other.items);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a NotificationCollection {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_filters_by_type() {
        let mut c = NotificationCollection::new();
        assert!(c.is_empty());

        c.warn("duplicate layer 'WALLS' ignored");
        c.notify(NotificationType::Repaired, "created layer 'DISTO'");
        c.warn("unterminated follower chain");

        assert_eq!(c.len(), 3);
        assert_eq!(c.of_type(NotificationType::Warning).len(), 2);
        assert!(c.has_type(NotificationType::Repaired));
        assert!(!c.has_type(NotificationType::NotSupported));
    }

    #[test]
    fn test_display() {
        let n = Notification::new(NotificationType::NotSupported, "IMAGE skipped");
        assert_eq!(n.to_string(), "[NotSupported] IMAGE skipped");
    }
}
