//! Notification System
//!
//! Records the outcome of every mutation (create, delete, comment, ...) as a
//! notification. The newest one is shown as a footer toast and the full,
//! bounded history can be opened as a panel.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

const MAX_HISTORY: usize = 50;
const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Kind of mutation a notification reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Create,
    Delete,
    BulkDelete,
    Comment,
    Favorite,
    Edit,
    Toggle,
}

impl OperationType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Delete => "Delete",
            Self::BulkDelete => "Bulk delete",
            Self::Comment => "Comment",
            Self::Favorite => "Favorite",
            Self::Edit => "Edit",
            Self::Toggle => "Toggle",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Create => "Created",
            Self::Delete => "Deleted",
            Self::BulkDelete => "Deleted",
            Self::Comment => "Commented on",
            Self::Favorite => "Updated",
            Self::Edit => "Edited",
            Self::Toggle => "Updated",
        }
    }

    pub fn present_participle(&self) -> &'static str {
        match self {
            Self::Create => "Creating",
            Self::Delete | Self::BulkDelete => "Deleting",
            Self::Comment => "Commenting on",
            Self::Favorite | Self::Toggle => "Updating",
            Self::Edit => "Editing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Request sent, no response yet
    Pending,
    Success,
    /// Failed with a user-facing message
    Error(String),
}

impl NotificationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "◯",
            Self::Success => "✓",
            Self::Error(_) => "✗",
        }
    }
}

/// A single notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub operation_type: OperationType,
    /// Collection the mutation targeted (`posts`, `comments`, ...)
    pub resource_type: String,
    /// Human label for the target (`#5`, `3 items`, a title)
    pub target: String,
    pub status: NotificationStatus,
    /// Extra detail shown in the history panel
    pub message: Option<String>,
    pub timestamp: DateTime<Local>,
    started: Instant,
    finished: Option<Instant>,
}

impl Notification {
    pub fn new(operation_type: OperationType, resource_type: &str, target: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation_type,
            resource_type: resource_type.to_string(),
            target: target.to_string(),
            status: NotificationStatus::Pending,
            message: None,
            timestamp: Local::now(),
            started: Instant::now(),
            finished: None,
        }
    }

    pub fn set_success(&mut self, message: Option<String>) {
        self.status = NotificationStatus::Success;
        self.message = message;
        self.finished = Some(Instant::now());
    }

    pub fn set_error(&mut self, error: String) {
        self.status = NotificationStatus::Error(error);
        self.finished = Some(Instant::now());
    }

    /// Time from submission to resolution (or until now while pending)
    pub fn duration(&self) -> Duration {
        self.finished
            .unwrap_or_else(Instant::now)
            .duration_since(self.started)
    }

    pub fn duration_display(&self) -> String {
        let d = self.duration();
        if d.as_secs() < 1 {
            format!("{}ms", d.as_millis())
        } else {
            format!("{}s", d.as_secs())
        }
    }

    /// One-line form used by the footer toast
    pub fn toast_message(&self) -> String {
        let icon = self.status.icon();
        match &self.status {
            NotificationStatus::Pending => format!(
                "{} {} {}...",
                icon,
                self.operation_type.present_participle(),
                self.target
            ),
            NotificationStatus::Success => format!(
                "{} {} {} ({})",
                icon,
                self.operation_type.past_tense(),
                self.target,
                self.duration_display()
            ),
            NotificationStatus::Error(err) => format!(
                "{} {} {} failed: {}",
                icon,
                self.operation_type.display_name(),
                self.target,
                err
            ),
        }
    }
}

/// Notification manager
pub struct NotificationManager {
    /// All notifications (recent first)
    pub notifications: VecDeque<Notification>,
    pub max_history: usize,
    pub toast_duration: Duration,
    last_toast_time: Option<Instant>,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            notifications: VecDeque::new(),
            max_history: MAX_HISTORY,
            toast_duration: TOAST_DURATION,
            last_toast_time: None,
        }
    }

    /// Record a pending operation and show it as the toast
    pub fn start(&mut self, operation_type: OperationType, resource_type: &str, target: &str) -> Uuid {
        let notification = Notification::new(operation_type, resource_type, target);
        let id = notification.id;
        self.notifications.push_front(notification);
        self.last_toast_time = Some(Instant::now());
        self.trim_history();
        id
    }

    /// Record an operation that completed synchronously (local-only edits)
    pub fn record_success(
        &mut self,
        operation_type: OperationType,
        resource_type: &str,
        target: &str,
        message: Option<String>,
    ) -> Uuid {
        let id = self.start(operation_type, resource_type, target);
        self.mark_success(id, message);
        id
    }

    pub fn mark_success(&mut self, id: Uuid, message: Option<String>) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_success(message);
            self.last_toast_time = Some(Instant::now());
        }
    }

    pub fn mark_error(&mut self, id: Uuid, error: String) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            tracing::warn!(
                "{} {} failed: {}",
                notif.operation_type.display_name(),
                notif.target,
                error
            );
            notif.set_error(error);
            self.last_toast_time = Some(Instant::now());
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Most recent notification while its toast is still visible
    pub fn current_toast(&self) -> Option<&Notification> {
        let last_time = self.last_toast_time?;
        if last_time.elapsed() > self.toast_duration {
            return None;
        }
        self.notifications.front()
    }

    pub fn pending_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| !n.status.is_terminal())
            .count()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
        self.last_toast_time = None;
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    /// Drop the oldest finished entries first
    fn trim_history(&mut self) {
        while self.notifications.len() > self.max_history {
            if let Some(pos) = self.notifications.iter().rposition(|n| n.status.is_terminal()) {
                self.notifications.remove(pos);
            } else {
                self.notifications.pop_back();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_lifecycle() {
        let mut manager = NotificationManager::new();
        let id = manager.start(OperationType::Delete, "posts", "#5");

        assert_eq!(manager.pending_count(), 1);
        assert_eq!(manager.get(id).unwrap().status, NotificationStatus::Pending);
        assert!(manager.current_toast().unwrap().toast_message().contains("Deleting #5"));

        manager.mark_success(id, None);
        assert_eq!(manager.get(id).unwrap().status, NotificationStatus::Success);
        assert_eq!(manager.pending_count(), 0);
        assert!(manager.current_toast().unwrap().toast_message().contains("Deleted #5"));
    }

    #[test]
    fn test_error_message_in_toast() {
        let mut manager = NotificationManager::new();
        let id = manager.start(OperationType::Create, "todos", "\"buy milk\"");
        manager.mark_error(id, "Server error (500)".to_string());

        let toast = manager.current_toast().unwrap().toast_message();
        assert!(toast.starts_with("✗"));
        assert!(toast.contains("Server error (500)"));
    }

    #[test]
    fn test_toast_expires() {
        let mut manager = NotificationManager::new();
        manager.toast_duration = Duration::ZERO;
        manager.record_success(OperationType::Edit, "posts", "#1", None);
        std::thread::sleep(Duration::from_millis(5));
        assert!(manager.current_toast().is_none());
        assert!(manager.has_notifications());
    }

    #[test]
    fn test_history_is_bounded_and_keeps_pending() {
        let mut manager = NotificationManager::new();
        manager.max_history = 3;
        let pending = manager.start(OperationType::BulkDelete, "posts", "3 items");
        for i in 0..5 {
            manager.record_success(OperationType::Favorite, "posts", &format!("#{}", i), None);
        }
        assert_eq!(manager.notifications.len(), 3);
        assert!(manager.get(pending).is_some());
    }
}
