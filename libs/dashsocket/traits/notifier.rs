use crate::error::{Result, SocketError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Desktop notification permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not decided yet; notifications are not shown
    #[default]
    Default,
    Granted,
    Denied,
}

/// Trait for desktop notification backends
///
/// The router checks `permission()` before every attempt and never lets a
/// failure from `show` reach subscribers.
pub trait DesktopNotifier: Send + Sync {
    /// Current permission state
    fn permission(&self) -> Permission;

    /// Ask for permission (called once at startup)
    fn request_permission(&self) -> Permission;

    /// Display a notification
    fn show(&self, title: &str, body: &str) -> Result<()>;
}

/// Notifier that writes notifications to the tracing output
///
/// A pending request resolves to the configured answer.
pub struct LogNotifier {
    permission: RwLock<Permission>,
    answer: Permission,
}

impl LogNotifier {
    /// Create a notifier that answers permission requests with `answer`
    pub fn new(answer: Permission) -> Self {
        Self {
            permission: RwLock::new(Permission::Default),
            answer,
        }
    }

    /// Create a notifier whose permission is already settled
    pub fn with_permission(permission: Permission) -> Self {
        Self {
            permission: RwLock::new(permission),
            answer: permission,
        }
    }
}

impl DesktopNotifier for LogNotifier {
    fn permission(&self) -> Permission {
        *self.permission.read()
    }

    fn request_permission(&self) -> Permission {
        let mut current = self.permission.write();
        if *current == Permission::Default {
            *current = self.answer;
        }
        info!("Notification permission: {:?}", *current);
        *current
    }

    fn show(&self, title: &str, body: &str) -> Result<()> {
        let permission = self.permission();
        if permission != Permission::Granted {
            return Err(SocketError::Notification(format!(
                "permission is {:?}",
                permission
            )));
        }
        info!("[desktop] {}: {}", title, body);
        Ok(())
    }
}

/// Notifier with notifications switched off
pub struct NoopNotifier;

impl DesktopNotifier for NoopNotifier {
    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn show(&self, _title: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_settles_default_only() {
        let notifier = LogNotifier::new(Permission::Granted);
        assert_eq!(notifier.permission(), Permission::Default);
        assert_eq!(notifier.request_permission(), Permission::Granted);

        let denied = LogNotifier::with_permission(Permission::Denied);
        assert_eq!(denied.request_permission(), Permission::Denied);
    }

    #[test]
    fn test_show_requires_granted_permission() {
        let notifier = LogNotifier::new(Permission::Granted);
        assert!(matches!(
            notifier.show("New Order Received", "Order #1"),
            Err(SocketError::Notification(_))
        ));

        notifier.request_permission();
        assert!(notifier.show("New Order Received", "Order #1").is_ok());
    }
}
