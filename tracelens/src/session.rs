//! Session identity for event grouping

use tokio::sync::RwLock;
use uuid::Uuid;

/// Tracks the current logical session id
///
/// Holds at most one id, last writer wins. Sessions carry no state of their
/// own; they exist to group events causally.
pub struct SessionRegistry {
    current: RwLock<Option<String>>,
}

impl SessionRegistry {
    /// Create a registry with no active session
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Get the current session id, creating one if none exists
    pub async fn current(&self) -> String {
        let mut current = self.current.write().await;
        match current.as_ref() {
            Some(id) => id.clone(),
            None => {
                let id = Uuid::new_v4().to_string();
                *current = Some(id.clone());
                id
            }
        }
    }

    /// Get the current session id without creating one
    pub async fn active(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    /// Force a new session, discarding any previous id
    pub async fn start(&self) -> String {
        let id = Uuid::new_v4().to_string();
        *self.current.write().await = Some(id.clone());
        id
    }

    /// Clear the current session; the next access creates a fresh one
    pub async fn end(&self) {
        *self.current.write().await = None;
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_creates_lazily() {
        let registry = SessionRegistry::new();
        assert!(registry.active().await.is_none());

        let id = registry.current().await;
        assert!(!id.is_empty());
        assert_eq!(registry.active().await, Some(id.clone()));

        // Stable until ended
        assert_eq!(registry.current().await, id);
    }

    #[tokio::test]
    async fn test_start_supersedes_previous() {
        let registry = SessionRegistry::new();

        let first = registry.start().await;
        let second = registry.start().await;

        assert_ne!(first, second);
        assert_eq!(registry.active().await, Some(second));
    }

    #[tokio::test]
    async fn test_end_clears_and_next_access_differs() {
        let registry = SessionRegistry::new();

        let first = registry.current().await;
        registry.end().await;
        assert!(registry.active().await.is_none());

        let second = registry.current().await;
        assert_ne!(first, second);
    }
}
