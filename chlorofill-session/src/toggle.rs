//! In-flight guard for favorite toggles.

use std::sync::Arc;

use chlorofill_core::ContentType;
use dashmap::DashSet;

type ToggleKey = (ContentType, String);

/// Set of (content type, id) pairs with a toggle in flight.
///
/// Entries are created on acquire and removed when the [`ToggleGuard`] is
/// dropped, whichever way the toggle ends.
#[derive(Debug, Clone, Default)]
pub struct ToggleLock {
    in_flight: Arc<DashSet<ToggleKey>>,
}

impl ToggleLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `(content_type, id)`, or `None` if it is already claimed.
    pub fn try_acquire(&self, content_type: ContentType, id: &str) -> Option<ToggleGuard> {
        let key = (content_type, id.to_string());
        if !self.in_flight.insert(key.clone()) {
            return None;
        }
        Some(ToggleGuard {
            in_flight: Arc::clone(&self.in_flight),
            key,
        })
    }

    pub fn is_held(&self, content_type: ContentType, id: &str) -> bool {
        self.in_flight.contains(&(content_type, id.to_string()))
    }

    pub fn held_count(&self) -> usize {
        self.in_flight.len()
    }
}

/// Releases its toggle key on drop.
#[derive(Debug)]
pub struct ToggleGuard {
    in_flight: Arc<DashSet<ToggleKey>>,
    key: ToggleKey,
}

impl ToggleGuard {
    pub fn content_type(&self) -> ContentType {
        self.key.0
    }

    pub fn item_id(&self) -> &str {
        &self.key.1
    }
}

impl Drop for ToggleGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused_until_release() {
        let lock = ToggleLock::new();
        let guard = lock.try_acquire(ContentType::Meal, "52772").unwrap();
        assert!(lock.try_acquire(ContentType::Meal, "52772").is_none());
        assert!(lock.is_held(ContentType::Meal, "52772"));

        drop(guard);
        assert!(!lock.is_held(ContentType::Meal, "52772"));
        assert!(lock.try_acquire(ContentType::Meal, "52772").is_some());
    }

    #[test]
    fn test_keys_are_per_content_type() {
        let lock = ToggleLock::new();
        let _meal = lock.try_acquire(ContentType::Meal, "11007").unwrap();
        let cocktail = lock.try_acquire(ContentType::Cocktail, "11007").unwrap();
        assert_eq!(cocktail.content_type(), ContentType::Cocktail);
        assert_eq!(cocktail.item_id(), "11007");
        assert_eq!(lock.held_count(), 2);
    }
}
