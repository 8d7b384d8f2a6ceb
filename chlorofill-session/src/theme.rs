//! Light/dark preference.

use std::sync::{Arc, PoisonError, RwLock};

use chlorofill_core::Theme;

use crate::local_store::LocalStore;

pub const THEME_STORAGE_KEY: &str = "preferred_theme";

/// The active theme and whether the user chose it explicitly.
///
/// Only an explicit choice ([`toggle`](Self::toggle) or [`set`](Self::set))
/// is written to local storage. Until one exists the theme follows the
/// system preference.
pub struct ThemePreference {
    local: Arc<dyn LocalStore>,
    current: RwLock<Theme>,
}

impl ThemePreference {
    /// Start from the stored preference, else the system preference, else
    /// light.
    pub fn load(local: Arc<dyn LocalStore>, system: Option<Theme>) -> Self {
        let initial = stored_theme(local.as_ref())
            .or(system)
            .unwrap_or(Theme::Light);
        Self {
            local,
            current: RwLock::new(initial),
        }
    }

    pub fn current(&self) -> Theme {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_dark(&self) -> bool {
        self.current().is_dark()
    }

    /// The explicitly stored preference, if valid.
    pub fn stored(&self) -> Option<Theme> {
        stored_theme(self.local.as_ref())
    }

    /// Flip the theme and remember the choice.
    pub fn toggle(&self) -> Theme {
        let next = self.current().toggled();
        self.set(next);
        next
    }

    pub fn set(&self, theme: Theme) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = theme;
        if let Err(e) = self.local.set(THEME_STORAGE_KEY, theme.as_str()) {
            tracing::warn!(error = %e, "failed to save theme preference");
        }
    }

    /// Follow a system preference change unless the user chose a theme.
    /// Returns whether the theme changed.
    pub fn on_system_change(&self, system: Theme) -> bool {
        if self.stored().is_some() {
            return false;
        }
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let changed = *current != system;
        *current = system;
        changed
    }
}

fn stored_theme(local: &dyn LocalStore) -> Option<Theme> {
    match local.get(THEME_STORAGE_KEY) {
        Ok(Some(raw)) => Theme::parse(&raw),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "theme preference unreadable");
            None
        }
    }
}
