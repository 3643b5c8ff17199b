//! Date selection input.

use std::sync::RwLock;

/// Source of the currently selected date, as typed by the operator.
///
/// The raw value is returned unvalidated; the reconciler validates it.
pub trait DateInput: Send + Sync {
    fn selected_date(&self) -> Option<String>;
}

/// In-process date picker.
#[derive(Debug, Default)]
pub struct SelectedDate {
    value: RwLock<Option<String>>,
}

impl SelectedDate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(Some(value.into())),
        }
    }

    pub fn select(&self, value: impl Into<String>) {
        let mut guard = self.value.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(value.into());
    }

    pub fn clear(&self) {
        let mut guard = self.value.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

impl DateInput for SelectedDate {
    fn selected_date(&self) -> Option<String> {
        self.value
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
