//! Firestore Settings

/// Settings for configuring the bridge-backed client
///
/// Fixed for the lifetime of a [`Firestore`](super::Firestore) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Whether the native side should enable local persistent storage
    ///
    /// Sent once through `initialise` when the client is created.
    ///
    /// Default: true
    pub persistence_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            persistence_enabled: true,
        }
    }
}

impl Settings {
    /// Creates default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable native persistence
    pub fn with_persistence(mut self, enabled: bool) -> Self {
        self.persistence_enabled = enabled;
        self
    }
}
