use serde::{Deserialize, Serialize};

/// The brain a call session talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Brain identifier that history rows are associated with
    pub brain_id: String,

    /// Brain display name (e.g., "Neura the Brainy Explorer")
    pub brain_name: String,

    pub subject: String,

    pub topic: String,

    /// Voice family used for the voice table lookup (e.g., "female")
    pub voice: String,

    /// Teaching style (e.g., "casual")
    pub style: String,

    /// Joins same-role turns in the saved history
    /// Default: " | "
    pub history_separator: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            brain_id: String::new(),
            brain_name: String::new(),
            subject: String::new(),
            topic: String::new(),
            voice: String::new(),
            style: String::new(),
            history_separator: " | ".to_string(),
        }
    }
}
