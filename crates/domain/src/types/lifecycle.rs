//! Cache generation lifecycle states

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of a cache generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Created, nothing installed yet
    #[default]
    Parsed,
    Installing,
    /// Precached and waiting to take over
    Installed,
    Activating,
    /// Serving reads and writes
    Active,
    /// Replaced by a newer generation
    Superseded,
    /// Installation failed; this generation never activates
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Superseded => "superseded",
            Self::Redundant => "redundant",
        }
    }

    /// Whether this generation intercepts fetches.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether `install` may start from this state.
    pub fn can_install(&self) -> bool {
        matches!(self, Self::Parsed | Self::Redundant)
    }

    /// Whether `activate` may start from this state.
    pub fn can_activate(&self) -> bool {
        matches!(self, Self::Installed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Superseded | Self::Redundant)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_intercepts() {
        assert!(LifecycleState::Active.can_intercept_fetch());
        assert!(!LifecycleState::Installed.can_intercept_fetch());
        assert!(!LifecycleState::Superseded.can_intercept_fetch());
    }

    #[test]
    fn install_and_activate_preconditions() {
        assert!(LifecycleState::Parsed.can_install());
        assert!(LifecycleState::Redundant.can_install());
        assert!(!LifecycleState::Active.can_install());
        assert!(LifecycleState::Installed.can_activate());
        assert!(!LifecycleState::Installing.can_activate());
    }
}
