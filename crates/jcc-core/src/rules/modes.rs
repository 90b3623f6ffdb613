//! Policy switches that shape how findings are classified.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::JccError;
use crate::rules::findings::Severity;

/// Binary mode checks linkage safety for already-compiled consumers.  API
/// mode additionally checks that consumers still recompile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityMode {
    Binary,
    Api,
}

impl CompatibilityMode {
    pub fn from_check_binary(check_binary: bool) -> Self {
        if check_binary {
            CompatibilityMode::Binary
        } else {
            CompatibilityMode::Api
        }
    }
}

/// An annotation present on only one side of a comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationDelta {
    Added,
    Removed,
}

/// How added/removed annotations (other than internal-API markers) are
/// reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationCheckMode {
    #[default]
    Ignore,
    Warn,
    Enforce,
    WarnRemoved,
    EnforceRemoved,
    WarnAddedEnforceRemoved,
}

impl AnnotationCheckMode {
    pub const ALL: [AnnotationCheckMode; 6] = [
        AnnotationCheckMode::Ignore,
        AnnotationCheckMode::Warn,
        AnnotationCheckMode::Enforce,
        AnnotationCheckMode::WarnRemoved,
        AnnotationCheckMode::EnforceRemoved,
        AnnotationCheckMode::WarnAddedEnforceRemoved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationCheckMode::Ignore => "ignore",
            AnnotationCheckMode::Warn => "warn",
            AnnotationCheckMode::Enforce => "enforce",
            AnnotationCheckMode::WarnRemoved => "warn-removed",
            AnnotationCheckMode::EnforceRemoved => "enforce-removed",
            AnnotationCheckMode::WarnAddedEnforceRemoved => "warn-added-enforce-removed",
        }
    }

    /// Severity for a delta, or `None` when the delta is not reported.
    pub fn severity_for(&self, delta: AnnotationDelta) -> Option<Severity> {
        use AnnotationDelta::{Added, Removed};
        match (self, delta) {
            (AnnotationCheckMode::Ignore, _) => None,
            (AnnotationCheckMode::Warn, _) => Some(Severity::Warning),
            (AnnotationCheckMode::Enforce, _) => Some(Severity::Error),
            (AnnotationCheckMode::WarnRemoved, Removed) => Some(Severity::Warning),
            (AnnotationCheckMode::EnforceRemoved, Removed) => Some(Severity::Error),
            (AnnotationCheckMode::WarnRemoved | AnnotationCheckMode::EnforceRemoved, Added) => None,
            (AnnotationCheckMode::WarnAddedEnforceRemoved, Added) => Some(Severity::Warning),
            (AnnotationCheckMode::WarnAddedEnforceRemoved, Removed) => Some(Severity::Error),
        }
    }
}

impl fmt::Display for AnnotationCheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationCheckMode {
    type Err = JccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| JccError::Config(format!("Unknown annotation check mode: {s}")))
    }
}

/// How findings on elements marked as internal API are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InternalAnnotationCheckMode {
    /// Drop the finding entirely.
    Suppress,
    /// Keep the finding but force it to a warning.
    #[default]
    Downgrade,
    /// Keep the finding's normal severity.
    Enforce,
}

impl InternalAnnotationCheckMode {
    pub const ALL: [InternalAnnotationCheckMode; 3] = [
        InternalAnnotationCheckMode::Suppress,
        InternalAnnotationCheckMode::Downgrade,
        InternalAnnotationCheckMode::Enforce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InternalAnnotationCheckMode::Suppress => "suppress",
            InternalAnnotationCheckMode::Downgrade => "downgrade",
            InternalAnnotationCheckMode::Enforce => "enforce",
        }
    }

    /// Severity after the policy, or `None` when the finding is dropped.
    pub fn apply(&self, severity: Severity) -> Option<Severity> {
        match self {
            InternalAnnotationCheckMode::Suppress => None,
            InternalAnnotationCheckMode::Downgrade => Some(Severity::Warning),
            InternalAnnotationCheckMode::Enforce => Some(severity),
        }
    }
}

impl fmt::Display for InternalAnnotationCheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternalAnnotationCheckMode {
    type Err = JccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| {
                JccError::Config(format!("Unknown internal annotation check mode: {s}"))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_mode_default_is_ignore() {
        assert_eq!(AnnotationCheckMode::default(), AnnotationCheckMode::Ignore);
        for delta in [AnnotationDelta::Added, AnnotationDelta::Removed] {
            assert_eq!(AnnotationCheckMode::Ignore.severity_for(delta), None);
        }
    }

    #[test]
    fn test_annotation_mode_severities() {
        use AnnotationDelta::{Added, Removed};
        assert_eq!(AnnotationCheckMode::Warn.severity_for(Added), Some(Severity::Warning));
        assert_eq!(AnnotationCheckMode::Enforce.severity_for(Removed), Some(Severity::Error));
        assert_eq!(AnnotationCheckMode::WarnRemoved.severity_for(Added), None);
        assert_eq!(AnnotationCheckMode::EnforceRemoved.severity_for(Removed), Some(Severity::Error));
        assert_eq!(
            AnnotationCheckMode::WarnAddedEnforceRemoved.severity_for(Added),
            Some(Severity::Warning)
        );
        assert_eq!(
            AnnotationCheckMode::WarnAddedEnforceRemoved.severity_for(Removed),
            Some(Severity::Error)
        );
    }

    #[test]
    fn test_annotation_mode_parse() {
        assert_eq!("warn".parse::<AnnotationCheckMode>().unwrap(), AnnotationCheckMode::Warn);
        assert_eq!(
            "WARN_REMOVED".parse::<AnnotationCheckMode>().unwrap(),
            AnnotationCheckMode::WarnRemoved
        );
        assert!("loud".parse::<AnnotationCheckMode>().is_err());
        for mode in AnnotationCheckMode::ALL {
            assert_eq!(mode.to_string().parse::<AnnotationCheckMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_internal_mode_apply() {
        assert_eq!(InternalAnnotationCheckMode::Suppress.apply(Severity::Error), None);
        assert_eq!(
            InternalAnnotationCheckMode::Downgrade.apply(Severity::Error),
            Some(Severity::Warning)
        );
        assert_eq!(
            InternalAnnotationCheckMode::Enforce.apply(Severity::Error),
            Some(Severity::Error)
        );
        assert_eq!(
            InternalAnnotationCheckMode::Enforce.apply(Severity::Warning),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn test_internal_mode_parse() {
        assert_eq!(
            " Suppress ".parse::<InternalAnnotationCheckMode>().unwrap(),
            InternalAnnotationCheckMode::Suppress
        );
        assert!("hide".parse::<InternalAnnotationCheckMode>().is_err());
    }

    #[test]
    fn test_compatibility_mode_from_flag() {
        assert_eq!(CompatibilityMode::from_check_binary(true), CompatibilityMode::Binary);
        assert_eq!(CompatibilityMode::from_check_binary(false), CompatibilityMode::Api);
    }
}
