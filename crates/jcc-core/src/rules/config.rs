//! Checker configuration and its environment overlay.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::classpath::index::DEFAULT_PLATFORM_CLASSES;
use crate::errors::{JccError, JccResult};
use crate::models::{carries_any, AnnotationModel};
use crate::rules::findings::RuleId;
use crate::rules::modes::{AnnotationCheckMode, CompatibilityMode, InternalAnnotationCheckMode};

/// Annotation types treated as internal-API markers when none are configured.
pub const DEFAULT_INTERNAL_ANNOTATIONS: &[&str] = &[
    "org.jetbrains.annotations.ApiStatus$Internal",
    "org.jetbrains.annotations.VisibleForTesting",
    "com.google.common.annotations.VisibleForTesting",
];

/// Rules that only fire in API mode unless configured otherwise.  Adding
/// `final` breaks subclassing and overriding at recompilation time, but
/// existing compiled subclasses still link.
pub const DEFAULT_BINARY_EXEMPT_RULES: &[RuleId] = &[RuleId::ClassFinalAdded, RuleId::MethodFinalAdded];

// Environment overrides
pub const ENV_CHECK_BINARY: &str = "JCC_CHECK_BINARY";
pub const ENV_ANNOTATION_CHECK_MODE: &str = "JCC_ANNOTATION_CHECK_MODE";
pub const ENV_INTERNAL_ANNOTATIONS: &str = "JCC_INTERNAL_ANNOTATIONS";
pub const ENV_INTERNAL_ANNOTATION_CHECK_MODE: &str = "JCC_INTERNAL_ANNOTATION_CHECK_MODE";
pub const ENV_WORKERS: &str = "JCC_WORKERS";
pub const ENV_PLATFORM_CLASSES: &str = "JCC_PLATFORM_CLASSES";

fn default_check_binary() -> bool {
    true
}

fn default_internal_annotations() -> BTreeSet<String> {
    DEFAULT_INTERNAL_ANNOTATIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_platform_classes() -> BTreeSet<String> {
    DEFAULT_PLATFORM_CLASSES.iter().map(|s| s.to_string()).collect()
}

fn split_names(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_binary_exempt_rules() -> BTreeSet<RuleId> {
    DEFAULT_BINARY_EXEMPT_RULES.iter().copied().collect()
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Everything the rule engine needs besides the two universes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// `true` selects binary mode, `false` the stricter API mode.
    #[serde(default = "default_check_binary")]
    pub check_binary: bool,
    pub annotation_check_mode: AnnotationCheckMode,
    #[serde(default = "default_internal_annotations")]
    pub internal_annotations: BTreeSet<String>,
    pub internal_annotation_check_mode: InternalAnnotationCheckMode,
    /// Rules skipped in binary mode.
    #[serde(default = "default_binary_exempt_rules")]
    pub binary_exempt_rules: BTreeSet<RuleId>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Classes both universes provide without a model, such as the
    /// hierarchy root.
    #[serde(default = "default_platform_classes")]
    pub platform_classes: BTreeSet<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            check_binary: default_check_binary(),
            annotation_check_mode: AnnotationCheckMode::default(),
            internal_annotations: default_internal_annotations(),
            internal_annotation_check_mode: InternalAnnotationCheckMode::default(),
            binary_exempt_rules: default_binary_exempt_rules(),
            workers: default_workers(),
            platform_classes: default_platform_classes(),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> JccResult<bool> {
    let v = value.trim().to_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(JccError::Config(format!("{key}: expected a boolean, got {value:?}"))),
    }
}

impl CheckerConfig {
    pub fn mode(&self) -> CompatibilityMode {
        CompatibilityMode::from_check_binary(self.check_binary)
    }

    /// Whether `rule` fires in the configured mode.
    pub fn rule_enabled(&self, rule: RuleId) -> bool {
        match self.mode() {
            CompatibilityMode::Api => true,
            CompatibilityMode::Binary => !self.binary_exempt_rules.contains(&rule),
        }
    }

    pub fn is_internal_annotation(&self, type_name: &str) -> bool {
        self.internal_annotations.contains(type_name)
    }

    pub fn marks_internal(&self, annotations: &[AnnotationModel]) -> bool {
        carries_any(annotations, &self.internal_annotations)
    }

    pub fn with_check_binary(mut self, check_binary: bool) -> Self {
        self.check_binary = check_binary;
        self
    }

    pub fn with_annotation_check_mode(mut self, mode: AnnotationCheckMode) -> Self {
        self.annotation_check_mode = mode;
        self
    }

    pub fn with_internal_annotations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.internal_annotations = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_internal_annotation_check_mode(mut self, mode: InternalAnnotationCheckMode) -> Self {
        self.internal_annotation_check_mode = mode;
        self
    }

    pub fn with_binary_exempt_rules(mut self, rules: impl IntoIterator<Item = RuleId>) -> Self {
        self.binary_exempt_rules = rules.into_iter().collect();
        self
    }

    pub fn with_platform_classes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platform_classes = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Defaults overlaid with the `JCC_*` environment variables.
    pub fn from_env() -> JccResult<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values produced by `lookup` (keyed by the `ENV_*` names).
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> JccResult<Self> {
        if let Some(value) = lookup(ENV_CHECK_BINARY) {
            self.check_binary = parse_flag(ENV_CHECK_BINARY, &value)?;
        }
        if let Some(value) = lookup(ENV_ANNOTATION_CHECK_MODE) {
            self.annotation_check_mode = value.parse()?;
        }
        if let Some(value) = lookup(ENV_INTERNAL_ANNOTATIONS) {
            self.internal_annotations = split_names(&value);
        }
        if let Some(value) = lookup(ENV_INTERNAL_ANNOTATION_CHECK_MODE) {
            self.internal_annotation_check_mode = value.parse()?;
        }
        if let Some(value) = lookup(ENV_WORKERS) {
            let workers: usize = value.trim().parse().map_err(|_| {
                JccError::Config(format!("{ENV_WORKERS}: expected a positive integer, got {value:?}"))
            })?;
            self.workers = workers.max(1);
        }
        if let Some(value) = lookup(ENV_PLATFORM_CLASSES) {
            self.platform_classes = split_names(&value);
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
