//! Typed incompatibility findings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{MemberCategory, MemberKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

/// Which rule produced a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    ClassRemoved,
    ClassVisibilityNarrowed,
    KindChanged,
    ClassFinalAdded,
    ClassAbstractAdded,
    SuperclassChanged,
    InterfaceRemoved,
    MemberRemoved,
    MemberVisibilityNarrowed,
    StaticChanged,
    MethodFinalAdded,
    FieldFinalAdded,
    MethodAbstractAdded,
    AnnotationAdded,
    AnnotationRemoved,
    UnresolvedDependency,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::ClassRemoved => "class-removed",
            RuleId::ClassVisibilityNarrowed => "class-visibility-narrowed",
            RuleId::KindChanged => "kind-changed",
            RuleId::ClassFinalAdded => "class-final-added",
            RuleId::ClassAbstractAdded => "class-abstract-added",
            RuleId::SuperclassChanged => "superclass-changed",
            RuleId::InterfaceRemoved => "interface-removed",
            RuleId::MemberRemoved => "member-removed",
            RuleId::MemberVisibilityNarrowed => "member-visibility-narrowed",
            RuleId::StaticChanged => "static-changed",
            RuleId::MethodFinalAdded => "method-final-added",
            RuleId::FieldFinalAdded => "field-final-added",
            RuleId::MethodAbstractAdded => "method-abstract-added",
            RuleId::AnnotationAdded => "annotation-added",
            RuleId::AnnotationRemoved => "annotation-removed",
            RuleId::UnresolvedDependency => "unresolved-dependency",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part every finding shares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingPayload {
    pub rule: RuleId,
    pub message: String,
    pub severity: Severity,
}

/// A member of a base class, by owner and identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberRef {
    pub class_name: String,
    pub key: MemberKey,
}

/// One structural delta, tagged by the kind of element it concerns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Finding {
    Class {
        class_name: String,
        #[serde(flatten)]
        payload: FindingPayload,
    },
    Method {
        member: MemberRef,
        #[serde(flatten)]
        payload: FindingPayload,
    },
    Field {
        member: MemberRef,
        #[serde(flatten)]
        payload: FindingPayload,
    },
}

impl Finding {
    pub fn class(
        class_name: &str,
        rule: RuleId,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Finding::Class {
            class_name: class_name.to_string(),
            payload: FindingPayload {
                rule,
                message: message.into(),
                severity,
            },
        }
    }

    pub fn member(
        category: MemberCategory,
        class_name: &str,
        key: MemberKey,
        rule: RuleId,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let member = MemberRef {
            class_name: class_name.to_string(),
            key,
        };
        let payload = FindingPayload {
            rule,
            message: message.into(),
            severity,
        };
        match category {
            MemberCategory::Method => Finding::Method { member, payload },
            MemberCategory::Field => Finding::Field { member, payload },
        }
    }

    pub fn payload(&self) -> &FindingPayload {
        match self {
            Finding::Class { payload, .. }
            | Finding::Method { payload, .. }
            | Finding::Field { payload, .. } => payload,
        }
    }

    pub fn payload_mut(&mut self) -> &mut FindingPayload {
        match self {
            Finding::Class { payload, .. }
            | Finding::Method { payload, .. }
            | Finding::Field { payload, .. } => payload,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            Finding::Class { class_name, .. } => class_name,
            Finding::Method { member, .. } | Finding::Field { member, .. } => &member.class_name,
        }
    }

    /// Member identity and category, or `None` for class-level findings.
    pub fn member_ref(&self) -> Option<(MemberCategory, &MemberRef)> {
        match self {
            Finding::Class { .. } => None,
            Finding::Method { member, .. } => Some((MemberCategory::Method, member)),
            Finding::Field { member, .. } => Some((MemberCategory::Field, member)),
        }
    }

    pub fn rule(&self) -> RuleId {
        self.payload().rule
    }

    pub fn severity(&self) -> Severity {
        self.payload().severity
    }

    pub fn message(&self) -> &str {
        &self.payload().message
    }

    pub fn is_error(&self) -> bool {
        self.severity().is_error()
    }

    /// Class-level findings first, then fields, then methods, each by name,
    /// signature and message.
    pub fn sort_key(&self) -> (u8, &str, &str, &str, &str) {
        let (rank, name, signature) = match self {
            Finding::Class { .. } => (0, "", ""),
            Finding::Field { member, .. } => (1, member.key.name.as_str(), member.key.signature.as_str()),
            Finding::Method { member, .. } => (2, member.key.name.as_str(), member.key.signature.as_str()),
        };
        (rank, self.class_name(), name, signature, self.message())
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.member_ref() {
            None => write!(f, "[{level}] {} - {}", self.class_name(), self.message()),
            Some((category, member)) => write!(
                f,
                "[{level}] {}.{} - {}",
                member.class_name,
                member.key.render(category),
                self.message()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
