//! Class-pair comparison: classifies every structural delta between a base
//! class and its counterpart in the candidate universe.
//!
//! Rules run in four passes (presence, class structure, members,
//! annotations).  Each finding is then passed through the internal-API
//! policy when the base class or member carries an internal marker.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::classpath::index::ClasspathIndex;
use crate::models::{AnnotationModel, ClassModel, MemberCategory, MemberModel};
use crate::query::resolver::{ancestry, resolve_detailed, Ancestry};
use crate::rules::config::CheckerConfig;
use crate::rules::findings::{Finding, RuleId, Severity};
use crate::rules::modes::AnnotationDelta;

const CONSTRUCTOR: &str = "<init>";
const STATIC_INITIALIZER: &str = "<clinit>";

fn joined(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Compares base classes against one frozen candidate universe.
pub struct RuleEngine<'a> {
    config: &'a CheckerConfig,
    candidate: &'a ClasspathIndex,
    /// When set, a class missing from the candidate only makes a walk
    /// inconclusive if the base universe cannot resolve it either.
    base: Option<&'a ClasspathIndex>,
}

/// Findings for one class, with the internal-API policy applied on push.
struct Collector<'a> {
    config: &'a CheckerConfig,
    class_internal: bool,
    findings: Vec<Finding>,
}

impl Collector<'_> {
    fn push(&mut self, mut finding: Finding, member_internal: bool) {
        if finding.rule() == RuleId::UnresolvedDependency {
            warn!("{finding}");
        }
        if self.class_internal || member_internal {
            let mode = self.config.internal_annotation_check_mode;
            match mode.apply(finding.severity()) {
                Some(severity) => finding.payload_mut().severity = severity,
                None => {
                    debug!("Suppressed internal-API finding: {finding}");
                    return;
                }
            }
        }
        self.findings.push(finding);
    }
}

impl<'a> RuleEngine<'a> {
    pub fn new(config: &'a CheckerConfig, candidate: &'a ClasspathIndex) -> Self {
        Self {
            config,
            candidate,
            base: None,
        }
    }

    pub fn with_base_universe(mut self, base: &'a ClasspathIndex) -> Self {
        self.base = Some(base);
        self
    }

    /// Why a negative walk result cannot be trusted, or `None` when it can.
    fn unresolved_reason(&self, cycle: bool, missing: &BTreeSet<String>) -> Option<String> {
        let unresolved: BTreeSet<String> = missing
            .iter()
            .filter(|name| self.base.map_or(true, |base| base.is_unresolvable(name)))
            .cloned()
            .collect();
        if !unresolved.is_empty() {
            Some(format!("unresolved classes {}", joined(&unresolved)))
        } else if cycle {
            Some("cyclic hierarchy".to_string())
        } else {
            None
        }
    }

    /// All findings for `base`, in rule order.
    pub fn compare(&self, base: &ClassModel) -> Vec<Finding> {
        let mut out = Collector {
            config: self.config,
            class_internal: self.config.marks_internal(&base.annotations),
            findings: Vec::new(),
        };
        let name = base.qualified_name.as_str();

        let Some(candidate) = self.candidate.lookup(name) else {
            if !base.is_private() && !base.is_synthetic() {
                out.push(
                    Finding::class(name, RuleId::ClassRemoved, Severity::Error, "class removed"),
                    false,
                );
            }
            return out.findings;
        };

        self.compare_class_structure(base, candidate, &mut out);
        for category in [MemberCategory::Field, MemberCategory::Method] {
            for member in base.members(category) {
                if member.is_synthetic() || member.is_private() {
                    continue;
                }
                if category == MemberCategory::Method && member.name == STATIC_INITIALIZER {
                    continue;
                }
                self.compare_member(base, candidate, category, member, &mut out);
            }
        }
        self.compare_annotations(
            &base.annotations,
            &candidate.annotations,
            &mut out,
            |rule, severity, message| Finding::class(name, rule, severity, message),
            false,
        );

        debug!("Compared {}: {} findings", name, out.findings.len());
        out.findings
    }

    // -- Class structure ---------------------------------------------------

    fn compare_class_structure(&self, base: &ClassModel, candidate: &ClassModel, out: &mut Collector<'_>) {
        let name = base.qualified_name.as_str();

        if base.visibility.is_narrowed_to(candidate.visibility) {
            out.push(
                Finding::class(
                    name,
                    RuleId::ClassVisibilityNarrowed,
                    Severity::Error,
                    format!(
                        "visibility narrowed from {} to {}",
                        base.visibility, candidate.visibility
                    ),
                ),
                false,
            );
        }

        let kind_changed = base.kind != candidate.kind;
        if kind_changed {
            out.push(
                Finding::class(
                    name,
                    RuleId::KindChanged,
                    Severity::Error,
                    format!("kind changed from {} to {}", base.kind, candidate.kind),
                ),
                false,
            );
        }

        if !base.modifiers.is_final
            && candidate.modifiers.is_final
            && self.config.rule_enabled(RuleId::ClassFinalAdded)
        {
            out.push(
                Finding::class(name, RuleId::ClassFinalAdded, Severity::Error, "class made final"),
                false,
            );
        }

        if !kind_changed && !base.is_effectively_abstract() && candidate.is_effectively_abstract() {
            out.push(
                Finding::class(
                    name,
                    RuleId::ClassAbstractAdded,
                    Severity::Error,
                    "class made abstract",
                ),
                false,
            );
        }

        let lineage = ancestry(self.candidate, &candidate.qualified_name);
        self.check_superclass(base, candidate, &lineage, out);
        self.check_interfaces(base, &lineage, out);
    }

    fn check_superclass(
        &self,
        base: &ClassModel,
        candidate: &ClassModel,
        lineage: &Ancestry,
        out: &mut Collector<'_>,
    ) {
        let name = base.qualified_name.as_str();
        // Gaining a superclass only extends the hierarchy.
        let Some(old) = base.superclass.as_deref() else {
            return;
        };
        let Some(new) = candidate.superclass.as_deref() else {
            if !self.candidate.is_platform_class(old) {
                out.push(
                    Finding::class(
                        name,
                        RuleId::SuperclassChanged,
                        Severity::Error,
                        format!("superclass changed from {old} to none"),
                    ),
                    false,
                );
            }
            return;
        };
        if old == new || lineage.has_superclass(old) {
            return;
        }
        let old_lineage = ancestry(self.candidate, old);
        if old_lineage.has_superclass(new) {
            return;
        }

        let mut missing = lineage.missing.clone();
        missing.extend(old_lineage.missing.iter().cloned());
        if let Some(reason) = self.unresolved_reason(lineage.cycle || old_lineage.cycle, &missing) {
            out.push(
                Finding::class(
                    name,
                    RuleId::UnresolvedDependency,
                    Severity::Warning,
                    format!("cannot verify superclass change from {old} to {new}: {reason}"),
                ),
                false,
            );
            return;
        }

        out.push(
            Finding::class(
                name,
                RuleId::SuperclassChanged,
                Severity::Error,
                format!("superclass changed from {old} to {new}"),
            ),
            false,
        );
    }

    fn check_interfaces(&self, base: &ClassModel, lineage: &Ancestry, out: &mut Collector<'_>) {
        let name = base.qualified_name.as_str();
        let unresolved = self.unresolved_reason(lineage.cycle, &lineage.missing);
        for iface in &base.interfaces {
            if lineage.interfaces.contains(iface) {
                continue;
            }
            let finding = if let Some(reason) = &unresolved {
                Finding::class(
                    name,
                    RuleId::UnresolvedDependency,
                    Severity::Warning,
                    format!("cannot verify interface {iface}: {reason}"),
                )
            } else {
                Finding::class(
                    name,
                    RuleId::InterfaceRemoved,
                    Severity::Error,
                    format!("interface {iface} removed"),
                )
            };
            out.push(finding, false);
        }
    }

    // -- Members -----------------------------------------------------------

    fn compare_member(
        &self,
        base: &ClassModel,
        candidate: &ClassModel,
        category: MemberCategory,
        member: &MemberModel,
        out: &mut Collector<'_>,
    ) {
        let class_name = base.qualified_name.as_str();
        let key = member.key();
        let internal = self.config.marks_internal(&member.annotations);
        let finding = |rule: RuleId, severity: Severity, message: String| {
            Finding::member(category, class_name, key.clone(), rule, severity, message)
        };

        // Constructors are never inherited, so only the class itself counts.
        let local = candidate.find_member(category, &key);
        let resolved = match local {
            Some(found) => Some(found),
            None if member.name == CONSTRUCTOR => None,
            None => {
                let resolution =
                    resolve_detailed(self.candidate, &candidate.qualified_name, &key, category);
                if let Some(found) = resolution.found {
                    Some(found.member)
                } else if let Some(reason) =
                    self.unresolved_reason(resolution.cycle, &resolution.missing)
                {
                    out.push(
                        finding(
                            RuleId::UnresolvedDependency,
                            Severity::Warning,
                            format!("cannot resolve {}: {reason}", category.as_str()),
                        ),
                        internal,
                    );
                    return;
                } else {
                    None
                }
            }
        };

        let Some(current) = resolved else {
            out.push(
                finding(
                    RuleId::MemberRemoved,
                    Severity::Error,
                    format!("{} removed", category.as_str()),
                ),
                internal,
            );
            return;
        };

        if member.visibility.is_narrowed_to(current.visibility) {
            out.push(
                finding(
                    RuleId::MemberVisibilityNarrowed,
                    Severity::Error,
                    format!(
                        "visibility narrowed from {} to {}",
                        member.visibility, current.visibility
                    ),
                ),
                internal,
            );
        }

        if member.modifiers.is_static != current.modifiers.is_static {
            let message = if current.modifiers.is_static {
                "changed from instance to static"
            } else {
                "changed from static to instance"
            };
            out.push(
                finding(RuleId::StaticChanged, Severity::Error, message.to_string()),
                internal,
            );
        }

        let final_rule = match category {
            MemberCategory::Method => RuleId::MethodFinalAdded,
            MemberCategory::Field => RuleId::FieldFinalAdded,
        };
        if !member.modifiers.is_final && current.modifiers.is_final && self.config.rule_enabled(final_rule) {
            out.push(
                finding(
                    final_rule,
                    Severity::Error,
                    format!("{} made final", category.as_str()),
                ),
                internal,
            );
        }

        if category == MemberCategory::Method
            && !member.modifiers.is_abstract
            && current.modifiers.is_abstract
        {
            out.push(
                finding(
                    RuleId::MethodAbstractAdded,
                    Severity::Error,
                    "method made abstract".to_string(),
                ),
                internal,
            );
        }

        self.compare_annotations(
            &member.annotations,
            &current.annotations,
            out,
            |rule, severity, message| finding(rule, severity, message),
            internal,
        );
    }

    // -- Annotations -------------------------------------------------------

    fn compare_annotations(
        &self,
        base: &[AnnotationModel],
        candidate: &[AnnotationModel],
        out: &mut Collector<'_>,
        make: impl Fn(RuleId, Severity, String) -> Finding,
        internal: bool,
    ) {
        let mode = self.config.annotation_check_mode;
        let names = |annotations: &[AnnotationModel]| -> BTreeSet<String> {
            annotations
                .iter()
                .map(|a| a.type_name.clone())
                .filter(|t| !self.config.is_internal_annotation(t))
                .collect()
        };
        let before = names(base);
        let after = names(candidate);

        let deltas = before
            .difference(&after)
            .map(|t| (AnnotationDelta::Removed, t))
            .chain(after.difference(&before).map(|t| (AnnotationDelta::Added, t)));
        for (delta, type_name) in deltas {
            let Some(severity) = mode.severity_for(delta) else {
                continue;
            };
            let (rule, verb) = match delta {
                AnnotationDelta::Added => (RuleId::AnnotationAdded, "added"),
                AnnotationDelta::Removed => (RuleId::AnnotationRemoved, "removed"),
            };
            out.push(make(rule, severity, format!("annotation {type_name} {verb}")), internal);
        }
    }
}

/// Compare one base class against the candidate universe.
pub fn compare(base: &ClassModel, candidate: &ClasspathIndex, config: &CheckerConfig) -> Vec<Finding> {
    RuleEngine::new(config, candidate).compare(base)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
