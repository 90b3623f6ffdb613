//! Result aggregation, report encoding, and exit-code mapping.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classpath::index::DuplicateClass;
use crate::errors::JccResult;
use crate::models::{ClassModel, MemberCategory};
use crate::rules::findings::{Finding, Severity};

/// Highest exit status used for incompatibilities; statuses above it are
/// reserved for the platform's signal and error codes.
pub const MAX_EXIT_CODE: i32 = 125;

/// Exit status for a run with `error_count` error-severity findings.
pub fn exit_code(error_count: usize) -> i32 {
    error_count.min(MAX_EXIT_CODE as usize) as i32
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// All findings for one base class.
#[derive(Clone, Debug)]
pub struct ClassResult {
    pub class: Arc<ClassModel>,
    pub findings: Vec<Finding>,
}

impl ClassResult {
    pub fn new(class: Arc<ClassModel>, findings: Vec<Finding>) -> Self {
        Self { class, findings }
    }

    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity() == Severity::Warning)
            .count()
    }
}

/// A non-finding condition noticed while setting up the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    DuplicateClass {
        universe: String,
        #[serde(flatten)]
        duplicate: DuplicateClass,
    },
}

/// Aggregated outcome of one run.
#[derive(Clone, Debug, Default)]
pub struct CheckReport {
    /// Error-severity findings across all classes; drives the exit status.
    pub error_count: usize,
    pub warning_count: usize,
    /// One entry per compared base class, sorted by class name.
    pub results: Vec<ClassResult>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    /// Sort results and findings so that output does not depend on the
    /// order in which comparisons finished.
    pub fn aggregate(
        results: impl IntoIterator<Item = ClassResult>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let mut results: Vec<ClassResult> = results.into_iter().collect();
        for result in &mut results {
            result.findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        }
        results.sort_by(|a, b| a.class.qualified_name.cmp(&b.class.qualified_name));

        let error_count = results.iter().map(ClassResult::error_count).sum();
        let warning_count = results.iter().map(ClassResult::warning_count).sum();
        Self {
            error_count,
            warning_count,
            results,
            diagnostics,
        }
    }

    pub fn classes_compared(&self) -> usize {
        self.results.len()
    }

    pub fn is_compatible(&self) -> bool {
        self.error_count == 0
    }

    pub fn exit_code(&self) -> i32 {
        exit_code(self.error_count)
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.results.iter().flat_map(|r| r.findings.iter())
    }

    pub fn encode(&self) -> ReportEncoding {
        let mut encoded = ReportEncoding::new();
        for finding in self.findings() {
            encoded.accept(finding);
        }
        encoded
    }

    pub fn to_json(&self) -> JccResult<String> {
        Ok(serde_json::to_string_pretty(&self.encode())?)
    }

    /// Write the encoded report to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> JccResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &self.encode())?;
        writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// One `{message, isError}` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedFinding {
    pub message: String,
    pub is_error: bool,
}

/// All encoded findings for one class.  Method keys are `name+signature`,
/// field keys are `name:signature`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedClass {
    pub class_incompatibilities: Vec<EncodedFinding>,
    pub method_incompatibilities: IndexMap<String, Vec<EncodedFinding>>,
    pub field_incompatibilities: IndexMap<String, Vec<EncodedFinding>>,
}

/// Persisted report: class qualified name to its encoded findings.  Classes
/// without findings are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportEncoding {
    pub classes: IndexMap<String, EncodedClass>,
}

impl ReportEncoding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, finding: &Finding) {
        let entry = EncodedFinding {
            message: finding.message().to_string(),
            is_error: finding.is_error(),
        };
        let class = self
            .classes
            .entry(finding.class_name().to_string())
            .or_default();
        match finding.member_ref() {
            None => class.class_incompatibilities.push(entry),
            Some((MemberCategory::Method, member)) => class
                .method_incompatibilities
                .entry(member.key.render(MemberCategory::Method))
                .or_default()
                .push(entry),
            Some((MemberCategory::Field, member)) => class
                .field_incompatibilities
                .entry(member.key.render(MemberCategory::Field))
                .or_default()
                .push(entry),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemberKey, Origin};
    use crate::rules::findings::RuleId;

    fn result(name: &str, findings: Vec<Finding>) -> ClassResult {
        ClassResult::new(Arc::new(ClassModel::new(name)), findings)
    }

    fn method_finding(class: &str, name: &str, severity: Severity) -> Finding {
        Finding::member(
            MemberCategory::Method,
            class,
            MemberKey::new(name, "()V"),
            RuleId::MemberRemoved,
            severity,
            "method removed",
        )
    }

    #[test]
    fn test_exit_code_clamp() {
        assert_eq!(exit_code(200), 125);
        assert_eq!(exit_code(125), 125);
        assert_eq!(exit_code(3), 3);
        assert_eq!(exit_code(0), 0);
    }

    #[test]
    fn test_aggregate_counts_and_sorts() {
        let report = CheckReport::aggregate(
            vec![
                result(
                    "b.B",
                    vec![
                        method_finding("b.B", "z", Severity::Warning),
                        method_finding("b.B", "a", Severity::Error),
                    ],
                ),
                result("a.A", vec![]),
                result(
                    "c.C",
                    vec![Finding::class("c.C", RuleId::ClassRemoved, Severity::Error, "class removed")],
                ),
            ],
            vec![],
        );
        assert_eq!(report.error_count, 2);
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.classes_compared(), 3);
        assert_eq!(report.exit_code(), 2);
        assert!(!report.is_compatible());
        let names: Vec<&str> = report
            .results
            .iter()
            .map(|r| r.class.qualified_name.as_str())
            .collect();
        assert_eq!(names, vec!["a.A", "b.B", "c.C"]);
        let b = &report.results[1];
        let (_, first) = b.findings[0].member_ref().unwrap();
        assert_eq!(first.key.name, "a");
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let forward = CheckReport::aggregate(
            vec![
                result("a.A", vec![method_finding("a.A", "m", Severity::Error)]),
                result("b.B", vec![method_finding("b.B", "m", Severity::Error)]),
            ],
            vec![],
        );
        let backward = CheckReport::aggregate(
            vec![
                result("b.B", vec![method_finding("b.B", "m", Severity::Error)]),
                result("a.A", vec![method_finding("a.A", "m", Severity::Error)]),
            ],
            vec![],
        );
        let left: Vec<&Finding> = forward.findings().collect();
        let right: Vec<&Finding> = backward.findings().collect();
        assert_eq!(left, right);
        assert_eq!(forward.encode(), backward.encode());
    }

    #[test]
    fn test_encoding_shape() {
        let report = CheckReport::aggregate(
            vec![
                result(
                    "a.A",
                    vec![
                        Finding::class("a.A", RuleId::KindChanged, Severity::Error, "kind changed from class to enum"),
                        method_finding("a.A", "m", Severity::Error),
                        Finding::member(
                            MemberCategory::Field,
                            "a.A",
                            MemberKey::new("f", "I"),
                            RuleId::MemberRemoved,
                            Severity::Warning,
                            "field removed",
                        ),
                    ],
                ),
                result("a.Clean", vec![]),
            ],
            vec![],
        );
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value.get("a.Clean").is_none());
        let a = &value["a.A"];
        assert_eq!(a["classIncompatibilities"][0]["message"], "kind changed from class to enum");
        assert_eq!(a["classIncompatibilities"][0]["isError"], true);
        assert_eq!(a["methodIncompatibilities"]["m()V"][0]["message"], "method removed");
        assert_eq!(a["fieldIncompatibilities"]["f:I"][0]["isError"], false);
    }

    #[test]
    fn test_encoding_round_trips_through_json() {
        let report = CheckReport::aggregate(
            vec![result("a.A", vec![method_finding("a.A", "m", Severity::Error)])],
            vec![],
        );
        let encoded = report.encode();
        let decoded: ReportEncoding = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(decoded, encoded);
    }

    #[test]
    fn test_write_to_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out").join("report.json");
        let report = CheckReport::aggregate(
            vec![result("a.A", vec![method_finding("a.A", "m", Severity::Error)])],
            vec![],
        );
        report.write_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let decoded: ReportEncoding = serde_json::from_str(&written).unwrap();
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_diagnostic_serialization() {
        let diagnostic = Diagnostic::DuplicateClass {
            universe: "base".to_string(),
            duplicate: DuplicateClass {
                qualified_name: "a.A".to_string(),
                kept: Origin::PrimaryArtifact,
                discarded: Origin::SharedLibrary,
            },
        };
        let value = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(value["kind"], "duplicate_class");
        assert_eq!(value["qualified_name"], "a.A");
        assert_eq!(value["discarded"], "shared_library");
    }
}
