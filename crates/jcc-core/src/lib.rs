//! jcc core library: binary and API compatibility checking for compiled
//! class artifacts.
//!
//! A run compares a base artifact against a candidate artifact, each resolved
//! within its own universe of libraries, and reports every structural change
//! that could break consumers compiled against the base.  Decoding artifacts
//! into `models::ClassModel`s, command-line handling, and rendering are left
//! to the embedding tool; `reader::ModelReader` is the seam for the former.

pub mod checker;
pub mod classpath;
pub mod errors;
pub mod models;
pub mod query;
pub mod reader;
pub mod report;
pub mod rules;

pub use checker::{check, CompatibilityChecker};
pub use classpath::index::ClasspathIndex;
pub use classpath::universe::UniverseInputs;
pub use errors::{JccError, JccResult};
pub use models::{AnnotationModel, ClassKind, ClassModel, MemberModel, Modifiers, Origin, Visibility};
pub use report::{exit_code, CheckReport, ClassResult};
pub use rules::{CheckerConfig, Finding, Severity};
