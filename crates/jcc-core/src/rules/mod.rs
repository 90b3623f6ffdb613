pub mod config;
pub mod engine;
pub mod findings;
pub mod modes;

pub use config::CheckerConfig;
pub use engine::{compare, RuleEngine};
pub use findings::{Finding, FindingPayload, MemberRef, RuleId, Severity};
pub use modes::{AnnotationCheckMode, CompatibilityMode, InternalAnnotationCheckMode};
