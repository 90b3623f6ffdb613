//! Name-to-class lookup table for one universe.
//!
//! An index is built in a single sequential pass and is immutable afterwards,
//! so it can be shared by reference across comparison workers.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::models::{ClassModel, Origin};

/// Classes every universe implicitly provides.  A reference to one of these
/// that has no model ends the walk instead of leaving it incomplete.
pub const DEFAULT_PLATFORM_CLASSES: &[&str] = &["java.lang.Object"];

/// A class name that was defined more than once while building an index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuplicateClass {
    pub qualified_name: String,
    pub kept: Origin,
    pub discarded: Origin,
}

/// Immutable classpath index.  Iteration follows first-insertion order.
#[derive(Debug, Default)]
pub struct ClasspathIndex {
    label: String,
    classes: IndexMap<String, Arc<ClassModel>>,
    duplicates: Vec<DuplicateClass>,
    platform_classes: BTreeSet<String>,
}

impl ClasspathIndex {
    /// Build an index from a sequence of models.
    ///
    /// Duplicate names are resolved last-writer-wins, except that a library
    /// class never replaces a primary-artifact class.  Every duplicate is
    /// logged and kept in `duplicates()`.
    pub fn build(label: &str, models: impl IntoIterator<Item = ClassModel>) -> Self {
        let mut classes: IndexMap<String, Arc<ClassModel>> = IndexMap::new();
        let mut duplicates = Vec::new();

        for model in models {
            match classes.get_mut(&model.qualified_name) {
                Some(existing) => {
                    let artifact_shadowed =
                        existing.origin == Origin::PrimaryArtifact && model.origin.is_library();
                    let (kept, discarded) = if artifact_shadowed {
                        (existing.origin, model.origin)
                    } else {
                        (model.origin, existing.origin)
                    };
                    warn!(
                        "Duplicate class {} in {} universe; keeping {:?} definition over {:?}",
                        model.qualified_name, label, kept, discarded
                    );
                    duplicates.push(DuplicateClass {
                        qualified_name: model.qualified_name.clone(),
                        kept,
                        discarded,
                    });
                    if !artifact_shadowed {
                        *existing = Arc::new(model);
                    }
                }
                None => {
                    classes.insert(model.qualified_name.clone(), Arc::new(model));
                }
            }
        }

        Self {
            label: label.to_string(),
            classes,
            duplicates,
            platform_classes: DEFAULT_PLATFORM_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the set of implicitly provided platform classes.
    pub fn with_platform_classes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platform_classes = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_platform_class(&self, name: &str) -> bool {
        self.platform_classes.contains(name)
    }

    /// Neither loaded nor provided by the platform.
    pub fn is_unresolvable(&self, name: &str) -> bool {
        !self.classes.contains_key(name) && !self.platform_classes.contains(name)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<ClassModel>> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ClassModel>> {
        self.classes.values()
    }

    /// Classes contributed by the artifact under test, i.e. diff roots.
    pub fn primary_classes(&self) -> impl Iterator<Item = &Arc<ClassModel>> {
        self.iter().filter(|c| c.origin == Origin::PrimaryArtifact)
    }

    pub fn duplicates(&self) -> &[DuplicateClass] {
        &self.duplicates
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberModel;

    #[test]
    fn test_build_and_lookup() {
        let index = ClasspathIndex::build(
            "base",
            vec![ClassModel::new("a.A"), ClassModel::new("a.B")],
        );
        assert_eq!(index.len(), 2);
        assert!(index.lookup("a.A").is_some());
        assert!(index.lookup("a.C").is_none());
        assert!(index.duplicates().is_empty());
        assert_eq!(index.label(), "base");
    }

    #[test]
    fn test_last_writer_wins_within_same_origin() {
        let first = ClassModel::new("a.A").with_method(MemberModel::new("first", "()V"));
        let second = ClassModel::new("a.A").with_method(MemberModel::new("second", "()V"));
        let index = ClasspathIndex::build("base", vec![first, second]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("a.A").unwrap().methods[0].name, "second");
        assert_eq!(index.duplicates().len(), 1);
    }

    #[test]
    fn test_artifact_wins_over_library() {
        let own = ClassModel::new("a.A").with_method(MemberModel::new("own", "()V"));
        let lib = ClassModel::new("a.A")
            .with_origin(Origin::SharedLibrary)
            .with_method(MemberModel::new("lib", "()V"));
        let index = ClasspathIndex::build("candidate", vec![own, lib]);
        let kept = index.lookup("a.A").unwrap();
        assert_eq!(kept.origin, Origin::PrimaryArtifact);
        assert_eq!(kept.methods[0].name, "own");
        assert_eq!(
            index.duplicates(),
            &[DuplicateClass {
                qualified_name: "a.A".to_string(),
                kept: Origin::PrimaryArtifact,
                discarded: Origin::SharedLibrary,
            }]
        );
    }

    #[test]
    fn test_artifact_replaces_earlier_library() {
        let lib = ClassModel::new("a.A").with_origin(Origin::SideOnlyLibrary);
        let own = ClassModel::new("a.A");
        let index = ClasspathIndex::build("base", vec![lib, own]);
        assert_eq!(index.lookup("a.A").unwrap().origin, Origin::PrimaryArtifact);
        assert_eq!(index.duplicates()[0].discarded, Origin::SideOnlyLibrary);
    }

    #[test]
    fn test_primary_classes_excludes_libraries() {
        let index = ClasspathIndex::build(
            "base",
            vec![
                ClassModel::new("lib.L").with_origin(Origin::SharedLibrary),
                ClassModel::new("a.A"),
            ],
        );
        let names: Vec<&str> = index
            .primary_classes()
            .map(|c| c.qualified_name.as_str())
            .collect();
        assert_eq!(names, vec!["a.A"]);
    }

    #[test]
    fn test_platform_classes() {
        let index = ClasspathIndex::build("base", vec![ClassModel::new("a.A")]);
        assert!(index.is_platform_class("java.lang.Object"));
        assert!(!index.is_unresolvable("java.lang.Object"));
        assert!(!index.is_unresolvable("a.A"));
        assert!(index.is_unresolvable("lib.Gone"));

        let index = index.with_platform_classes(["java.lang.Object", "java.io.Serializable"]);
        assert!(index.is_platform_class("java.io.Serializable"));
        assert!(!index.contains("java.io.Serializable"));
    }
}
