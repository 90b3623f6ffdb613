//! Structural model of compiled classes and their members.
//!
//! These records are produced by a model reader (see `reader`) and are
//! read-only for the rest of a run.  Member identity is always the pair
//! `(name, signature)`: two members with different descriptors are different
//! symbols, never "the same member with a changed type".

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{JccError, JccResult};

// ---------------------------------------------------------------------------
// Descriptor grammar
// ---------------------------------------------------------------------------

static FIELD_DESCRIPTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[*(?:[BCDFIJSZ]|L[^;\[()]+;)$").unwrap());

static METHOD_DESCRIPTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\((?:\[*(?:[BCDFIJSZ]|L[^;\[()]+;))*\)(?:V|\[*(?:[BCDFIJSZ]|L[^;\[()]+;))$")
        .unwrap()
});

/// Whether `signature` is a well-formed descriptor for the given category.
pub fn is_valid_descriptor(signature: &str, category: MemberCategory) -> bool {
    match category {
        MemberCategory::Field => FIELD_DESCRIPTOR_RE.is_match(signature),
        MemberCategory::Method => METHOD_DESCRIPTOR_RE.is_match(signature),
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// What sort of type a compiled class is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Annotation => "annotation",
            ClassKind::Record => "record",
        }
    }

    /// Interfaces and annotation types are implicitly abstract.
    pub fn is_interface_like(&self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access level, ordered from most restricted to most open so that
/// `candidate < base` means the element was narrowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    PackagePrivate,
    Protected,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::PackagePrivate => "package-private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }

    pub fn is_narrowed_to(&self, other: Visibility) -> bool {
        other < *self
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which universe contribution a class came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    PrimaryArtifact,
    SharedLibrary,
    SideOnlyLibrary,
}

impl Origin {
    pub fn is_library(&self) -> bool {
        !matches!(self, Origin::PrimaryArtifact)
    }
}

/// Fields and methods live in independent key spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberCategory {
    Field,
    Method,
}

impl MemberCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberCategory::Field => "field",
            MemberCategory::Method => "method",
        }
    }
}

// ---------------------------------------------------------------------------
// Modifiers and annotations
// ---------------------------------------------------------------------------

/// Modifier flags shared by classes and members.  `is_static` only applies to
/// nested classes at class level; `is_bridge` only to methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_synthetic: bool,
    pub is_bridge: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.is_synthetic = true;
        self
    }

    pub fn bridge(mut self) -> Self {
        self.is_bridge = true;
        self
    }
}

/// A single annotation marker attached to a class or member.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationModel {
    pub type_name: String,
    #[serde(default = "default_runtime_visible")]
    pub runtime_visible: bool,
}

fn default_runtime_visible() -> bool {
    true
}

impl AnnotationModel {
    pub fn new(type_name: impl Into<String>, runtime_visible: bool) -> Self {
        Self {
            type_name: type_name.into(),
            runtime_visible,
        }
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// Identity of a member within one class: `(name, signature)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberKey {
    pub name: String,
    pub signature: String,
}

impl MemberKey {
    pub fn new(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
        }
    }

    /// Display form used in reports: `name+signature` for methods and
    /// `name:signature` for fields.
    pub fn render(&self, category: MemberCategory) -> String {
        match category {
            MemberCategory::Method => format!("{}{}", self.name, self.signature),
            MemberCategory::Field => format!("{}:{}", self.name, self.signature),
        }
    }
}

/// A field or method of a compiled class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberModel {
    pub name: String,
    pub signature: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub annotations: Vec<AnnotationModel>,
    /// Name of the declaring class.  Informational only.
    #[serde(default)]
    pub owning_class: String,
}

impl MemberModel {
    /// A public member with no modifiers or annotations.
    pub fn new(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            annotations: Vec::new(),
            owning_class: String::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationModel) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn key(&self) -> MemberKey {
        MemberKey::new(self.name.clone(), self.signature.clone())
    }

    pub fn matches(&self, key: &MemberKey) -> bool {
        self.name == key.name && self.signature == key.signature
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_synthetic(&self) -> bool {
        self.modifiers.is_synthetic
    }
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

/// One compiled class, interface, enum, annotation type or record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassModel {
    pub qualified_name: String,
    pub kind: ClassKind,
    pub visibility: Visibility,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<MemberModel>,
    #[serde(default)]
    pub methods: Vec<MemberModel>,
    #[serde(default)]
    pub annotations: Vec<AnnotationModel>,
    #[serde(default = "default_origin")]
    pub origin: Origin,
}

fn default_origin() -> Origin {
    Origin::PrimaryArtifact
}

impl ClassModel {
    /// A public, non-final class with no members, extending nothing.
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind: ClassKind::Class,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            origin: Origin::PrimaryArtifact,
        }
    }

    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_field(mut self, mut field: MemberModel) -> Self {
        field.owning_class = self.qualified_name.clone();
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, mut method: MemberModel) -> Self {
        method.owning_class = self.qualified_name.clone();
        self.methods.push(method);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationModel) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn members(&self, category: MemberCategory) -> &[MemberModel] {
        match category {
            MemberCategory::Field => &self.fields,
            MemberCategory::Method => &self.methods,
        }
    }

    /// Directly declared member with the given identity, any visibility.
    pub fn find_member(&self, category: MemberCategory, key: &MemberKey) -> Option<&MemberModel> {
        self.members(category).iter().find(|m| m.matches(key))
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_synthetic(&self) -> bool {
        self.modifiers.is_synthetic
    }

    /// Interfaces count as abstract whether or not the flag is set.
    pub fn is_effectively_abstract(&self) -> bool {
        self.modifiers.is_abstract || self.kind.is_interface_like()
    }

    /// Fill in `owning_class` on every member.  Readers call this after
    /// deserializing, since the back-reference is not always serialized.
    pub fn link_members(&mut self) {
        let owner = self.qualified_name.clone();
        for member in self.fields.iter_mut().chain(self.methods.iter_mut()) {
            member.owning_class = owner.clone();
        }
    }

    /// Check the structural invariants a reader must uphold.
    ///
    /// Signatures are compared as opaque strings, but they must be JVM
    /// descriptors (`I`, `[Ljava/lang/String;`, `(IJ)V`): a reader that
    /// produces any other encoding gets `MalformedInput` here.
    pub fn validate(&self) -> JccResult<()> {
        if self.qualified_name.trim().is_empty() {
            return Err(JccError::MalformedInput(
                "class with empty qualified name".to_string(),
            ));
        }
        if self.superclass.as_deref() == Some(self.qualified_name.as_str()) {
            return Err(JccError::MalformedInput(format!(
                "class {} declares itself as its superclass",
                self.qualified_name
            )));
        }
        for category in [MemberCategory::Field, MemberCategory::Method] {
            let mut seen: HashSet<(&str, &str)> = HashSet::new();
            for member in self.members(category) {
                if member.name.is_empty() {
                    return Err(JccError::MalformedInput(format!(
                        "{} with empty name in class {}",
                        category.as_str(),
                        self.qualified_name
                    )));
                }
                if !is_valid_descriptor(&member.signature, category) {
                    return Err(JccError::MalformedInput(format!(
                        "{} {} in class {} has malformed descriptor {:?}",
                        category.as_str(),
                        member.name,
                        self.qualified_name,
                        member.signature
                    )));
                }
                if !seen.insert((member.name.as_str(), member.signature.as_str())) {
                    return Err(JccError::MalformedInput(format!(
                        "duplicate {} {} in class {}",
                        category.as_str(),
                        member.key().render(category),
                        self.qualified_name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Whether any annotation in `annotations` is one of `type_names`.
/// Runtime-invisible annotations count too.
pub fn carries_any(annotations: &[AnnotationModel], type_names: &BTreeSet<String>) -> bool {
    annotations
        .iter()
        .any(|a| type_names.contains(&a.type_name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
