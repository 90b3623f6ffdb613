//! Inheritance-aware member resolution within one universe.
//!
//! The walk visits the class itself, then its superclass chain, then every
//! interface reachable from any class on that chain in breadth-first order.
//! Private members are never inherited and are skipped at every level.
//! Visited names are tracked so that malformed hierarchies terminate.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use crate::classpath::index::ClasspathIndex;
use crate::models::{ClassModel, MemberCategory, MemberKey, MemberModel};

/// A member located somewhere in a class hierarchy.
#[derive(Clone, Copy, Debug)]
pub struct Resolved<'a> {
    pub declaring_class: &'a Arc<ClassModel>,
    pub member: &'a MemberModel,
}

/// Outcome of a resolution walk, including the edges that could not be
/// followed.  Platform classes without a model end the walk and are not
/// reported as missing.
#[derive(Clone, Debug, Default)]
pub struct Resolution<'a> {
    pub found: Option<Resolved<'a>>,
    /// Referenced class names absent from the index.
    pub missing: BTreeSet<String>,
    /// A class on the superclass chain named one of its own descendants.
    pub cycle: bool,
}

impl Resolution<'_> {
    /// The walk was cut short, so a negative answer is not conclusive.
    pub fn is_incomplete(&self) -> bool {
        self.cycle || !self.missing.is_empty()
    }
}

/// Everything above a class in its hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ancestry {
    /// Superclass chain, nearest first, excluding the class itself.
    pub superclasses: Vec<String>,
    /// Every interface implemented directly or transitively.
    pub interfaces: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub cycle: bool,
}

impl Ancestry {
    pub fn is_incomplete(&self) -> bool {
        self.cycle || !self.missing.is_empty()
    }

    pub fn has_superclass(&self, name: &str) -> bool {
        self.superclasses.iter().any(|s| s == name)
    }
}

/// Superclass chain starting at (and including) `class_name`.
fn superclass_chain<'a>(
    index: &'a ClasspathIndex,
    class_name: &str,
    missing: &mut BTreeSet<String>,
    cycle: &mut bool,
) -> Vec<&'a Arc<ClassModel>> {
    let mut chain = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut next = Some(class_name.to_string());

    while let Some(name) = next.take() {
        if !visited.insert(name.clone()) {
            *cycle = true;
            break;
        }
        match index.lookup(&name) {
            Some(class) => {
                next = class.superclass.clone();
                chain.push(class);
            }
            None => {
                if !index.is_platform_class(&name) {
                    missing.insert(name);
                }
            }
        }
    }
    chain
}

/// Breadth-first walk over the interfaces of `chain`, calling `visit` for
/// each loaded interface until it returns `true`.
fn walk_interfaces<'a>(
    index: &'a ClasspathIndex,
    chain: &[&'a Arc<ClassModel>],
    missing: &mut BTreeSet<String>,
    mut visit: impl FnMut(&'a Arc<ClassModel>) -> bool,
) -> BTreeSet<String> {
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut visited: BTreeSet<String> = BTreeSet::new();
    for class in chain {
        for iface in &class.interfaces {
            if visited.insert(iface.clone()) {
                queue.push_back(iface.clone());
            }
        }
    }

    while let Some(name) = queue.pop_front() {
        let Some(iface) = index.lookup(&name) else {
            if !index.is_platform_class(&name) {
                missing.insert(name);
            }
            continue;
        };
        if visit(iface) {
            break;
        }
        for parent in &iface.interfaces {
            if visited.insert(parent.clone()) {
                queue.push_back(parent.clone());
            }
        }
    }
    visited
}

fn inheritable<'a>(
    class: &'a Arc<ClassModel>,
    category: MemberCategory,
    key: &MemberKey,
) -> Option<Resolved<'a>> {
    class
        .members(category)
        .iter()
        .find(|m| m.matches(key) && !m.is_private())
        .map(|member| Resolved {
            declaring_class: class,
            member,
        })
}

/// Locate a non-private member by identity, reporting unfollowable edges.
pub fn resolve_detailed<'a>(
    index: &'a ClasspathIndex,
    class_name: &str,
    key: &MemberKey,
    category: MemberCategory,
) -> Resolution<'a> {
    let mut resolution = Resolution::default();
    let chain = superclass_chain(
        index,
        class_name,
        &mut resolution.missing,
        &mut resolution.cycle,
    );
    if chain.is_empty() {
        return resolution;
    }

    if let Some(found) = chain.iter().find_map(|&c| inheritable(c, category, key)) {
        resolution.found = Some(found);
        return resolution;
    }

    let mut found = None;
    walk_interfaces(index, &chain, &mut resolution.missing, |iface| {
        found = inheritable(iface, category, key);
        found.is_some()
    });
    resolution.found = found;
    resolution
}

/// Locate a non-private member by identity.  Returns `None` when the member
/// does not exist or when `class_name` itself is not in the index.
pub fn resolve<'a>(
    index: &'a ClasspathIndex,
    class_name: &str,
    key: &MemberKey,
    category: MemberCategory,
) -> Option<Resolved<'a>> {
    resolve_detailed(index, class_name, key, category).found
}

/// Collect the superclass chain and transitive interfaces of `class_name`.
pub fn ancestry(index: &ClasspathIndex, class_name: &str) -> Ancestry {
    let mut ancestry = Ancestry::default();
    let chain = superclass_chain(
        index,
        class_name,
        &mut ancestry.missing,
        &mut ancestry.cycle,
    );

    // Names past the last loaded class are still known ancestors.
    ancestry.superclasses = chain
        .iter()
        .skip(1)
        .map(|c| c.qualified_name.clone())
        .collect();
    if let Some(last) = chain.last() {
        if let Some(unloaded) = &last.superclass {
            if !index.contains(unloaded) {
                ancestry.superclasses.push(unloaded.clone());
            }
        }
    }

    ancestry.interfaces = walk_interfaces(index, &chain, &mut ancestry.missing, |_| false);
    ancestry
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
