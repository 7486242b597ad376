//! External data dependencies declared by functions
//!
//! A function's dependency body fills a [`Dependencies`] accumulator with
//! the scene data it reads. The host then pushes the accumulated entries
//! into its own dependency graph through a [`DependencySink`], so that a
//! change to that data can trigger re-evaluation without speculatively
//! running the call body.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dependency {
    /// The transform (location, rotation, scale) of a named object
    ObjectTransform(String),
    /// The evaluated geometry of a named object
    ObjectGeometry(String),
}

impl Dependency {
    pub fn object(&self) -> &str {
        match self {
            Dependency::ObjectTransform(name) | Dependency::ObjectGeometry(name) => name,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::ObjectTransform(name) => write!(f, "transform of '{}'", name),
            Dependency::ObjectGeometry(name) => write!(f, "geometry of '{}'", name),
        }
    }
}

/// Receives dependencies on behalf of an external dependency graph
pub trait DependencySink {
    fn add_relation(&mut self, dependency: &Dependency, description: &str);
}

impl DependencySink for Vec<Dependency> {
    fn add_relation(&mut self, dependency: &Dependency, _description: &str) {
        self.push(dependency.clone());
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependencies {
    entries: BTreeSet<Dependency>,
}

impl Dependencies {
    pub fn new() -> Self {
        Dependencies::default()
    }

    pub fn add(&mut self, dependency: Dependency) {
        self.entries.insert(dependency);
    }

    pub fn add_object_transform(&mut self, object: impl Into<String>) {
        self.add(Dependency::ObjectTransform(object.into()));
    }

    pub fn add_object_geometry(&mut self, object: impl Into<String>) {
        self.add(Dependency::ObjectGeometry(object.into()));
    }

    pub fn extend(&mut self, other: &Dependencies) {
        self.entries.extend(other.entries.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.entries.contains(dependency)
    }

    /// Entries in a stable order
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.entries.iter()
    }

    pub fn update_depsgraph(&self, sink: &mut dyn DependencySink) {
        for dependency in &self.entries {
            sink.add_relation(dependency, "Function");
        }
    }
}
