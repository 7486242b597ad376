//! Functions that read scene objects
//!
//! These are the functions that carry a dependency body: the host has to
//! know which objects a compiled function reads so it can re-evaluate when
//! they move.

use crate::dependencies::Dependencies;
use crate::function::{Function, SharedFunction};
use crate::signature::{Parameter, Signature};
use crate::tuple::Tuple;
use crate::types::TypeRegistry;
use crate::value::Vector;
use std::collections::HashMap;
use std::sync::Arc;

/// Read access to the host's scene objects
pub trait ObjectSource: Send + Sync {
    fn location(&self, object: &str) -> Option<Vector>;
}

/// Fixed table of object locations
#[derive(Debug, Clone, Default)]
pub struct StaticObjects {
    locations: HashMap<String, Vector>,
}

impl StaticObjects {
    pub fn new() -> Self {
        StaticObjects::default()
    }

    pub fn with_location(mut self, object: impl Into<String>, location: Vector) -> Self {
        self.insert(object, location);
        self
    }

    pub fn insert(&mut self, object: impl Into<String>, location: Vector) {
        self.locations.insert(object.into(), location);
    }
}

impl ObjectSource for StaticObjects {
    fn location(&self, object: &str) -> Option<Vector> {
        self.locations.get(object).copied()
    }
}

/// `() -> (FVec3 location)` for one named object
///
/// A missing object reads as the origin. An empty object name declares no
/// dependency.
pub fn object_transforms(
    registry: &TypeRegistry,
    object: &str,
    source: Arc<dyn ObjectSource>,
) -> SharedFunction {
    let signature = Signature::new(vec![], vec![Parameter::new("location", registry.fvec3())]);
    let call_object = object.to_string();
    let deps_object = object.to_string();
    Function::builder(format!("Object Transforms ({})", object), signature)
        .call_body(move |_: &mut Tuple, fn_out: &mut Tuple| {
            let location = source.location(&call_object).unwrap_or(Vector::ZERO);
            fn_out.set(0, location)
        })
        .dependencies_body(move |deps: &mut Dependencies| {
            if !deps_object.is_empty() {
                deps.add_object_transform(deps_object.as_str());
            }
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::Dependency;

    #[test]
    fn test_reads_location_and_declares_dependency() {
        let registry = TypeRegistry::new();
        let objects = StaticObjects::new().with_location("Cube", Vector::new(1.0, 2.0, 3.0));
        let function = object_transforms(&registry, "Cube", Arc::new(objects));

        let mut fn_in = function.input_tuple();
        let mut fn_out = function.output_tuple();
        function.call(&mut fn_in, &mut fn_out).unwrap();
        assert_eq!(fn_out.get::<Vector>(0).unwrap(), Vector::new(1.0, 2.0, 3.0));

        let mut deps = Dependencies::new();
        assert!(function.dependencies(&mut deps));
        assert!(deps.contains(&Dependency::ObjectTransform("Cube".to_string())));
    }

    #[test]
    fn test_missing_object_reads_origin() {
        let registry = TypeRegistry::new();
        let function = object_transforms(&registry, "", Arc::new(StaticObjects::new()));
        let mut fn_in = function.input_tuple();
        let mut fn_out = function.output_tuple();
        function.call(&mut fn_in, &mut fn_out).unwrap();
        assert_eq!(fn_out.get::<Vector>(0).unwrap(), Vector::ZERO);

        let mut deps = Dependencies::new();
        function.dependencies(&mut deps);
        assert!(deps.is_empty());
    }
}
