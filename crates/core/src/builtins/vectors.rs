use crate::function::{Function, SharedFunction};
use crate::signature::{Parameter, Signature};
use crate::tuple::Tuple;
use crate::types::TypeRegistry;
use crate::value::Vector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorOp {
    Add,
    Subtract,
    /// Component-wise
    Multiply,
    Cross,
}

impl VectorOp {
    pub const ALL: [VectorOp; 4] = [
        VectorOp::Add,
        VectorOp::Subtract,
        VectorOp::Multiply,
        VectorOp::Cross,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VectorOp::Add => "add",
            VectorOp::Subtract => "subtract",
            VectorOp::Multiply => "multiply",
            VectorOp::Cross => "cross",
        }
    }

    pub fn from_name(name: &str) -> Option<VectorOp> {
        VectorOp::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn apply(self, a: Vector, b: Vector) -> Vector {
        match self {
            VectorOp::Add => a.zip_with(b, |x, y| x + y),
            VectorOp::Subtract => a.zip_with(b, |x, y| x - y),
            VectorOp::Multiply => a.zip_with(b, |x, y| x * y),
            VectorOp::Cross => a.cross(b),
        }
    }
}

/// `(FVec3 a, FVec3 b) -> (FVec3 result)`
pub fn vector_math(registry: &TypeRegistry, op: VectorOp) -> SharedFunction {
    let fvec3 = registry.fvec3();
    let signature = Signature::new(
        vec![Parameter::new("a", fvec3), Parameter::new("b", fvec3)],
        vec![Parameter::new("result", fvec3)],
    );
    Function::builder(format!("Vector Math ({})", op.name()), signature)
        .call_body(move |fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let a = fn_in.get::<Vector>(0)?;
            let b = fn_in.get::<Vector>(1)?;
            fn_out.set(0, op.apply(a, b))
        })
        .build()
}

/// `(Float x, Float y, Float z) -> (FVec3 vector)`
pub fn combine_vector(registry: &TypeRegistry) -> SharedFunction {
    let float = registry.float();
    let signature = Signature::new(
        vec![
            Parameter::new("x", float),
            Parameter::new("y", float),
            Parameter::new("z", float),
        ],
        vec![Parameter::new("vector", registry.fvec3())],
    );
    Function::builder("Combine Vector", signature)
        .call_body(|fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let vector = Vector::new(fn_in.get(0)?, fn_in.get(1)?, fn_in.get(2)?);
            fn_out.set(0, vector)
        })
        .build()
}

/// `(FVec3 vector) -> (Float x, Float y, Float z)`
pub fn separate_vector(registry: &TypeRegistry) -> SharedFunction {
    let float = registry.float();
    let signature = Signature::new(
        vec![Parameter::new("vector", registry.fvec3())],
        vec![
            Parameter::new("x", float),
            Parameter::new("y", float),
            Parameter::new("z", float),
        ],
    );
    Function::builder("Separate Vector", signature)
        .call_body(|fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let vector = fn_in.get::<Vector>(0)?;
            fn_out.set(0, vector.x)?;
            fn_out.set(1, vector.y)?;
            fn_out.set(2, vector.z)
        })
        .build()
}

/// `(FVec3 a, FVec3 b) -> (Float distance)`
pub fn vector_distance(registry: &TypeRegistry) -> SharedFunction {
    let fvec3 = registry.fvec3();
    let signature = Signature::new(
        vec![Parameter::new("a", fvec3), Parameter::new("b", fvec3)],
        vec![Parameter::new("distance", registry.float())],
    );
    Function::builder("Vector Distance", signature)
        .call_body(|fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let a = fn_in.get::<Vector>(0)?;
            let b = fn_in.get::<Vector>(1)?;
            fn_out.set(0, VectorOp::Subtract.apply(a, b).length())
        })
        .build()
}
