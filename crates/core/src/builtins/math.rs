use crate::function::{Function, SharedFunction};
use crate::signature::{Parameter, Signature};
use crate::tuple::Tuple;
use crate::types::TypeRegistry;
use crate::value::TupleValue;
use serde::{Deserialize, Serialize};

/// Binary scalar operation shared by the float and integer math functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Minimum,
    Maximum,
    Power,
}

impl MathOp {
    pub const ALL: [MathOp; 7] = [
        MathOp::Add,
        MathOp::Subtract,
        MathOp::Multiply,
        MathOp::Divide,
        MathOp::Minimum,
        MathOp::Maximum,
        MathOp::Power,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MathOp::Add => "add",
            MathOp::Subtract => "subtract",
            MathOp::Multiply => "multiply",
            MathOp::Divide => "divide",
            MathOp::Minimum => "minimum",
            MathOp::Maximum => "maximum",
            MathOp::Power => "power",
        }
    }

    pub fn from_name(name: &str) -> Option<MathOp> {
        MathOp::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Division by zero yields zero rather than infinity or NaN
    pub fn apply_float(self, a: f32, b: f32) -> f32 {
        match self {
            MathOp::Add => a + b,
            MathOp::Subtract => a - b,
            MathOp::Multiply => a * b,
            MathOp::Divide => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            MathOp::Minimum => a.min(b),
            MathOp::Maximum => a.max(b),
            MathOp::Power => a.powf(b),
        }
    }

    /// Wrapping arithmetic; division by zero and negative powers yield zero
    pub fn apply_int(self, a: i32, b: i32) -> i32 {
        match self {
            MathOp::Add => a.wrapping_add(b),
            MathOp::Subtract => a.wrapping_sub(b),
            MathOp::Multiply => a.wrapping_mul(b),
            MathOp::Divide => {
                if b == 0 {
                    0
                } else {
                    a.wrapping_div(b)
                }
            }
            MathOp::Minimum => a.min(b),
            MathOp::Maximum => a.max(b),
            MathOp::Power => u32::try_from(b).map_or(0, |exp| a.wrapping_pow(exp)),
        }
    }
}

fn binary<T, F>(registry: &TypeRegistry, name: String, op: F) -> SharedFunction
where
    T: TupleValue + Clone + 'static,
    F: Fn(T, T) -> T + Send + Sync + 'static,
{
    let ty = registry.borrow(T::KIND);
    let signature = Signature::new(
        vec![Parameter::new("a", ty), Parameter::new("b", ty)],
        vec![Parameter::new("result", ty)],
    );
    Function::builder(name, signature)
        .call_body(move |fn_in: &mut Tuple, fn_out: &mut Tuple| {
            let a = fn_in.get::<T>(0)?;
            let b = fn_in.get::<T>(1)?;
            fn_out.set(0, op(a, b))
        })
        .build()
}

/// `(Float a, Float b) -> (Float result)`
pub fn float_math(registry: &TypeRegistry, op: MathOp) -> SharedFunction {
    binary::<f32, _>(registry, format!("Float Math ({})", op.name()), move |a, b| {
        op.apply_float(a, b)
    })
}

pub fn add_floats(registry: &TypeRegistry) -> SharedFunction {
    float_math(registry, MathOp::Add)
}

/// `(Int32 a, Int32 b) -> (Int32 result)`
pub fn int_math(registry: &TypeRegistry, op: MathOp) -> SharedFunction {
    binary::<i32, _>(registry, format!("Int32 Math ({})", op.name()), move |a, b| {
        op.apply_int(a, b)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_float(registry: &TypeRegistry, op: MathOp, a: f32, b: f32) -> f32 {
        let function = float_math(registry, op);
        let mut fn_in = function.input_tuple();
        let mut fn_out = function.output_tuple();
        fn_in.set(0, a).unwrap();
        fn_in.set(1, b).unwrap();
        function.call(&mut fn_in, &mut fn_out).unwrap();
        fn_out.get(0).unwrap()
    }

    #[test]
    fn test_float_ops() {
        let registry = TypeRegistry::new();
        assert_eq!(run_float(&registry, MathOp::Add, 3.0, 4.0), 7.0);
        assert_eq!(run_float(&registry, MathOp::Subtract, 3.0, 4.0), -1.0);
        assert_eq!(run_float(&registry, MathOp::Multiply, 3.0, 4.0), 12.0);
        assert_eq!(run_float(&registry, MathOp::Divide, 3.0, 0.0), 0.0);
        assert_eq!(run_float(&registry, MathOp::Minimum, 3.0, 4.0), 3.0);
        assert_eq!(run_float(&registry, MathOp::Power, 2.0, 3.0), 8.0);
    }

    #[test]
    fn test_int_ops() {
        assert_eq!(MathOp::Add.apply_int(i32::MAX, 1), i32::MIN);
        assert_eq!(MathOp::Divide.apply_int(7, 0), 0);
        assert_eq!(MathOp::Divide.apply_int(7, 2), 3);
        assert_eq!(MathOp::Power.apply_int(2, 10), 1024);
        assert_eq!(MathOp::Power.apply_int(2, -1), 0);
    }

    #[test]
    fn test_int_math_signature() {
        let registry = TypeRegistry::new();
        let function = int_math(&registry, MathOp::Maximum);
        let int = registry.int32().clone();
        assert!(function
            .signature()
            .has_types(&[int.clone(), int.clone()], &[int]));
        assert_eq!(function.name(), "Int32 Math (maximum)");
    }

    #[test]
    fn test_int_power_call() {
        let registry = TypeRegistry::new();
        let function = int_math(&registry, MathOp::Power);
        assert_eq!(function.name(), "Int32 Math (power)");

        let mut fn_in = function.input_tuple();
        let mut fn_out = function.output_tuple();
        for (base, exp, expected) in [(3, 4, 81), (-2, 3, -8), (5, 0, 1), (5, -2, 0)] {
            fn_in.set(0, base).unwrap();
            fn_in.set(1, exp).unwrap();
            function.call(&mut fn_in, &mut fn_out).unwrap();
            assert_eq!(fn_out.relocate_out::<i32>(0).unwrap(), expected);
        }
    }

    #[test]
    fn test_op_names_round_trip() {
        for op in MathOp::ALL {
            assert_eq!(MathOp::from_name(op.name()), Some(op));
        }
        assert_eq!(MathOp::from_name("modulo"), None);
    }
}
