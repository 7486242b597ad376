use crate::types::Type;
use std::fmt;

/// A named, typed input or output slot of a function
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: &Type) -> Self {
        Parameter {
            name: name.into(),
            ty: ty.clone(),
        }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// Calling contract of a function: ordered inputs and outputs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    inputs: Vec<Parameter>,
    outputs: Vec<Parameter>,
}

impl Signature {
    pub fn new(inputs: Vec<Parameter>, outputs: Vec<Parameter>) -> Self {
        Signature { inputs, outputs }
    }

    pub fn inputs(&self) -> &[Parameter] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Parameter] {
        &self.outputs
    }

    pub fn input_types(&self) -> Vec<Type> {
        self.inputs.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<Type> {
        self.outputs.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p.name == name)
    }

    pub fn input_has_type(&self, index: usize, ty: &Type) -> bool {
        self.inputs.get(index).is_some_and(|p| &p.ty == ty)
    }

    pub fn output_has_type(&self, index: usize, ty: &Type) -> bool {
        self.outputs.get(index).is_some_and(|p| &p.ty == ty)
    }

    /// Identity match against an expected type list
    ///
    /// Arities must agree and every type handle must be the same descriptor.
    pub fn has_types(&self, inputs: &[Type], outputs: &[Type]) -> bool {
        self.inputs.len() == inputs.len()
            && self.outputs.len() == outputs.len()
            && inputs
                .iter()
                .enumerate()
                .all(|(i, ty)| self.input_has_type(i, ty))
            && outputs
                .iter()
                .enumerate()
                .all(|(i, ty)| self.output_has_type(i, ty))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn params(f: &mut fmt::Formatter<'_>, list: &[Parameter]) -> fmt::Result {
            write!(f, "(")?;
            for (i, p) in list.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
            write!(f, ")")
        }

        params(f, &self.inputs)?;
        write!(f, " -> ")?;
        params(f, &self.outputs)
    }
}
