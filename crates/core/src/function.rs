//! Functions and their bodies
//!
//! A [`Function`] pairs a [`Signature`] with a set of optional bodies. Each
//! body is a separate capability: a function may be callable, declare
//! dependencies, or both. Callers ask for the facet they need and get
//! `None` when the function does not provide it.
//!
//! Functions are immutable once built and shared as [`SharedFunction`]
//! (`Arc<Function>`), so many callers on many threads may hold and call the
//! same function as long as each uses its own pair of tuples.

use crate::dependencies::Dependencies;
use crate::error::FnError;
use crate::signature::Signature;
use crate::tuple::Tuple;
use crate::types::Type;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

pub type SharedFunction = Arc<Function>;

/// Executes a function against an input and an output tuple
///
/// Bodies may relocate values out of `fn_in`; the input tuple is scratch
/// space once the call starts.
pub trait TupleCallBody: Send + Sync {
    fn call(&self, fn_in: &mut Tuple, fn_out: &mut Tuple) -> Result<(), FnError>;
}

impl<F> TupleCallBody for F
where
    F: Fn(&mut Tuple, &mut Tuple) -> Result<(), FnError> + Send + Sync,
{
    fn call(&self, fn_in: &mut Tuple, fn_out: &mut Tuple) -> Result<(), FnError> {
        self(fn_in, fn_out)
    }
}

/// Declares the external data a function reads
pub trait DependenciesBody: Send + Sync {
    fn dependencies(&self, deps: &mut Dependencies);
}

impl<F> DependenciesBody for F
where
    F: Fn(&mut Dependencies) + Send + Sync,
{
    fn dependencies(&self, deps: &mut Dependencies) {
        self(deps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Call,
    Dependencies,
}

impl BodyKind {
    pub fn name(self) -> &'static str {
        match self {
            BodyKind::Call => "call",
            BodyKind::Dependencies => "dependencies",
        }
    }
}

pub struct Function {
    name: String,
    signature: Signature,
    call_body: Option<Box<dyn TupleCallBody>>,
    dependencies_body: Option<Box<dyn DependenciesBody>>,
}

impl Function {
    pub fn builder(name: impl Into<String>, signature: Signature) -> FunctionBuilder {
        FunctionBuilder {
            function: Function {
                name: name.into(),
                signature,
                call_body: None,
                dependencies_body: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn has_body(&self, kind: BodyKind) -> bool {
        match kind {
            BodyKind::Call => self.call_body.is_some(),
            BodyKind::Dependencies => self.dependencies_body.is_some(),
        }
    }

    pub fn call_body(&self) -> Option<&dyn TupleCallBody> {
        self.call_body.as_deref()
    }

    pub fn dependencies_body(&self) -> Option<&dyn DependenciesBody> {
        self.dependencies_body.as_deref()
    }

    /// Fresh, empty tuple laid out for this function's inputs
    pub fn input_tuple(&self) -> Tuple {
        Tuple::new(&self.signature.input_types())
    }

    /// Fresh, empty tuple laid out for this function's outputs
    pub fn output_tuple(&self) -> Tuple {
        Tuple::new(&self.signature.output_types())
    }

    /// Run the call body with contract checks on both sides
    ///
    /// Fails without touching `fn_out` if the input tuple has the wrong
    /// layout or any unset slot. Fails after the call if the body left an
    /// output slot unset.
    pub fn call(&self, fn_in: &mut Tuple, fn_out: &mut Tuple) -> Result<(), FnError> {
        if !same_layout(fn_in.types(), self.signature.inputs().iter().map(|p| p.ty())) {
            return Err(self.violation("input tuple layout does not match signature".to_string()));
        }
        if !same_layout(fn_out.types(), self.signature.outputs().iter().map(|p| p.ty())) {
            return Err(self.violation("output tuple layout does not match signature".to_string()));
        }
        if !fn_in.all_initialized() {
            return Err(self.violation(format!(
                "input slots {:?} not initialized before call",
                fn_in.uninitialized_slots()
            )));
        }

        let body = self.call_body.as_ref().ok_or_else(|| FnError::MissingBody {
            function: self.name.clone(),
            body: BodyKind::Call.name(),
        })?;

        trace!(function = %self.name, "call");
        body.call(fn_in, fn_out)?;

        if !fn_out.all_initialized() {
            return Err(self.violation(format!(
                "output slots {:?} not initialized after call",
                fn_out.uninitialized_slots()
            )));
        }
        Ok(())
    }

    /// Query the dependency body, if any; returns whether one was present
    pub fn dependencies(&self, deps: &mut Dependencies) -> bool {
        match &self.dependencies_body {
            Some(body) => {
                body.dependencies(deps);
                true
            }
            None => false,
        }
    }

    fn violation(&self, reason: String) -> FnError {
        FnError::ContractViolation {
            function: self.name.clone(),
            reason,
        }
    }
}

fn same_layout<'a>(actual: &[Type], expected: impl ExactSizeIterator<Item = &'a Type>) -> bool {
    actual.len() == expected.len() && actual.iter().zip(expected).all(|(a, b)| a == b)
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function: {} {}", self.name, self.signature)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("call_body", &self.call_body.is_some())
            .field("dependencies_body", &self.dependencies_body.is_some())
            .finish()
    }
}

pub struct FunctionBuilder {
    function: Function,
}

impl FunctionBuilder {
    pub fn call_body(mut self, body: impl TupleCallBody + 'static) -> Self {
        self.function.call_body = Some(Box::new(body));
        self
    }

    pub fn dependencies_body(mut self, body: impl DependenciesBody + 'static) -> Self {
        self.function.dependencies_body = Some(Box::new(body));
        self
    }

    pub fn build(self) -> SharedFunction {
        Arc::new(self.function)
    }
}
