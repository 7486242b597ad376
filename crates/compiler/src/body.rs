//! Bodies of compiled graph functions

use crate::plan::{Consumption, ExecutionPlan, Source};
use nodefn_core::{Dependencies, DependenciesBody, FnError, SharedFunction, Tuple, TupleCallBody, Value};
use tracing::trace;

/// Runs an [`ExecutionPlan`] against the caller's tuples
///
/// Each step gets fresh tuples from its function; outputs of a step live
/// until their last consumer relocates them. The caller's input tuple is
/// left as it was passed in.
pub struct GraphCallBody {
    plan: ExecutionPlan,
}

impl GraphCallBody {
    pub fn new(plan: ExecutionPlan) -> Self {
        GraphCallBody { plan }
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }
}

impl TupleCallBody for GraphCallBody {
    fn call(&self, fn_in: &mut Tuple, fn_out: &mut Tuple) -> Result<(), FnError> {
        let mut results: Vec<Tuple> = Vec::with_capacity(self.plan.steps.len());
        for step in &self.plan.steps {
            let mut step_in = step.function.input_tuple();
            for (index, consumption) in step.inputs.iter().enumerate() {
                let value = fetch(consumption, fn_in, &mut results)?;
                step_in.set_value(index, value)?;
            }
            let mut step_out = step.function.output_tuple();
            trace!(node = %step.node, "running step");
            step.function.call(&mut step_in, &mut step_out)?;
            results.push(step_out);
        }
        for (index, consumption) in self.plan.outputs.iter().enumerate() {
            let value = fetch(consumption, fn_in, &mut results)?;
            fn_out.set_value(index, value)?;
        }
        Ok(())
    }
}

fn fetch(consumption: &Consumption, fn_in: &Tuple, results: &mut [Tuple]) -> Result<Value, FnError> {
    let (tuple, index) = match &consumption.source {
        Source::Constant(value) => return Ok(value.clone()),
        Source::FunctionInput(index) => return fn_in.copy_value(*index),
        Source::NodeOutput { step, output } => {
            let tuple = results
                .get_mut(*step)
                .ok_or_else(|| FnError::Body(format!("step {} has not run", step)))?;
            (tuple, *output)
        }
    };
    if consumption.relocate {
        tuple.relocate_value(index)
    } else {
        tuple.copy_value(index)
    }
}

/// Declares the union of the dependencies of the functions a graph runs
pub struct GraphDependenciesBody {
    functions: Vec<SharedFunction>,
}

impl GraphDependenciesBody {
    /// `None` if no function has a dependency body
    pub fn for_plan(plan: &ExecutionPlan) -> Option<Self> {
        let functions: Vec<SharedFunction> = plan
            .functions()
            .filter(|f| f.dependencies_body().is_some())
            .cloned()
            .collect();
        if functions.is_empty() {
            None
        } else {
            Some(GraphDependenciesBody { functions })
        }
    }
}

impl DependenciesBody for GraphDependenciesBody {
    fn dependencies(&self, deps: &mut Dependencies) {
        for function in &self.functions {
            function.dependencies(deps);
        }
    }
}
