//! Execution plan of a compiled graph
//!
//! A plan is a list of steps, one per node the output depends on, in
//! evaluation order. Every step input and every graph output names where
//! its value comes from and whether this is the value's last consumption.
//! Last consumptions of step outputs relocate the value out of its slot,
//! earlier ones copy it; a list built inside the graph that flows to a
//! single consumer is handed over without its reference count ever rising,
//! so `get_mutable` can extend it in place.
//!
//! The caller's input tuple is only ever copied from, so a host can set
//! inputs once and call repeatedly. Copying a list input clones its handle,
//! not its elements.

use nodefn_core::{SharedFunction, Value};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Slot of the compiled function's input tuple
    FunctionInput(usize),
    /// Output slot of an earlier step
    NodeOutput { step: usize, output: usize },
    /// Default value of an unlinked socket
    Constant(Value),
}

impl Source {
    /// Step output slot this source may relocate from
    fn relocatable_slot(&self) -> Option<(usize, usize)> {
        match self {
            Source::NodeOutput { step, output } => Some((*step, *output)),
            Source::FunctionInput(_) | Source::Constant(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::FunctionInput(index) => write!(f, "input[{}]", index),
            Source::NodeOutput { step, output } => write!(f, "step[{}].out[{}]", step, output),
            Source::Constant(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Consumption {
    pub source: Source,
    pub relocate: bool,
}

impl Consumption {
    pub fn new(source: Source) -> Self {
        Consumption {
            source,
            relocate: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    /// Name of the graph node this step runs
    pub node: String,
    pub function: SharedFunction,
    /// One entry per input parameter of `function`
    pub inputs: Vec<Consumption>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub steps: Vec<Step>,
    /// One entry per output of the compiled function
    pub outputs: Vec<Consumption>,
}

impl ExecutionPlan {
    /// Set `relocate` on the final consumption of every step output slot
    pub fn mark_last_uses(&mut self) {
        let mut last: HashMap<(usize, usize), &mut Consumption> = HashMap::new();
        let consumptions = self
            .steps
            .iter_mut()
            .flat_map(|step| step.inputs.iter_mut())
            .chain(self.outputs.iter_mut());
        for consumption in consumptions {
            consumption.relocate = false;
            if let Some(slot) = consumption.source.relocatable_slot() {
                last.insert(slot, consumption);
            }
        }
        for consumption in last.into_values() {
            consumption.relocate = true;
        }
    }

    /// Functions of all steps, in evaluation order
    pub fn functions(&self) -> impl Iterator<Item = &SharedFunction> {
        self.steps.iter().map(|step| &step.function)
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn consumptions(f: &mut fmt::Formatter<'_>, items: &[Consumption]) -> fmt::Result {
            for (i, c) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                if c.relocate {
                    write!(f, "move ")?;
                }
                write!(f, "{}", c.source)?;
            }
            Ok(())
        }

        for (index, step) in self.steps.iter().enumerate() {
            write!(f, "step[{}] {} = {}(", index, step.node, step.function.name())?;
            consumptions(f, &step.inputs)?;
            writeln!(f, ")")?;
        }
        write!(f, "return (")?;
        consumptions(f, &self.outputs)?;
        write!(f, ")")
    }
}
