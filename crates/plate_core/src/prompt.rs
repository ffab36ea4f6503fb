//! Interactive collaborator seam.

use std::collections::HashMap;

use plate_spec::{Activation, Collection, RawValue};

use crate::error::CoreResult;

/// Asks the user for values between the two activation passes.
///
/// `activation` is the first pass, computed from the values in `known`.
/// Returned answers join the CLI override layer.
pub trait Prompter {
    fn prompt(
        &mut self,
        collection: &Collection,
        activation: &Activation,
        known: &HashMap<String, RawValue>,
    ) -> CoreResult<HashMap<String, RawValue>>;
}

/// Answers from a fixed map, for scripted and test runs.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: HashMap<String, RawValue>,
    /// Variables that were asked about, in order.
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.answers.insert(name.into(), value.into());
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(
        &mut self,
        collection: &Collection,
        _activation: &Activation,
        _known: &HashMap<String, RawValue>,
    ) -> CoreResult<HashMap<String, RawValue>> {
        let mut answers = HashMap::new();
        for (_, var) in collection.variables() {
            if let Some(value) = self.answers.get(&var.name) {
                self.asked.push(var.name.clone());
                answers.insert(var.name.clone(), value.clone());
            }
        }
        Ok(answers)
    }
}
