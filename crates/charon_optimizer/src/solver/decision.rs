use serde::Serialize;

use crate::model::linear::VarId;

/// Raw variable assignment returned by a solver: one value per model
/// variable. Produced once, consumed by the extractor, never mutated
/// afterwards.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DecisionAssignment {
    values: Vec<f64>,
}

impl DecisionAssignment {
    pub fn zeroed(num_variables: usize) -> Self {
        DecisionAssignment {
            values: vec![0.0; num_variables],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values[var]
    }

    pub fn set(&mut self, var: VarId, value: f64) {
        self.values[var] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
