use serde::Serialize;
use smallvec::SmallVec;

use charon_network::define_index_newtype;

define_index_newtype!(VarId, f64);

/// Sum of coefficient-weighted variables; constants live on the
/// constraint's right-hand side.
#[derive(Serialize, Debug, Clone, Default)]
pub struct LinearExpr {
    terms: SmallVec<[(VarId, f64); 4]>,
}

impl LinearExpr {
    pub fn new() -> Self {
        LinearExpr::default()
    }

    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * values[var])
            .sum()
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

#[derive(Serialize, Debug, Clone)]
pub struct Constraint {
    label: String,
    expr: LinearExpr,
    sense: Sense,
    rhs: f64,
}

impl Constraint {
    pub fn new(label: String, expr: LinearExpr, sense: Sense, rhs: f64) -> Self {
        Constraint {
            label,
            expr,
            sense,
            rhs,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn expr(&self) -> &LinearExpr {
        &self.expr
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}
