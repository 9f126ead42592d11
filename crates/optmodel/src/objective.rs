//! Objective holder.

use optmodel_core::error::Result;
use optmodel_core::{
    Function, ScalarAffine, ScalarChange, ScalarQuadratic, VariableHandle, VariableRef,
};

/// Optimization sense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectiveSense {
    /// No optimization direction; find any feasible point.
    #[default]
    Feasibility,
    /// Minimize the objective function.
    Minimize,
    /// Maximize the objective function.
    Maximize,
}

/// The scalar function kinds an objective can hold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarFunction {
    /// A single variable.
    Variable(VariableRef),
    /// An affine expression.
    Affine(ScalarAffine),
    /// A quadratic expression.
    Quadratic(ScalarQuadratic),
}

impl Default for ScalarFunction {
    fn default() -> Self {
        ScalarFunction::Affine(ScalarAffine::empty())
    }
}

impl From<VariableRef> for ScalarFunction {
    fn from(f: VariableRef) -> Self {
        ScalarFunction::Variable(f)
    }
}

impl From<ScalarAffine> for ScalarFunction {
    fn from(f: ScalarAffine) -> Self {
        ScalarFunction::Affine(f)
    }
}

impl From<ScalarQuadratic> for ScalarFunction {
    fn from(f: ScalarQuadratic) -> Self {
        ScalarFunction::Quadratic(f)
    }
}

impl ScalarFunction {
    /// Number of terms; a single variable counts as one.
    pub fn num_terms(&self) -> usize {
        match self {
            ScalarFunction::Variable(_) => 1,
            ScalarFunction::Affine(f) => f.terms.len(),
            ScalarFunction::Quadratic(f) => f.quadratic_terms.len() + f.affine_terms.len(),
        }
    }

    /// The constant offset; a single variable has none.
    pub fn constant(&self) -> f64 {
        match self {
            ScalarFunction::Variable(_) => 0.0,
            ScalarFunction::Affine(f) => f.constant,
            ScalarFunction::Quadratic(f) => f.constant,
        }
    }

    /// Coefficient-wise comparison within `tolerance`. Functions of
    /// different kinds never compare equal.
    pub fn approx_eq(&self, other: &ScalarFunction, tolerance: f64) -> bool {
        match (self, other) {
            (ScalarFunction::Variable(a), ScalarFunction::Variable(b)) => {
                a.approx_eq(b, tolerance)
            }
            (ScalarFunction::Affine(a), ScalarFunction::Affine(b)) => a.approx_eq(b, tolerance),
            (ScalarFunction::Quadratic(a), ScalarFunction::Quadratic(b)) => {
                a.approx_eq(b, tolerance)
            }
            _ => false,
        }
    }

    fn remove_variable(&mut self, variable: VariableHandle) {
        match self {
            // A projection of the deleted variable collapses to zero.
            ScalarFunction::Variable(f) if f.variable == variable => {
                *self = ScalarFunction::Affine(ScalarAffine::empty());
            }
            ScalarFunction::Variable(_) => {}
            ScalarFunction::Affine(f) => f.remove_variable(variable),
            ScalarFunction::Quadratic(f) => f.remove_variable(variable),
        }
    }

    fn apply(&mut self, change: &ScalarChange) -> Result<()> {
        match self {
            ScalarFunction::Variable(f) => f.apply(change),
            ScalarFunction::Affine(f) => f.apply(change),
            ScalarFunction::Quadratic(f) => f.apply(change),
        }
    }
}

/// The sense and function of the optimization objective, with flags
/// recording whether either was ever explicitly set.
#[derive(Debug, Default)]
pub(crate) struct Objective {
    sense: ObjectiveSense,
    function: ScalarFunction,
    sense_was_set: bool,
    function_was_set: bool,
}

impl Objective {
    pub(crate) fn new() -> Self {
        Objective::default()
    }

    pub(crate) fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub(crate) fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
        self.sense_was_set = true;
    }

    pub(crate) fn function(&self) -> &ScalarFunction {
        &self.function
    }

    pub(crate) fn set_function(&mut self, function: ScalarFunction) {
        self.function = function;
        self.function_was_set = true;
    }

    pub(crate) fn modify(&mut self, change: &ScalarChange) -> Result<()> {
        self.function.apply(change)
    }

    pub(crate) fn remove_variable(&mut self, variable: VariableHandle) {
        self.function.remove_variable(variable);
    }

    /// True while the objective is in its freshly constructed state:
    /// neither sense nor function ever set and the function still the
    /// empty affine expression.
    pub(crate) fn is_pristine(&self) -> bool {
        !self.sense_was_set
            && !self.function_was_set
            && self.function.num_terms() == 0
            && self.function.constant() == 0.0
    }
}
