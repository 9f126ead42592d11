//! Function value types and the operations the registry calls on them.
//!
//! Duplicate terms are permitted in the stored representation and mean
//! summation; comparisons go through [`Function::approx_eq`], which
//! canonicalizes before comparing coefficients.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ModelError, Result};
use crate::handle::VariableHandle;
use crate::modification::{ScalarChange, VectorChange};

/// Operations the registry needs from a function value.
pub trait Function: Clone + PartialEq + fmt::Debug {
    /// Incremental modification delta accepted by this function kind.
    type Change: fmt::Debug;

    /// Stable name of this function kind, used in errors and kind listings.
    fn kind_name() -> &'static str;

    /// Number of output rows; scalar functions return 1.
    fn output_dimension(&self) -> usize;

    /// Strips every occurrence of `variable` from the function.
    fn remove_variable(&mut self, variable: VariableHandle);

    /// `Some(v)` when the function is a direct projection of exactly one
    /// variable. Constraints on such a function become unrepresentable
    /// when that variable is deleted and are removed by the cascade.
    fn single_variable(&self) -> Option<VariableHandle> {
        None
    }

    /// Applies an incremental modification delta.
    fn apply(&mut self, change: &Self::Change) -> Result<()>;

    /// Coefficient-wise comparison within `tolerance`, after
    /// canonicalizing duplicate terms.
    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool;
}

fn accumulate<K: Ord>(map: &mut BTreeMap<K, f64>, key: K, coefficient: f64) {
    *map.entry(key).or_insert(0.0) += coefficient;
}

fn maps_approx_eq<K: Ord + Copy>(
    a: &BTreeMap<K, f64>,
    b: &BTreeMap<K, f64>,
    tolerance: f64,
) -> bool {
    a.keys()
        .chain(b.keys())
        .all(|k| (a.get(k).unwrap_or(&0.0) - b.get(k).unwrap_or(&0.0)).abs() <= tolerance)
}

/// A function that is exactly one variable.
///
/// The single-variable projection kind: constraints on it are deleted
/// outright when the referenced variable is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableRef {
    /// The referenced variable.
    pub variable: VariableHandle,
}

impl VariableRef {
    /// Creates a projection of `variable`.
    pub fn new(variable: VariableHandle) -> Self {
        VariableRef { variable }
    }
}

impl Default for VariableRef {
    // Placeholder referencing the never-issued handle 0; overwritten by
    // the load phase of the two-phase protocol before use.
    fn default() -> Self {
        VariableRef::new(VariableHandle::from_raw(0))
    }
}

impl Function for VariableRef {
    type Change = ScalarChange;

    fn kind_name() -> &'static str {
        "VariableRef"
    }

    fn output_dimension(&self) -> usize {
        1
    }

    fn remove_variable(&mut self, _variable: VariableHandle) {
        // Constraints on this kind are cascade victims, never rewritten.
    }

    fn single_variable(&self) -> Option<VariableHandle> {
        Some(self.variable)
    }

    fn apply(&mut self, _change: &ScalarChange) -> Result<()> {
        Err(ModelError::UnsupportedModification(
            "a single-variable projection has no coefficients or constant",
        ))
    }

    fn approx_eq(&self, other: &Self, _tolerance: f64) -> bool {
        self == other
    }
}

/// One `coefficient * variable` term of an affine function.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AffineTerm {
    /// The variable.
    pub variable: VariableHandle,
    /// Its coefficient.
    pub coefficient: f64,
}

impl AffineTerm {
    /// Creates a `coefficient * variable` term.
    pub fn new(variable: VariableHandle, coefficient: f64) -> Self {
        AffineTerm {
            variable,
            coefficient,
        }
    }
}

/// The scalar affine function `sum(terms) + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalarAffine {
    /// Affine terms; duplicates mean summation.
    pub terms: Vec<AffineTerm>,
    /// Constant offset.
    pub constant: f64,
}

impl ScalarAffine {
    /// Creates the function from terms and a constant.
    pub fn new(terms: Vec<AffineTerm>, constant: f64) -> Self {
        ScalarAffine { terms, constant }
    }

    /// The zero function: no terms, zero constant.
    pub fn empty() -> Self {
        ScalarAffine::default()
    }

    /// Convenience: builds `sum(coefficient * variable)` with no constant.
    pub fn from_terms(terms: &[(VariableHandle, f64)]) -> Self {
        ScalarAffine {
            terms: terms
                .iter()
                .map(|&(v, c)| AffineTerm::new(v, c))
                .collect(),
            constant: 0.0,
        }
    }

    /// True when the function has no terms and a zero constant.
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    fn canonical(&self) -> BTreeMap<u64, f64> {
        let mut map = BTreeMap::new();
        for term in &self.terms {
            accumulate(&mut map, term.variable.raw(), term.coefficient);
        }
        map
    }

    fn apply_scalar(terms: &mut Vec<AffineTerm>, constant: &mut f64, change: &ScalarChange) {
        match change {
            ScalarChange::Constant(value) => *constant = *value,
            ScalarChange::Coefficient(variable, coefficient) => {
                terms.retain(|t| t.variable != *variable);
                if *coefficient != 0.0 {
                    terms.push(AffineTerm::new(*variable, *coefficient));
                }
            }
        }
    }
}

impl Function for ScalarAffine {
    type Change = ScalarChange;

    fn kind_name() -> &'static str {
        "ScalarAffine"
    }

    fn output_dimension(&self) -> usize {
        1
    }

    fn remove_variable(&mut self, variable: VariableHandle) {
        self.terms.retain(|t| t.variable != variable);
    }

    fn apply(&mut self, change: &ScalarChange) -> Result<()> {
        ScalarAffine::apply_scalar(&mut self.terms, &mut self.constant, change);
        Ok(())
    }

    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.constant - other.constant).abs() <= tolerance
            && maps_approx_eq(&self.canonical(), &other.canonical(), tolerance)
    }
}

/// One `coefficient * variable_1 * variable_2` term of a quadratic
/// function.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadraticTerm {
    /// First variable of the product.
    pub variable_1: VariableHandle,
    /// Second variable of the product.
    pub variable_2: VariableHandle,
    /// Its coefficient.
    pub coefficient: f64,
}

impl QuadraticTerm {
    /// Creates a `coefficient * variable_1 * variable_2` term.
    pub fn new(variable_1: VariableHandle, variable_2: VariableHandle, coefficient: f64) -> Self {
        QuadraticTerm {
            variable_1,
            variable_2,
            coefficient,
        }
    }

    fn touches(&self, variable: VariableHandle) -> bool {
        self.variable_1 == variable || self.variable_2 == variable
    }
}

/// The scalar quadratic function
/// `sum(quadratic_terms) + sum(affine_terms) + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalarQuadratic {
    /// Quadratic terms; duplicates mean summation.
    pub quadratic_terms: Vec<QuadraticTerm>,
    /// Affine terms; duplicates mean summation.
    pub affine_terms: Vec<AffineTerm>,
    /// Constant offset.
    pub constant: f64,
}

impl ScalarQuadratic {
    /// Creates the function from its term lists and constant.
    pub fn new(
        quadratic_terms: Vec<QuadraticTerm>,
        affine_terms: Vec<AffineTerm>,
        constant: f64,
    ) -> Self {
        ScalarQuadratic {
            quadratic_terms,
            affine_terms,
            constant,
        }
    }

    fn canonical_affine(&self) -> BTreeMap<u64, f64> {
        let mut map = BTreeMap::new();
        for term in &self.affine_terms {
            accumulate(&mut map, term.variable.raw(), term.coefficient);
        }
        map
    }

    fn canonical_quadratic(&self) -> BTreeMap<(u64, u64), f64> {
        let mut map = BTreeMap::new();
        for term in &self.quadratic_terms {
            let a = term.variable_1.raw();
            let b = term.variable_2.raw();
            // Products commute; key by the ordered pair.
            accumulate(&mut map, (a.min(b), a.max(b)), term.coefficient);
        }
        map
    }
}

impl Function for ScalarQuadratic {
    type Change = ScalarChange;

    fn kind_name() -> &'static str {
        "ScalarQuadratic"
    }

    fn output_dimension(&self) -> usize {
        1
    }

    fn remove_variable(&mut self, variable: VariableHandle) {
        self.quadratic_terms.retain(|t| !t.touches(variable));
        self.affine_terms.retain(|t| t.variable != variable);
    }

    fn apply(&mut self, change: &ScalarChange) -> Result<()> {
        // Deltas target the affine part; quadratic terms are replaced
        // wholesale through set_function.
        ScalarAffine::apply_scalar(&mut self.affine_terms, &mut self.constant, change);
        Ok(())
    }

    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.constant - other.constant).abs() <= tolerance
            && maps_approx_eq(&self.canonical_affine(), &other.canonical_affine(), tolerance)
            && maps_approx_eq(
                &self.canonical_quadratic(),
                &other.canonical_quadratic(),
                tolerance,
            )
    }
}

/// The vector-valued function whose rows are the listed variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorOfVariables {
    /// One output row per variable, in order.
    pub variables: Vec<VariableHandle>,
}

impl VectorOfVariables {
    /// Creates the function from its row variables.
    pub fn new(variables: Vec<VariableHandle>) -> Self {
        VectorOfVariables { variables }
    }
}

impl Function for VectorOfVariables {
    type Change = VectorChange;

    fn kind_name() -> &'static str {
        "VectorOfVariables"
    }

    fn output_dimension(&self) -> usize {
        self.variables.len()
    }

    fn remove_variable(&mut self, variable: VariableHandle) {
        self.variables.retain(|&v| v != variable);
    }

    fn apply(&mut self, _change: &VectorChange) -> Result<()> {
        Err(ModelError::UnsupportedModification(
            "a vector of variables has no coefficients or constants",
        ))
    }

    fn approx_eq(&self, other: &Self, _tolerance: f64) -> bool {
        self == other
    }
}

/// One `coefficient * variable` term in an output row of a vector
/// affine function.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorAffineTerm {
    /// Output row the term contributes to.
    pub output_index: usize,
    /// The variable.
    pub variable: VariableHandle,
    /// Its coefficient.
    pub coefficient: f64,
}

impl VectorAffineTerm {
    /// Creates a term contributing `coefficient * variable` to row
    /// `output_index`.
    pub fn new(output_index: usize, variable: VariableHandle, coefficient: f64) -> Self {
        VectorAffineTerm {
            output_index,
            variable,
            coefficient,
        }
    }
}

/// The vector affine function `A x + b`, stored as sparse terms plus a
/// dense constant vector.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorAffine {
    /// Sparse terms; duplicates mean summation.
    pub terms: Vec<VectorAffineTerm>,
    /// One constant per output row.
    pub constants: Vec<f64>,
}

impl VectorAffine {
    /// Creates the function from sparse terms and row constants.
    pub fn new(terms: Vec<VectorAffineTerm>, constants: Vec<f64>) -> Self {
        VectorAffine { terms, constants }
    }

    fn canonical(&self) -> BTreeMap<(usize, u64), f64> {
        let mut map = BTreeMap::new();
        for term in &self.terms {
            accumulate(
                &mut map,
                (term.output_index, term.variable.raw()),
                term.coefficient,
            );
        }
        map
    }
}

impl Function for VectorAffine {
    type Change = VectorChange;

    fn kind_name() -> &'static str {
        "VectorAffine"
    }

    fn output_dimension(&self) -> usize {
        self.constants.len()
    }

    fn remove_variable(&mut self, variable: VariableHandle) {
        // Rows are fixed; only the variable's terms disappear.
        self.terms.retain(|t| t.variable != variable);
    }

    fn apply(&mut self, change: &VectorChange) -> Result<()> {
        match change {
            VectorChange::Constants(rows) => {
                for &(row, value) in rows {
                    let slot = self.constants.get_mut(row).ok_or(
                        ModelError::UnsupportedModification("constant row out of range"),
                    )?;
                    *slot = value;
                }
            }
            VectorChange::Coefficients(entries) => {
                for &(row, variable, coefficient) in entries {
                    if row >= self.constants.len() {
                        return Err(ModelError::UnsupportedModification(
                            "coefficient row out of range",
                        ));
                    }
                    self.terms
                        .retain(|t| !(t.output_index == row && t.variable == variable));
                    if coefficient != 0.0 {
                        self.terms
                            .push(VectorAffineTerm::new(row, variable, coefficient));
                    }
                }
            }
        }
        Ok(())
    }

    fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.constants.len() == other.constants.len()
            && self
                .constants
                .iter()
                .zip(&other.constants)
                .all(|(a, b)| (a - b).abs() <= tolerance)
            && maps_approx_eq(&self.canonical(), &other.canonical(), tolerance)
    }
}
