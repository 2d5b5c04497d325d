//! Force closure test.
//!
//! Full rank of the grasp matrix is necessary but not sufficient. When the rank is there, a
//! linear program looks for coefficients `k` with `G·k = w` (`w = 0` for internal forces,
//! an external load otherwise) where every pushing coefficient is at least
//! `min_coefficient`. Tangential (bisense) coefficients are split into a positive and a
//! negative part so that the weighted objective stays bounded and penalizes their magnitude.

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use nalgebra::DVector;
use tracing::{debug, warn};
use crate::contact::Sense;
use crate::grasp_error::GraspError;
use crate::grasp_matrix::GraspMatrix;
use crate::parameters::AnalysisConfig;
use crate::utils::snap_to_zero;
use crate::wrench_traits::Wrench;

/// Body wrench the contacts must balance.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadCase {
    /// Homogeneous equilibrium, `G·k = 0`.
    Internal,
    /// Contacts must produce this body wrench, `G·k = w`.
    External(Wrench),
}

/// Outcome of a force closure query, created fresh per query.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceClosureResult {
    pub rank: usize,
    pub is_full_rank: bool,
    pub is_feasible: bool,
    /// One coefficient per grasp matrix column, present only when feasible.
    pub coefficients: Option<DVector<f64>>,
    /// Weighted objective at the optimum, present only when feasible.
    pub objective: Option<f64>,
}

impl ForceClosureResult {
    fn rank_deficient(rank: usize) -> Self {
        ForceClosureResult { rank, is_full_rank: false, is_feasible: false, coefficients: None, objective: None }
    }

    /// Both conditions hold: full rank and a strictly positive unisense solution.
    pub fn is_force_closure(&self) -> bool {
        self.is_full_rank && self.is_feasible
    }

    /// Coefficients of a single contact as `(candidate, coefficient)` pairs.
    pub fn coefficients_of(&self, grasp: &GraspMatrix, contact: usize) -> Vec<(usize, f64)> {
        match &self.coefficients {
            None => Vec::new(),
            Some(k) => grasp.columns().iter().enumerate()
                .filter(|(_, c)| c.contact == contact)
                .map(|(column, c)| (c.candidate, k[column]))
                .collect(),
        }
    }
}

enum ColumnVars {
    Single(Variable),
    Split(Variable, Variable),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceClosureSolver {
    pub tolerance: f64,
    pub min_coefficient: f64,
    pub max_coefficient: Option<f64>,
}

impl Default for ForceClosureSolver {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl ForceClosureSolver {
    pub fn new(config: &AnalysisConfig) -> Self {
        ForceClosureSolver {
            tolerance: config.tolerance,
            min_coefficient: config.min_coefficient,
            max_coefficient: config.max_coefficient,
        }
    }

    /// Equal weight for every column.
    pub fn uniform_weights(grasp: &GraspMatrix) -> Vec<f64> {
        vec![1.0; grasp.ncols()]
    }

    /// Internal force case: can the contacts squeeze the body with every pushing force
    /// strictly positive while the net wrench stays zero?
    pub fn analyze(&self, grasp: &GraspMatrix, weights: &[f64]) -> Result<ForceClosureResult, GraspError> {
        self.analyze_load(grasp, weights, &LoadCase::Internal)
    }

    pub fn analyze_load(&self, grasp: &GraspMatrix, weights: &[f64], load: &LoadCase)
                        -> Result<ForceClosureResult, GraspError> {
        self.validate(grasp, weights, load)?;

        let dim = grasp.dimensionality().wrench_dim();
        let rank = grasp.rank(self.tolerance);
        if rank < dim {
            warn!("grasp matrix rank {} is below {}, no force closure", rank, dim);
            return Ok(ForceClosureResult::rank_deficient(rank));
        }

        let target = match load {
            LoadCase::Internal => Wrench::zeros(dim),
            LoadCase::External(w) => w.clone(),
        };

        let upper = self.max_coefficient.unwrap_or(f64::INFINITY);
        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let vars: Vec<ColumnVars> = grasp.columns().iter().zip(weights)
            .map(|(column, weight)| match column.sense {
                Sense::Unisense =>
                    ColumnVars::Single(problem.add_var(*weight, (self.min_coefficient, upper))),
                Sense::Bisense => {
                    let positive = problem.add_var(*weight, (0.0, upper));
                    let negative = problem.add_var(*weight, (0.0, upper));
                    ColumnVars::Split(positive, negative)
                }
            })
            .collect();

        // Full rank leaves no empty row. Coefficients go in unsnapped, exact zeros are skipped.
        let g = grasp.matrix();
        for row in 0..dim {
            let mut expr = LinearExpr::empty();
            for (column, var) in vars.iter().enumerate() {
                let a = g[(row, column)];
                if a == 0.0 {
                    continue;
                }
                match var {
                    ColumnVars::Single(x) => expr.add(*x, a),
                    ColumnVars::Split(p, n) => {
                        expr.add(*p, a);
                        expr.add(*n, -a);
                    }
                }
            }
            problem.add_constraint(expr, ComparisonOp::Eq, target[row]);
        }

        match problem.solve() {
            Ok(solution) => {
                let mut k = DVector::from_iterator(vars.len(), vars.iter().map(|var| match var {
                    ColumnVars::Single(x) => solution[*x],
                    ColumnVars::Split(p, n) => solution[*p] - solution[*n],
                }));
                snap_to_zero(&mut k, self.tolerance);
                debug!("force closure program solved, objective {}", solution.objective());
                Ok(ForceClosureResult {
                    rank,
                    is_full_rank: true,
                    is_feasible: true,
                    coefficients: Some(k),
                    objective: Some(solution.objective()),
                })
            }
            Err(minilp::Error::Infeasible) => {
                warn!("force closure program is infeasible");
                Ok(ForceClosureResult { rank, is_full_rank: true, is_feasible: false, coefficients: None, objective: None })
            }
            Err(err) =>
                Err(GraspError::SolverError(format!("force closure program failed: {:?}", err))),
        }
    }

    fn validate(&self, grasp: &GraspMatrix, weights: &[f64], load: &LoadCase) -> Result<(), GraspError> {
        if weights.len() != grasp.ncols() {
            return Err(GraspError::InvalidInput(format!(
                "{} weights given for {} columns", weights.len(), grasp.ncols()
            )));
        }
        if let Some((i, w)) = weights.iter().enumerate().find(|(_, w)| !(w.is_finite() && **w >= 0.0)) {
            return Err(GraspError::InvalidInput(format!("weight {} must be finite and not negative (got {})", i, w)));
        }
        if !(self.min_coefficient.is_finite() && self.min_coefficient > 0.0) {
            return Err(GraspError::InvalidInput(format!(
                "min_coefficient must be positive (got {})", self.min_coefficient
            )));
        }
        if let LoadCase::External(w) = load {
            let dim = grasp.dimensionality().wrench_dim();
            if w.len() != dim {
                return Err(GraspError::DimensionMismatch { contact: 0, expected: dim, found: w.len() });
            }
            if !w.iter().all(|v| v.is_finite()) {
                return Err(GraspError::InvalidInput("external load must be finite".to_string()));
            }
        }
        Ok(())
    }
}
