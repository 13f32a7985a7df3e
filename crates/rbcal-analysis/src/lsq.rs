//! Bounded nonlinear least squares.
//!
//! [`TrustRegion`] minimises `½·Σ rᵢ(x)²` subject to `lower ≤ x ≤ upper`
//! with the MINPACK Levenberg–Marquardt port of the `levenberg-marquardt`
//! crate. The box is removed by a change of variables: every free
//! parameter is driven through
//!
//! ```text
//! x = lo + (hi − lo)·(1 + sin u) / 2
//! ```
//!
//! so any `u` maps inside `[lo, hi]` and a bound is reached where the
//! derivative of the map vanishes. The Jacobian in `u` is estimated by
//! forward differences.
//!
//! Parameters whose bounds coincide are held fixed and take no part in the
//! Jacobian.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn};
use rbcal_core::FitOptions;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use tracing::{debug, warn};

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Gradient fell below `gtol`.
    Gradient,
    /// Step length fell below `xtol` relative to the parameters.
    Step,
    /// Relative cost reduction fell below `ftol`.
    Cost,
    /// Evaluation budget exhausted.
    MaxEvaluations,
    /// Every parameter is fixed by its bounds.
    NoFreeParameters,
    /// The solver gave up without meeting a tolerance.
    Stalled,
}

impl Termination {
    /// True for the tolerance-based stops.
    pub fn converged(self) -> bool {
        matches!(
            self,
            Termination::Gradient | Termination::Step | Termination::Cost
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::Gradient => "gradient tolerance reached",
            Termination::Step => "step tolerance reached",
            Termination::Cost => "cost tolerance reached",
            Termination::MaxEvaluations => "evaluation budget exhausted",
            Termination::NoFreeParameters => "no free parameters",
            Termination::Stalled => "no downhill step found",
        };
        f.write_str(text)
    }
}

/// Result of one minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Best parameters found.
    pub x: Vec<f64>,
    /// `½·Σr²` at `x`.
    pub cost: f64,
    /// Residual evaluations used, Jacobian columns included.
    pub evaluations: usize,
    /// Stop reason.
    pub termination: Termination,
}

/// Bounded Levenberg–Marquardt solver.
#[derive(Debug, Clone, Copy)]
pub struct TrustRegion {
    xtol: f64,
    ftol: f64,
    gtol: f64,
    max_evaluations: usize,
}

/// Keeps the starting point off the flat top of the sine map.
const EDGE: f64 = 0.999;

impl TrustRegion {
    /// Solver using the tolerances and budget of `options`.
    pub fn new(options: &FitOptions) -> Self {
        Self {
            xtol: options.xtol,
            ftol: options.ftol,
            gtol: options.gtol,
            max_evaluations: options.max_evaluations.max(1),
        }
    }

    /// Minimise the residual function inside `[lower, upper]`.
    ///
    /// `x0` is clamped into the box first. The residual length must not
    /// change between calls.
    pub fn minimize<F>(&self, mut residual: F, x0: &[f64], lower: &[f64], upper: &[f64]) -> Solution
    where
        F: FnMut(&[f64]) -> Vec<f64>,
    {
        let mut x = x0.to_vec();
        for ((v, lo), hi) in x.iter_mut().zip(lower).zip(upper) {
            *v = v.clamp(*lo, *hi);
        }
        let free: Vec<usize> = (0..x.len()).filter(|&i| upper[i] > lower[i]).collect();

        if free.is_empty() {
            let cost = half_norm_sqr(&residual(&x));
            return Solution {
                x,
                cost,
                evaluations: 1,
                termination: Termination::NoFreeParameters,
            };
        }

        let problem = BoxedProblem::new(residual, x, lower, upper, free, self.max_evaluations);
        let (problem, report) = LevenbergMarquardt::new()
            .with_ftol(self.ftol)
            .with_xtol(self.xtol)
            .with_gtol(self.gtol)
            .with_patience(self.max_evaluations)
            .minimize(problem);

        let termination = match report.termination {
            TerminationReason::Converged { ftol: true, .. } | TerminationReason::ResidualsZero => {
                Termination::Cost
            }
            TerminationReason::Converged { .. } => Termination::Step,
            TerminationReason::Orthogonal => Termination::Gradient,
            TerminationReason::LostPatience => Termination::MaxEvaluations,
            _ if problem.exhausted.get() => Termination::MaxEvaluations,
            other => {
                debug!(reason = ?other, "least squares solver gave up");
                Termination::Stalled
            }
        };
        let evaluations = problem.evaluations.get();
        let (cost, x) = problem.best.into_inner();

        if termination.converged() {
            debug!(%termination, cost, evaluations, "least squares finished");
        } else {
            warn!(%termination, cost, evaluations, "least squares stopped early");
        }
        Solution {
            x,
            cost,
            evaluations,
            termination,
        }
    }
}

/// Residual function seen through the sine map of the free parameters.
///
/// The solver only hands out `&self` for residuals and Jacobians, so the
/// user closure, the evaluation count and the best point found live in
/// cells.
struct BoxedProblem<'a, F> {
    residual: RefCell<F>,
    lower: &'a [f64],
    upper: &'a [f64],
    free: Vec<usize>,
    /// Full parameter vector; free slots are overwritten from `u`.
    base: Vec<f64>,
    u: DVector<f64>,
    current: RefCell<Option<DVector<f64>>>,
    evaluations: Cell<usize>,
    budget: usize,
    exhausted: Cell<bool>,
    best: RefCell<(f64, Vec<f64>)>,
}

impl<'a, F> BoxedProblem<'a, F>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    fn new(
        residual: F,
        x: Vec<f64>,
        lower: &'a [f64],
        upper: &'a [f64],
        free: Vec<usize>,
        budget: usize,
    ) -> Self {
        let u = DVector::from_iterator(
            free.len(),
            free.iter().map(|&i| {
                let s = 2.0 * (x[i] - lower[i]) / (upper[i] - lower[i]) - 1.0;
                s.clamp(-EDGE, EDGE).asin()
            }),
        );
        Self {
            residual: RefCell::new(residual),
            lower,
            upper,
            free,
            best: RefCell::new((f64::INFINITY, x.clone())),
            base: x,
            u,
            current: RefCell::new(None),
            evaluations: Cell::new(0),
            budget,
            exhausted: Cell::new(false),
        }
    }

    fn to_box(&self, u: &DVector<f64>) -> Vec<f64> {
        let mut x = self.base.clone();
        for (k, &i) in self.free.iter().enumerate() {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            x[i] = (lo + (hi - lo) * 0.5 * (1.0 + u[k].sin())).clamp(lo, hi);
        }
        x
    }

    /// One residual evaluation at `u`, or `None` once the budget is spent.
    fn evaluate(&self, u: &DVector<f64>) -> Option<DVector<f64>> {
        if self.evaluations.get() >= self.budget {
            self.exhausted.set(true);
            return None;
        }
        let x = self.to_box(u);
        let r = DVector::from_vec((self.residual.borrow_mut())(&x));
        self.evaluations.set(self.evaluations.get() + 1);

        let cost = half_norm_sqr(r.as_slice());
        let mut best = self.best.borrow_mut();
        if cost < best.0 {
            *best = (cost, x);
        }
        Some(r)
    }
}

impl<F> LeastSquaresProblem<f64, Dyn, Dyn> for BoxedProblem<'_, F>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, u: &DVector<f64>) {
        self.u.copy_from(u);
        *self.current.get_mut() = None;
    }

    fn params(&self) -> DVector<f64> {
        self.u.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        if let Some(r) = self.current.borrow().as_ref() {
            return Some(r.clone());
        }
        let r = self.evaluate(&self.u)?;
        *self.current.borrow_mut() = Some(r.clone());
        Some(r)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let r = self.residuals()?;
        if self.evaluations.get() + self.free.len() > self.budget {
            self.exhausted.set(true);
            return None;
        }
        let mut jac = DMatrix::zeros(r.len(), self.free.len());
        let mut shifted_u = self.u.clone();
        for col in 0..self.free.len() {
            let h = f64::EPSILON.sqrt() * self.u[col].abs().max(1.0);
            shifted_u[col] = self.u[col] + h;
            let shifted = self.evaluate(&shifted_u)?;
            shifted_u[col] = self.u[col];
            if shifted.len() != r.len() {
                return None;
            }
            jac.set_column(col, &((shifted - &r) / h));
        }
        Some(jac)
    }
}

fn half_norm_sqr(r: &[f64]) -> f64 {
    0.5 * r.iter().map(|v| v * v).sum::<f64>()
}
