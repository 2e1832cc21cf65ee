//! hp-adaptive refinement: candidate scoring and the refinement step
//!
//! For every element of a coarse approximation, each local refinement
//! candidate is scored by comparing its error reduction against the degrees
//! of freedom it spends. A single step applies the best-scoring candidate
//! across the whole mesh.

use crate::domain::function::{Function, FunctionError};
use crate::domain::mesh::{hp_refinement::generate_candidates, Mesh1D, MeshError, GEOM_EPS};

use rayon::prelude::*;
use std::fmt;

/// Score of an equal-DOF candidate that strictly reduces the error; such a
/// candidate is always accepted ahead of any finite-rate one
pub const ACCEPT_SCORE: f64 = -1e10;

/// Score of an equal-DOF candidate that fails to reduce the error; such a
/// candidate is never taken
pub const REJECT_SCORE: f64 = 1e10;

/// A refinement candidate together with its merit score (lower is better)
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    pub mesh: Mesh1D,
    pub score: f64,
}

/// Compute the merit score of one candidate against the original element
///
/// * Equal DOF counts: [ACCEPT_SCORE] if the candidate's error is strictly
///   lower (a better approximation at the same cost), [REJECT_SCORE]
///   otherwise.
/// * More DOFs: the local slope `(ln err_cand - ln err_orig) /
///   sqrt(dof_cand - dof_orig)` of the log-error vs. sqrt-DOF convergence
///   curve; steeper descent means more error reduction per unit cost.
/// * Fewer DOFs: derefinement, which is not implemented; fails explicitly.
pub fn candidate_score(
    dof_cand: usize,
    err_cand: f64,
    dof_orig: usize,
    err_orig: f64,
) -> Result<f64, AdaptError> {
    use std::cmp::Ordering;

    match dof_cand.cmp(&dof_orig) {
        // the error must drop by more than the geometric tolerance: the
        // unchanged-layout candidate reproduces the original up to roundoff,
        // and noise-level "improvements" must not win the ranking outright
        Ordering::Equal => Ok(if err_cand < err_orig - GEOM_EPS {
            ACCEPT_SCORE
        } else {
            REJECT_SCORE
        }),
        Ordering::Greater => {
            Ok((err_cand.ln() - err_orig.ln()) / ((dof_cand - dof_orig) as f64).sqrt())
        }
        Ordering::Less => Err(AdaptError::DerefinementUnsupported { dof_cand, dof_orig }),
    }
}

/// Score every candidate of every element of `approximation` against the
/// reference function and return them sorted ascending by score
///
/// `reference` is the function being approximated; `approximation` is the
/// current coarse representation of it. The best candidate is first.
/// Elements are scored independently, in parallel on the rayon global
/// threadpool.
pub fn rank_candidates(
    approximation: &Function,
    reference: &Function,
) -> Result<Vec<ScoredCandidate>, AdaptError> {
    let span = tracing::info_span!("rank_candidates");
    let _enter = span.enter();

    let elems: Vec<_> = approximation.mesh().elems().collect();

    let per_elem: Vec<Vec<ScoredCandidate>> = elems
        .par_iter()
        .map(|elem| {
            let original = approximation.restrict_to_interval(elem.left, elem.right)?;
            let local_reference = reference.restrict_to_interval(elem.left, elem.right)?;
            let dof_orig = original.dofs();
            let err_orig = local_reference.try_sub(&original)?.l2_norm();

            generate_candidates(elem)
                .into_iter()
                .map(|mesh| {
                    let trial = Function::from_fn(|x| reference.eval(x), mesh.clone())?;
                    let err_cand = local_reference.try_sub(&trial)?.l2_norm();
                    let score = candidate_score(trial.dofs(), err_cand, dof_orig, err_orig)?;
                    tracing::debug!(
                        left = elem.left,
                        right = elem.right,
                        order = elem.order,
                        score,
                        "scored candidate"
                    );
                    Ok(ScoredCandidate { mesh, score })
                })
                .collect::<Result<Vec<_>, AdaptError>>()
        })
        .collect::<Result<Vec<_>, AdaptError>>()?;

    let mut scored: Vec<ScoredCandidate> = per_elem.into_iter().flatten().collect();
    scored.sort_by(|a, b| a.score.total_cmp(&b.score));

    tracing::debug!(num_candidates = scored.len(), "candidates ranked");
    Ok(scored)
}

/// Perform one hp-refinement step and return the refined mesh
///
/// The globally best-scoring candidate replaces its parent element in
/// `approximation`'s mesh. Repeated application, re-projecting the reference
/// after each step, drives an outer adaptive loop; the stopping criterion
/// (target error or DOF budget) is up to the caller.
pub fn refine_step(approximation: &Function, reference: &Function) -> Result<Mesh1D, AdaptError> {
    let ranked = rank_candidates(approximation, reference)?;
    // every element contributes at least seven candidates, so the ranking is
    // never empty
    let best = &ranked[0];

    tracing::info!(score = best.score, "applying best candidate");
    Ok(approximation.mesh().use_candidate(&best.mesh)?)
}

/// The error type for failed candidate scoring
#[derive(Clone, Debug, PartialEq)]
pub enum AdaptError {
    DerefinementUnsupported { dof_cand: usize, dof_orig: usize },
    Function(FunctionError),
    Mesh(MeshError),
}

impl std::error::Error for AdaptError {}

impl fmt::Display for AdaptError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DerefinementUnsupported { dof_cand, dof_orig } => write!(
                f,
                "Candidate has {} DOFs but the original element has {}; Derefinement is not implemented!",
                dof_cand, dof_orig,
            ),
            Self::Function(err) => err.fmt(f),
            Self::Mesh(err) => err.fmt(f),
        }
    }
}

impl From<FunctionError> for AdaptError {
    fn from(err: FunctionError) -> Self {
        Self::Function(err)
    }
}

impl From<MeshError> for AdaptError {
    fn from(err: MeshError) -> Self {
        Self::Mesh(err)
    }
}
