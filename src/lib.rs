//! A 1D hp-Adaptive Finite Element Toolkit
//!
//! This library approximates one-dimensional functions with piecewise
//! polynomials on an adaptively refined mesh. Each element of a [Mesh1D]
//! carries its own polynomial order, and a [Function] stores nodal values at
//! the element's mapped Gauss-Lobatto points. The refinement machinery
//! decides, per element, whether to raise the polynomial order
//! (p-refinement), split the element at its midpoint (h-refinement), or do
//! both at once, ranking the alternatives by error reduction per degree of
//! freedom spent.
//!
//! ## Example: one refinement step on sin(x)
//! ```
//! use fem_1d::{Function, Mesh1D};
//! use fem_1d::adaptivity::refine_step;
//! use std::f64::consts::PI;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // a well-resolved reference and a coarse approximation of sin(x)
//! let fine = Mesh1D::new(vec![-PI, -PI / 3.0, PI / 3.0, PI], vec![12, 12, 12])?;
//! let coarse = Mesh1D::new(vec![-PI, -PI / 2.0, 0.0, PI / 2.0, PI], vec![1, 1, 1, 1])?;
//!
//! let f = Function::from_fn(f64::sin, fine)?;
//! let g = f.project_onto(&coarse)?;
//!
//! // the best-scoring local candidate replaces its parent element
//! let refined = refine_step(&g, &f)?;
//! let g_next = f.project_onto(&refined)?;
//!
//! assert!(g_next.try_sub(&f)?.l2_norm() < g.try_sub(&f)?.l2_norm());
//! # Ok(())
//! # }
//! ```

/// Candidate scoring and the hp-refinement step
pub mod adaptivity;
/// Polynomial basis utilities
pub mod basis;
/// Mesh and field types
pub mod domain;
/// Numerical integration
pub mod integration;

pub use adaptivity::{rank_candidates, refine_step, ScoredCandidate};
pub use domain::function::Function;
pub use domain::mesh::{Elem, Mesh1D};
