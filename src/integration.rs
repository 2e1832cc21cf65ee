//! Numerical integration

/// Gauss-Legendre quadrature points and the adaptive integration primitive
pub mod glq;

pub use glq::{gauss_quadrature_points, integrate};
