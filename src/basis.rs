//! Polynomial basis utilities

/// Gauss-Lobatto-Legendre nodal points per polynomial order
pub mod gauss_lobatto;

pub use gauss_lobatto::gauss_lobatto_points;
