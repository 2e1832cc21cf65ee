//! A piecewise-polynomial function represented by nodal values on a [Mesh1D]

use super::mesh::{Mesh1D, MeshError, GEOM_EPS, NODE_EPS};
use crate::basis::gauss_lobatto::gauss_lobatto_points;
use crate::integration::glq::integrate;

use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::ops::Neg;

#[cfg(feature = "json_export")]
use json::{object, JsonValue};

/// A piecewise-polynomial field over a [Mesh1D]
///
/// Each element of order n holds n + 1 nodal values, one per mapped
/// Gauss-Lobatto reference point. The interpolating polynomial of every
/// element is solved for once at construction and reused for all
/// evaluations. A `Function` is never mutated; every transformation returns
/// a new instance.
///
/// Two functions are equal iff they agree within [GEOM_EPS] at the mapped
/// reference points of *both* operands' meshes. Checking only one side is
/// insufficient: different layouts may coincidentally agree on one set of
/// points.
#[derive(Clone, Debug)]
pub struct Function {
    mesh: Mesh1D,
    values: Vec<Vec<f64>>,
    coefficients: Vec<Vec<f64>>,
}

impl Function {
    /// Construct a function by sampling a callable at every element's mapped
    /// Gauss-Lobatto points
    ///
    /// This only evaluates `f` at the nodal points, so the result matches `f`
    /// pointwise there and nowhere else in general; it is not a best
    /// approximation in any norm.
    pub fn from_fn<F>(f: F, mesh: Mesh1D) -> Result<Self, FunctionError>
    where
        F: Fn(f64) -> f64,
    {
        let values = mesh
            .elems()
            .map(|elem| {
                gauss_lobatto_points(elem.order as usize)
                    .iter()
                    .map(|&x_ref| f(elem.to_physical(x_ref)))
                    .collect()
            })
            .collect();

        Self::from_values(values, mesh)
    }

    /// Construct a function from precomputed per-element nodal values
    ///
    /// Element i must hold exactly `orders[i] + 1` values; no resampling is
    /// performed.
    pub fn from_values(values: Vec<Vec<f64>>, mesh: Mesh1D) -> Result<Self, FunctionError> {
        if values.len() != mesh.num_elems() {
            return Err(FunctionError::ElemCountMismatch {
                num_elems: mesh.num_elems(),
                num_value_sets: values.len(),
            });
        }
        for (n, (elem, elem_values)) in mesh.elems().zip(values.iter()).enumerate() {
            if elem_values.len() != elem.order as usize + 1 {
                return Err(FunctionError::ValueCountMismatch {
                    elem_id: n,
                    expected: elem.order as usize + 1,
                    actual: elem_values.len(),
                });
            }
        }

        let coefficients = mesh
            .elems()
            .zip(values.iter())
            .enumerate()
            .map(|(n, (elem, elem_values))| {
                local_polynomial(elem_values, elem.left, elem.right)
                    .ok_or(FunctionError::SingularInterpolation(n))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            mesh,
            values,
            coefficients,
        })
    }

    /// The mesh this function is defined on
    pub fn mesh(&self) -> &Mesh1D {
        &self.mesh
    }

    /// The per-element nodal values
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Evaluate the function at `x`
    ///
    /// The containing element is located with the mesh's [Mesh1D::element_at]
    /// convention and its stored coefficients are evaluated by Horner
    /// accumulation.
    ///
    /// # Panics
    /// Panics if `x` lies past the right end of the mesh by more than
    /// [NODE_EPS].
    pub fn eval(&self, x: f64) -> f64 {
        let n = match self.mesh.element_at(x) {
            Some(n) => n,
            // tolerate the affine map rounding a right endpoint just past
            // the last breakpoint
            None if (x - self.mesh.span().1).abs() < NODE_EPS => self.mesh.num_elems() - 1,
            None => panic!("Point {} lies outside the mesh; Cannot evaluate Function!", x),
        };

        self.coefficients[n]
            .iter()
            .fold(0.0, |accumulated, c| accumulated * x + c)
    }

    /// Re-sample this function onto another mesh
    ///
    /// This is not a true L2 projection: the result only matches `self` at
    /// the target mesh's mapped reference points, so it is not variationally
    /// optimal.
    pub fn project_onto(&self, mesh: &Mesh1D) -> Result<Self, FunctionError> {
        Self::from_fn(|x| self.eval(x), mesh.clone())
    }

    /// The same function with its domain restricted to `[from, to]`
    pub fn restrict_to_interval(&self, from: f64, to: f64) -> Result<Self, FunctionError> {
        let restricted = self.mesh.restrict(from, to)?;
        self.project_onto(&restricted)
    }

    /// Add another function to this one
    ///
    /// If both operands share an identical mesh the nodal values combine
    /// elementwise. Otherwise both are projected onto the mesh union first,
    /// which makes the result subject to the re-sampling caveat of
    /// [Function::project_onto].
    pub fn try_add(&self, other: &Self) -> Result<Self, FunctionError> {
        if self.mesh == other.mesh {
            // interpolation is linear in the nodal values, so the stored
            // coefficients combine elementwise as well
            let values = zipped_sums(&self.values, &other.values);
            let coefficients = zipped_sums(&self.coefficients, &other.coefficients);
            Ok(Self {
                mesh: self.mesh.clone(),
                values,
                coefficients,
            })
        } else {
            let union = self.mesh.union(&other.mesh)?;
            self.project_onto(&union)?.try_add(&other.project_onto(&union)?)
        }
    }

    /// Subtract another function from this one; see [Function::try_add]
    pub fn try_sub(&self, other: &Self) -> Result<Self, FunctionError> {
        self.try_add(&-other)
    }

    /// The integral of the squared function over the whole mesh
    ///
    /// Each element is integrated with the adaptive quadrature primitive and
    /// the results are summed. Note that no square root is taken.
    pub fn l2_norm(&self) -> f64 {
        self.mesh
            .elems()
            .map(|elem| integrate(|x| self.eval(x).powi(2), elem.left, elem.right).0)
            .sum()
    }

    /// The number of global degrees of freedom of a continuous
    /// piecewise-polynomial space with this function's element orders
    ///
    /// Breakpoint values shared by adjacent elements count once.
    pub fn dofs(&self) -> usize {
        1 + self
            .mesh
            .orders()
            .iter()
            .map(|&order| order as usize)
            .sum::<usize>()
    }

    // true if `other` matches this function at every mapped reference point
    // of this function's own mesh
    fn agrees_at_own_points(&self, other: &Self) -> bool {
        self.mesh.elems().all(|elem| {
            gauss_lobatto_points(elem.order as usize)
                .iter()
                .all(|&x_ref| {
                    let x = elem.to_physical(x_ref);
                    (self.eval(x) - other.eval(x)).abs() < GEOM_EPS
                })
        })
    }
}

/// Coefficients, highest degree first, of the unique polynomial through
/// `values` at the mapped Gauss-Lobatto points of `[a, b]`
///
/// Solves the n×n monomial-basis system evaluated at the physical points
/// (Vandermonde-like, and correspondingly ill-conditioned at high order).
/// Returns `None` if the system is singular.
pub fn local_polynomial(values: &[f64], a: f64, b: f64) -> Option<Vec<f64>> {
    let n = values.len();
    let points = gauss_lobatto_points(n - 1);

    let system = DMatrix::from_fn(n, n, |i, j| {
        let x_phys = (a + b) / 2.0 + points[i] * (b - a) / 2.0;
        x_phys.powi((n - j - 1) as i32)
    });
    let rhs = DVector::from_column_slice(values);

    system
        .lu()
        .solve(&rhs)
        .map(|solution| solution.iter().cloned().collect())
}

fn zipped_sums(ours: &[Vec<f64>], theirs: &[Vec<f64>]) -> Vec<Vec<f64>> {
    ours.iter()
        .zip(theirs.iter())
        .map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| x + y).collect())
        .collect()
}

impl Neg for &Function {
    type Output = Function;

    fn neg(self) -> Function {
        let negate = |sets: &[Vec<f64>]| {
            sets.iter()
                .map(|set| set.iter().map(|v| -v).collect())
                .collect()
        };
        Function {
            mesh: self.mesh.clone(),
            values: negate(&self.values),
            coefficients: negate(&self.coefficients),
        }
    }
}

impl PartialEq for Function {
    /// Both functions must cover the same interval; evaluation of either
    /// operand outside its own mesh panics.
    fn eq(&self, other: &Self) -> bool {
        self.agrees_at_own_points(other) && other.agrees_at_own_points(self)
    }
}

#[cfg(feature = "json_export")]
impl From<&Function> for JsonValue {
    fn from(function: &Function) -> Self {
        object! {
            "mesh": JsonValue::from(function.mesh()),
            "values": function.values.clone(),
        }
    }
}

/// The error type for invalid function construction and algebra
#[derive(Clone, Debug, PartialEq)]
pub enum FunctionError {
    ElemCountMismatch {
        num_elems: usize,
        num_value_sets: usize,
    },
    ValueCountMismatch {
        elem_id: usize,
        expected: usize,
        actual: usize,
    },
    SingularInterpolation(usize),
    Mesh(MeshError),
}

impl std::error::Error for FunctionError {}

impl fmt::Display for FunctionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ElemCountMismatch {
                num_elems,
                num_value_sets,
            } => write!(
                f,
                "Mesh has {} elements but {} nodal value sets were given; Cannot construct Function!",
                num_elems, num_value_sets,
            ),
            Self::ValueCountMismatch {
                elem_id,
                expected,
                actual,
            } => write!(
                f,
                "Element {} needs {} nodal values but {} were given; Cannot construct Function!",
                elem_id, expected, actual,
            ),
            Self::SingularInterpolation(elem_id) => write!(
                f,
                "Interpolation system of element {} is singular; Cannot construct Function!",
                elem_id,
            ),
            Self::Mesh(err) => err.fmt(f),
        }
    }
}

impl From<MeshError> for FunctionError {
    fn from(err: MeshError) -> Self {
        Self::Mesh(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-12;

    fn mesh(points: &[f64], orders: &[u8]) -> Mesh1D {
        Mesh1D::new(points.to_vec(), orders.to_vec()).unwrap()
    }

    fn sampled<F: Fn(f64) -> f64>(f: F, points: &[f64], orders: &[u8]) -> Function {
        Function::from_fn(f, mesh(points, orders)).unwrap()
    }

    #[test]
    fn interpolation_is_exact_for_resolved_polynomials() {
        let f = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]);
        for x in [
            -5.0, -4.5, -4.0, -3.0, -2.0, -1.0, 0.0, 0.01, 1e-5, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0,
            7.0, 10.0,
        ] {
            assert!((f.eval(x) - x * x).abs() < EPS, "mismatch at {}", x);
        }
    }

    #[test]
    fn under_resolved_elements_produce_bounded_error() {
        let f = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[1, 5, 2]);
        for x in [-5.0, -4.0, -3.0, 0.0, 1e-5, 2.0, 3.0, 5.0, 10.0] {
            assert!((f.eval(x) - x * x).abs() < EPS);
        }
        assert!((f.eval(-4.9) - (-4.9f64) * (-4.9)).abs() > 0.08);
        assert!((f.eval(-4.5) - (-4.5f64) * (-4.5)).abs() > 0.24);

        let g = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[1, 5, 1]);
        for x in [-5.0, -4.0, -3.0, 0.0, 1.0, 3.0, 10.0] {
            assert!((g.eval(x) - x * x).abs() < EPS);
        }
        assert!((g.eval(4.0) - 16.0).abs() > 5.9);
        assert!((g.eval(5.0) - 25.0).abs() > 9.9);
        assert!((g.eval(6.0) - 36.0).abs() > 11.9);
        assert!((g.eval(7.0) - 49.0).abs() > 11.9);
        assert!((g.eval(9.0) - 81.0).abs() > 5.9);
    }

    #[test]
    fn order_five_element_resolves_up_to_degree_five() {
        let interior = [-4.0, -3.0, -2.0, -1.0, 0.0, 0.01, 1e-5, 1.0, 2.0, 3.0];

        for degree in 2..=5 {
            let f = sampled(
                |x| x.powi(degree),
                &[-5.0, -4.0, 3.0, 10.0],
                &[1, 5, 1],
            );
            for &x in interior.iter() {
                assert!(
                    (f.eval(x) - x.powi(degree)).abs() < EPS,
                    "degree {} at {}",
                    degree,
                    x
                );
            }
        }

        let f = sampled(|x| x.powi(6), &[-5.0, -4.0, 3.0, 10.0], &[1, 5, 1]);
        assert!((f.eval(-1.0) - 1.0).abs() > 61.9);
        assert!((f.eval(0.0)).abs() > 61.9);
        assert!((f.eval(1.0) - 1.0).abs() > 61.6);
        assert!((f.eval(2.0) - 64.0).abs() > 28.9);
    }

    #[test]
    fn projection_is_resampling() {
        let orig_mesh = mesh(&[-5.0, -4.0, 3.0, 10.0], &[1, 5, 1]);
        let coarse_mesh = mesh(&[-5.0, -4.0, 3.0, 10.0], &[1, 1, 1]);

        let f = Function::from_fn(|x| x * x, orig_mesh.clone()).unwrap();
        let g = f.project_onto(&coarse_mesh).unwrap();
        let h = Function::from_fn(|x| x * x, coarse_mesh.clone()).unwrap();

        assert_eq!(g, h);
        assert_eq!(h, h.project_onto(&orig_mesh).unwrap());
    }

    #[test]
    fn equality_is_layout_independent_for_resolved_functions() {
        let f = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]);
        let g = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 2, 2]);
        let h = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 2, 1]);
        let l = sampled(|x| x * x, &[-5.0, 10.0], &[2]);

        assert_eq!(f, g);
        assert_eq!(g, f);
        assert_eq!(f, l);
        assert_eq!(g, l);
        assert_ne!(f, h);
        assert_ne!(h, f);
        assert_ne!(g, h);
        assert_ne!(h, g);

        assert_eq!(f, sampled(|x| x * x, &[-5.0, 10.0], &[3]));
        assert_ne!(f, sampled(|x| x * x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]));
        assert_ne!(f, sampled(|x| x * x, &[-5.0, 10.0], &[1]));
    }

    #[test]
    fn algebra_on_identical_meshes_is_nodal() {
        let f = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]);
        let g = sampled(|x| 2.0 * x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]);

        let sum = f.try_add(&f).unwrap();
        assert_eq!(sum, g);

        let difference = g.try_sub(&f).unwrap();
        assert_eq!(difference, f);
    }

    #[test]
    fn algebra_across_meshes_goes_through_the_union() {
        let f = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]);
        let g = sampled(|x| x * x, &[-5.0, 0.0, 10.0], &[2, 4]);

        let difference = f.try_sub(&g).unwrap();
        assert_eq!(
            difference.mesh(),
            &mesh(&[-5.0, -4.0, 0.0, 3.0, 10.0], &[2, 5, 5, 4])
        );
        assert!(difference.l2_norm() < 1e-10);
    }

    #[test]
    fn negation_flips_every_value() {
        let f = sampled(|x| x + 1.0, &[0.0, 1.0, 2.0], &[1, 2]);
        let negated = -&f;
        for x in [0.0, 0.5, 1.0, 1.5, 2.0] {
            assert_abs_diff_eq!(negated.eval(x), -(x + 1.0), epsilon = EPS);
        }
    }

    #[test]
    fn squared_norm_is_quadratured_per_element() {
        let f = sampled(|x| x, &[0.0, 1.0], &[1]);
        assert_abs_diff_eq!(f.l2_norm(), 1.0 / 3.0, epsilon = 1e-10);

        let g = sampled(|x| x, &[0.0, 0.25, 1.0], &[1, 1]);
        assert_abs_diff_eq!(g.l2_norm(), 1.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn dof_counting_shares_breakpoints() {
        let f = sampled(|x| x, &[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]);
        assert_eq!(f.dofs(), 10);

        let g = sampled(|x| x, &[-5.0, 10.0], &[1]);
        assert_eq!(g.dofs(), 2);
    }

    #[test]
    fn restriction_keeps_values() {
        let f = sampled(|x| x * x, &[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]);
        let restricted = f.restrict_to_interval(-4.0, 3.0).unwrap();
        assert_eq!(restricted.mesh(), &mesh(&[-4.0, 3.0], &[5]));
        for x in [-4.0, -2.0, 0.0, 1.5, 3.0] {
            assert_abs_diff_eq!(restricted.eval(x), x * x, epsilon = EPS);
        }
    }

    #[test]
    fn value_layout_is_checked() {
        let m = mesh(&[-5.0, -4.0, 3.0, 10.0], &[2, 5, 2]);
        assert!(matches!(
            Function::from_values(vec![vec![0.0; 3], vec![0.0; 6]], m.clone()),
            Err(FunctionError::ElemCountMismatch { .. })
        ));
        assert!(matches!(
            Function::from_values(
                vec![vec![0.0; 3], vec![0.0; 5], vec![0.0; 3]],
                m
            ),
            Err(FunctionError::ValueCountMismatch {
                elem_id: 1,
                expected: 6,
                actual: 5,
            })
        ));
    }

    #[test]
    fn local_polynomial_reproduces_coefficients() {
        // 3x² - 2x + 1 sampled at the order-2 points of [-1, 2]
        let f = |x: f64| 3.0 * x * x - 2.0 * x + 1.0;
        let points = gauss_lobatto_points(2);
        let values: Vec<f64> = points
            .iter()
            .map(|&x_ref| f(0.5 + x_ref * 1.5))
            .collect();

        let coefficients = local_polynomial(&values, -1.0, 2.0).unwrap();
        assert_eq!(coefficients.len(), 3);
        assert_abs_diff_eq!(coefficients[0], 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(coefficients[1], -2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(coefficients[2], 1.0, epsilon = 1e-10);
    }
}
