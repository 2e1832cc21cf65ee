//! A 1D mesh: ordered breakpoints with a polynomial order per element

/// Structures and functions to generate local hp-refinement candidates
pub mod hp_refinement;

use std::fmt;

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
#[cfg(feature = "json_export")]
use std::fs::{read_to_string, File};
#[cfg(feature = "json_export")]
use std::io::BufWriter;

/// Tolerance for exact node lookups. Two coordinates within this distance
/// refer to the same node.
pub const NODE_EPS: f64 = 1e-10;

/// Tolerance for geometric comparisons: mesh equality, clip-boundary
/// alignment and breakpoint deduplication all use this value.
pub const GEOM_EPS: f64 = 1e-12;

/// A single mesh element: a closed sub-interval with an associated
/// polynomial order
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Elem {
    pub left: f64,
    pub right: f64,
    pub order: u8,
}

impl Elem {
    /// Map a reference coordinate in `[-1, 1]` to physical coordinates over
    /// this element
    pub fn to_physical(&self, x_ref: f64) -> f64 {
        (self.left + self.right) / 2.0 + x_ref * (self.right - self.left) / 2.0
    }

    /// The physical midpoint of the element
    pub fn midpoint(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// An immutable ordered partition of a real interval into elements, each
/// with a polynomial order
///
/// Breakpoints are strictly increasing; this is relied upon everywhere but
/// not checked beyond the length invariants. Every operation builds a fresh
/// `Mesh1D`; nothing is mutated in place.
///
/// Two meshes are equal iff their order sequences match element-for-element
/// and their breakpoints agree pairwise within [GEOM_EPS]. No merging or
/// splitting normalization is applied.
#[derive(Clone, Debug)]
pub struct Mesh1D {
    points: Vec<f64>,
    orders: Vec<u8>,
}

impl Mesh1D {
    /// Construct a mesh from its breakpoints and per-element orders
    ///
    /// Returns an `Err` if the lengths are inconsistent (`points` must hold
    /// exactly one more entry than `orders`) or fewer than two breakpoints
    /// are given.
    pub fn new(points: Vec<f64>, orders: Vec<u8>) -> Result<Self, MeshError> {
        if points.len() != orders.len() + 1 {
            return Err(MeshError::SizeMismatch {
                num_points: points.len(),
                num_orders: orders.len(),
            });
        }
        if points.len() < 2 {
            return Err(MeshError::TooFewPoints(points.len()));
        }

        Ok(Self { points, orders })
    }

    // internal constructor for callers that build valid layouts by
    // construction (candidate generation)
    pub(crate) fn from_parts(points: Vec<f64>, orders: Vec<u8>) -> Self {
        debug_assert_eq!(points.len(), orders.len() + 1);
        debug_assert!(points.len() >= 2);
        Self { points, orders }
    }

    /// The ordered breakpoint sequence
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// The per-element polynomial orders
    pub fn orders(&self) -> &[u8] {
        &self.orders
    }

    /// Number of elements in the mesh
    pub fn num_elems(&self) -> usize {
        self.orders.len()
    }

    /// The interval covered by the mesh, as `(leftmost, rightmost)`
    pub fn span(&self) -> (f64, f64) {
        (self.points[0], self.points[self.points.len() - 1])
    }

    /// Iterate over the elements left-to-right
    pub fn elems(&self) -> impl Iterator<Item = Elem> + '_ {
        (0..self.orders.len()).map(move |n| self.elem(n))
    }

    /// Get an element by its id
    ///
    /// # Panics
    /// Panics if `n` is out of bounds.
    pub fn elem(&self, n: usize) -> Elem {
        Elem {
            left: self.points[n],
            right: self.points[n + 1],
            order: self.orders[n],
        }
    }

    /// The id of the first element (left-to-right) whose right bound is >= x,
    /// or `None` if `x` lies past the right end of the mesh
    ///
    /// At a shared breakpoint this returns the element whose right bound
    /// coincides with it; elements with right bound strictly below `x` are
    /// skipped.
    pub fn element_at(&self, x: f64) -> Option<usize> {
        self.elems().position(|elem| elem.right >= x)
    }

    /// The index of the breakpoint equal to `x` within [NODE_EPS]
    pub fn node_index(&self, x: f64) -> Result<usize, MeshError> {
        self.points
            .iter()
            .position(|node| (node - x).abs() < NODE_EPS)
            .ok_or(MeshError::NodeNotFound(x))
    }

    /// The sub-mesh covering exactly `[from, to]`
    ///
    /// The first and last overlapping elements are clipped to the requested
    /// boundary; boundaries already aligned with a breakpoint (within
    /// [GEOM_EPS]) are left untouched. Boundary configurations the clipping
    /// logic does not cover fail explicitly.
    ///
    /// # Panics
    /// Panics if `from >= to`.
    pub fn restrict(&self, from: f64, to: f64) -> Result<Self, MeshError> {
        assert!(to > from, "Restriction interval must satisfy from < to");
        let n1 = self
            .element_at(from)
            .ok_or(MeshError::UncoveredPoint(from))?;
        let n2 = self.element_at(to).ok_or(MeshError::UncoveredPoint(to))?;

        let mut points = Vec::with_capacity(n2 - n1 + 2);
        let mut orders = Vec::with_capacity(n2 - n1 + 1);

        // first overlapping element: degenerate if `from` sits on its right
        // bound, otherwise clipped on the left
        let first = self.elem(n1);
        if (first.right - from).abs() >= GEOM_EPS {
            let left = if (first.left - from).abs() < GEOM_EPS {
                first.left
            } else if first.left < from {
                from
            } else {
                return Err(MeshError::UnsupportedRestriction(from));
            };
            points.push(left);
            orders.push(first.order);
        }

        // interior elements pass through unclipped
        for n in (n1 + 1)..n2 {
            points.push(self.points[n]);
            orders.push(self.orders[n]);
        }

        // last overlapping element: clipped on both sides (it is also the
        // first element whenever the interval falls inside a single one)
        let last = self.elem(n2);
        let mut left = last.left;
        if (left - from).abs() >= GEOM_EPS && left < from {
            left = from;
        }
        let right = if (last.right - to).abs() < GEOM_EPS {
            last.right
        } else if to < last.right {
            to
        } else {
            return Err(MeshError::UnsupportedRestriction(to));
        };
        if points
            .last()
            .map_or(true, |previous| (previous - left).abs() >= GEOM_EPS)
        {
            points.push(left);
            orders.push(last.order);
        }
        points.push(right);

        Self::new(points, orders)
    }

    /// Merge two meshes over the same interval into their order envelope
    ///
    /// The breakpoint sets are merged (deduplicated within [GEOM_EPS]) and
    /// every resulting sub-interval takes the larger of the two orders its
    /// midpoint falls into. This is an order-envelope merge, not a structural
    /// union of polynomial spaces.
    pub fn union(&self, other: &Self) -> Result<Self, MeshError> {
        let mut merged: Vec<f64> = self
            .points
            .iter()
            .chain(other.points.iter())
            .cloned()
            .collect();
        merged.sort_by(f64::total_cmp);

        let mut points = vec![merged[0]];
        for &point in merged[1..].iter() {
            // points is never empty here
            if (points.last().unwrap() - point).abs() < GEOM_EPS {
                continue;
            }
            points.push(point);
        }

        let mut orders = Vec::with_capacity(points.len() - 1);
        for pair in points.windows(2) {
            let midpoint = (pair[0] + pair[1]) / 2.0;
            let ours = self
                .element_at(midpoint)
                .ok_or(MeshError::UncoveredPoint(midpoint))?;
            let theirs = other
                .element_at(midpoint)
                .ok_or(MeshError::UncoveredPoint(midpoint))?;
            orders.push(self.orders[ours].max(other.orders[theirs]));
        }

        Self::new(points, orders)
    }

    /// Replace the elements covered by `candidate` with the candidate's own
    /// elements, returning the refined mesh
    ///
    /// Both endpoints of the candidate must be existing nodes of this mesh
    /// (within [NODE_EPS]); interior candidate breakpoints may be new.
    pub fn use_candidate(&self, candidate: &Self) -> Result<Self, MeshError> {
        let n1 = self.node_index(candidate.points[0])?;
        let n2 = self.node_index(candidate.points[candidate.points.len() - 1])?;

        let mut points = Vec::with_capacity(self.points.len() + candidate.points.len());
        points.extend_from_slice(&self.points[..n1]);
        points.extend_from_slice(&candidate.points);
        points.extend_from_slice(&self.points[n2 + 1..]);

        let mut orders = Vec::with_capacity(self.orders.len() + candidate.orders.len());
        orders.extend_from_slice(&self.orders[..n1]);
        orders.extend_from_slice(&candidate.orders);
        orders.extend_from_slice(&self.orders[n2..]);

        Self::new(points, orders)
    }

    /// Construct a Mesh1D from a JSON file with the following format
    ///
    /// mesh.json
    /// ```JSON
    /// {
    ///     "points": [-5.0, -4.0, 3.0, 10.0],
    ///     "orders": [2, 5, 2]
    /// }
    /// ```
    #[cfg(feature = "json_export")]
    pub fn from_file(path: impl AsRef<str>) -> std::io::Result<Self> {
        let mesh_file_contents = read_to_string(path.as_ref())?;
        let mesh_file_json =
            json::parse(&mesh_file_contents).expect("Unable to parse Mesh File as JSON!");

        let points = mesh_file_json["points"]
            .members()
            .map(|point| {
                point
                    .as_f64()
                    .expect("Mesh File 'points' must be an array of numbers!")
            })
            .collect();
        let orders = mesh_file_json["orders"]
            .members()
            .map(|order| {
                order
                    .as_u8()
                    .expect("Mesh File 'orders' must be an array of small integers!")
            })
            .collect();

        Ok(Self::new(points, orders).expect("Mesh File does not describe a valid Mesh1D!"))
    }

    /// Write the mesh to a JSON file at the designated `path`
    #[cfg(feature = "json_export")]
    pub fn to_file(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        JsonValue::from(self).write_pretty(&mut writer, 4)
    }
}

impl PartialEq for Mesh1D {
    fn eq(&self, other: &Self) -> bool {
        self.orders == other.orders
            && self
                .points
                .iter()
                .zip(other.points.iter())
                .all(|(ours, theirs)| (ours - theirs).abs() < GEOM_EPS)
    }
}

#[cfg(feature = "json_export")]
impl From<&Mesh1D> for JsonValue {
    fn from(mesh: &Mesh1D) -> Self {
        object! {
            "points": mesh.points.clone(),
            "orders": mesh.orders.clone(),
        }
    }
}

/// The error type for invalid mesh construction and mesh algebra
#[derive(Clone, Debug, PartialEq)]
pub enum MeshError {
    SizeMismatch { num_points: usize, num_orders: usize },
    TooFewPoints(usize),
    NodeNotFound(f64),
    UncoveredPoint(f64),
    UnsupportedRestriction(f64),
}

impl std::error::Error for MeshError {}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SizeMismatch {
                num_points,
                num_orders,
            } => write!(
                f,
                "Mesh has {} points and {} orders (expected {}); Cannot construct Mesh1D!",
                num_points,
                num_orders,
                num_orders + 1,
            ),
            Self::TooFewPoints(num_points) => write!(
                f,
                "Mesh has {} points but needs at least 2; Cannot construct Mesh1D!",
                num_points,
            ),
            Self::NodeNotFound(x) => {
                write!(f, "No node at coordinate {}; Cannot look up node id!", x)
            }
            Self::UncoveredPoint(x) => write!(
                f,
                "Point {} is not covered by any element; Cannot locate element!",
                x,
            ),
            Self::UnsupportedRestriction(x) => write!(
                f,
                "Restriction boundary {} is neither aligned with a breakpoint nor interior to the clipped element; Cannot restrict Mesh1D!",
                x,
            ),
        }
    }
}
