use super::{traversal::OrientedTriangle, TriangleId, TriangleMesh};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipError {
    /// Nothing across the edge to flip with
    Boundary,
    /// The new diagonal is already an edge of the mesh, flipping would make it non-manifold
    EdgeExists,
    /// Both triangles have the same far vertex
    Degenerate,
}

impl std::fmt::Display for FlipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boundary => f.write_str("edge lies on the mesh boundary"),
            Self::EdgeExists => f.write_str("flipped diagonal already exists"),
            Self::Degenerate => f.write_str("triangles share their far vertex"),
        }
    }
}

impl std::error::Error for FlipError {}

/// Swap the diagonal of the quadrilateral formed by `edge`'s triangle and the triangle across it.
///
/// ```text
///        c                 c
///       / \               /|\
///      / 1 \             / | \
///     a --->b    ->     a 2|1 b
///      \ 2 /             \ | /
///       \ /               \|/
///        d                 d
/// ```
/// In the first triangle the edge origin `a` is replaced by `d`, in the second the edge destination `b`
/// is replaced by `c`. Both slots keep their handles. Returns `(first, second)`.
///
/// Uses adjacency from the last attribute update, so neither triangle may have been modified since.
pub fn flip(mesh:&mut TriangleMesh, edge:OrientedTriangle) -> Result<(TriangleId, TriangleId), FlipError> {
    let first = mesh.goto(edge);
    let second = first.across_edge();
    if second == first {
        return Err(FlipError::Boundary);
    }
    let (c, d) = (first.far_vertex(), second.far_vertex());
    if c == d {
        return Err(FlipError::Degenerate);
    }
    if mesh.edge_triangles(c, d).next().is_some() {
        return Err(FlipError::EdgeExists);
    }
    let (first_local, second_local) = (first.origin_local(), second.destination_local());
    let (first, second) = (first.index(), second.index());
    mesh.replace_vertex(first, first_local, d);
    mesh.replace_vertex(second, second_local, c);
    Ok((first, second))
}

/// Angle in radians between the normals of the two triangles sharing `edge`, from current positions.
/// NaN when either triangle is degenerate.
pub fn dihedral_angle(mesh:&TriangleMesh, edge:OrientedTriangle) -> f32 {
    let first = mesh.compute_normal(edge.index());
    let second = mesh.compute_normal(mesh.goto(edge).across_edge().index());
    (first.dot(second) / (first.length() * second.length())).clamp(-1.0, 1.0).acos()
}

/// Sum of the valences of the edge's two endpoints
pub fn valence_sum(mesh:&TriangleMesh, edge:OrientedTriangle) -> usize {
    let edge = mesh.goto(edge);
    mesh.valence(edge.origin()) + mesh.valence(edge.destination())
}
