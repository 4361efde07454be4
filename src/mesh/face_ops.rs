use super::{traversal::OrientedTriangle, TriangleId, TriangleMesh, VertexId};

/// Splits a triangle 1-to-4 given the midpoints of its edges, `midpoints[i]` lying on edge `i -> i+1`.
///
/// Three corner triangles are appended, each copying the parent's normal. The parent slot is kept
/// and becomes the central triangle `(m0, m1, m2)`. Returns the corner triangles in corner order.
/// ```text
///           2
///          / \
///        m2---m1
///        / \ / \
///       0---m0--1
/// ```
pub fn split(mesh:&mut TriangleMesh, triangle:TriangleId, midpoints:[VertexId;3]) -> [TriangleId;3] {
    let corners = mesh[triangle].vertices;
    let normal = mesh[triangle].normal;
    let result = [0, 1, 2].map(|i| mesh.insert_triangle([corners[i], midpoints[i], midpoints[(i + 2) % 3]], normal));
    mesh.rewire_triangle(triangle, midpoints);
    result
}

/// Partially splits the triangle of `edge` at `midpoint`, a new vertex lying on that edge.
///
/// With the edge being local edge `k`, the triangle `(n_k, n_k+1, n_k+2)` becomes `(n_k, midpoint, n_k+2)`
/// and a new triangle `(n_k+1, n_k+2, midpoint)` covering the other half is appended with the same normal.
/// Returns the new triangle.
/// ```text
///        far                far
///        / \                /|\
///       /   \      ->      / | \
///      /     \            /  |  \
///     k ----- k+1        k---m---k+1
/// ```
pub fn stitch(mesh:&mut TriangleMesh, edge:OrientedTriangle, midpoint:VertexId) -> TriangleId {
    let triangle = edge.index();
    let k = edge.edge_index();
    let vertices = mesh[triangle].vertices;
    let normal = mesh[triangle].normal;
    let new_triangle = mesh.insert_triangle([vertices[(k + 1) % 3], vertices[(k + 2) % 3], midpoint], normal);
    mesh.replace_vertex(triangle, (k + 1) % 3, midpoint);
    new_triangle
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use slotmap::KeyData;

    use crate::mesh::{tests::sample_square, traversal::OrientedTriangle, vertex_ops::{midpoint, MidpointCache}, TriangleId, VertexId};

    #[test]
    fn test_split() {
        let mut mesh = sample_square();
        let t = TriangleId(KeyData::from_ffi(1));
        let corners = mesh[t].vertices();
        let area = mesh.triangle_area(t);
        let mut cache = MidpointCache::default();
        let midpoints = [0, 1, 2].map(|i| midpoint(&mut mesh, &mut cache, corners[i], corners[(i + 1) % 3]));
        let new_triangles = super::split(&mut mesh, t, midpoints);
        assert_eq!(mesh.triangle_count(), 5);
        assert_eq!(mesh[t].vertices(), midpoints);
        assert_eq!(mesh[new_triangles[0]].vertices(), [corners[0], midpoints[0], midpoints[2]]);
        assert_eq!(mesh[new_triangles[1]].vertices(), [corners[1], midpoints[1], midpoints[0]]);
        assert_eq!(mesh[new_triangles[2]].vertices(), [corners[2], midpoints[2], midpoints[1]]);
        let total:f32 = new_triangles.iter().chain([&t]).map(|&t| mesh.triangle_area(t)).sum();
        assert!((total - area).abs() < 1e-6);
        for t in new_triangles.iter().chain([&t]) {
            assert!(mesh.compute_normal(*t).abs_diff_eq(Vec3::Z, 1e-6));
            assert_eq!(mesh.face_normal(*t), mesh.face_normal(new_triangles[0]));
        }
        assert!(mesh.is_incidence_consistent());
        // Corners only keep the corner triangle from this split
        assert_eq!(mesh.valence(VertexId(KeyData::from_ffi(2))), 1);
    }

    #[test]
    fn test_stitch() {
        let mut mesh = sample_square();
        let t2 = TriangleId(KeyData::from_ffi(2));
        let area = mesh.triangle_area(t2);
        let [v1, v3] = [1, 3].map(|i| VertexId(KeyData::from_ffi(i)));
        let mut cache = MidpointCache::default();
        let m = midpoint(&mut mesh, &mut cache, v1, v3);
        let new_triangle = super::stitch(&mut mesh, OrientedTriangle::new(t2, 0), m);
        assert_eq!(mesh[t2].vertices(), [v1, m, VertexId(KeyData::from_ffi(4))]);
        assert_eq!(mesh[new_triangle].vertices(), [v3, VertexId(KeyData::from_ffi(4)), m]);
        assert!((mesh.triangle_area(t2) + mesh.triangle_area(new_triangle) - area).abs() < 1e-6);
        assert!(mesh.compute_normal(new_triangle).abs_diff_eq(Vec3::Z, 1e-6));
        assert!(mesh.compute_normal(t2).abs_diff_eq(Vec3::Z, 1e-6));
        assert!(mesh.is_incidence_consistent());
    }
}
