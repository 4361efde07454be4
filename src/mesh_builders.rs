use bevy_math::primitives::{Cuboid, Rectangle, Tetrahedron};
use glam::{Vec2, Vec3};
use itertools::Itertools;

use crate::mesh::{attributes::ALL_ATTRIBUTES, TriangleMesh, VertexId};

/// A trait used for primitives to construct a [`TriangleMesh`]
pub trait TriangleMeshBuilder {
    /// Generate an editable [`TriangleMesh`] with all attributes up to date
    fn procgen(&self) -> TriangleMesh;
}

fn build(positions:&[Vec3], triangles:&[[usize;3]]) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    let vertices:Vec<VertexId> = positions.iter().map(|&p| mesh.new_vertex(p)).collect();
    for triangle in triangles {
        mesh.new_triangle(triangle.map(|idx| vertices[idx]));
    }
    mesh.update_attributes(&ALL_ATTRIBUTES);
    mesh
}

impl TriangleMeshBuilder for Rectangle {
    /// Lies in the XY plane facing +Z
    fn procgen(&self) -> TriangleMesh {
        let Vec2{x, y} = self.half_size;
        let positions = [
            Vec3::new(-x, -y, 0.0),
            Vec3::new(x, -y, 0.0),
            Vec3::new(x, y, 0.0),
            Vec3::new(-x, y, 0.0),
        ];
        build(&positions, &[[0, 1, 2], [0, 2, 3]])
    }
}

impl TriangleMeshBuilder for Cuboid {
    fn procgen(&self) -> TriangleMesh {
        let Vec3{x, y, z} = self.half_size;
        let quads = [
            [0, 1, 2, 3], //     7-..__
            [4, 5, 6, 7], //    4|..__  6
            [7, 6, 1, 0], //    ||     5|        y
            [0, 3, 4, 7], //    ||     ||        |
            [1, 6, 5, 2], //    |0 -..__1       /-> x
            [2, 5, 4, 3], //    3 -..__2       z
        ];
        let positions = [
            Vec3::new(-x, -y, -z), // 0
            Vec3::new(x, -y, -z),  // 1
            Vec3::new(x, -y, z),   // 2
            Vec3::new(-x, -y, z),  // 3
            Vec3::new(-x, y, z),   // 4
            Vec3::new(x, y, z),    // 5
            Vec3::new(x, y, -z),   // 6
            Vec3::new(-x, y, -z)   // 7
        ];
        // Fan each quad from its first corner
        let triangles:Vec<[usize;3]> = quads.iter()
            .flat_map(|quad| quad[1..].iter().tuple_windows().map(|(&b, &c)| [quad[0], b, c]))
            .collect();
        build(&positions, &triangles)
    }
}

impl TriangleMeshBuilder for Tetrahedron {
    /// Faces are wound outward whichever way the vertices are ordered
    fn procgen(&self) -> TriangleMesh {
        let mut faces = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        if self.signed_volume().is_sign_negative() {
            faces.iter_mut().for_each(|face| face.swap(1, 2));
        }
        build(&self.vertices, &faces)
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::primitives::{Cuboid, Rectangle, Tetrahedron};
    use glam::Vec3;

    use crate::mesh::{mesh_ops::subdivide, selection::TriangleSelection, traversal::OrientedTriangle, TriangleMesh};

    use super::TriangleMeshBuilder;

    fn is_closed(mesh:&TriangleMesh) -> bool {
        mesh.triangle_keys()
            .flat_map(|t| (0..3).map(move |edge| OrientedTriangle::new(t, edge)))
            .all(|edge| !mesh.goto(edge).is_boundary())
    }

    /// Every face normal points away from the centroid
    fn is_outward(mesh:&TriangleMesh) -> bool {
        let centroid = mesh.vertex_keys().map(|v| mesh.position(v)).sum::<Vec3>() / mesh.vertex_count() as f32;
        mesh.triangle_keys().all(|t| {
            let corner = mesh.position(mesh[t].vertices()[0]);
            mesh.face_normal(t).dot(corner - centroid) > 0.0
        })
    }

    #[test]
    fn test_rectangle() {
        let mesh = Rectangle::new(2.0, 1.0).procgen();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        let area:f32 = mesh.triangle_keys().map(|t| mesh.triangle_area(t)).sum();
        assert!((area - 2.0).abs() < 1e-6);
        for t in mesh.triangle_keys() {
            assert!(mesh.face_normal(t).abs_diff_eq(Vec3::Z, 1e-6));
        }
        for v in mesh.vertex_keys() {
            assert!(mesh.vertex_normal(v).abs_diff_eq(Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn test_cuboid() {
        let mesh = Cuboid::new(1.0, 2.0, 3.0).procgen();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_incidence_consistent());
        assert!(is_closed(&mesh));
        assert!(is_outward(&mesh));
        let area:f32 = mesh.triangle_keys().map(|t| mesh.triangle_area(t)).sum();
        assert!((area - 22.0).abs() < 1e-5);
    }

    #[test]
    fn test_tetrahedron() {
        let tetrahedron = Tetrahedron::new(Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z);
        let mesh = tetrahedron.procgen();
        assert_eq!(mesh.triangle_count(), 4);
        assert!(is_closed(&mesh));
        assert!(is_outward(&mesh));
        // Swapping two vertices mirrors the volume sign
        let mirrored = Tetrahedron::new(Vec3::X, Vec3::ZERO, Vec3::Y, Vec3::Z).procgen();
        assert!(is_closed(&mirrored));
        assert!(is_outward(&mirrored));
    }

    #[test]
    fn test_subdivide_cuboid() {
        let mut mesh = Cuboid::default().procgen();
        let mut selection = TriangleSelection::all(&mesh);
        let result = subdivide(&mut mesh, &mut selection);
        assert_eq!(result.stitched, 0);
        // One midpoint per edge of the triangulated cuboid
        assert_eq!(mesh.vertex_count(), 8 + 18);
        assert_eq!(mesh.triangle_count(), 48);
        assert!(mesh.is_incidence_consistent());
        assert!(is_closed(&mesh));
        assert!(is_outward(&mesh));
    }
}
