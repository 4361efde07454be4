use bevy_utils::{tracing::warn, HashMap};
use glam::Vec3;
use slotmap::SecondaryMap;

use super::{traversal::OrientedTriangle, vertex_ops::edge_key, StackVec, TriangleId, TriangleMesh, VertexId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
/// Data derived from the vertex and triangle arenas that has to be recomputed after topology changes
pub enum AttributeKind {
    /// Triangle across each edge, used by [`super::traversal::Traversal::across_edge`]
    Adjacency,
    FaceNormals,
    /// Average of the incident face normals
    VertexNormals,
}

pub const ALL_ATTRIBUTES:[AttributeKind;3] = [AttributeKind::Adjacency, AttributeKind::FaceNormals, AttributeKind::VertexNormals];

pub type AttributeStore<K, T> = SecondaryMap<K, T>;

/// For each triangle and each of its edges, the oriented triangle across that edge with the same origin and destination.
/// Edges without a neighbour point back at the triangle itself.
/// Edges shared by more than two triangles are treated as boundary.
pub(crate) fn compute_adjacency(mesh:&TriangleMesh) -> AttributeStore<TriangleId, [OrientedTriangle;3]> {
    let mut edges:HashMap<(VertexId, VertexId), StackVec<OrientedTriangle>> = HashMap::default();
    let mut adjacency = AttributeStore::new();
    for (id, triangle) in &mesh.triangles {
        for edge in 0..3 {
            edges.entry(edge_key(triangle.vertices[edge], triangle.vertices[(edge + 1) % 3]))
                .or_default()
                .push(OrientedTriangle::new(id, edge));
        }
        adjacency.insert(id, [0, 1, 2].map(|edge| OrientedTriangle::new(id, edge)));
    }

    for (key, sides) in edges {
        match sides.as_slice() {
            &[first, second] => {
                let facing = |from:OrientedTriangle, to:OrientedTriangle| {
                    if mesh.goto(from).origin() == mesh.goto(to).origin() { to } else { to.sym() }
                };
                adjacency[first.index()][first.edge_index()] = facing(first, second);
                adjacency[second.index()][second.edge_index()] = facing(second, first);
            }
            &[_] => {}
            _ => warn!("Edge {key:?} is shared by {} triangles, treating it as boundary", sides.len()),
        }
    }
    adjacency
}

pub(crate) fn compute_face_normals(mesh:&mut TriangleMesh) {
    let normals:Vec<_> = mesh.triangles.keys().map(|t| (t, mesh.compute_normal(t))).collect();
    for (triangle, normal) in normals {
        mesh.triangles[triangle].normal = normal;
    }
}

pub(crate) fn compute_vertex_normals(mesh:&TriangleMesh) -> AttributeStore<VertexId, Vec3> {
    mesh.vertices.iter().map(|(id, vertex)| {
        let sum = vertex.triangles.iter().fold(Vec3::ZERO, |acc, &t| acc + mesh.triangles[t].normal);
        (id, sum.normalize_or_zero())
    }).collect()
}
