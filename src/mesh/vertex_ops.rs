use bevy_utils::HashMap;

use super::{TriangleMesh, VertexId};

/// Midpoint vertices created during one operation, keyed by the edge they split
pub type MidpointCache = HashMap<(VertexId, VertexId), VertexId>;

/// Canonical key of the undirected edge `{a, b}`
#[inline]
pub fn edge_key(a:VertexId, b:VertexId) -> (VertexId, VertexId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Returns the vertex halfway between `a` and `b`. The vertex is created the first time
/// the edge is seen and reused afterwards, so two triangles sharing the edge share the midpoint.
pub fn midpoint(mesh:&mut TriangleMesh, cache:&mut MidpointCache, a:VertexId, b:VertexId) -> VertexId {
    *cache.entry(edge_key(a, b)).or_insert_with(|| {
        let position = (mesh[a].position + mesh[b].position) / 2.0;
        mesh.insert_vertex(position)
    })
}
