use std::{cmp::Reverse, collections::BinaryHeap};

use bevy_utils::{tracing::{debug, info}, HashSet};
use itertools::Itertools;

use super::{attributes::{AttributeKind, ALL_ATTRIBUTES}, edge_ops, face_ops, selection::TriangleSelection, traversal::OrientedTriangle, vertex_ops::{self, MidpointCache}, TriangleId, TriangleMesh, VertexId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// What a call to [`subdivide`] changed
pub struct Subdivision {
    /// Selected triangles split 1-to-4
    pub subdivided: usize,
    /// Unselected neighbours partially split to close the selection boundary
    pub stitched: usize,
    pub vertices_added: usize,
    pub triangles_added: usize,
}

/// Split every selected triangle into four, sharing one midpoint vertex per edge.
///
/// Only triangles selected when the call starts are split. The corner triangles created here are
/// added to the selection for the next call. An unselected triangle across a split edge receives the
/// edge midpoint and is cut in two so the mesh stays crack-free; it is left unselected.
///
/// Face normals are copied from the split triangles, adjacency and vertex normals are recomputed at the end.
pub fn subdivide(mesh:&mut TriangleMesh, selection:&mut TriangleSelection) -> Subdivision {
    mesh.ensure_attributes();
    let (vertex_count, triangle_count) = (mesh.vertex_count(), mesh.triangle_count());
    let snapshot:Vec<TriangleId> = mesh.triangle_keys().filter(|&t| selection.contains(t)).collect();
    debug!("Subdividing {} of {} triangles", snapshot.len(), triangle_count);

    let mut cache = MidpointCache::default();
    let mut stitched = 0;
    for &triangle in &snapshot {
        let corners = mesh[triangle].vertices;
        let mut midpoints = [VertexId::default();3];
        for (midpoint, (&a, &b)) in midpoints.iter_mut().zip(corners.iter().circular_tuple_windows()) {
            *midpoint = vertex_ops::midpoint(mesh, &mut cache, a, b);
        }

        selection.extend(face_ops::split(mesh, triangle, midpoints));

        for edge in 0..3 {
            // Adjacency still describes the mesh as it was when the call started
            let neighbour = mesh.goto(OrientedTriangle::new(triangle, edge)).across_edge().get_position();
            if neighbour.index() == triangle || selection.contains(neighbour.index()) {
                continue;
            }
            let (a, b) = (corners[edge], corners[(edge + 1) % 3]);
            match edge_holder(mesh, selection, neighbour, a, b) {
                Some(holder) => {
                    face_ops::stitch(mesh, holder, midpoints[edge]);
                    stitched += 1;
                },
                None => debug!("No unselected triangle holds edge {a:?}-{b:?} anymore, skipping"),
            }
        }
    }

    mesh.update_attributes(&[AttributeKind::Adjacency, AttributeKind::VertexNormals]);
    let result = Subdivision {
        subdivided: snapshot.len(),
        stitched,
        vertices_added: mesh.vertex_count() - vertex_count,
        triangles_added: mesh.triangle_count() - triangle_count,
    };
    info!("Subdivided {} triangles, stitched {} neighbours", result.subdivided, result.stitched);
    result
}

/// The unselected triangle currently holding edge `{a, b}`.
/// `neighbour` was across the edge when the call started, but an earlier stitch in the same call
/// may have moved the edge into a newly appended triangle.
fn edge_holder(mesh:&TriangleMesh, selection:&TriangleSelection, neighbour:OrientedTriangle, a:VertexId, b:VertexId) -> Option<OrientedTriangle> {
    let vertices = mesh[neighbour.index()].vertices;
    if let Some(edge) = OrientedTriangle::from_vertices(neighbour.index(), vertices, a, b) {
        return Some(edge);
    }
    debug!("{neighbour:?} already changed in this pass, looking up the triangle holding {a:?}-{b:?}");
    mesh.edge_triangles(a, b).find(|edge| !selection.contains(edge.index()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Limits for a single [`relax`] call
pub struct RelaxParams {
    max_flips: usize,
    max_angle: f32,
}

impl Default for RelaxParams {
    fn default() -> Self {
        Self { max_flips: 10, max_angle: 5.0_f32.to_radians() }
    }
}

impl RelaxParams {
    /// `max_angle` is the largest angle in radians between two triangle normals that still allows a flip
    pub fn new(max_flips:usize, max_angle:f32) -> Self {
        Self { max_flips, max_angle }
    }

    pub fn max_flips(&self) -> usize {
        self.max_flips
    }

    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }

    pub fn with_max_flips(mut self, max_flips:usize) -> Self {
        self.max_flips = max_flips;
        self
    }

    pub fn with_max_angle(mut self, max_angle:f32) -> Self {
        self.max_angle = max_angle;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Candidate {
    priority: usize,
    edge: OrientedTriangle,
}

/// Edges with a selected triangle on both sides, lowest endpoint valence sum first.
/// Every edge is queued once, from the triangle with the lower handle.
pub(crate) fn candidate_edges(mesh:&TriangleMesh, selection:&TriangleSelection) -> BinaryHeap<Reverse<Candidate>> {
    mesh.triangle_keys()
        .filter(|&t| selection.contains(t))
        .flat_map(|t| (0..3).map(move |edge| OrientedTriangle::new(t, edge)))
        .filter(|&edge| {
            let across = mesh.goto(edge).across_edge().index();
            across != edge.index() && selection.contains(across) && edge.index() < across
        })
        .map(|edge| Reverse(Candidate { priority: edge_ops::valence_sum(mesh, edge), edge }))
        .collect()
}

/// Flip up to `params.max_flips` edges inside the selection whose two triangles are within
/// `params.max_angle` of coplanar. A triangle takes part in at most one flip per call.
/// Returns the number of flips performed.
pub fn relax(mesh:&mut TriangleMesh, selection:&TriangleSelection, params:&RelaxParams) -> usize {
    mesh.ensure_attributes();
    let mut candidates = candidate_edges(mesh, selection);
    debug!("{} candidate edges for relaxation", candidates.len());

    let mut modified:HashSet<TriangleId> = HashSet::default();
    let mut flips = 0;
    while flips < params.max_flips {
        let Some(Reverse(Candidate { edge, .. })) = candidates.pop() else { break };
        let across = mesh.goto(edge).across_edge().index();
        if modified.contains(&edge.index()) || modified.contains(&across) {
            continue;
        }
        let angle = edge_ops::dihedral_angle(mesh, edge);
        if angle.is_nan() || angle > params.max_angle {
            debug!("Keeping {edge:?}, normals are {angle} radians apart");
            continue;
        }
        match edge_ops::flip(mesh, edge) {
            Ok((first, second)) => {
                modified.insert(first);
                modified.insert(second);
                flips += 1;
            },
            Err(error) => debug!("Keeping {edge:?}: {error}"),
        }
    }

    mesh.update_attributes(&ALL_ATTRIBUTES);
    if flips < params.max_flips {
        info!("Relaxed {flips} edges, not enough edges fulfilled the relaxation criteria");
    } else {
        info!("Relaxed {flips} edges");
    }
    flips
}
