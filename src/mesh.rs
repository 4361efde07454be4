use std::collections::BTreeSet;

use attributes::{AttributeKind, AttributeStore, ALL_ATTRIBUTES};
use bevy_utils::default;
use glam::Vec3;
use slotmap::{SecondaryMap, SlotMap};
use smallvec::SmallVec;
use traversal::{OrientedTriangle, Traversal, TraversalError, TraversalErrorKind, TraversalResult};

pub mod attributes;
pub mod traversal;
pub mod selection;
pub mod vertex_ops;
pub mod edge_ops;
pub mod face_ops;
pub mod mesh_ops;


use crate::OPTIMIZE_FOR_VALENCE_UNDER_SIZE;

pub type StackVec<T> = SmallVec<[T;OPTIMIZE_FOR_VALENCE_UNDER_SIZE]>;

/// Triangles containing a vertex. Behaves as a set: no duplicates, order is irrelevant.
pub type Incidence = StackVec<TriangleId>;

#[derive(Copy, Clone, PartialEq, Eq)]
/// A single position on a mesh. A vertex, a triangle, or a directed edge of a triangle
pub enum MeshPosition{
    Vertex(VertexId),
    Triangle(TriangleId),
    Edge(OrientedTriangle),
}

slotmap::new_key_type! {
    /// Handle of a given [`Vertex`]. The null key is reserved, so the first vertex has index 1.
    pub struct VertexId;
}
slotmap::new_key_type! {
    /// Handle of a given [`Triangle`]. Slots are reused in place and never freed.
    pub struct TriangleId;
}

impl std::fmt::Debug for MeshPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex(arg0) => f.write_fmt(format_args!("{:?}", arg0)),
            Self::Triangle(arg0) => f.write_fmt(format_args!("{:?}", arg0)),
            Self::Edge(arg0) => f.write_fmt(format_args!("{:?}", arg0)),
        }
    }
}

impl MeshPosition {
    pub fn is_valid(&self, mesh:&TriangleMesh) -> bool {
        match self {
            &MeshPosition::Vertex(vertex_id) => mesh.vertices.contains_key(vertex_id),
            &MeshPosition::Triangle(triangle_id) => mesh.triangles.contains_key(triangle_id),
            &MeshPosition::Edge(edge) => mesh.triangles.contains_key(edge.index()),
        }
    }
}

impl From<VertexId> for MeshPosition {
    #[inline]
    fn from(value: VertexId) -> Self {
        Self::Vertex(value)
    }
}

impl From<TriangleId> for MeshPosition {
    #[inline]
    fn from(value: TriangleId) -> Self {
        Self::Triangle(value)
    }
}

impl From<OrientedTriangle> for MeshPosition {
    #[inline]
    fn from(value: OrientedTriangle) -> Self {
        Self::Edge(value)
    }
}

#[derive(Debug, Clone, Default)]
/// A vertex position together with every triangle that currently uses it.
pub struct Vertex {
    position: Vec3,
    triangles: Incidence,
}

impl Vertex {
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn triangles(&self) -> &[TriangleId] {
        &self.triangles
    }

    /// Number of triangles incident to this vertex
    #[inline]
    pub fn valence(&self) -> usize {
        self.triangles.len()
    }
}

#[derive(Debug, Clone, Copy)]
/// Ordered vertex triple. The order fixes the winding used by [`OrientedTriangle`] versions.
pub struct Triangle {
    vertices: [VertexId;3],
    normal: Vec3,
}

impl Triangle {
    #[inline]
    pub fn vertices(&self) -> [VertexId;3] {
        self.vertices
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    #[inline]
    pub fn contains(&self, vertex:VertexId) -> bool {
        self.vertices.contains(&vertex)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeshConstructionError{
    NeedPolygons,
    UnknownPosition,
}

impl std::fmt::Display for MeshConstructionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NeedPolygons => f.write_str("mesh needs at least one triangle"),
            Self::UnknownPosition => f.write_str("triangle references a position index that does not exist"),
        }
    }
}

impl std::error::Error for MeshConstructionError {}

/// Editable triangle mesh stored as two append-only arenas: vertices and triangles.
///
/// Every vertex keeps the set of triangles that use it (its incidence). That set is only ever
/// changed together with a triangle's vertex triple, through [`TriangleMesh::rewire_triangle`],
/// so it always equals the triangles whose triple contains the vertex.
///
/// Face adjacency and vertex normals are derived from the arenas and refreshed after every
/// operation with [`TriangleMesh::update_attributes`].
pub struct TriangleMesh {
    vertices: SlotMap<VertexId, Vertex>,
    triangles: SlotMap<TriangleId, Triangle>,
    adjacency: AttributeStore<TriangleId, [OrientedTriangle;3]>,
    vertex_normals: AttributeStore<VertexId, Vec3>,
    stale: BTreeSet<AttributeKind>,
}


macro_rules! index_mesh_with {
    ($id_type:ty, $output_type:ty, $property:ident) => {
        impl std::ops::Index<$id_type> for TriangleMesh {
            type Output = $output_type;

            fn index(&self, index: $id_type) -> &Self::Output {
                match self.$property.get(index) {
                    Some(value) => value,
                    None => panic!("Broken {} handle while reading a mesh.", stringify!($id_type)),
                }
            }
        }
    };
}

index_mesh_with!(VertexId, Vertex, vertices);
index_mesh_with!(TriangleId, Triangle, triangles);

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self{
            vertices: SlotMap::with_key(),
            triangles: SlotMap::with_key(),
            adjacency: AttributeStore::new(),
            vertex_normals: AttributeStore::new(),
            stale: BTreeSet::new(),
        }
    }

    /// Build a mesh from caller-owned arrays. `triangles` index into `positions` starting at 0.
    /// All derived attributes are computed before returning.
    pub fn from_triangles(positions:&[Vec3], triangles:&[[usize;3]]) -> Result<Self, MeshConstructionError> {
        if triangles.is_empty() {
            return Err(MeshConstructionError::NeedPolygons);
        }
        let mut mesh = Self::new();
        let vertices:Vec<VertexId> = positions.iter().map(|&p| mesh.insert_vertex(p)).collect();
        for triangle in triangles {
            if triangle.iter().any(|&idx| idx >= vertices.len()) {
                return Err(MeshConstructionError::UnknownPosition);
            }
            let triangle = triangle.map(|idx| vertices[idx]);
            let normal = mesh.normal_of(triangle);
            mesh.insert_triangle(triangle, normal);
        }
        mesh.update_attributes(&ALL_ATTRIBUTES);
        Ok(mesh)
    }

    /// Dense copy of the mesh: positions and 0-based triangle indices, in handle order.
    pub fn to_triangles(&self) -> (Vec<Vec3>, Vec<[usize;3]>) {
        let mut dense:SecondaryMap<VertexId, usize> = SecondaryMap::new();
        let positions = self.vertices.iter().enumerate().map(|(idx, (id, vertex))| {
            dense.insert(id, idx);
            vertex.position
        }).collect();
        let indices = self.triangles.values().map(|t| t.vertices.map(|v| dense[v])).collect();
        (positions, indices)
    }

    #[inline]
    /// Initiate navigation of the mesh starting at a given directed edge
    pub fn goto(&self, edge:OrientedTriangle) -> Traversal<'_> {
        Traversal::new(self, edge)
    }

    /// Add a free-standing vertex. Derived attributes become stale until the next operation.
    pub fn new_vertex(&mut self, position:Vec3) -> VertexId {
        self.stale.insert(AttributeKind::VertexNormals);
        self.insert_vertex(position)
    }

    /// Add a triangle over existing vertices. Its normal is computed from current positions.
    pub fn new_triangle(&mut self, vertices:[VertexId;3]) -> TriangleId {
        self.stale.extend([AttributeKind::Adjacency, AttributeKind::VertexNormals]);
        let normal = self.normal_of(vertices);
        self.insert_triangle(vertices, normal)
    }

    /// Move a vertex. Face and vertex normals become stale until the next operation.
    pub fn set_position(&mut self, vertex:VertexId, position:Vec3) {
        self.stale.extend([AttributeKind::FaceNormals, AttributeKind::VertexNormals]);
        self.vertices[vertex].position = position;
    }

    pub(crate) fn insert_vertex(&mut self, position:Vec3) -> VertexId {
        self.vertices.insert(Vertex { position, triangles: default() })
    }

    pub(crate) fn insert_triangle(&mut self, vertices:[VertexId;3], normal:Vec3) -> TriangleId {
        let triangle = self.triangles.insert(Triangle { vertices: [VertexId::default();3], normal });
        self.rewire_triangle(triangle, vertices);
        triangle
    }

    /// Overwrite the vertex triple of `triangle` and update incidence in the same step.
    /// This is the only place a triple is allowed to change.
    pub(crate) fn rewire_triangle(&mut self, triangle:TriangleId, vertices:[VertexId;3]) {
        let previous = std::mem::replace(&mut self.triangles[triangle].vertices, vertices);
        for vertex in previous {
            if vertices.contains(&vertex) {
                continue;
            }
            if let Some(vertex) = self.vertices.get_mut(vertex) {
                vertex.triangles.retain(|t| *t != triangle);
            }
        }
        for vertex in vertices {
            let incidence = &mut self.vertices[vertex].triangles;
            if !incidence.contains(&triangle) {
                incidence.push(triangle);
            }
        }
    }

    /// Replace the vertex at `local` (0..3) position of `triangle`.
    pub(crate) fn replace_vertex(&mut self, triangle:TriangleId, local:usize, vertex:VertexId) {
        let mut vertices = self.triangles[triangle].vertices;
        vertices[local] = vertex;
        self.rewire_triangle(triangle, vertices);
    }

    /// Recompute the requested derived attributes from the current arenas.
    pub fn update_attributes(&mut self, kinds:&[AttributeKind]) {
        for kind in kinds {
            match kind {
                AttributeKind::Adjacency => self.adjacency = attributes::compute_adjacency(self),
                AttributeKind::FaceNormals => attributes::compute_face_normals(self),
                AttributeKind::VertexNormals => self.vertex_normals = attributes::compute_vertex_normals(self),
            }
            self.stale.remove(kind);
        }
    }

    /// Refresh whatever was invalidated by [`TriangleMesh::new_vertex`], [`TriangleMesh::new_triangle`] or [`TriangleMesh::set_position`]
    pub(crate) fn ensure_attributes(&mut self) {
        let stale:StackVec<_> = self.stale.iter().copied().collect();
        self.update_attributes(&stale);
    }

    fn normal_of(&self, [a, b, c]:[VertexId;3]) -> Vec3 {
        let (a, b, c) = (self[a].position, self[b].position, self[c].position);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Unit normal of `triangle` from current vertex positions (not the stored normal).
    /// Zero for degenerate triangles.
    pub fn compute_normal(&self, triangle:TriangleId) -> Vec3 {
        self.normal_of(self[triangle].vertices)
    }

    /// Normal stored with the triangle. Copied from the parent when a triangle is split.
    pub fn face_normal(&self, triangle:TriangleId) -> Vec3 {
        self[triangle].normal
    }

    pub fn vertex_normal(&self, vertex:VertexId) -> Vec3 {
        self.vertex_normals.get(vertex).copied().unwrap_or(Vec3::ZERO)
    }

    pub fn triangle_area(&self, triangle:TriangleId) -> f32 {
        let [a, b, c] = self[triangle].vertices.map(|v| self[v].position);
        0.5 * (b - a).cross(c - a).length()
    }

    #[inline]
    pub fn position(&self, vertex:VertexId) -> Vec3 {
        self[vertex].position
    }

    /// The count of triangles using this vertex
    #[inline]
    pub fn valence(&self, vertex:VertexId) -> usize {
        self[vertex].valence()
    }

    #[inline]
    pub fn vertex_triangles(&self, vertex:VertexId) -> &[TriangleId] {
        self[vertex].triangles()
    }

    /// How many triangles are currently allocated
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// How many vertices are currently allocated
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_keys(&self) -> slotmap::basic::Keys<TriangleId, Triangle> {
        self.triangles.keys()
    }

    pub fn vertex_keys(&self) -> slotmap::basic::Keys<VertexId, Vertex> {
        self.vertices.keys()
    }

    /// Every triangle holding the undirected edge `{origin, destination}`, oriented from `origin` to `destination`.
    pub fn edge_triangles(&self, origin:VertexId, destination:VertexId) -> impl Iterator<Item = OrientedTriangle> + '_ {
        self[origin].triangles.iter().filter_map(move |&t| OrientedTriangle::from_vertices(t, self[t].vertices, origin, destination))
    }

    /// First triangle holding the edge `{origin, destination}`
    pub fn find_edge(&self, origin:VertexId, destination:VertexId) -> TraversalResult<OrientedTriangle> {
        self.edge_triangles(origin, destination).next().ok_or(TraversalError::new(origin, TraversalErrorKind::NotFound))
    }

    /// Check that every incidence set equals the triangles whose triple contains the vertex
    pub fn is_incidence_consistent(&self) -> bool {
        let mut expected:SecondaryMap<VertexId, Incidence> = SecondaryMap::new();
        for vertex in self.vertices.keys() {
            expected.insert(vertex, default());
        }
        for (id, triangle) in &self.triangles {
            for vertex in triangle.vertices {
                match expected.get_mut(vertex) {
                    Some(incidence) if !incidence.contains(&id) => incidence.push(id),
                    Some(_) => {},
                    None => return false,
                }
            }
        }
        self.vertices.iter().all(|(id, vertex)| {
            let expected = &expected[id];
            vertex.triangles.len() == expected.len() && expected.iter().all(|t| vertex.triangles.contains(t))
        })
    }
}


#[cfg(test)]
pub(crate) mod tests {
    use glam::Vec3;
    use slotmap::KeyData;

    use super::{attributes::AttributeKind, MeshConstructionError, TriangleId, TriangleMesh, VertexId};

    /// Returns a flat mesh in the XY plane in the form
    /// ```text
    /// indices      VertexId      TriangleId
    /// 3---2        4---3         +---+
    /// | / |        | / |         |2/1|
    /// 0---1        1---2         +---+
    /// ```
    pub fn sample_square() -> TriangleMesh {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::X + Vec3::Y, Vec3::Y];
        TriangleMesh::from_triangles(&positions, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    /// Returns an `n` by `n` grid of unit squares in the XY plane, each split along the same diagonal
    pub fn sample_grid(n:usize) -> TriangleMesh {
        let positions:Vec<Vec3> = (0..=n).flat_map(|y| (0..=n).map(move |x| Vec3::new(x as f32, y as f32, 0.0))).collect();
        let mut triangles = Vec::new();
        for y in 0..n {
            for x in 0..n {
                let v0 = y*(n+1) + x;
                let (v1, v2, v3) = (v0 + 1, v0 + n + 2, v0 + n + 1);
                triangles.push([v0, v1, v2]);
                triangles.push([v0, v2, v3]);
            }
        }
        TriangleMesh::from_triangles(&positions, &triangles).unwrap()
    }

    #[test]
    fn test_sample_square() {
        let mesh = sample_square();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.is_incidence_consistent());
        assert_eq!(mesh.valence(VertexId(KeyData::from_ffi(1))), 2);
        assert_eq!(mesh.valence(VertexId(KeyData::from_ffi(2))), 1);
        assert_eq!(mesh.valence(VertexId(KeyData::from_ffi(3))), 2);
        assert_eq!(mesh.valence(VertexId(KeyData::from_ffi(4))), 1);
        assert_eq!(mesh[TriangleId(KeyData::from_ffi(1))].vertices(), [1, 2, 3].map(|i| VertexId(KeyData::from_ffi(i))));
        for t in mesh.triangle_keys() {
            assert!(mesh.face_normal(t).abs_diff_eq(Vec3::Z, 1e-6));
        }
        for v in mesh.vertex_keys() {
            assert!(mesh.vertex_normal(v).abs_diff_eq(Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(TriangleMesh::from_triangles(&[Vec3::ZERO], &[]).err(), Some(MeshConstructionError::NeedPolygons));
        assert_eq!(TriangleMesh::from_triangles(&[Vec3::ZERO, Vec3::X, Vec3::Y], &[[0, 1, 3]]).err(), Some(MeshConstructionError::UnknownPosition));
    }

    #[test]
    fn test_to_triangles() {
        let mesh = sample_grid(2);
        let (positions, triangles) = mesh.to_triangles();
        assert_eq!(positions.len(), 9);
        assert_eq!(triangles.len(), 8);
        assert_eq!(triangles[0], [0, 1, 4]);
        assert_eq!(triangles[1], [0, 4, 3]);
        let rebuilt = TriangleMesh::from_triangles(&positions, &triangles).unwrap();
        assert_eq!(rebuilt.to_triangles(), (positions, triangles));
    }

    #[test]
    fn test_rewire_keeps_incidence() {
        let mut mesh = sample_square();
        let t = TriangleId(KeyData::from_ffi(1));
        let [a, b, _] = mesh[t].vertices();
        let d = VertexId(KeyData::from_ffi(4));
        mesh.replace_vertex(t, 2, d);
        assert!(mesh.is_incidence_consistent());
        assert_eq!(mesh[t].vertices(), [a, b, d]);
        assert_eq!(mesh.valence(VertexId(KeyData::from_ffi(3))), 1);
        assert_eq!(mesh.valence(d), 2);
        // Repeated vertex only counts once
        mesh.rewire_triangle(t, [a, a, d]);
        assert!(mesh.is_incidence_consistent());
        assert_eq!(mesh.valence(b), 0);
        assert_eq!(mesh.valence(a), 2);
    }

    #[test]
    fn test_new_triangle_marks_attributes_stale() {
        let mut mesh = TriangleMesh::new();
        let v = [Vec3::ZERO, Vec3::X, Vec3::Y].map(|p| mesh.new_vertex(p));
        let t = mesh.new_triangle(v);
        assert!(mesh.stale.contains(&AttributeKind::Adjacency));
        assert!(mesh.face_normal(t).abs_diff_eq(Vec3::Z, 1e-6));
        mesh.ensure_attributes();
        assert!(mesh.stale.is_empty());
        assert!(mesh.vertex_normal(v[0]).abs_diff_eq(Vec3::Z, 1e-6));
        assert!(mesh.is_incidence_consistent());
    }

    #[test]
    fn test_find_edge() {
        let mesh = sample_square();
        let [v1, v2, v3, v4] = [1, 2, 3, 4].map(|i| VertexId(KeyData::from_ffi(i)));
        assert_eq!(mesh.edge_triangles(v1, v3).count(), 2);
        assert_eq!(mesh.edge_triangles(v1, v2).count(), 1);
        let edge = mesh.find_edge(v3, v1).unwrap();
        assert_eq!(mesh.goto(edge).origin(), v3);
        assert_eq!(mesh.goto(edge).destination(), v1);
        assert!(mesh.find_edge(v2, v4).is_err());
    }
}
