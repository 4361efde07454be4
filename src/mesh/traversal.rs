use super::{MeshPosition, TriangleId, TriangleMesh, VertexId};

/// Local corner where each version's directed edge starts. Versions 0-2 follow the winding, 3-5 go against it.
const ORIGIN:[usize;6] = [0, 1, 2, 1, 2, 0];
/// Local corner where each version's directed edge ends.
const DESTINATION:[usize;6] = [1, 2, 0, 0, 1, 2];

pub type TraversalResult<T> = Result<T, TraversalError>;


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalErrorKind{
    /// No triangle holds the requested edge
    NotFound,
    /// The edge lies on the mesh boundary, there is nothing across it
    BoundaryEdge,
}

#[derive(Copy, Clone, Debug)]
pub struct TraversalError{
    pub position: MeshPosition,
    pub kind: TraversalErrorKind,
}

impl TraversalError {
    pub fn new(pos: impl Into<MeshPosition>, kind:TraversalErrorKind) -> Self {
        Self{position:pos.into(), kind}
    }
}

impl std::fmt::Display for TraversalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?} at {:?}", self.kind, self.position))
    }
}

impl std::error::Error for TraversalError {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A triangle seen from one of its directed edges.
///
/// ```text
///          far
///          / \
///         /   \
///   origin --->-- destination
/// ```
/// Versions 0, 1, 2 are the edges `0->1`, `1->2`, `2->0` of the triangle's winding,
/// versions 3, 4, 5 are the same edges walked backwards: `1->0`, `2->1`, `0->2`.
pub struct OrientedTriangle {
    triangle: TriangleId,
    version: u8,
}

impl OrientedTriangle {
    /// Edge `edge` (0..3) of `triangle`, following the triangle's winding
    #[inline]
    pub fn new(triangle:TriangleId, edge:usize) -> Self {
        Self { triangle, version: (edge % 3) as u8 }
    }

    /// Find the version of `triangle` whose edge runs from `origin` to `destination`
    pub(crate) fn from_vertices(triangle:TriangleId, vertices:[VertexId;3], origin:VertexId, destination:VertexId) -> Option<Self> {
        (0..6).map(|version| Self { triangle, version })
            .find(|ot| vertices[ot.origin_local()] == origin && vertices[ot.destination_local()] == destination)
    }

    #[inline]
    pub fn index(&self) -> TriangleId {
        self.triangle
    }

    /// Local edge 0..3, independent of direction
    #[inline]
    pub fn edge_index(&self) -> usize {
        self.version as usize % 3
    }

    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.version >= 3
    }

    /// Same edge, opposite direction
    #[inline]
    pub fn sym(&self) -> Self {
        Self { triangle: self.triangle, version: (self.version + 3) % 6 }
    }

    #[inline]
    pub fn origin_local(&self) -> usize {
        ORIGIN[self.version as usize]
    }

    #[inline]
    pub fn destination_local(&self) -> usize {
        DESTINATION[self.version as usize]
    }

    /// The corner not on this edge
    #[inline]
    pub fn far_local(&self) -> usize {
        (self.edge_index() + 2) % 3
    }
}

#[derive(Copy, Clone)]
/// Collection of convenience methods to navigate the mesh from a directed edge
pub struct Traversal<'m> {
    position: OrientedTriangle,
    mesh:&'m TriangleMesh,
}

impl<'m> std::ops::Deref for Traversal<'m> {
    type Target = OrientedTriangle;

    fn deref(&self) -> &Self::Target {
        &self.position
    }
}

impl<'m> PartialEq for Traversal<'m> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl<'m> Eq for Traversal<'m> { }

impl<'m> From<Traversal<'m>> for OrientedTriangle {
    fn from(value: Traversal<'m>) -> Self {
        value.position
    }
}

impl<'m> Traversal<'m> {
    pub fn new(mesh:&'m TriangleMesh, position:OrientedTriangle) -> Self {
        if !MeshPosition::from(position).is_valid(mesh) {
            panic!("Created Traversal with invalid position");
        }
        Self{mesh, position}
    }

    #[inline]
    pub fn get_position(&self) -> OrientedTriangle {
        self.position
    }

    #[inline]
    pub fn origin(&self) -> VertexId {
        self.mesh[self.position.triangle].vertices[self.origin_local()]
    }

    #[inline]
    pub fn destination(&self) -> VertexId {
        self.mesh[self.position.triangle].vertices[self.destination_local()]
    }

    /// The vertex of this triangle opposite the edge
    #[inline]
    pub fn far_vertex(&self) -> VertexId {
        self.mesh[self.position.triangle].vertices[self.far_local()]
    }

    /// Move to the triangle on the other side of this edge, keeping the same origin and destination.
    /// On the mesh boundary there is no such triangle and the current position is returned unchanged.
    ///
    /// Uses the adjacency computed by the last [`super::TriangleMesh::update_attributes`] call.
    pub fn across_edge(&self) -> Self {
        match self.mesh.adjacency.get(self.position.triangle).map(|edges| edges[self.edge_index()]) {
            Some(across) if across.triangle != self.position.triangle => {
                let position = if self.is_reversed() { across.sym() } else { across };
                Self{mesh:self.mesh, position}
            },
            _ => *self,
        }
    }

    /// Like [`Traversal::across_edge`], but reports the mesh boundary as an error
    pub fn try_across_edge(&self) -> TraversalResult<Self> {
        let across = self.across_edge();
        if across == *self {
            Err(TraversalError::new(self.position, TraversalErrorKind::BoundaryEdge))
        } else {
            Ok(across)
        }
    }

    #[inline]
    /// Syntactic sugar to see if there is no triangle across this edge
    pub fn is_boundary(&self) -> bool {
        self.across_edge() == *self
    }
}

impl<'m> std::fmt::Debug for Traversal<'m> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}", self.position))
    }
}
