use bevy_utils::{hashbrown::hash_set::Iter, HashSet};

use super::{MeshPosition, TriangleId, TriangleMesh};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Set of triangles an operation is allowed to touch. Owned by the caller;
/// [`super::mesh_ops::subdivide`] adds the triangles it creates, [`super::mesh_ops::relax`] only reads it.
pub struct TriangleSelection {
    triangles: HashSet<TriangleId>,
}

impl TriangleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every triangle of the mesh
    pub fn all(mesh:&TriangleMesh) -> Self {
        mesh.triangle_keys().collect()
    }

    /// Returns `true` if the triangle was not selected before
    pub fn select(&mut self, triangle:TriangleId) -> bool {
        self.triangles.insert(triangle)
    }

    pub fn deselect(&mut self, triangle:TriangleId) -> bool {
        self.triangles.remove(&triangle)
    }

    #[inline]
    pub fn contains(&self, triangle:TriangleId) -> bool {
        self.triangles.contains(&triangle)
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, TriangleId> {
        self.triangles.iter()
    }

    /// Selects every triangle sharing a vertex with the current selection.
    /// Handles that are not part of `mesh` are kept but not grown from.
    pub fn grow(&mut self, mesh:&TriangleMesh) {
        let grown:Vec<_> = self.triangles.iter()
            .filter(|&&t| MeshPosition::from(t).is_valid(mesh))
            .flat_map(|&t| mesh[t].vertices())
            .flat_map(|v| mesh.vertex_triangles(v).iter().copied())
            .collect();
        self.triangles.extend(grown);
    }
}

impl FromIterator<TriangleId> for TriangleSelection {
    fn from_iter<I: IntoIterator<Item = TriangleId>>(iter: I) -> Self {
        Self { triangles: iter.into_iter().collect() }
    }
}

impl Extend<TriangleId> for TriangleSelection {
    fn extend<I: IntoIterator<Item = TriangleId>>(&mut self, iter: I) {
        self.triangles.extend(iter)
    }
}
