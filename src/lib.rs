pub mod mesh;
pub mod mesh_builders;

pub(crate) const OPTIMIZE_FOR_VALENCE_UNDER_SIZE:usize = 8; // regular triangle meshes have valence 6, keep incidence sets on the stack
