//! Indexed triangle mesh and its incremental builder.

mod cylinder;

use glam::Vec3;

pub use cylinder::{
    add_cylinder, cylinder_index_count, cylinder_vertex_count, CylinderProps,
};

use super::{swap_f32, swap_u32, Geometry, GeometryKind, Sphere3D};
use crate::{
    options::BaseGeometryOptions,
    schema::{
        builtin::{BASE_SCHEMA, MESH_SCHEMA},
        PartialSchema, Value, Values,
    },
};

/// Indexed triangle mesh with one group id per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<f32>,
    normals: Vec<f32>,
    groups: Vec<f32>,
    indices: Vec<u32>,
    bounding_sphere: Sphere3D,
}

impl Mesh {
    /// Empty mesh, reusing `recycle`'s allocations when given.
    pub fn create_empty(recycle: Option<Self>) -> Self {
        let mut mesh = recycle.unwrap_or_default();
        mesh.clear();
        mesh
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat `xyz` positions.
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Flat `xyz` normals.
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    /// Group id per vertex.
    pub fn groups(&self) -> &[f32] {
        &self.groups
    }

    /// Triangle indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

impl Geometry for Mesh {
    const KIND: GeometryKind = GeometryKind::Mesh;

    fn partial_schemas() -> &'static [PartialSchema] {
        &[BASE_SCHEMA, MESH_SCHEMA]
    }

    fn uses_size_texture() -> bool {
        false
    }

    fn draw_count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn bounding_sphere(&self) -> Sphere3D {
        self.bounding_sphere
    }

    fn set_bounding_sphere(&mut self, sphere: Sphere3D) {
        self.bounding_sphere = sphere;
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.groups.clear();
        self.indices.clear();
        self.bounding_sphere = Sphere3D::EMPTY;
    }

    fn install(&mut self, values: &mut Values) {
        values.set("drawCount", Value::Uint(self.draw_count()));
        values.set(
            "invariantBoundingSphere",
            Value::Sphere(self.bounding_sphere),
        );
        self.vertices = swap_f32(
            values,
            "aPosition",
            std::mem::take(&mut self.vertices),
        );
        self.normals =
            swap_f32(values, "aNormal", std::mem::take(&mut self.normals));
        self.groups =
            swap_f32(values, "aGroup", std::mem::take(&mut self.groups));
        self.indices =
            swap_u32(values, "elements", std::mem::take(&mut self.indices));
        self.bounding_sphere = Sphere3D::EMPTY;
    }

    fn update_values(
        values: &mut Values,
        props: &BaseGeometryOptions,
        _size_factor: f32,
    ) -> bool {
        let mut changed =
            values.set_if_changed("uAlpha", Value::Float(props.alpha));
        changed |= values.set_if_changed("dUseFog", Value::Bool(props.use_fog));
        changed |= values
            .set_if_changed("dFlatShaded", Value::Bool(props.flat_shaded));
        changed |= values
            .set_if_changed("dDoubleSided", Value::Bool(props.double_sided));
        changed
    }
}

/// Accumulates vertices and triangles tagged with the current group id.
pub struct MeshBuilder {
    mesh: Mesh,
    /// Group id stamped onto every vertex added from now on.
    pub current_group: u32,
}

impl MeshBuilder {
    /// Builder pre-sized for the given estimates, reusing `recycle`'s
    /// allocations.
    pub fn new(
        vertex_estimate: usize,
        index_estimate: usize,
        recycle: Option<Mesh>,
    ) -> Self {
        let mut mesh = Mesh::create_empty(recycle);
        mesh.vertices.reserve(vertex_estimate * 3);
        mesh.normals.reserve(vertex_estimate * 3);
        mesh.groups.reserve(vertex_estimate);
        mesh.indices.reserve(index_estimate);
        Self {
            mesh,
            current_group: 0,
        }
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.mesh.vertex_count() as u32;
        self.mesh.vertices.extend_from_slice(&position.to_array());
        self.mesh.normals.extend_from_slice(&normal.to_array());
        self.mesh.groups.push(self.current_group as f32);
        index
    }

    /// Append one triangle.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.mesh.indices.extend_from_slice(&[a, b, c]);
    }

    /// Number of vertices added so far.
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Finish building. Array lengths are exact; spare capacity is kept for
    /// the next build that recycles this mesh.
    pub fn finish(self) -> Mesh {
        self.mesh
    }
}
