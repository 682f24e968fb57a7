//! Mesh generators for common shapes.
//!
//! These generators produce [`MeshData`] values that can be uploaded to
//! the GPU via `RenderDevice::make_mesh`.

use super::data::MeshData;

/// Generate a unit quad in the XY plane, centered at the origin.
///
/// Two triangles, indexed, facing +Z.
pub fn generate_quad(width: f32, height: f32) -> MeshData {
    let hw = width / 2.0;
    let hh = height / 2.0;

    MeshData::from_positions(vec![
        [-hw, -hh, 0.0],
        [hw, -hh, 0.0],
        [hw, hh, 0.0],
        [-hw, hh, 0.0],
    ])
    .with_normals(vec![[0.0, 0.0, 1.0]; 4])
    .with_uvs(vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]])
    .with_indices(vec![0, 1, 2, 0, 2, 3])
}

/// Generate an axis-aligned cube centered at the origin.
///
/// 24 vertices (4 per face, so normals stay flat), 12 triangles.
pub fn generate_cube(size: f32) -> MeshData {
    let h = size / 2.0;

    // (normal, four corners in CCW order viewed from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
        ),
        (
            [0.0, 0.0, -1.0],
            [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
        ),
        (
            [1.0, 0.0, 0.0],
            [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]],
        ),
        (
            [-1.0, 0.0, 0.0],
            [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
        ),
        (
            [0.0, 1.0, 0.0],
            [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]],
        ),
        (
            [0.0, -1.0, 0.0],
            [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
        ),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, corners) in &faces {
        let base = positions.len() as u32;
        positions.extend_from_slice(corners);
        normals.extend_from_slice(&[*normal; 4]);
        uvs.extend_from_slice(&[[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData::from_positions(positions)
        .with_normals(normals)
        .with_uvs(uvs)
        .with_indices(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_counts() {
        let quad = generate_quad(1.0, 1.0);
        quad.validate().expect("quad should be valid");
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.primitive_count(), 2);
    }

    #[test]
    fn test_cube_counts() {
        let cube = generate_cube(2.0);
        cube.validate().expect("cube should be valid");
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.primitive_count(), 12);
    }

    #[test]
    fn test_cube_bounding_radius() {
        let cube = generate_cube(2.0);
        // Corner at (1, 1, 1).
        assert!((cube.bounding_radius() - 3.0_f32.sqrt()).abs() < 1e-6);
    }
}
