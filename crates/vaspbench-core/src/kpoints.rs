use crate::common::constants::PI2;
use crate::domain::{BenchError, BenchResult, KpointMesh, Structure};

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Reciprocal lattice vectors (rows), including the 2*pi factor.
pub fn reciprocal_cell(cell: &[[f64; 3]; 3]) -> BenchResult<[[f64; 3]; 3]> {
    let volume = dot(cell[0], cross(cell[1], cell[2]));
    if !volume.is_finite() || volume.abs() < 1.0e-10 {
        return Err(BenchError::input_validation(
            "INPUT.DEGENERATE_CELL",
            format!("cell volume {} is too small to build a k-point mesh", volume),
        ));
    }

    let scale = PI2 / volume;
    let mut reciprocal = [[0.0; 3]; 3];
    for (index, (first, second)) in [(1, 2), (2, 0), (0, 1)].into_iter().enumerate() {
        let product = cross(cell[first], cell[second]);
        reciprocal[index] = [product[0] * scale, product[1] * scale, product[2] * scale];
    }
    Ok(reciprocal)
}

/// Monkhorst-Pack style mesh with at least `1/density` divisions per reciprocal
/// vector length; lengths are rounded to 5 decimals before the ceiling so that
/// float noise cannot add a division.
pub fn mesh_from_density(
    structure: &Structure,
    density: f64,
    offset: [f64; 3],
) -> BenchResult<KpointMesh> {
    if !(density.is_finite() && density > 0.0) {
        return Err(BenchError::input_validation(
            "INPUT.KPOINT_DENSITY",
            format!("k-point density must be positive, got {}", density),
        ));
    }

    let reciprocal = reciprocal_cell(&structure.cell)?;
    let mut mesh = [1_u32; 3];
    for (divisions, vector) in mesh.iter_mut().zip(reciprocal) {
        let ratio = (norm(vector) / density * 1.0e5).round() / 1.0e5;
        *divisions = (ratio.ceil() as u32).max(1);
    }

    Ok(KpointMesh { mesh, offset })
}
