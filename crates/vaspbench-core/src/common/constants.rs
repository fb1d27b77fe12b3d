//! Physical constants and fixed planning settings shared by the derivation
//! and extraction pipelines.

pub const PI: f64 = std::f64::consts::PI;
pub const PI2: f64 = 2.0 * PI;
pub const RY_TO_EV: f64 = 13.605_691_725_3_f64;

/// Linear k-point density (1/Angstrom, 2*pi included) used for every SCF mesh.
pub const KPOINT_DENSITY: f64 = 0.15;
pub const KPOINT_OFFSET: [f64; 3] = [0.0, 0.0, 0.0];

pub const SCF_SMEARING_RY: f64 = 0.02;
pub const SCF_EDIFF: f64 = 1.0e-9;
