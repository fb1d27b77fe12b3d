//! Planning, bookkeeping and result extraction for VASP SCF benchmark runs.

pub mod common;
pub mod domain;
pub mod extract;
pub mod kpoints;
pub mod ledger;
pub mod outputs;
pub mod params;
pub mod planner;
pub mod potentials;
pub mod serialization;
pub mod store;
pub mod summary;
