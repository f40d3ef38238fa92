//! Output drivers.

pub mod siren;
