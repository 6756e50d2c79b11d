//! Command implementations

pub mod pck;
