//! # System Module
//!
//! Static review-stage catalog and role-based authorization gate.
//!
//! Both are pure lookups over compiled-in data. Every other component
//! consults them; neither holds state.

mod gate;
mod stage;

pub use gate::*;
pub use stage::*;
