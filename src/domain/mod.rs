//! Domain types for the Animals API.

mod animal;

pub use animal::*;
