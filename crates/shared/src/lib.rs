//! Wire records and domain vocabulary shared by the inventory client crates.

pub mod domain;
pub mod error;
pub mod protocol;
