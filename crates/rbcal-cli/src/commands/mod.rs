//! CLI command implementations.

pub mod calibrate;
pub mod common;
pub mod compare;
pub mod cross;
pub mod paz;
pub mod sensors;
