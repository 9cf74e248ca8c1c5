//! Command modules following the `command()` convention.

pub mod echo;
pub mod rename;
