//! Request parsing utilities.

pub mod upload;
