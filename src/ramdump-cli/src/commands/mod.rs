//! Command handlers for ramdump CLI

pub mod acquire;
pub mod configure;
pub mod ranges;
