//! Handler implementations, one module per function-library area.

pub(crate) mod aggregate;
pub(crate) mod collections;
pub(crate) mod combining;
pub(crate) mod datetime;
pub(crate) mod equality;
pub(crate) mod existence;
pub(crate) mod helpers;
pub(crate) mod filtering;
pub(crate) mod logic;
pub(crate) mod math;
pub(crate) mod misc;
pub(crate) mod navigation;
pub(crate) mod strings;
pub(crate) mod types;
