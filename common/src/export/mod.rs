//! Export core modules shared across the HTTP and CLI front ends.

pub mod pdf_core;
