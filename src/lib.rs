//! Extract fenced code from workbook cells, patch it for local runs, execute
//! it out of process and record stdout or the first error per row.

pub mod artifacts;
pub mod batch;
pub mod config;
pub mod execution;
pub mod extract;
pub mod patch;
pub mod printer;
pub mod workbook;
