//! Source rewrites applied to extracted code before it is run.

pub mod dataset;
pub mod display;

pub use dataset::rewrite_dataset_path;
pub use display::replace_show_with_savefig;
