pub mod filter_input;

pub use filter_input::{build_filter_spec, FilterFlags};
