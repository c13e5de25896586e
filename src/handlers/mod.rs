pub mod filter_handlers;
pub mod map_handlers;
pub mod share_handlers;
pub mod validate_handlers;

pub use filter_handlers::{run_filter, run_options, FilterArgs};
pub use map_handlers::{run_cards, run_map};
pub use share_handlers::{run_share, ShareArgs};
pub use validate_handlers::{run_validate, ValidateArgs};

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// Write `value` as pretty JSON followed by a newline. Nothing else may
/// share `out` with it; human-readable messages go to stderr.
pub fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Could not serialize JSON output")?;
    writeln!(out).context("Could not write JSON output")?;
    Ok(())
}
