use anyhow::Result;
use clap::Args;
use zoodir_core::{active_filter_count, shareable_url};

use crate::operations::{build_filter_spec, FilterFlags};
use crate::state::AppState;
use crate::ui::{print_messages, StatusLevel};

#[derive(Args, Debug)]
pub struct ShareArgs {
    #[command(flatten)]
    pub filters: FilterFlags,

    /// Search term to carry in the link
    #[arg(short, long, value_name = "TEXT", default_value = "")]
    pub search: String,

    /// Page the link points at; defaults to the configured site_url
    #[arg(long, value_name = "URL")]
    pub base: Option<String>,
}

/// Run `share`: print a link that restores the given search and filters
pub fn run_share(state: &AppState, args: &ShareArgs) -> Result<()> {
    let parsed = build_filter_spec(&args.filters);
    print_messages("Ignored flags", &parsed.warnings, StatusLevel::Warning);

    let base = args.base.as_deref().unwrap_or(&state.settings.site_url);
    let url = shareable_url(base, &args.search, &parsed.spec)?;

    tracing::debug!(
        base,
        active_filters = active_filter_count(&parsed.spec),
        "shareable link built"
    );
    println!("{}", url);
    Ok(())
}
