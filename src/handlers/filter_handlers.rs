use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;
use std::path::{Path, PathBuf};
use zoodir_core::*;

use crate::operations::{build_filter_spec, FilterFlags};
use crate::state::AppState;
use super::write_json;
use crate::ui::{print_filter_options, print_listing, print_messages, set_status, StatusLevel};

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Path to a CMS export
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub filters: FilterFlags,

    /// Visitor position used for distance filtering, e.g. "40.71,-74.00"
    #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
    pub near: Option<Coordinates>,

    /// Free-text search over names, descriptions, animals and amenities
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Restore search and filters from a shared link or its query string
    #[arg(long = "from-url", value_name = "URL")]
    pub from_url: Option<String>,

    /// Sort results: name, price or rating
    #[arg(long, value_name = "KEY")]
    pub sort: Option<SortKey>,

    /// Group results by zoo type
    #[arg(short = 'G', long = "group-by-type")]
    pub group_by_type: bool,

    /// Print matching listings as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Query string part of a shared link. A bare query string is returned as is.
fn query_part(url: &str) -> &str {
    let without_fragment = url.split('#').next().unwrap_or(url);
    match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None => without_fragment,
    }
}

/// Link to a listing's detail page, if it has a usable slug
pub fn detail_href(state: &mut AppState, listing: &Listing) -> Result<Option<String>> {
    let slug = serde_json::to_value(&listing.slug).context("Could not serialize slug")?;
    let base_path = state.detail_base_path().to_string();
    let link = safe_link(None, Some(&slug), &base_path, &mut state.monitor);
    Ok(link.ready().map(|target| target.href.clone()))
}

fn listing_distance(listing: &Listing, origin: Option<Coordinates>) -> Option<f64> {
    let origin = origin?;
    let location = listing.location.as_ref()?;
    Some(distance_miles(origin.lat, origin.lng, location.lat, location.lng))
}

/// Run `filter`: search, filter, sort and print listings from a payload.
/// With `--json` the matching listings are the only thing written to `out`.
pub fn run_filter(state: &mut AppState, args: &FilterArgs, out: &mut dyn Write) -> Result<()> {
    let loaded = state.load(&args.file)?;

    let url_state = args
        .from_url
        .as_deref()
        .map(|url| parse_url_params(query_part(url)))
        .unwrap_or_default();

    // Explicit flags add to whatever the shared link carried
    let mut flags = args.filters.clone();
    if flags.encoded.is_none() {
        flags.encoded = encode_filters(&url_state.filters);
    }
    let parsed = build_filter_spec(&flags);
    print_messages("Ignored flags", &parsed.warnings, StatusLevel::Warning);
    let spec = parsed.spec;

    let term = args.search.clone().unwrap_or(url_state.search);
    let origin = state.user_location(args.near)?;
    if spec.distance.is_active() && origin.is_none() {
        set_status(
            "Distance filter ignored: pass --near or set default_location",
            StatusLevel::Warning,
        );
    }

    let searched = search_listings(loaded.listings(), &term);
    let mut filtered = apply_filters(&searched, &spec, origin);
    if let Some(key) = args.sort {
        sort_listings(&mut filtered, key);
    }

    tracing::debug!(
        search = %term,
        active_filters = active_filter_count(&spec),
        matched = filtered.len(),
        "filters applied"
    );

    if args.json {
        return write_json(out, &filtered);
    }

    println!("{}\n", summarize(&spec, searched.len(), filtered.len()));
    if filtered.is_empty() {
        set_status("No petting zoos match these filters", StatusLevel::Info);
        return Ok(());
    }

    if args.group_by_type {
        for (zoo_type, listings) in group_by_zoo_type(&filtered) {
            let title = if zoo_type == UNSPECIFIED_GROUP {
                "Other"
            } else {
                zoo_type.as_str()
            };
            println!("== {} ({}) ==\n", title, listings.len());
            for listing in &listings {
                print_one(state, listing, origin)?;
            }
        }
    } else {
        for listing in &filtered {
            print_one(state, listing, origin)?;
        }
    }

    Ok(())
}

fn print_one(state: &mut AppState, listing: &Listing, origin: Option<Coordinates>) -> Result<()> {
    let href = detail_href(state, listing)?;
    print_listing(listing, listing_distance(listing, origin), href.as_deref());
    Ok(())
}

/// Run `options`: list every zoo type, animal and amenity in a payload
pub fn run_options(
    state: &mut AppState,
    file: &Path,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let loaded = state.load(file)?;
    let options = collect_filter_options(loaded.listings());

    if json {
        write_json(out, &options)?;
    } else {
        print_filter_options(&options);
    }
    Ok(())
}
