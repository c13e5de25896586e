use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::Path;
use zoodir_core::{plan_map, safe_image, ImageRequest, Listing, Rendered};

use crate::state::AppState;
use crate::ui::{
    format_listing_heading, format_price, format_rating, print_map_plan, set_status, StatusLevel,
};

use super::filter_handlers::detail_href;
use super::write_json;

/// Run `map`: print markers, centre and zoom for every listing in a payload
pub fn run_map(state: &mut AppState, file: &Path, json: bool, out: &mut dyn Write) -> Result<()> {
    let loaded = state.load(file)?;
    let plan = plan_map(
        loaded.listings(),
        state.settings.maps_configured(),
        &mut state.monitor,
    );

    if json {
        return write_json(out, &plan);
    }

    match plan {
        Rendered::Ready(plan) => print_map_plan(&plan),
        Rendered::Fallback(reason) => set_status(
            &format!("Map unavailable: {}. Set ZOODIR_MAPS_API_KEY to enable it", reason),
            StatusLevel::Warning,
        ),
    }
    Ok(())
}

/// Image line of a card: CDN URL, or the placeholder reason
fn card_image(state: &mut AppState, listing: &Listing) -> Result<String> {
    let Some(image) = &listing.main_image else {
        return Ok("No image available".to_string());
    };

    let raw = serde_json::to_value(image).context("Could not serialize image")?;
    let request = ImageRequest {
        alt: Some(listing.name.as_str()),
        ..Default::default()
    };
    let cdn = state.settings.cdn();

    Ok(match safe_image(&raw, &request, &cdn, &mut state.monitor) {
        Rendered::Ready(view) => format!("{} ({})", view.url, view.alt),
        Rendered::Fallback(reason) => format!("No image available ({})", reason),
    })
}

/// Run `cards`: print the display decisions made for each listing card
pub fn run_cards(state: &mut AppState, file: &Path) -> Result<()> {
    let loaded = state.load(file)?;

    for listing in loaded.listings() {
        println!("{}", format_listing_heading(listing, None).bold());
        println!("  {} · {}", format_price(listing), format_rating(&listing.reviews));
        println!("  Image: {}", card_image(state, listing)?);

        match detail_href(state, listing)? {
            Some(href) => println!("  Link: {}", href.cyan()),
            None => println!("  Link: {}", "not linkable".yellow()),
        }
        println!();
    }
    Ok(())
}
