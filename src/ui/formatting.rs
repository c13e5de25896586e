use colored::Colorize;
use zoodir_core::diagnostics::{ErrorStats, ErrorTrend};
use zoodir_core::models::Review;
use zoodir_core::render::MapPlan;
use zoodir_core::{mean_approved_rating, FilterOptions, Listing};

use super::StatusLevel;

/// Admission price as shown on a card
pub fn format_price(listing: &Listing) -> String {
    if let Some(pricing) = &listing.admission_price {
        if let Some(adult) = pricing.adult {
            if adult == 0.0 {
                return "Free entry".to_string();
            }
            return format!("{} {:.2} adult", pricing.currency, adult);
        }
    }

    match listing.price_per_night {
        Some(nightly) if nightly > 0.0 => format!("{:.2} per night", nightly),
        _ => "Price not listed".to_string(),
    }
}

/// Mean approved rating with the number of reviews behind it
pub fn format_rating(reviews: &[Review]) -> String {
    let counted = reviews
        .iter()
        .filter(|r| r.is_approved() && r.rating.is_some_and(|rating| rating != 0.0))
        .count();

    match counted {
        0 => "No reviews".to_string(),
        1 => format!("★ {:.1} (1 review)", mean_approved_rating(reviews)),
        n => format!("★ {:.1} ({} reviews)", mean_approved_rating(reviews), n),
    }
}

pub fn format_distance(miles: f64) -> String {
    format!("{:.1} mi", miles)
}

/// First line of a listing: name, type and distance when known
pub fn format_listing_heading(listing: &Listing, distance: Option<f64>) -> String {
    let mut heading = listing.name.clone();
    if let Some(zoo_type) = &listing.zoo_type {
        heading.push_str(&format!(" ({})", zoo_type));
    }
    if let Some(miles) = distance {
        heading.push_str(&format!(" · {}", format_distance(miles)));
    }
    heading
}

pub fn print_listing(listing: &Listing, distance: Option<f64>, detail_href: Option<&str>) {
    println!("{}", format_listing_heading(listing, distance).bold());

    let place = listing
        .location
        .as_ref()
        .and_then(|l| l.city.clone())
        .or_else(|| listing.address.clone());
    if let Some(place) = place {
        println!("  {}", place);
    }

    println!("  {} · {}", format_price(listing), format_rating(&listing.reviews));

    if !listing.animals.is_empty() {
        let animals: Vec<&str> = listing
            .animals
            .iter()
            .filter_map(|a| a.species.as_deref().or(a.name.as_deref()))
            .collect();
        println!("  Animals: {}", animals.join(", "));
    }

    if let Some(href) = detail_href {
        println!("  {}", href.cyan());
    }
    println!();
}

/// Print a titled, numbered list of messages to stderr
pub fn print_messages(title: &str, messages: &[String], level: StatusLevel) {
    if messages.is_empty() {
        return;
    }

    let heading = format!("{} ({})", title, messages.len());
    let heading = match level {
        StatusLevel::Error => heading.red().bold(),
        StatusLevel::Warning => heading.yellow().bold(),
        StatusLevel::Success => heading.green().bold(),
        StatusLevel::Info => heading.bold(),
    };
    eprintln!("{}", heading);

    for (i, message) in messages.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, message);
    }
    eprintln!();
}

pub fn print_filter_options(options: &FilterOptions) {
    let sections = [
        ("Zoo types", &options.zoo_types),
        ("Animal types", &options.animal_types),
        ("Amenities", &options.amenities),
    ];

    for (title, values) in sections {
        println!("{}", title.bold());
        if values.is_empty() {
            println!("  (none)");
        }
        for value in values {
            println!("  • {}", value);
        }
        println!();
    }
}

pub fn print_map_plan(plan: &MapPlan) {
    println!(
        "{} center {:.4}, {:.4} at zoom {}",
        "Map:".bold(),
        plan.center.lat,
        plan.center.lng,
        plan.zoom
    );

    for marker in &plan.markers {
        println!(
            "  📍 {} ({:.4}, {:.4})",
            marker.name, marker.position.lat, marker.position.lng
        );
    }

    if !plan.unlocated.is_empty() {
        println!(
            "  {}",
            format!("{} listing(s) without a usable location", plan.unlocated.len()).yellow()
        );
    }
    println!();
}

/// Summary of failures collected while the command ran, on stderr
pub fn print_diagnostics(stats: &ErrorStats, trend: &ErrorTrend) {
    if stats.total_errors == 0 {
        return;
    }

    eprintln!(
        "{} {} recorded, trend {}",
        "Diagnostics:".bold(),
        stats.total_errors,
        trend.trend
    );
    for top in &stats.top_errors {
        eprintln!("  {} × {}", top.count, top.error);
    }
    eprintln!();
}
