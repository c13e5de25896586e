//! Presentation decisions for images, links and maps.
//!
//! Each function inspects possibly-broken CMS data and either returns what
//! a page should display or says why it should show a placeholder instead.
//! Failures are also reported to the supplied [`DiagnosticsSink`].

use crate::diagnostics::{Component, DiagnosticsSink, ErrorKind};
use crate::models::{Coordinates, Listing};
use crate::validation::{validate_image, validate_slug};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Geographic centre of the contiguous United States
pub const US_CENTER: Coordinates = Coordinates {
    lat: 39.8283,
    lng: -98.5795,
};
pub const SINGLE_LISTING_ZOOM: u8 = 12;
pub const OVERVIEW_ZOOM: u8 = 6;

const CDN_HOST: &str = "https://cdn.sanity.io/images";
const DEFAULT_ALT: &str = "Image";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason", content = "details")]
pub enum FallbackReason {
    InvalidImage(Vec<String>),
    UnresolvableAsset(String),
    MissingCdnConfig,
    InvalidSlug(Vec<String>),
    MissingHref,
    BlockedHref(String),
    MissingApiKey,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::InvalidImage(errors) => write!(f, "invalid image: {}", errors.join(", ")),
            FallbackReason::UnresolvableAsset(reference) => {
                write!(f, "cannot build an image URL from asset '{}'", reference)
            }
            FallbackReason::MissingCdnConfig => write!(f, "image CDN project is not configured"),
            FallbackReason::InvalidSlug(errors) => write!(f, "invalid slug: {}", errors.join(", ")),
            FallbackReason::MissingHref => write!(f, "no valid href available"),
            FallbackReason::BlockedHref(href) => write!(f, "href '{}' failed sanitization", href),
            FallbackReason::MissingApiKey => write!(f, "maps API key is not configured"),
        }
    }
}

/// Either something to display or the reason a placeholder is shown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Rendered<T> {
    Ready(T),
    Fallback(FallbackReason),
}

impl<T> Rendered<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Rendered::Ready(value) => Some(value),
            Rendered::Fallback(_) => None,
        }
    }

    pub fn fallback(&self) -> Option<&FallbackReason> {
        match self {
            Rendered::Ready(_) => None,
            Rendered::Fallback(reason) => Some(reason),
        }
    }
}

/// Image CDN coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnConfig {
    pub project_id: String,
    pub dataset: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRequest<'a> {
    pub width: u32,
    pub height: u32,
    pub alt: Option<&'a str>,
}

impl Default for ImageRequest<'_> {
    fn default() -> Self {
        Self {
            width: 400,
            height: 250,
            alt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Parts of an image asset reference such as `image-abc123-400x300-jpg`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef<'a> {
    pub id: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: &'a str,
}

pub fn parse_asset_ref(reference: &str) -> Option<AssetRef<'_>> {
    let rest = reference.strip_prefix("image-")?;
    let mut parts = rest.rsplitn(3, '-');
    let format = parts.next()?;
    let (width, height) = parts.next()?.split_once('x')?;
    let id = parts.next()?;

    if id.is_empty() || format.is_empty() {
        return None;
    }

    Some(AssetRef {
        id,
        width: width.parse().ok()?,
        height: height.parse().ok()?,
        format,
    })
}

/// Decide how to display a CMS image
pub fn safe_image(
    raw: &Value,
    request: &ImageRequest<'_>,
    cdn: &CdnConfig,
    sink: &mut dyn DiagnosticsSink,
) -> Rendered<ImageView> {
    let validation = validate_image(raw);
    let image = match validation.data {
        Some(image) if validation.is_valid => image,
        _ => {
            let mut details = validation.errors.clone();
            details.push(format!("diagnosis: {}", diagnose_image(raw).issue));
            sink.record(Component::SafeImage, ErrorKind::ValidationFailed, details);
            return Rendered::Fallback(FallbackReason::InvalidImage(validation.errors));
        }
    };

    if cdn.project_id.trim().is_empty() {
        sink.record(
            Component::SafeImage,
            ErrorKind::ImageLoadFailed,
            vec!["image CDN project id is empty".to_string()],
        );
        return Rendered::Fallback(FallbackReason::MissingCdnConfig);
    }

    let reference = image.asset_ref().unwrap_or_default().to_string();
    let Some(asset) = parse_asset_ref(&reference) else {
        sink.record(
            Component::SafeImage,
            ErrorKind::ImageLoadFailed,
            vec![format!("unparseable asset reference '{}'", reference)],
        );
        return Rendered::Fallback(FallbackReason::UnresolvableAsset(reference));
    };

    let url = format!(
        "{}/{}/{}/{}-{}x{}.{}?w={}&h={}&fit=crop&auto=format",
        CDN_HOST,
        cdn.project_id,
        cdn.dataset,
        asset.id,
        asset.width,
        asset.height,
        asset.format,
        request.width,
        request.height
    );

    let alt = request
        .alt
        .filter(|alt| !alt.trim().is_empty())
        .map(str::to_string)
        .or_else(|| Some(image.alt.clone()).filter(|alt| !alt.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_ALT.to_string());

    Rendered::Ready(ImageView {
        url,
        alt,
        width: request.width,
        height: request.height,
        caption: image.caption,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkTarget {
    pub href: String,
    /// Opens outside the site (new tab, no referrer)
    pub external: bool,
}

/// Decide where a link should point. An explicit `href` wins over `slug`.
pub fn safe_link(
    href: Option<&str>,
    slug: Option<&Value>,
    base_path: &str,
    sink: &mut dyn DiagnosticsSink,
) -> Rendered<LinkTarget> {
    let explicit = href.filter(|h| !h.trim().is_empty());

    let target = match (explicit, slug) {
        (Some(href), _) => href.to_string(),
        (None, Some(raw_slug)) => {
            let validation = validate_slug(raw_slug);
            let current = match validation.data.current {
                Some(current) if validation.is_valid => current,
                _ => {
                    sink.record(
                        Component::SafeLink,
                        ErrorKind::ValidationFailed,
                        validation.errors.clone(),
                    );
                    return Rendered::Fallback(FallbackReason::InvalidSlug(validation.errors));
                }
            };
            format!("{}/{}", base_path.trim_end_matches('/'), current)
        }
        (None, None) => {
            sink.record(
                Component::SafeLink,
                ErrorKind::InvalidLinkData,
                vec!["No valid href available".to_string()],
            );
            return Rendered::Fallback(FallbackReason::MissingHref);
        }
    };

    match sanitize_href(&target) {
        Some(href) => Rendered::Ready(LinkTarget {
            external: is_external(&href),
            href,
        }),
        None => {
            sink.record(
                Component::SafeLink,
                ErrorKind::InvalidLinkData,
                vec![format!("blocked href '{}'", target)],
            );
            Rendered::Fallback(FallbackReason::BlockedHref(target))
        }
    }
}

const BLOCKED_SCHEMES: [&str; 4] = ["javascript:", "data:", "vbscript:", "file:"];
const PASSTHROUGH_PREFIXES: [&str; 6] = ["/", "#", "http://", "https://", "mailto:", "tel:"];

/// Reject script-capable schemes and root bare relative paths
pub fn sanitize_href(href: &str) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if let Some(scheme) = BLOCKED_SCHEMES.iter().find(|s| lower.starts_with(*s)) {
        tracing::warn!(scheme, "blocked link with dangerous scheme");
        return None;
    }

    if PASSTHROUGH_PREFIXES.iter().any(|p| trimmed.starts_with(p)) || trimmed.contains("://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}

pub fn is_external(href: &str) -> bool {
    ["http://", "https://", "mailto:", "tel:"]
        .iter()
        .any(|p| href.starts_with(p))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub position: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPlan {
    pub center: Coordinates,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
    /// Ids of listings shown without a marker
    pub unlocated: Vec<String>,
}

/// Work out markers, centre and zoom for a map of `listings`
pub fn plan_map(
    listings: &[Listing],
    api_key_configured: bool,
    sink: &mut dyn DiagnosticsSink,
) -> Rendered<MapPlan> {
    if !api_key_configured {
        sink.record(
            Component::SafeMap,
            ErrorKind::MapRenderingFailed,
            vec!["maps API key is not configured".to_string()],
        );
        return Rendered::Fallback(FallbackReason::MissingApiKey);
    }

    let mut markers = Vec::new();
    let mut unlocated = Vec::new();

    for (idx, listing) in listings.iter().enumerate() {
        match listing.location.as_ref().map(|l| l.coordinates()) {
            Some(position) if position.is_in_range() => markers.push(MapMarker {
                id: listing.id.clone(),
                name: listing.name.clone(),
                slug: listing.slug.current.clone(),
                position,
            }),
            Some(position) => {
                sink.record(
                    Component::SafeMap,
                    ErrorKind::ValidationFailed,
                    vec![
                        format!("Invalid location data for #{} '{}'", idx + 1, listing.name),
                        format!("lat={}, lng={}", position.lat, position.lng),
                    ],
                );
                unlocated.push(listing.id.clone());
            }
            None => unlocated.push(listing.id.clone()),
        }
    }

    let center = match markers.as_slice() {
        [] => US_CENTER,
        [only] => only.position,
        many => bounds_center(many.iter().map(|m| m.position)),
    };

    let zoom = if listings.len() == 1 {
        SINGLE_LISTING_ZOOM
    } else {
        OVERVIEW_ZOOM
    };

    Rendered::Ready(MapPlan {
        center,
        zoom,
        markers,
        unlocated,
    })
}

fn bounds_center(points: impl Iterator<Item = Coordinates>) -> Coordinates {
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lng, mut max_lng) = (f64::INFINITY, f64::NEG_INFINITY);

    for point in points {
        min_lat = min_lat.min(point.lat);
        max_lat = max_lat.max(point.lat);
        min_lng = min_lng.min(point.lng);
        max_lng = max_lng.max(point.lng);
    }

    Coordinates::new((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDiagnosis {
    pub issue: String,
    pub severity: Severity,
    pub fixes: Vec<String>,
}

impl ImageDiagnosis {
    fn new(issue: impl Into<String>, severity: Severity, fixes: &[&str]) -> Self {
        Self {
            issue: issue.into(),
            severity,
            fixes: fixes.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Explain why an image cannot be displayed and how to fix the CMS data
pub fn diagnose_image(raw: &Value) -> ImageDiagnosis {
    let empty = match raw {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if empty {
        return ImageDiagnosis::new(
            "Image data is null or undefined",
            Severity::Medium,
            &[
                "Check that the image field exists in the CMS schema",
                "Check that the query selects the image field",
                "Skip rendering when the image is absent",
            ],
        );
    }

    let Some(image) = raw.as_object() else {
        return ImageDiagnosis::new(
            "Image data is not an object",
            Severity::High,
            &[
                "Pass the image object, not a URL string",
                "Check the query returns the image as an object",
            ],
        );
    };

    match image.get("asset") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            return ImageDiagnosis::new(
                "Image missing asset reference",
                Severity::High,
                &[
                    "Re-upload the image in the CMS studio",
                    "Check the query selects `asset`",
                ],
            );
        }
        Some(Value::Object(fields)) => {
            if !fields.contains_key("_ref") && !fields.contains_key("_id") {
                return ImageDiagnosis::new(
                    "Asset missing _ref or _id property",
                    Severity::High,
                    &[
                        "Select `asset { _ref }` or expand it with `asset->{ _id, url }`",
                        "Check the image was saved in the CMS",
                    ],
                );
            }
        }
        Some(_) => {
            return ImageDiagnosis::new(
                "Asset reference has wrong format",
                Severity::Medium,
                &["The asset should be an object with a `_ref` property"],
            );
        }
    }

    let validation = validate_image(raw);
    if validation.is_valid {
        ImageDiagnosis::new(
            "Image appears valid - this might be a false positive",
            Severity::Low,
            &[
                "Check whether the failure happened while loading from the CDN",
                "Check the CDN project and dataset settings",
            ],
        )
    } else {
        ImageDiagnosis::new(
            format!("Validation failed: {}", validation.errors.join(", ")),
            Severity::Medium,
            &["Compare the image data with the expected structure"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{ErrorMonitor, NullSink};
    use crate::validation::validate_listing;
    use serde_json::json;

    fn cdn() -> CdnConfig {
        CdnConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
        }
    }

    #[test]
    fn test_parse_asset_ref() {
        assert_eq!(
            parse_asset_ref("image-a1b2-with-dashes-640x480-webp"),
            Some(AssetRef {
                id: "a1b2-with-dashes",
                width: 640,
                height: 480,
                format: "webp"
            })
        );
        assert_eq!(parse_asset_ref("file-abc-1x1-pdf"), None);
        assert_eq!(parse_asset_ref("image-abc-big-png"), None);
        assert_eq!(parse_asset_ref("image--1x1-png"), None);
    }

    #[test]
    fn test_safe_image_builds_cdn_url() {
        let mut sink = ErrorMonitor::default();
        let raw = json!({"asset": {"_ref": "image-goat1-1200x800-jpg"}, "alt": "A goat", "caption": "Billy"});
        let rendered = safe_image(&raw, &ImageRequest::default(), &cdn(), &mut sink);

        let view = rendered.ready().unwrap();
        assert_eq!(
            view.url,
            "https://cdn.sanity.io/images/abc123/production/goat1-1200x800.jpg?w=400&h=250&fit=crop&auto=format"
        );
        assert_eq!(view.alt, "A goat");
        assert_eq!(view.caption.as_deref(), Some("Billy"));
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_safe_image_request_alt_wins() {
        let raw = json!({"asset": {"_ref": "image-x-1x1-png"}, "alt": "stored"});
        let request = ImageRequest {
            alt: Some("override"),
            ..Default::default()
        };
        let rendered = safe_image(&raw, &request, &cdn(), &mut NullSink);
        assert_eq!(rendered.ready().unwrap().alt, "override");
    }

    #[test]
    fn test_safe_image_invalid_is_reported() {
        let mut sink = ErrorMonitor::default();
        let rendered = safe_image(&json!({"alt": "x"}), &ImageRequest::default(), &cdn(), &mut sink);

        assert_eq!(
            rendered.fallback(),
            Some(&FallbackReason::InvalidImage(vec![
                "Image missing asset reference".to_string()
            ]))
        );
        let entry = &sink.entries()[0];
        assert_eq!(entry.component, Component::SafeImage);
        assert_eq!(entry.kind, ErrorKind::ValidationFailed);
        assert!(entry.details.contains(&"diagnosis: Image missing asset reference".to_string()));
    }

    #[test]
    fn test_safe_image_unparseable_reference() {
        let mut sink = ErrorMonitor::default();
        let raw = json!({"asset": {"url": "https://x"}});
        let rendered = safe_image(&raw, &ImageRequest::default(), &cdn(), &mut sink);
        assert_eq!(
            rendered.fallback(),
            Some(&FallbackReason::UnresolvableAsset(String::new()))
        );
        assert_eq!(sink.entries()[0].kind, ErrorKind::ImageLoadFailed);
    }

    #[test]
    fn test_safe_image_without_cdn_project() {
        let raw = json!({"asset": {"_ref": "image-x-1x1-png"}});
        let config = CdnConfig {
            project_id: String::new(),
            dataset: "production".to_string(),
        };
        let rendered = safe_image(&raw, &ImageRequest::default(), &config, &mut NullSink);
        assert_eq!(rendered.fallback(), Some(&FallbackReason::MissingCdnConfig));
    }

    #[test]
    fn test_sanitize_href() {
        assert_eq!(sanitize_href("javascript:alert(1)"), None);
        assert_eq!(sanitize_href("  JavaScript:alert(1)"), None);
        assert_eq!(sanitize_href("data:text/html,hi"), None);
        assert_eq!(sanitize_href("zoo/goat-farm").as_deref(), Some("/zoo/goat-farm"));
        assert_eq!(sanitize_href(" /zoo/a ").as_deref(), Some("/zoo/a"));
        assert_eq!(sanitize_href("#reviews").as_deref(), Some("#reviews"));
        assert_eq!(sanitize_href("ftp://files.example").as_deref(), Some("ftp://files.example"));
        assert_eq!(sanitize_href("   "), None);
    }

    #[test]
    fn test_is_external() {
        assert!(is_external("https://example.com"));
        assert!(is_external("tel:+441234"));
        assert!(!is_external("/zoo/goat-farm"));
    }

    #[test]
    fn test_safe_link_from_slug() {
        let mut sink = ErrorMonitor::default();
        let slug = json!({"current": "goat-farm"});
        let rendered = safe_link(None, Some(&slug), "/zoo/", &mut sink);
        assert_eq!(
            rendered,
            Rendered::Ready(LinkTarget {
                href: "/zoo/goat-farm".to_string(),
                external: false
            })
        );

        let root = safe_link(None, Some(&slug), "", &mut sink);
        assert_eq!(root.ready().unwrap().href, "/goat-farm");
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_safe_link_explicit_href_wins() {
        let slug = json!({"current": "ignored"});
        let rendered = safe_link(Some("https://farm.example"), Some(&slug), "/zoo", &mut NullSink);
        let target = rendered.ready().unwrap();
        assert_eq!(target.href, "https://farm.example");
        assert!(target.external);
    }

    #[test]
    fn test_safe_link_fallbacks() {
        let mut sink = ErrorMonitor::default();

        let bad_slug = json!({"current": ""});
        assert!(matches!(
            safe_link(None, Some(&bad_slug), "/zoo", &mut sink),
            Rendered::Fallback(FallbackReason::InvalidSlug(_))
        ));
        assert_eq!(
            safe_link(Some("  "), None, "/zoo", &mut sink).fallback(),
            Some(&FallbackReason::MissingHref)
        );
        assert!(matches!(
            safe_link(Some("vbscript:msgbox"), None, "", &mut sink),
            Rendered::Fallback(FallbackReason::BlockedHref(_))
        ));

        let stats = sink.stats();
        assert_eq!(stats.by_component[&Component::SafeLink], 3);
        assert_eq!(stats.by_kind[&ErrorKind::InvalidLinkData], 2);
    }

    fn located(id: &str, lat: f64, lng: f64) -> Listing {
        validate_listing(&json!({
            "_id": id,
            "name": id,
            "slug": {"current": id},
            "location": {"lat": lat, "lng": lng}
        }))
        .data
    }

    #[test]
    fn test_plan_map_without_api_key() {
        let mut sink = ErrorMonitor::default();
        let rendered = plan_map(&[located("a", 1.0, 1.0)], false, &mut sink);
        assert_eq!(rendered.fallback(), Some(&FallbackReason::MissingApiKey));
        assert_eq!(sink.entries()[0].kind, ErrorKind::MapRenderingFailed);
    }

    #[test]
    fn test_plan_map_empty_uses_us_center() {
        let plan = plan_map(&[], true, &mut NullSink);
        let plan = plan.ready().unwrap();
        assert_eq!(plan.center, US_CENTER);
        assert_eq!(plan.zoom, OVERVIEW_ZOOM);
    }

    #[test]
    fn test_plan_map_single_listing() {
        let plan = plan_map(&[located("a", 51.5, -0.12)], true, &mut NullSink);
        let plan = plan.ready().unwrap();
        assert_eq!(plan.center, Coordinates::new(51.5, -0.12));
        assert_eq!(plan.zoom, SINGLE_LISTING_ZOOM);
        assert_eq!(plan.markers.len(), 1);
    }

    #[test]
    fn test_plan_map_bounds_and_invalid_locations() {
        let mut broken = located("broken", 0.0, 0.0);
        if let Some(location) = broken.location.as_mut() {
            location.lat = 120.0;
        }
        let unlocated = validate_listing(&json!({"_id": "nowhere", "slug": {"current": "n"}})).data;

        let listings = vec![located("a", 40.0, -80.0), broken, located("b", 30.0, -70.0), unlocated];
        let mut sink = ErrorMonitor::default();
        let rendered = plan_map(&listings, true, &mut sink);
        let plan = rendered.ready().unwrap();

        assert_eq!(plan.center, Coordinates::new(35.0, -75.0));
        assert_eq!(plan.zoom, OVERVIEW_ZOOM);
        assert_eq!(plan.markers.len(), 2);
        assert_eq!(plan.unlocated, vec!["broken".to_string(), "nowhere".to_string()]);
        assert_eq!(sink.entries().len(), 1);
        assert_eq!(sink.entries()[0].component, Component::SafeMap);
    }

    #[test]
    fn test_diagnose_image_cases() {
        assert_eq!(diagnose_image(&json!(null)).issue, "Image data is null or undefined");
        assert_eq!(diagnose_image(&json!("https://x/y.jpg")).severity, Severity::High);
        assert_eq!(diagnose_image(&json!({})).issue, "Image missing asset reference");
        assert_eq!(
            diagnose_image(&json!({"asset": "image-x"})).issue,
            "Asset reference has wrong format"
        );
        assert_eq!(
            diagnose_image(&json!({"asset": {"url": "x"}})).issue,
            "Asset missing _ref or _id property"
        );
        assert_eq!(
            diagnose_image(&json!({"asset": {"_ref": "image-x-1x1-png"}})).severity,
            Severity::Low
        );
    }
}
