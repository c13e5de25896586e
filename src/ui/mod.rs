pub mod formatting;
pub mod status;

pub use formatting::{
    format_listing_heading, format_price, format_rating, print_diagnostics, print_filter_options,
    print_listing, print_map_plan, print_messages,
};
pub use status::{set_status, StatusLevel};
