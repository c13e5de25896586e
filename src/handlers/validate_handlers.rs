use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use zoodir_core::{
    petting_zoo_schema, save_listings, validate_against_schema, RawPayload, SanitizedPayload,
};

use crate::state::AppState;
use crate::ui::{print_messages, set_status, StatusLevel};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to a CMS export (array, wrapper object or single record)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Also check every raw record against the bundled schema
    #[arg(long)]
    pub strict: bool,

    /// Write the sanitized listings to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Check each raw record of a payload against the listing schema.
/// Messages are prefixed with the 1-based record number.
pub fn schema_violations(raw: &serde_json::Value) -> Vec<String> {
    let records = match RawPayload::resolve(raw) {
        RawPayload::Empty => Vec::new(),
        RawPayload::Collection { records, .. } => records,
        RawPayload::Single(record) => vec![record],
    };

    let schema = petting_zoo_schema();
    records
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| {
            validate_against_schema(&schema, record)
                .err()
                .map(|errors| (idx, errors))
        })
        .flat_map(|(idx, errors)| {
            errors
                .into_iter()
                .map(move |error| format!("Record #{}: {}", idx + 1, error))
        })
        .collect()
}

/// Run `validate`. Returns `false` when `--strict` found schema violations.
pub fn run_validate(state: &mut AppState, args: &ValidateArgs) -> Result<bool> {
    let loaded = state.load(&args.file)?;
    let result = &loaded.result;

    print_messages("Errors", &result.errors, StatusLevel::Error);
    print_messages("Warnings", &result.warnings, StatusLevel::Warning);

    let shape = match &result.data {
        SanitizedPayload::Collection { .. } => "collection",
        SanitizedPayload::Single(_) => "single record",
    };
    let summary = format!(
        "{} usable listing(s) in {} ({}), {} error(s), {} warning(s)",
        loaded.listings().len(),
        args.file.display(),
        shape,
        result.errors.len(),
        result.warnings.len()
    );
    if result.is_valid {
        set_status(&summary, StatusLevel::Success);
    } else {
        set_status(&summary, StatusLevel::Warning);
    }

    if let Some(output) = &args.output {
        save_listings(loaded.listings(), output)
            .with_context(|| format!("Could not write listings to {}", output.display()))?;
        set_status(
            &format!("Sanitized listings written to {}", output.display()),
            StatusLevel::Info,
        );
    }

    if !args.strict {
        return Ok(true);
    }

    let violations = schema_violations(&loaded.raw);
    print_messages("Schema violations", &violations, StatusLevel::Error);
    if violations.is_empty() {
        set_status("All records conform to the schema", StatusLevel::Success);
    }
    Ok(violations.is_empty())
}
