//! Print version information.

use crate::error::Result;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;
use crate::store::SNAPSHOT_KEY;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionOutput {
    version: &'static str,
    build: &'static str,
    schema_version: i32,
    snapshot_key: &'static str,
}

impl VersionOutput {
    fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build: if cfg!(debug_assertions) { "dev" } else { "release" },
            schema_version: CURRENT_SCHEMA_VERSION,
            snapshot_key: SNAPSHOT_KEY,
        }
    }
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput::current();
    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("crmsync version {} ({})", output.version, output.build);
        if !crate::is_silent() {
            println!("  schema v{}, snapshot key `{}`", output.schema_version, output.snapshot_key);
        }
    }
    Ok(())
}
