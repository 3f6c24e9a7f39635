use anyhow::Result;

use crate::fetch::TranscriptRecord;

/// Serialize the record as a single line of JSON.
pub fn format_record(record: &TranscriptRecord) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

/// Print the record to stdout as exactly one line.
///
/// Callers pipe stdout straight into a JSON parser, so nothing else may be
/// written there.
pub fn print_record(record: &TranscriptRecord) -> Result<()> {
    println!("{}", format_record(record)?);
    Ok(())
}
