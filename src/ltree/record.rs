//! Record section: container-wide values preceding the entry tree

use tracing::{debug, trace};

use super::error::{LtreeError, LtreeResult};
use super::split::{trim_carriage_return, LineCursor, SplitValues, FIELD_DELIMITER};
use super::types::{TAG_CL, TAG_TOTAL_BYTES};
use super::values::decimal_to_u64;

/// Values read from the record section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordValues {
    /// Total media size in bytes ("tb")
    pub media_size: Option<u64>,
}

/// Parse the record type line and value line at the cursor.
///
/// Leaves the cursor two lines further on success.
pub(crate) fn parse_record_values(
    cursor: &mut LineCursor<'_>,
    verbose: bool,
) -> LtreeResult<RecordValues> {
    cursor.require(2)?;

    let types = SplitValues::split(cursor.current()?, FIELD_DELIMITER);
    cursor.advance();
    let values = SplitValues::split(cursor.current()?, FIELD_DELIMITER);

    if types.len() != values.len() {
        return Err(LtreeError::MalformedRecord(format!(
            "{} types for {} values",
            types.len(),
            values.len()
        )));
    }

    let mut record = RecordValues::default();

    for (type_string, value_string) in types.iter().zip(values.iter()) {
        let type_string = trim_carriage_return(type_string);
        let value_string = trim_carriage_return(value_string);

        if verbose && crate::logging::is_trace_enabled() {
            trace!(
                tag = %String::from_utf8_lossy(type_string),
                value = %String::from_utf8_lossy(value_string),
                "record value"
            );
        }

        // Empty values are absent values
        if value_string.is_empty() {
            continue;
        }
        match type_string {
            TAG_TOTAL_BYTES => record.media_size = Some(decimal_to_u64(value_string)?),
            TAG_CL => {} // reserved
            tag => trace!(tag = %String::from_utf8_lossy(tag), "Ignoring unknown record type"),
        }
    }

    cursor.advance();
    debug!(media_size = ?record.media_size, "Parsed record values");
    Ok(record)
}
