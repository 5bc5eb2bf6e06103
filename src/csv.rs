//! Plain comma-separated import/export of members.
//!
//! The format has no quoting: a field containing a comma cannot be read
//! back. Exports log a warning for such fields instead of escaping them.

use tracing::{debug, warn};

use crate::error::{GymError, Result};
use crate::member::{generate_id, validate, Member, MemberCandidate, DATE_FORMAT};

/// Header line written on export
pub const CSV_HEADER: &str = "name,phone,type,amount,start,end";

/// Members accepted from a CSV document
#[derive(Debug, Default)]
pub struct CsvImport {
    pub members: Vec<Member>,
    /// Data rows dropped for missing name/phone or invalid values
    pub skipped: usize,
}

impl CsvImport {
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Column positions of the recognized header fields
#[derive(Debug, Default)]
struct Columns {
    name: Option<usize>,
    phone: Option<usize>,
    membership_type: Option<usize>,
    amount: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
}

impl Columns {
    fn from_header(line: &str) -> Self {
        let header: Vec<String> = line.split(',').map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| header.iter().position(|h| h == name);
        Self {
            name: find("name"),
            phone: find("phone"),
            membership_type: find("type"),
            amount: find("amount"),
            start: find("start"),
            end: find("end"),
        }
    }
}

fn cell(cols: &[&str], idx: Option<usize>) -> String {
    idx.and_then(|i| cols.get(i))
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

/// Parse CSV text into members, each with a freshly generated id.
///
/// The first non-blank line is the header. Rows with an empty name or
/// phone, or values that fail validation, are skipped without error.
pub fn parse(text: &str) -> Result<CsvImport> {
    let mut lines = text
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|l| !l.is_empty());

    let header = lines.next().ok_or(GymError::EmptyOrMalformedCsv)?;
    let columns = Columns::from_header(header);

    let mut import = CsvImport::default();
    for (row, line) in lines.enumerate() {
        let cols: Vec<&str> = line.split(',').collect();
        let candidate = MemberCandidate {
            name: cell(&cols, columns.name),
            phone: cell(&cols, columns.phone),
            // blank type and amount fall back to Gym and 0 in validate()
            membership_type: cell(&cols, columns.membership_type),
            amount: cell(&cols, columns.amount),
            start: cell(&cols, columns.start),
            end: cell(&cols, columns.end),
        };

        if candidate.name.is_empty() || candidate.phone.is_empty() {
            debug!(row = row + 2, "skipping row without name or phone");
            import.skipped += 1;
            continue;
        }

        match validate(&candidate) {
            Ok(fields) => import.members.push(Member::new(generate_id(), fields)),
            Err(e) => {
                debug!(row = row + 2, "skipping row: {e}");
                import.skipped += 1;
            }
        }
    }

    Ok(import)
}

/// Serialize members as CSV text with a header line
pub fn serialize(members: &[Member]) -> String {
    let mut lines = vec![CSV_HEADER.to_string()];
    for member in members {
        let fields = [
            member.name.clone(),
            member.phone.clone(),
            member.membership_type.to_string(),
            member.amount_paid.to_string(),
            member.start.format(DATE_FORMAT).to_string(),
            member.end.format(DATE_FORMAT).to_string(),
        ];
        if fields.iter().any(|f| f.contains(',')) {
            warn!(id = %member.id, "field contains a comma; exported row will not import cleanly");
        }
        lines.push(fields.join(","));
    }
    lines.join("\n")
}
