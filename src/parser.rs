use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SyncError;

#[cfg(test)]
use mockall::automock;

/// Description used when a note carries a ticket key but no trailing text.
pub const DEFAULT_DESCRIPTION: &str = "Work logged via timetrap sync";

static TICKET_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z]+-[0-9]+)").unwrap());
static TICKET_WITH_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[A-Za-z]+-[0-9]+:\s*(.+)").unwrap());
static BARE_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+-[0-9]+$").unwrap());

/// Ticket key and worklog description extracted from an entry note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedReference {
    pub ticket_key: String,
    pub description: String,
}

/// Supplies a ticket key for a note that carries none.
///
/// The terminal prompt is one implementation; non-interactive runs plug in
/// an auto-skip. `None` means the entry is skipped.
#[cfg_attr(test, automock)]
pub trait ReferenceResolver {
    fn resolve(&mut self, note: &str) -> Option<String>;
}

/// Validates a ticket key supplied out-of-band, e.g. by a resolver.
pub fn is_valid_ticket_key(key: &str) -> bool {
    BARE_KEY.is_match(key)
}

/// Extracts a [`ParsedReference`] from an entry note.
///
/// Notes of the form `@KEY-NUM: text` yield the key and the trailing text;
/// `@KEY-NUM` alone falls back to [`DEFAULT_DESCRIPTION`]. A note without a
/// ticket token is handed to the resolver, and a key obtained that way keeps
/// the raw note verbatim as the description.
pub fn parse_note<R: ReferenceResolver>(
    note: &str,
    resolver: &mut R,
) -> Result<ParsedReference, SyncError> {
    if let Some(captures) = TICKET_KEY.captures(note) {
        let ticket_key = captures[1].to_string();
        let description = TICKET_WITH_DESCRIPTION
            .captures(note)
            .map(|captures| captures[1].trim().to_string())
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        debug!("Parsed `{}` out of note", ticket_key);

        return Ok(ParsedReference {
            ticket_key,
            description,
        });
    }

    match resolver.resolve(note) {
        Some(key) if is_valid_ticket_key(&key) => Ok(ParsedReference {
            ticket_key: key,
            description: note.to_string(),
        }),
        Some(key) => Err(SyncError::Skipped(format!(
            "resolver supplied malformed ticket key `{}`",
            key
        ))),
        None => Err(SyncError::Skipped(
            "no ticket reference in note".to_string(),
        )),
    }
}
