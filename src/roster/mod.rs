//! Entity roster loading.
//!
//! The roster is a tab-separated reference file with no header and three
//! positional fields per line: code, display name, short alias (alias may be
//! empty). Candidates are tried in order and the first readable one wins;
//! an unresolved roster is not an error; callers fall back to raw codes.

use std::collections::HashMap;

use crate::data::provider::ResourceProvider;
use crate::domain::RosterEntry;
use crate::norm::ident::normalize_entity_code;

/// Resolve the roster among `candidates` (in order) via the provider.
///
/// Returns the mapping keyed by normalized code plus the candidate that
/// resolved (empty string when none did).
pub fn resolve(
    provider: &dyn ResourceProvider,
    candidates: &[String],
) -> (HashMap<String, RosterEntry>, String) {
    for candidate in candidates {
        let Ok(bytes) = provider.fetch(candidate) else {
            continue;
        };
        return (parse_roster(&bytes), candidate.clone());
    }
    (HashMap::new(), String::new())
}

/// Parse roster bytes (UTF-8 when valid, Latin-1 otherwise).
fn parse_roster(bytes: &[u8]) -> HashMap<String, RosterEntry> {
    let text: String = match std::str::from_utf8(bytes) {
        Ok(t) => t.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut map = HashMap::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let Some(code) = record.get(0).filter(|c| !c.is_empty()) else {
            continue;
        };
        let code_norm = normalize_entity_code(code);
        let entry = RosterEntry {
            code_norm: code_norm.clone(),
            name: record.get(1).unwrap_or("").to_string(),
            alias: record.get(2).unwrap_or("").to_string(),
        };
        // First occurrence of a code wins; later duplicates are ignored.
        map.entry(code_norm).or_insert(entry);
    }
    map
}
