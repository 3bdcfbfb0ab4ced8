//! Format sniffing: encoding × delimiter detection for source CSVs.
//!
//! Monthly batches are exported by different tools, so files arrive as UTF-8
//! or Latin-1 and use `;`, `,`, or TAB. The sniffer tries each combination in
//! a fixed order and accepts the first that yields at least three columns,
//! the threshold that rejects a wrong delimiter collapsing everything into a
//! single mega-column. A permissive frequency-based fallback runs last; total
//! failure is reported to the caller as `None`, never an error.
//!
//! Everything is read as text at this stage; type coercion happens later in
//! the pipeline.

/// Delimiters tried, in order.
pub const DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

/// Minimum column count for a strict-phase parse to be accepted.
const MIN_COLUMNS: usize = 3;

/// A parsed-but-untyped table: trimmed headers plus text rows.
///
/// Rows may be ragged (`flexible` parsing); consumers index cells with `get`.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Sniff encoding and delimiter, returning the parsed table and the delimiter
/// actually used (`None` = permissive fallback had to guess).
pub fn sniff(bytes: &[u8]) -> Option<(RawTable, Option<u8>)> {
    for decoded in decode_candidates(bytes) {
        for &delim in &DELIMITERS {
            if let Some(table) = parse_delimited(&decoded, delim, MIN_COLUMNS, true) {
                return Some((table, Some(delim)));
            }
        }
    }

    let decoded = String::from_utf8_lossy(bytes).into_owned();
    let delim = guess_delimiter(&decoded)?;
    parse_delimited(&decoded, delim, 1, false).map(|t| (t, None))
}

/// Human-readable delimiter label for diagnostics.
pub fn delimiter_label(delim: Option<u8>) -> &'static str {
    match delim {
        Some(b';') => ";",
        Some(b',') => ",",
        Some(b'\t') => "TAB",
        Some(_) => "?",
        None => "auto",
    }
}

/// Decoded texts to try, in order: UTF-8 (when valid), then Latin-1.
fn decode_candidates(bytes: &[u8]) -> Vec<String> {
    let mut out = Vec::with_capacity(2);
    if let Ok(text) = std::str::from_utf8(bytes) {
        out.push(text.to_string());
    }
    // Latin-1 maps every byte straight to the same code point, so this
    // decode never fails.
    out.push(bytes.iter().map(|&b| b as char).collect());
    out
}

fn parse_delimited(text: &str, delim: u8, min_columns: usize, strict: bool) -> Option<RawTable> {
    let text = text.trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .ok()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.len() < min_columns {
        return None;
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(r) => rows.push(r.iter().map(str::to_string).collect()),
            // Strict phase: a malformed record rejects the whole combination.
            // Permissive phase: bad records are dropped.
            Err(_) if strict => return None,
            Err(_) => continue,
        }
    }

    Some(RawTable { headers, rows })
}

/// Pick the candidate delimiter occurring most often in the first non-empty
/// line; `None` when no candidate occurs at all.
fn guess_delimiter(text: &str) -> Option<u8> {
    let line = text.lines().find(|l| !l.trim().is_empty())?;
    DELIMITERS
        .iter()
        .copied()
        .map(|d| (line.matches(d as char).count(), d))
        .filter(|&(count, _)| count > 0)
        .max_by_key(|&(count, _)| count)
        .map(|(_, d)| d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_semicolon_utf8() {
        let bytes = "Fecha;Entidad;ROE (%)\n202504;11;12,5\n".as_bytes();
        let (table, delim) = sniff(bytes).unwrap();
        assert_eq!(delim, Some(b';'));
        assert_eq!(table.headers, vec!["Fecha", "Entidad", "ROE (%)"]);
        assert_eq!(table.rows, vec![vec!["202504", "11", "12,5"]]);
    }

    #[test]
    fn detects_comma_and_tab() {
        let (_, delim) = sniff(b"Fecha,Entidad,X\n202504,11,1\n").unwrap();
        assert_eq!(delim, Some(b','));

        let (_, delim) = sniff(b"Fecha\tEntidad\tX\n202504\t11\t1\n").unwrap();
        assert_eq!(delim, Some(b'\t'));
    }

    #[test]
    fn falls_back_to_latin1_for_accented_headers() {
        // "Código de la entidad" with Latin-1 ó (0xF3) is invalid UTF-8.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"Fecha;C\xf3digo de la entidad;ROE\n");
        bytes.extend_from_slice(b"202504;11;3,2\n");
        let (table, delim) = sniff(&bytes).unwrap();
        assert_eq!(delim, Some(b';'));
        assert_eq!(table.headers[1], "Código de la entidad");
    }

    #[test]
    fn bom_is_stripped_from_the_first_header() {
        let bytes = "\u{feff}Fecha;Entidad;X\n202504;11;1\n".as_bytes();
        let (table, _) = sniff(bytes).unwrap();
        assert_eq!(table.headers[0], "Fecha");
    }

    #[test]
    fn narrow_files_go_through_the_permissive_fallback() {
        // Two columns never pass the strict three-column threshold.
        let (table, delim) = sniff(b"Fecha;X\n202504;1\n").unwrap();
        assert_eq!(delim, None);
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn undelimited_content_fails() {
        assert!(sniff(b"no separators here at all\njust text\n").is_none());
        assert!(sniff(&[0x00, 0x01, 0x02]).is_none());
    }

    #[test]
    fn quoted_fields_keep_embedded_separators() {
        let bytes = "Fecha;Entidad;Nota\n202504;11;\"a;b\"\n".as_bytes();
        let (table, _) = sniff(bytes).unwrap();
        assert_eq!(table.rows[0][2], "a;b");
    }
}
