//! Query Engine
//!
//! Parses filter clauses from the list endpoint's query parameters and
//! matches them against job records. Scan-based; clauses combine with AND.

use serde_json::Value;

use bisect_core::schema::{self, FilterAtom};

/// One parsed filter clause: a dotted path, an optional negation, and the
/// atoms the resolved value is compared against.
#[derive(Debug, Clone)]
pub struct FilterClause {
    pub path: String,
    pub negate: bool,
    pub atoms: Vec<FilterAtom>,
}

/// Parse query parameters into filter clauses.
///
/// A trailing `!` on the key negates the clause; the value is a
/// comma-separated list of atoms coerced per the schema.
pub fn parse_filters(params: &[(String, String)]) -> Vec<FilterClause> {
    params
        .iter()
        .map(|(key, raw)| {
            let (path, negate) = match key.strip_suffix('!') {
                Some(stripped) => (stripped, true),
                None => (key.as_str(), false),
            };

            let atoms = raw
                .split(',')
                .map(|atom| schema::coerce_filter_atom(path, atom))
                .collect();

            FilterClause {
                path: path.to_string(),
                negate,
                atoms,
            }
        })
        .collect()
}

/// Whether a record's JSON projection satisfies every clause.
pub fn matches(record: &Value, clauses: &[FilterClause]) -> bool {
    clauses.iter().all(|clause| {
        let resolved = resolve_path(record, &clause.path);
        let member = clause.atoms.iter().any(|atom| match atom {
            FilterAtom::Absent => resolved.is_none(),
            FilterAtom::Value(value) => resolved == Some(value),
        });
        member != clause.negate
    })
}

/// Resolve a dotted path against nested mappings. Missing segments and
/// non-mapping intermediates resolve to absent; sequences are not indexed.
fn resolve_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
