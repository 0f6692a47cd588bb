//! Free-text station lookup.

use std::collections::BTreeSet;

use crate::domain::{Station, StationId};

use super::error::ResolveError;

/// Lowercased, trimmed query text.
fn normalize(query: &str) -> Result<String, ResolveError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(ResolveError::EmptyQuery);
    }
    Ok(q.to_lowercase())
}

fn is_match(station: &Station, needle: &str) -> bool {
    station.name.to_lowercase().contains(needle)
        || station.code.as_str().to_lowercase().contains(needle)
}

/// Stations whose name or code contains the query, ignoring case.
///
/// The query must be a substring of the name or code, not the other way
/// round. Stations are returned in input order.
pub fn matching_stations<'a>(
    stations: &'a [Station],
    query: &str,
) -> Result<Vec<&'a Station>, ResolveError> {
    let needle = normalize(query)?;
    Ok(stations.iter().filter(|s| is_match(s, &needle)).collect())
}

/// Resolve a query to the set of matching station ids.
///
/// An empty set is a valid answer (nothing matched), not an error. Callers
/// must report "no matching station" instead of matching against it.
///
/// # Examples
///
/// ```
/// use circum_server::domain::{Station, StationId};
/// use circum_server::stations::resolve;
///
/// let stations = vec![
///     Station::new(1, "Pompei Scavi", "PSC").unwrap(),
///     Station::new(2, "Pompei Santuario", "PSA").unwrap(),
///     Station::new(3, "Sorrento", "SOR").unwrap(),
/// ];
///
/// let ids = resolve(&stations, "pompei").unwrap();
/// assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![StationId(1), StationId(2)]);
/// assert!(resolve(&stations, "salerno").unwrap().is_empty());
/// ```
pub fn resolve(stations: &[Station], query: &str) -> Result<BTreeSet<StationId>, ResolveError> {
    Ok(matching_stations(stations, query)?
        .into_iter()
        .map(|s| s.id)
        .collect())
}

/// Stations matching a query, best candidates first, for type-ahead search.
///
/// Exact code matches come first, then names starting with the query,
/// then every other match; ties are broken by name.
pub fn search<'a>(
    stations: &'a [Station],
    query: &str,
    limit: usize,
) -> Result<Vec<&'a Station>, ResolveError> {
    let needle = normalize(query)?;
    let mut found = matching_stations(stations, query)?;

    found.sort_by_cached_key(|s| {
        let tier = if s.code.as_str().eq_ignore_ascii_case(&needle) {
            0
        } else if s.name.to_lowercase().starts_with(&needle) {
            1
        } else {
            2
        };
        (tier, s.name.clone())
    });
    found.truncate(limit);

    Ok(found)
}
