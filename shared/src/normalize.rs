//! City name normalization for user-entered cities.
//!
//! The catalog is keyed by the normalized name, so two spellings of the same
//! city must collapse to one key before anything is written.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Anything after one of these is treated as a qualifier ("Antwerp - BE",
/// "Ghent / Gent") and dropped.
pub const CITY_NAME_SEPARATORS: &[char] = &['-', '/', '|', ','];

/// Localized and alias spellings mapped to the canonical English name.
/// Keys are lowercase with single spaces.
const CITY_ALIASES: &[(&str, &str)] = &[
    ("bruxelles", "Brussels"),
    ("brussel", "Brussels"),
    ("brüssel", "Brussels"),
    ("bruselas", "Brussels"),
    ("antwerpen", "Antwerp"),
    ("anvers", "Antwerp"),
    ("gent", "Ghent"),
    ("gand", "Ghent"),
    ("brugge", "Bruges"),
    ("louvain", "Leuven"),
    ("liège", "Liege"),
    ("luik", "Liege"),
    ("lüttich", "Liege"),
    ("bergen", "Mons"),
    ("namen", "Namur"),
    ("münchen", "Munich"),
    ("munchen", "Munich"),
    ("muenchen", "Munich"),
    ("köln", "Cologne"),
    ("koln", "Cologne"),
    ("koeln", "Cologne"),
    ("wien", "Vienna"),
    ("praha", "Prague"),
    ("roma", "Rome"),
    ("milano", "Milan"),
    ("napoli", "Naples"),
    ("firenze", "Florence"),
    ("venezia", "Venice"),
    ("torino", "Turin"),
    ("lisboa", "Lisbon"),
    ("sevilla", "Seville"),
    ("københavn", "Copenhagen"),
    ("kobenhavn", "Copenhagen"),
    ("warszawa", "Warsaw"),
    ("kraków", "Krakow"),
    ("krakow", "Krakow"),
    ("moskva", "Moscow"),
    ("athina", "Athens"),
    ("athína", "Athens"),
    ("genève", "Geneva"),
    ("geneve", "Geneva"),
    ("genf", "Geneva"),
    ("zürich", "Zurich"),
    ("göteborg", "Gothenburg"),
    ("den haag", "The Hague"),
    ("la haye", "The Hague"),
    ("bucurești", "Bucharest"),
    ("beograd", "Belgrade"),
];

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum CityNameError {
    #[error("city name is empty")]
    Empty,
}

/// Normalize a user-entered city name to its catalog key.
///
/// Trims, cuts at the first [`CITY_NAME_SEPARATORS`] character, lowercases,
/// then maps known aliases to their canonical name. Names not in the alias
/// table are title-cased word by word so that "new york" and "NEW YORK"
/// share one key.
pub fn normalize_city_name(raw: &str) -> Result<String, CityNameError> {
    let head = raw
        .split(CITY_NAME_SEPARATORS)
        .next()
        .unwrap_or_default();

    let lowered = head
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if lowered.is_empty() {
        return Err(CityNameError::Empty);
    }

    if let Some(canonical) = canonical_alias(&lowered) {
        return Ok(canonical.to_string());
    }

    Ok(title_case(&lowered))
}

fn canonical_alias(lowered: &str) -> Option<&'static str> {
    CITY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| *canonical)
}

fn title_case(lowered: &str) -> String {
    lowered
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
