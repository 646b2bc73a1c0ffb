//! Street type and directional synonym tables.
//!
//! Abbreviations are expanded to one canonical form so that names stored
//! at build time and names supplied at query time compare equal.

use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Street type abbreviations: the common USPS Publication 28 suffixes
/// plus a few French ones seen in `OpenAddresses` data.
static STREET_TYPES: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("ALY", "ALLEY"),
        ("AV", "AVENUE"),
        ("AVE", "AVENUE"),
        ("BD", "BOULEVARD"),
        ("BLVD", "BOULEVARD"),
        ("BND", "BEND"),
        ("BR", "BRANCH"),
        ("BRG", "BRIDGE"),
        ("BYP", "BYPASS"),
        ("CHE", "CHEMIN"),
        ("CIR", "CIRCLE"),
        ("CRES", "CRESCENT"),
        ("CSWY", "CAUSEWAY"),
        ("CT", "COURT"),
        ("CTR", "CENTER"),
        ("CV", "COVE"),
        ("DR", "DRIVE"),
        ("EXPY", "EXPRESSWAY"),
        ("EXT", "EXTENSION"),
        ("FWY", "FREEWAY"),
        ("GRN", "GREEN"),
        ("GRV", "GROVE"),
        ("HTS", "HEIGHTS"),
        ("HWY", "HIGHWAY"),
        ("IMP", "IMPASSE"),
        ("JCT", "JUNCTION"),
        ("LN", "LANE"),
        ("MNR", "MANOR"),
        ("PKWY", "PARKWAY"),
        ("PL", "PLACE"),
        ("PLZ", "PLAZA"),
        ("PROM", "PROMENADE"),
        ("PT", "POINT"),
        ("RD", "ROAD"),
        ("RTE", "ROUTE"),
        ("SQ", "SQUARE"),
        ("ST", "STREET"),
        ("STR", "STREET"),
        ("TER", "TERRACE"),
        ("TPKE", "TURNPIKE"),
        ("TRL", "TRAIL"),
        ("XING", "CROSSING"),
    ])
});

/// Directional abbreviations.
static DIRECTIONALS: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("N", "NORTH"),
        ("S", "SOUTH"),
        ("E", "EAST"),
        ("W", "WEST"),
        ("NE", "NORTHEAST"),
        ("NW", "NORTHWEST"),
        ("SE", "SOUTHEAST"),
        ("SW", "SOUTHWEST"),
    ])
});

/// Expands a single uppercased token, or returns it unchanged.
#[must_use]
pub fn expand_token(token: &str) -> &str {
    DIRECTIONALS
        .get(token)
        .or_else(|| STREET_TYPES.get(token))
        .copied()
        .unwrap_or(token)
}
