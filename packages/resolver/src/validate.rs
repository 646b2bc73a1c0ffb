//! Input validation for resolver queries.

use address_interpolation_build::analyze::parse_housenumber;
use address_interpolation_store::normalize;

/// A query coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl Coordinate {
    /// Parses a coordinate from text, e.g. query-string parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLatitude`] or
    /// [`ValidationError::InvalidLongitude`] if a component is not a
    /// finite number.
    pub fn parse(lat: &str, lon: &str) -> Result<Self, ValidationError> {
        let lat = parse_finite(lat).ok_or(ValidationError::InvalidLatitude)?;
        let lon = parse_finite(lon).ok_or(ValidationError::InvalidLongitude)?;
        Ok(Self { lat, lon })
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rejected resolver input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The house number does not parse to a finite number.
    #[error("invalid number")]
    InvalidNumber,

    /// The street name normalizes to nothing.
    #[error("invalid street")]
    InvalidStreet,

    /// The latitude is not a finite number.
    #[error("invalid latitude")]
    InvalidLatitude,

    /// The longitude is not a finite number.
    #[error("invalid longitude")]
    InvalidLongitude,
}

/// A query that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    /// Query coordinate.
    pub point: Coordinate,
    /// Parsed target house number.
    pub number: f64,
    /// House number exactly as supplied, echoed in results.
    pub raw_number: String,
    /// Normalized street-name variants to match.
    pub names: Vec<String>,
}

/// Checks the coordinate, then the number, then the street.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate(
    point: Coordinate,
    number: &str,
    street: &str,
) -> Result<ValidatedQuery, ValidationError> {
    if !point.lat.is_finite() {
        return Err(ValidationError::InvalidLatitude);
    }
    if !point.lon.is_finite() {
        return Err(ValidationError::InvalidLongitude);
    }

    let parsed = parse_housenumber(number).ok_or(ValidationError::InvalidNumber)?;

    let names = normalize::street_variants(street);
    if names.is_empty() {
        return Err(ValidationError::InvalidStreet);
    }

    Ok(ValidatedQuery {
        point,
        number: parsed,
        raw_number: number.to_string(),
        names,
    })
}
