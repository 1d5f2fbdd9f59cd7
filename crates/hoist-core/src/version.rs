use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("version string is empty")]
    Empty,
    #[error("invalid version '{input}': segment '{segment}' is not a non-negative integer")]
    InvalidSegment { input: String, segment: String },
}

/// Dotted version made of non-negative integer components.
///
/// Versions of different lengths compare as if the shorter one were padded
/// with zeros, so `1.0` and `1.0.0` are equal.
#[derive(Debug, Clone)]
pub struct VersionNumber {
    parts: Vec<u64>,
}

impl VersionNumber {
    /// Parse a dotted version such as `1.2.10`.
    ///
    /// # Errors
    /// Returns an error when the input is empty or any segment is not a plain
    /// non-negative integer.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        if input.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let parts = input
            .split('.')
            .map(|segment| parse_segment(input, segment))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { parts })
    }
}

fn parse_segment(input: &str, segment: &str) -> Result<u64, VersionParseError> {
    // `u64::from_str` accepts a leading '+', which is not a version digit.
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_segment(input, segment));
    }
    segment
        .parse::<u64>()
        .map_err(|_| invalid_segment(input, segment))
}

fn invalid_segment(input: &str, segment: &str) -> VersionParseError {
    VersionParseError::InvalidSegment {
        input: input.to_string(),
        segment: segment.to_string(),
    }
}

/// Compare two versions component by component after zero-padding the
/// shorter one.
#[must_use]
pub fn compare(a: &VersionNumber, b: &VersionNumber) -> Ordering {
    let len = a.parts.len().max(b.parts.len());
    (0..len)
        .map(|i| {
            let left = a.parts.get(i).copied().unwrap_or(0);
            let right = b.parts.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[must_use]
pub fn is_newer(latest: &VersionNumber, current: &VersionNumber) -> bool {
    compare(latest, current) == Ordering::Greater
}

/// Parse both strings and report whether `latest` is strictly newer.
///
/// # Errors
/// Returns an error when either string is not a valid dotted version.
pub fn is_newer_version(latest: &str, current: &str) -> Result<bool, VersionParseError> {
    Ok(is_newer(
        &VersionNumber::parse(latest)?,
        &VersionNumber::parse(current)?,
    ))
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == Ordering::Equal
    }
}

impl Eq for VersionNumber {}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl FromStr for VersionNumber {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{VersionNumber, VersionParseError, compare, is_newer, is_newer_version};

    fn v(input: &str) -> VersionNumber {
        VersionNumber::parse(input).expect("test version should parse")
    }

    #[test]
    fn test_version_comparison() {
        assert!(is_newer(&v("1.0.1"), &v("1.0.0")));
        assert!(is_newer(&v("1.1.0"), &v("1.0.0")));
        assert!(is_newer(&v("2.0.0"), &v("1.9.9")));
        assert!(is_newer(&v("1.2"), &v("1.1.9")));
        assert!(is_newer(&v("1.10"), &v("1.9")));
        assert!(is_newer(&v("1.2.0"), &v("1.0.0")));
        assert!(!is_newer(&v("1.9.9"), &v("2.0.0")));
        assert!(!is_newer(&v("1.0.0"), &v("1.0.0")));
        assert!(!is_newer(&v("1.2"), &v("1.2.0")));
    }

    #[test]
    fn zero_padding_makes_lengths_irrelevant() {
        assert_eq!(compare(&v("1.0"), &v("1.0.0")), Ordering::Equal);
        assert_eq!(compare(&v("1"), &v("1.0.0.0")), Ordering::Equal);
        assert_eq!(compare(&v("1.0.0.1"), &v("1")), Ordering::Greater);
        assert_eq!(v("2.0"), v("2"));
    }

    #[test]
    fn comparison_is_reflexive_antisymmetric_and_transitive() {
        let versions = ["0.1", "1", "1.0.0", "1.0.1", "1.2", "1.10", "2.0.0.0", "10"]
            .map(v);

        for a in &versions {
            assert_eq!(compare(a, a), Ordering::Equal);
            for b in &versions {
                assert_eq!(compare(a, b), compare(b, a).reverse());
                for c in &versions {
                    if compare(a, b).is_le() && compare(b, c).is_le() {
                        assert!(compare(a, c).is_le(), "{a} <= {b} <= {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn parse_rejects_non_numeric_segments() {
        assert_eq!(VersionNumber::parse(""), Err(VersionParseError::Empty));
        for input in ["1.x", "1..2", "1.2.", "-1.0", "+1.0", " 1.0", "1.0.0-beta", "v1.0"] {
            assert!(
                matches!(
                    VersionNumber::parse(input),
                    Err(VersionParseError::InvalidSegment { .. })
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn parse_error_names_offending_segment() {
        let error = VersionNumber::parse("1.beta.3").expect_err("segment should be rejected");
        assert_eq!(
            error.to_string(),
            "invalid version '1.beta.3': segment 'beta' is not a non-negative integer"
        );
    }

    #[test]
    fn display_round_trips_parsed_form() {
        assert_eq!(v("1.20.3").to_string(), "1.20.3");
        assert_eq!(v("7").to_string(), "7");
        assert_eq!("0.4.0".parse::<VersionNumber>(), Ok(v("0.4")));
    }

    #[test]
    fn is_newer_version_parses_both_sides() {
        assert_eq!(is_newer_version("1.2.0", "1.0.0"), Ok(true));
        assert_eq!(is_newer_version("1.9.9", "2.0.0"), Ok(false));
        assert!(is_newer_version("1.0", "dev").is_err());
    }
}
