#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Canonical theft incident record and the district risk taxonomy.
//!
//! This crate defines the typed row shape that every dataset export is
//! normalized into, plus the three-level risk classification used by the
//! reporting layer. All derived relations are computed from
//! [`IncidentRecord`] rows.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Fraction of the run maximum below which a district is classified
/// [`RiskLevel::Low`].
pub const LOW_FRACTION: f64 = 0.33;

/// Fraction of the run maximum below which a district is classified
/// [`RiskLevel::Medium`].
pub const MEDIUM_FRACTION: f64 = 0.66;

/// One reported theft count for a district/time/modality combination.
///
/// `count` is kept as `f64` because upstream estimation can produce
/// fractional quantities; totals must preserve that precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Opaque administrative code for the district (UBIGEO).
    pub district_code: String,
    /// Display name for the same district.
    pub district_name: String,
    /// Categorical label for how the theft occurred.
    pub modality: String,
    /// Calendar year of the report.
    pub year: i32,
    /// Calendar month of the report (1-12 in well-formed data).
    pub month: u32,
    /// Reported incident quantity. Non-negative, possibly fractional.
    pub count: f64,
}

/// Risk level assigned to a district relative to the run maximum.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskLevel {
    /// Total below 33% of the run maximum.
    Low,
    /// Total below 66% of the run maximum.
    Medium,
    /// Everything else, including the maximum itself.
    High,
}

impl RiskLevel {
    /// Classifies a district total against the maximum total of the
    /// current run.
    ///
    /// Both thresholds are strict `<` comparisons against fractions of
    /// `max_total`: the maximum district itself always lands on `High`
    /// (equality falls through both branches), and a zero maximum
    /// classifies every row `High` (`0 < 0` is false at both thresholds,
    /// no divide-by-zero special case).
    #[must_use]
    pub fn classify(total: f64, max_total: f64) -> Self {
        if total < LOW_FRACTION * max_total {
            Self::Low
        } else if total < MEDIUM_FRACTION * max_total {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}
