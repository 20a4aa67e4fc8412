#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row types for the five derived reporting relations.
//!
//! Each struct is one row of the relation it is named after; the
//! aggregation functions in `robos_peru_aggregate` produce vectors of
//! these, already in their persisted order.

use robos_peru_incident_models::RiskLevel;
use serde::{Deserialize, Serialize};

/// A district's summed theft total before risk classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictTotal {
    /// Opaque administrative code for the district.
    pub district_code: String,
    /// Display name for the same district.
    pub district_name: String,
    /// Sum of `count` over all incidents in the district.
    pub total: f64,
}

/// A row of the `riesgo` relation: a district total plus its risk label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Opaque administrative code for the district.
    pub district_code: String,
    /// Display name for the same district.
    pub district_name: String,
    /// Sum of `count` over all incidents in the district.
    pub total: f64,
    /// Risk label relative to the run maximum.
    pub risk_level: RiskLevel,
}

/// A row of the `modalidades` relation: theft total per district and
/// modality, ranked descending by total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityTotal {
    /// Opaque administrative code for the district.
    pub district_code: String,
    /// Categorical label for how the theft occurred.
    pub modality: String,
    /// Sum of `count` over the (district, modality) group.
    pub total: f64,
}

/// A row of the `zonas` relation: district total ranked descending.
///
/// Same keying as the pre-classification `riesgo` relation but computed
/// independently; the two are separate outputs of the source system and
/// are kept separate here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTotal {
    /// Opaque administrative code for the district.
    pub district_code: String,
    /// Display name for the same district.
    pub district_name: String,
    /// Sum of `count` over all incidents in the district.
    pub total: f64,
}

/// A row of the `temporal` relation: theft total per calendar month
/// across all districts and years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    /// Calendar month (1-12 in well-formed data).
    pub month: u32,
    /// Sum of `count` over all incidents in the month.
    pub total: f64,
}

/// A row of the `historial` relation: theft total per district per
/// (year, month), ordered chronologically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    /// Calendar year of the report.
    pub year: i32,
    /// Calendar month of the report.
    pub month: u32,
    /// Opaque administrative code for the district.
    pub district_code: String,
    /// Sum of `count` over the (year, month, district) group.
    pub total: f64,
}

/// All five derived relations for one pipeline run, each in its
/// persisted row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRelations {
    /// District risk classification (`riesgo`).
    pub riesgo: Vec<RiskAssessment>,
    /// Ranked modality frequencies (`modalidades`).
    pub modalidades: Vec<ModalityTotal>,
    /// Ranked district totals (`zonas`).
    pub zonas: Vec<ZoneTotal>,
    /// Monthly seasonality totals (`temporal`).
    pub temporal: Vec<MonthlyTotal>,
    /// Per-district time series (`historial`).
    pub historial: Vec<HistoryPoint>,
}

impl DerivedRelations {
    /// Returns `true` when every relation is empty (an empty source
    /// relation propagates to empty outputs, which is not an error).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.riesgo.is_empty()
            && self.modalidades.is_empty()
            && self.zonas.is_empty()
            && self.temporal.is_empty()
            && self.historial.is_empty()
    }
}
