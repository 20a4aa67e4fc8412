#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and risk classification over theft incident records.
//!
//! Every function here is pure: it takes the source relation as a slice
//! and returns a freshly computed derived relation. Grouping goes through
//! `BTreeMap` so iteration order (and therefore tie order after the
//! ranking sorts) is identical on every run over the same input. None of
//! these functions perform I/O.

use std::collections::BTreeMap;

use robos_peru_aggregate_models::{
    DerivedRelations, DistrictTotal, HistoryPoint, ModalityTotal, MonthlyTotal, RiskAssessment,
    ZoneTotal,
};
use robos_peru_incident_models::{IncidentRecord, RiskLevel};

/// Sums `count` per district, keyed by `(district_code, district_name)`.
///
/// This is the `riesgo` relation before classification. Rows come out in
/// ascending key order; the relation itself carries no ranking.
#[must_use]
pub fn district_totals(records: &[IncidentRecord]) -> Vec<DistrictTotal> {
    let mut groups: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for record in records {
        *groups
            .entry((record.district_code.as_str(), record.district_name.as_str()))
            .or_insert(0.0) += record.count;
    }

    groups
        .into_iter()
        .map(|((code, name), total)| DistrictTotal {
            district_code: code.to_owned(),
            district_name: name.to_owned(),
            total,
        })
        .collect()
}

/// Sums `count` per `(district_code, modality)` and ranks the result
/// descending by total.
///
/// Ties keep the ascending key order the grouping produced, so reruns on
/// identical input yield identical row order.
#[must_use]
pub fn modality_totals(records: &[IncidentRecord]) -> Vec<ModalityTotal> {
    let mut groups: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for record in records {
        *groups
            .entry((record.district_code.as_str(), record.modality.as_str()))
            .or_insert(0.0) += record.count;
    }

    let mut rows: Vec<ModalityTotal> = groups
        .into_iter()
        .map(|((code, modality), total)| ModalityTotal {
            district_code: code.to_owned(),
            modality: modality.to_owned(),
            total,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total.total_cmp(&a.total).then_with(|| {
            (&a.district_code, &a.modality).cmp(&(&b.district_code, &b.modality))
        })
    });

    rows
}

/// Sums `count` per district and ranks the result descending by total.
///
/// Same keying as [`district_totals`] but an independent relation: the
/// source system computed the two separately and downstream consumers
/// read them separately, so no result sharing happens here.
#[must_use]
pub fn zone_totals(records: &[IncidentRecord]) -> Vec<ZoneTotal> {
    let mut groups: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for record in records {
        *groups
            .entry((record.district_code.as_str(), record.district_name.as_str()))
            .or_insert(0.0) += record.count;
    }

    let mut rows: Vec<ZoneTotal> = groups
        .into_iter()
        .map(|((code, name), total)| ZoneTotal {
            district_code: code.to_owned(),
            district_name: name.to_owned(),
            total,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total.total_cmp(&a.total).then_with(|| {
            (&a.district_code, &a.district_name).cmp(&(&b.district_code, &b.district_name))
        })
    });

    rows
}

/// Sums `count` per calendar month across all districts and years,
/// ordered ascending by month.
#[must_use]
pub fn monthly_totals(records: &[IncidentRecord]) -> Vec<MonthlyTotal> {
    let mut groups: BTreeMap<u32, f64> = BTreeMap::new();
    for record in records {
        *groups.entry(record.month).or_insert(0.0) += record.count;
    }

    groups
        .into_iter()
        .map(|(month, total)| MonthlyTotal { month, total })
        .collect()
}

/// Sums `count` per `(year, month, district_code)`, ordered ascending by
/// `(year, month)` with district code as the deterministic tie-break
/// within a month.
#[must_use]
pub fn history(records: &[IncidentRecord]) -> Vec<HistoryPoint> {
    let mut groups: BTreeMap<(i32, u32, &str), f64> = BTreeMap::new();
    for record in records {
        *groups
            .entry((record.year, record.month, record.district_code.as_str()))
            .or_insert(0.0) += record.count;
    }

    groups
        .into_iter()
        .map(|((year, month, code), total)| HistoryPoint {
            year,
            month,
            district_code: code.to_owned(),
            total,
        })
        .collect()
}

/// Assigns a [`RiskLevel`] to every district total.
///
/// The maximum is computed over the full input relation and classification
/// never drops or adds rows. An empty input yields an empty output; when
/// every total is zero the maximum is zero and every row classifies
/// `High` (see [`RiskLevel::classify`]).
#[must_use]
pub fn classify_risk(totals: Vec<DistrictTotal>) -> Vec<RiskAssessment> {
    let max_total = totals.iter().fold(0.0_f64, |max, row| max.max(row.total));

    totals
        .into_iter()
        .map(|row| RiskAssessment {
            risk_level: RiskLevel::classify(row.total, max_total),
            district_code: row.district_code,
            district_name: row.district_name,
            total: row.total,
        })
        .collect()
}

/// Computes all five derived relations from one source relation.
#[must_use]
pub fn derive_all(records: &[IncidentRecord]) -> DerivedRelations {
    DerivedRelations {
        riesgo: classify_risk(district_totals(records)),
        modalidades: modality_totals(records),
        zonas: zone_totals(records),
        temporal: monthly_totals(records),
        historial: history(records),
    }
}
