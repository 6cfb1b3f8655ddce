//! Grouped summaries and time-series trends over stored payroll records.
//!
//! Every aggregation is a pure function over a slice of records, so the same
//! code serves the SQLite and in-memory stores. The async loaders at the
//! bottom of this module resolve a [`Scope`] against a [`PeriodStore`] and
//! fetch the records an aggregation needs.
//!
//! Ratios and averages are returned unrounded; rounding is a presentation
//! concern handled by [`crate::report`] and the `show` command.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{PayrollError, PayrollResult};
use crate::models::{sum_amounts, PayrollRecord, Period};
use crate::store::{sort_records, PeriodStore};

/// Which records an aggregation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The maximum stored period.
    Latest,
    Period(Period),
}

impl From<Option<Period>> for Scope {
    fn from(p: Option<Period>) -> Self {
        p.map(Scope::Period).unwrap_or(Scope::Latest)
    }
}

fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn pct_change(current: f64, previous: f64) -> Option<f64> {
    (previous != 0.0).then(|| (current - previous) / previous * 100.0)
}

/// Descending order with `None` after every value.
fn desc_none_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ============ Department / position ============

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentSummary {
    pub department: String,
    pub employee_count: usize,
    pub base_salary: i64,
    pub overtime_pay: i64,
    pub allowances: i64,
    pub bonuses: i64,
    pub deductions: i64,
    pub night_shift_pay: i64,
    pub holiday_pay: i64,
    pub skill_allowance: i64,
    pub total: i64,
    pub avg_total: f64,
    pub max_total: i64,
    pub min_total: i64,
    pub avg_hourly_rate: f64,
    pub avg_productivity: f64,
    pub total_overtime_hours: f64,
    /// Share of the grand total, in percent.
    pub cost_ratio: f64,
}

pub fn department_summary(records: &[PayrollRecord]) -> Vec<DepartmentSummary> {
    let mut groups: BTreeMap<&str, Vec<&PayrollRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(r.department.as_str()).or_default().push(r);
    }
    let grand_total = sum_amounts(records.iter().map(|r| r.total));

    let mut rows: Vec<DepartmentSummary> = groups
        .into_iter()
        .map(|(department, rs)| {
            let n = rs.len();
            let sum = |f: fn(&PayrollRecord) -> i64| sum_amounts(rs.iter().map(|r| f(r)));
            let total = sum(|r| r.total);
            DepartmentSummary {
                department: department.to_string(),
                employee_count: n,
                base_salary: sum(|r| r.base_salary),
                overtime_pay: sum(|r| r.overtime_pay),
                allowances: sum(|r| r.allowances),
                bonuses: sum(|r| r.bonuses),
                deductions: sum(|r| r.deductions),
                night_shift_pay: sum(|r| r.night_shift_pay),
                holiday_pay: sum(|r| r.holiday_pay),
                skill_allowance: sum(|r| r.skill_allowance),
                total,
                avg_total: mean(total as f64, n),
                max_total: rs.iter().map(|r| r.total).max().unwrap_or(0),
                min_total: rs.iter().map(|r| r.total).min().unwrap_or(0),
                avg_hourly_rate: mean(rs.iter().map(|r| r.hourly_rate).sum(), n),
                avg_productivity: mean(rs.iter().map(|r| r.productivity_score).sum(), n),
                total_overtime_hours: rs.iter().map(|r| r.overtime_hours).sum(),
                cost_ratio: if grand_total == 0 {
                    0.0
                } else {
                    total as f64 / grand_total as f64 * 100.0
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.department.cmp(&b.department)));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub position: String,
    pub employee_count: usize,
    pub avg_total: f64,
    pub total: i64,
    pub max_total: i64,
    pub min_total: i64,
    pub avg_base_salary: f64,
    pub avg_overtime_pay: f64,
    pub avg_hourly_rate: f64,
    pub avg_overtime_hours: f64,
}

pub fn position_summary(records: &[PayrollRecord]) -> Vec<PositionSummary> {
    let mut groups: BTreeMap<&str, Vec<&PayrollRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(r.position.as_str()).or_default().push(r);
    }

    let mut rows: Vec<PositionSummary> = groups
        .into_iter()
        .map(|(position, rs)| {
            let n = rs.len();
            let total = sum_amounts(rs.iter().map(|r| r.total));
            PositionSummary {
                position: position.to_string(),
                employee_count: n,
                avg_total: mean(total as f64, n),
                total,
                max_total: rs.iter().map(|r| r.total).max().unwrap_or(0),
                min_total: rs.iter().map(|r| r.total).min().unwrap_or(0),
                avg_base_salary: mean(rs.iter().map(|r| r.base_salary as f64).sum(), n),
                avg_overtime_pay: mean(rs.iter().map(|r| r.overtime_pay as f64).sum(), n),
                avg_hourly_rate: mean(rs.iter().map(|r| r.hourly_rate).sum(), n),
                avg_overtime_hours: mean(rs.iter().map(|r| r.overtime_hours).sum(), n),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.avg_total
            .total_cmp(&a.avg_total)
            .then_with(|| a.position.cmp(&b.position))
    });
    rows
}

// ============ Trends ============

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub year: i32,
    pub month: u32,
    pub employee_count: usize,
    pub total_cost: i64,
    pub avg_salary: f64,
    pub cost_change_pct: Option<f64>,
    pub headcount_change_pct: Option<f64>,
}

/// One row per period present in `records`, ascending. Callers pass the
/// records of the most recent N periods; absent months are simply absent.
pub fn monthly_trend(records: &[PayrollRecord]) -> Vec<MonthlyTrend> {
    let mut groups: BTreeMap<Period, (usize, i64)> = BTreeMap::new();
    for r in records {
        let e = groups.entry(r.period()).or_default();
        e.0 += 1;
        e.1 = e.1.saturating_add(r.total);
    }

    let mut rows = Vec::with_capacity(groups.len());
    let mut prev: Option<(usize, i64)> = None;
    for (period, (count, total)) in groups {
        rows.push(MonthlyTrend {
            year: period.year,
            month: period.month,
            employee_count: count,
            total_cost: total,
            avg_salary: mean(total as f64, count),
            cost_change_pct: prev.and_then(|(_, t)| pct_change(total as f64, t as f64)),
            headcount_change_pct: prev.and_then(|(c, _)| pct_change(count as f64, c as f64)),
        });
        prev = Some((count, total));
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OvertimeTrend {
    pub year: i32,
    pub month: u32,
    pub department: String,
    pub employee_count: usize,
    pub total_overtime_hours: f64,
    pub avg_overtime_hours: f64,
    pub max_overtime_hours: f64,
    pub total_overtime_pay: i64,
    pub avg_overtime_pay: f64,
    /// Overtime pay as a percentage of total pay.
    pub overtime_ratio: f64,
    /// Change in total overtime hours versus the department's previous row.
    pub hours_growth_pct: Option<f64>,
}

/// Per (department, period) overtime figures over records with overtime,
/// sorted by department, year, month.
pub fn overtime_trend(records: &[PayrollRecord]) -> Vec<OvertimeTrend> {
    let mut groups: BTreeMap<(&str, Period), Vec<&PayrollRecord>> = BTreeMap::new();
    for r in records.iter().filter(|r| r.overtime_hours > 0.0) {
        groups
            .entry((r.department.as_str(), r.period()))
            .or_default()
            .push(r);
    }

    let mut rows: Vec<OvertimeTrend> = Vec::with_capacity(groups.len());
    for ((department, period), rs) in groups {
        let n = rs.len();
        let hours: f64 = rs.iter().map(|r| r.overtime_hours).sum();
        let pay = sum_amounts(rs.iter().map(|r| r.overtime_pay));
        let total = sum_amounts(rs.iter().map(|r| r.total));
        let growth = rows
            .last()
            .filter(|prev| prev.department == department)
            .and_then(|prev| pct_change(hours, prev.total_overtime_hours));

        rows.push(OvertimeTrend {
            year: period.year,
            month: period.month,
            department: department.to_string(),
            employee_count: n,
            total_overtime_hours: hours,
            avg_overtime_hours: mean(hours, n),
            max_overtime_hours: rs.iter().map(|r| r.overtime_hours).fold(0.0, f64::max),
            total_overtime_pay: pay,
            avg_overtime_pay: mean(pay as f64, n),
            overtime_ratio: if total == 0 {
                0.0
            } else {
                pay as f64 / total as f64 * 100.0
            },
            hours_growth_pct: growth,
        });
    }
    rows
}

// ============ Per-employee efficiency ============

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyRow {
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub position: String,
    pub total: i64,
    pub total_hours: f64,
    pub cost_per_hour: f64,
    pub productivity_score: f64,
    pub hourly_rate: f64,
    /// `productivity / hourly_rate × 100`; undefined for a zero hourly rate.
    pub efficiency_index: Option<f64>,
}

pub fn efficiency_analysis(records: &[PayrollRecord]) -> Vec<EfficiencyRow> {
    let mut rows: Vec<EfficiencyRow> = records
        .iter()
        .filter(|r| r.total_hours() > 0.0)
        .map(|r| {
            let total_hours = r.total_hours();
            EfficiencyRow {
                employee_id: r.employee_id.clone(),
                employee_name: r.employee_name.clone(),
                department: r.department.clone(),
                position: r.position.clone(),
                total: r.total,
                total_hours,
                cost_per_hour: r.total as f64 / total_hours,
                productivity_score: r.productivity_score,
                hourly_rate: r.hourly_rate,
                efficiency_index: (r.hourly_rate > 0.0)
                    .then(|| r.productivity_score / r.hourly_rate * 100.0),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        desc_none_last(a.efficiency_index, b.efficiency_index)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyCostRow {
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub hourly_rate: f64,
    pub overtime_rate: f64,
    pub total_hours: f64,
    pub total: i64,
    pub actual_hourly_cost: f64,
    pub productivity_score: f64,
    /// `productivity / actual hourly cost × 100`; undefined when nothing was paid.
    pub cost_efficiency: Option<f64>,
}

pub fn hourly_cost_analysis(records: &[PayrollRecord]) -> Vec<HourlyCostRow> {
    let mut rows: Vec<HourlyCostRow> = records
        .iter()
        .filter(|r| r.total_hours() > 0.0)
        .map(|r| {
            let total_hours = r.total_hours();
            let actual = r.total as f64 / total_hours;
            HourlyCostRow {
                employee_id: r.employee_id.clone(),
                employee_name: r.employee_name.clone(),
                department: r.department.clone(),
                hourly_rate: r.hourly_rate,
                overtime_rate: r.overtime_rate,
                total_hours,
                total: r.total,
                actual_hourly_cost: actual,
                productivity_score: r.productivity_score,
                cost_efficiency: (actual > 0.0).then(|| r.productivity_score / actual * 100.0),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        desc_none_last(a.cost_efficiency, b.cost_efficiency)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });
    rows
}

// ============ Overtime buckets ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OvertimeBucket {
    None,
    Low,
    Moderate,
    High,
}

impl OvertimeBucket {
    /// `none` at 0 h, `low` below 11 h, `moderate` up to 20 h, `high` above.
    pub fn classify(hours: f64) -> Self {
        if hours <= 0.0 {
            OvertimeBucket::None
        } else if hours < 11.0 {
            OvertimeBucket::Low
        } else if hours <= 20.0 {
            OvertimeBucket::Moderate
        } else {
            OvertimeBucket::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OvertimeBucket::None => "none",
            OvertimeBucket::Low => "low",
            OvertimeBucket::Moderate => "moderate",
            OvertimeBucket::High => "high",
        }
    }
}

impl fmt::Display for OvertimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRow {
    pub department: String,
    pub bucket: OvertimeBucket,
    pub employee_count: usize,
    pub avg_overtime_pay: f64,
}

pub fn overtime_distribution(records: &[PayrollRecord]) -> Vec<BucketRow> {
    let mut groups: BTreeMap<(&str, OvertimeBucket), (usize, i64)> = BTreeMap::new();
    for r in records {
        let e = groups
            .entry((r.department.as_str(), OvertimeBucket::classify(r.overtime_hours)))
            .or_default();
        e.0 += 1;
        e.1 = e.1.saturating_add(r.overtime_pay);
    }

    groups
        .into_iter()
        .map(|((department, bucket), (count, pay))| BucketRow {
            department: department.to_string(),
            bucket,
            employee_count: count,
            avg_overtime_pay: mean(pay as f64, count),
        })
        .collect()
}

/// Records ordered for the detail sheet: department, then total descending.
pub fn detail_rows(records: &[PayrollRecord]) -> Vec<PayrollRecord> {
    let mut rows = records.to_vec();
    sort_records(&mut rows);
    rows
}

// ============ Loaders ============

/// Resolve `scope` to a concrete period. An empty store resolves to `None`.
pub async fn resolve_scope(store: &dyn PeriodStore, scope: Scope) -> PayrollResult<Option<Period>> {
    match scope {
        Scope::Period(p) => Ok(Some(p)),
        Scope::Latest => match store.latest_period().await {
            Ok(p) => Ok(Some(p)),
            Err(PayrollError::EmptyStore) => Ok(None),
            Err(e) => Err(e),
        },
    }
}

/// Records of the scoped period (empty when the store is empty).
pub async fn scoped_records(
    store: &dyn PeriodStore,
    scope: Scope,
) -> PayrollResult<(Option<Period>, Vec<PayrollRecord>)> {
    match resolve_scope(store, scope).await? {
        Some(period) => Ok((Some(period), store.query_period(period).await?)),
        None => Ok((None, Vec::new())),
    }
}

/// Records of the most recent `months` stored periods, not later than
/// `until` when given.
pub async fn recent_records(
    store: &dyn PeriodStore,
    months: usize,
    until: Option<Period>,
) -> PayrollResult<Vec<PayrollRecord>> {
    let periods: Vec<Period> = store
        .periods()
        .await?
        .into_iter()
        .filter(|p| until.map_or(true, |u| *p <= u))
        .collect();
    let start = periods.len().saturating_sub(months);

    let mut records = Vec::new();
    for period in &periods[start..] {
        records.extend(store.query_period(*period).await?);
    }
    Ok(records)
}
