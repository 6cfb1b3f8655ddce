//! Report assembly: named, ordered tables ready for the workbook writer.
//!
//! A [`ReportBundle`] is an ordered list of [`Section`]s. Sections whose table
//! has no rows are dropped by [`assemble`], so a report over an empty store
//! has no sections at all and [`write_report`] writes no file.
//!
//! Section order is fixed per variant:
//!
//! | General | Direct |
//! |---------|--------|
//! | Department Summary | Department Analysis |
//! | Monthly Trend | Position Analysis |
//! | Position Analysis | Efficiency Analysis |
//! | Payroll Detail | Overtime Pattern |
//! | Summary Statistics | Overtime Trend |
//! | | Hourly Cost Analysis |
//! | | Direct Labor Detail |
//! | | Dashboard Summary |

use std::path::Path;

use tracing::{info, warn};

use crate::analytics::{
    self, BucketRow, DepartmentSummary, EfficiencyRow, HourlyCostRow, MonthlyTrend,
    OvertimeTrend, PositionSummary, Scope,
};
use crate::error::{PayrollError, PayrollResult};
use crate::models::{sum_amounts, PayrollRecord, Period, Variant};
use crate::store::PeriodStore;
use crate::tabular::Cell;
use crate::xlsx::{self, Sheet};

/// Header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Table of typed rows, with columns chosen for `variant`.
    pub fn from_rows<T: TableRow>(rows: &[T], variant: Variant) -> Self {
        Self {
            columns: T::headers(variant).into_iter().map(String::from).collect(),
            rows: rows.iter().map(|r| r.cells(variant)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub table: Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    pub variant: Variant,
    /// Period the report is scoped to; `None` for an empty store.
    pub period: Option<Period>,
    pub sections: Vec<Section>,
}

impl ReportBundle {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }
}

/// A row type that renders into a report table.
pub trait TableRow {
    fn headers(variant: Variant) -> Vec<&'static str>;
    fn cells(&self, variant: Variant) -> Vec<Cell>;
}

/// Keep the non-empty sections, in order.
pub fn assemble<I, S>(sections: I) -> Vec<Section>
where
    I: IntoIterator<Item = (S, Table)>,
    S: Into<String>,
{
    sections
        .into_iter()
        .filter(|(_, table)| !table.is_empty())
        .map(|(name, table)| Section {
            name: name.into(),
            table,
        })
        .collect()
}

fn round2(v: f64) -> Cell {
    Cell::from((v * 100.0).round() / 100.0)
}

fn round2_opt(v: Option<f64>) -> Cell {
    v.map(round2).unwrap_or(Cell::Empty)
}

impl TableRow for DepartmentSummary {
    fn headers(variant: Variant) -> Vec<&'static str> {
        let mut h = vec!["Department", "Employees", "Base Salary", "Overtime Pay"];
        match variant {
            Variant::General => {
                h.extend(["Allowances", "Bonuses", "Deductions", "Net Pay Total"]);
                h.extend(["Average", "Max", "Min", "Cost Ratio (%)"]);
            }
            Variant::Direct => {
                h.extend(["Night Shift Pay", "Holiday Pay", "Skill Allowance"]);
                h.extend(["Direct Labor Total", "Average", "Max", "Min"]);
                h.extend(["Avg Hourly Rate", "Overtime Hours", "Avg Productivity"]);
                h.push("Cost Ratio (%)");
            }
        }
        h
    }

    fn cells(&self, variant: Variant) -> Vec<Cell> {
        let mut c = vec![
            Cell::from(self.department.as_str()),
            self.employee_count.into(),
            self.base_salary.into(),
            self.overtime_pay.into(),
        ];
        match variant {
            Variant::General => {
                c.extend([
                    Cell::from(self.allowances),
                    Cell::from(self.bonuses),
                    Cell::from(self.deductions),
                ]);
                c.extend([self.total.into(), round2(self.avg_total)]);
                c.extend([Cell::from(self.max_total), Cell::from(self.min_total)]);
            }
            Variant::Direct => {
                c.extend([
                    Cell::from(self.night_shift_pay),
                    Cell::from(self.holiday_pay),
                    Cell::from(self.skill_allowance),
                ]);
                c.extend([self.total.into(), round2(self.avg_total)]);
                c.extend([Cell::from(self.max_total), Cell::from(self.min_total)]);
                c.extend([
                    round2(self.avg_hourly_rate),
                    round2(self.total_overtime_hours),
                    round2(self.avg_productivity),
                ]);
            }
        }
        c.push(round2(self.cost_ratio));
        c
    }
}

impl TableRow for PositionSummary {
    fn headers(variant: Variant) -> Vec<&'static str> {
        let mut h = vec!["Position", "Employees", "Average", "Total", "Max", "Min"];
        if variant == Variant::Direct {
            h.extend([
                "Avg Base Salary",
                "Avg Overtime Pay",
                "Avg Hourly Rate",
                "Avg Overtime Hours",
            ]);
        }
        h
    }

    fn cells(&self, variant: Variant) -> Vec<Cell> {
        let mut c = vec![
            Cell::from(self.position.as_str()),
            self.employee_count.into(),
            round2(self.avg_total),
            self.total.into(),
            self.max_total.into(),
            self.min_total.into(),
        ];
        if variant == Variant::Direct {
            c.extend([
                round2(self.avg_base_salary),
                round2(self.avg_overtime_pay),
                round2(self.avg_hourly_rate),
                round2(self.avg_overtime_hours),
            ]);
        }
        c
    }
}

impl TableRow for MonthlyTrend {
    fn headers(_: Variant) -> Vec<&'static str> {
        vec![
            "Year",
            "Month",
            "Employees",
            "Total Cost",
            "Average Salary",
            "Cost Change (%)",
            "Headcount Change (%)",
        ]
    }

    fn cells(&self, _: Variant) -> Vec<Cell> {
        vec![
            i64::from(self.year).into(),
            i64::from(self.month).into(),
            self.employee_count.into(),
            self.total_cost.into(),
            round2(self.avg_salary),
            round2_opt(self.cost_change_pct),
            round2_opt(self.headcount_change_pct),
        ]
    }
}

impl TableRow for OvertimeTrend {
    fn headers(_: Variant) -> Vec<&'static str> {
        vec![
            "Year",
            "Month",
            "Department",
            "Employees",
            "Overtime Hours",
            "Avg Overtime Hours",
            "Max Overtime Hours",
            "Overtime Pay",
            "Avg Overtime Pay",
            "Overtime Ratio (%)",
            "Hours Growth (%)",
        ]
    }

    fn cells(&self, _: Variant) -> Vec<Cell> {
        vec![
            i64::from(self.year).into(),
            i64::from(self.month).into(),
            Cell::from(self.department.as_str()),
            self.employee_count.into(),
            round2(self.total_overtime_hours),
            round2(self.avg_overtime_hours),
            round2(self.max_overtime_hours),
            self.total_overtime_pay.into(),
            round2(self.avg_overtime_pay),
            round2(self.overtime_ratio),
            round2_opt(self.hours_growth_pct),
        ]
    }
}

impl TableRow for EfficiencyRow {
    fn headers(_: Variant) -> Vec<&'static str> {
        vec![
            "Employee ID",
            "Name",
            "Department",
            "Position",
            "Direct Labor Cost",
            "Total Hours",
            "Cost per Hour",
            "Productivity",
            "Hourly Rate",
            "Efficiency Index",
        ]
    }

    fn cells(&self, _: Variant) -> Vec<Cell> {
        vec![
            Cell::from(self.employee_id.as_str()),
            Cell::from(self.employee_name.as_str()),
            Cell::from(self.department.as_str()),
            Cell::from(self.position.as_str()),
            self.total.into(),
            round2(self.total_hours),
            round2(self.cost_per_hour),
            round2(self.productivity_score),
            round2(self.hourly_rate),
            round2_opt(self.efficiency_index),
        ]
    }
}

impl TableRow for HourlyCostRow {
    fn headers(_: Variant) -> Vec<&'static str> {
        vec![
            "Employee ID",
            "Name",
            "Department",
            "Hourly Rate",
            "Overtime Rate",
            "Total Hours",
            "Direct Labor Cost",
            "Actual Hourly Cost",
            "Productivity",
            "Cost Efficiency",
        ]
    }

    fn cells(&self, _: Variant) -> Vec<Cell> {
        vec![
            Cell::from(self.employee_id.as_str()),
            Cell::from(self.employee_name.as_str()),
            Cell::from(self.department.as_str()),
            round2(self.hourly_rate),
            round2(self.overtime_rate),
            round2(self.total_hours),
            self.total.into(),
            round2(self.actual_hourly_cost),
            round2(self.productivity_score),
            round2_opt(self.cost_efficiency),
        ]
    }
}

impl TableRow for BucketRow {
    fn headers(_: Variant) -> Vec<&'static str> {
        vec!["Department", "Overtime Bucket", "Employees", "Avg Overtime Pay"]
    }

    fn cells(&self, _: Variant) -> Vec<Cell> {
        vec![
            Cell::from(self.department.as_str()),
            Cell::from(self.bucket.as_str()),
            self.employee_count.into(),
            round2(self.avg_overtime_pay),
        ]
    }
}

impl TableRow for PayrollRecord {
    fn headers(variant: Variant) -> Vec<&'static str> {
        let mut h = vec!["Employee ID", "Name", "Department", "Position"];
        match variant {
            Variant::General => {
                h.extend(["Base Salary", "Overtime Pay", "Allowances", "Bonuses"]);
                h.extend(["Deductions", "Net Pay", "Payment Date", "Year", "Month"]);
            }
            Variant::Direct => {
                h.extend(["Work Type", "Base Salary", "Overtime Pay", "Night Shift Pay"]);
                h.extend(["Holiday Pay", "Skill Allowance", "Direct Labor Cost"]);
                h.extend(["Work Hours", "Overtime Hours", "Hourly Rate", "Overtime Rate"]);
                h.extend(["Productivity", "Cost Center", "Project Code", "Payment Date"]);
            }
        }
        h
    }

    fn cells(&self, variant: Variant) -> Vec<Cell> {
        let mut c = vec![
            Cell::from(self.employee_id.as_str()),
            Cell::from(self.employee_name.as_str()),
            Cell::from(self.department.as_str()),
            Cell::from(self.position.as_str()),
        ];
        let payment_date = Cell::from(self.payment_date.format("%Y-%m-%d").to_string());
        match variant {
            Variant::General => {
                c.extend([
                    self.base_salary.into(),
                    self.overtime_pay.into(),
                    self.allowances.into(),
                    self.bonuses.into(),
                    self.deductions.into(),
                    self.total.into(),
                    payment_date,
                    i64::from(self.year).into(),
                    i64::from(self.month).into(),
                ]);
            }
            Variant::Direct => {
                c.extend([
                    Cell::from(self.work_type.as_str()),
                    self.base_salary.into(),
                    self.overtime_pay.into(),
                    self.night_shift_pay.into(),
                    self.holiday_pay.into(),
                    self.skill_allowance.into(),
                    self.total.into(),
                    round2(self.work_hours),
                    round2(self.overtime_hours),
                    round2(self.hourly_rate),
                    round2(self.overtime_rate),
                    round2(self.productivity_score),
                    Cell::from(self.cost_center.as_str()),
                    Cell::from(self.project_code.as_str()),
                    payment_date,
                ]);
            }
        }
        c
    }
}

// ============ Headline metrics ============

/// One dashboard line: label, formatted value, description.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    pub description: String,
}

impl Metric {
    fn new(label: &str, value: String, description: &str) -> Self {
        Self {
            label: label.to_string(),
            value,
            description: description.to_string(),
        }
    }
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Direct-labor dashboard figures. Empty for an empty scope.
pub fn headline_metrics(records: &[PayrollRecord], currency: &str) -> Vec<Metric> {
    if records.is_empty() {
        return Vec::new();
    }
    let n = records.len() as f64;
    let total = sum_amounts(records.iter().map(|r| r.total));
    let overtime_pay = sum_amounts(records.iter().map(|r| r.overtime_pay));
    let overtime_hours: f64 = records.iter().map(|r| r.overtime_hours).sum();
    let avg_hourly = records.iter().map(|r| r.hourly_rate).sum::<f64>() / n;
    let avg_productivity = records.iter().map(|r| r.productivity_score).sum::<f64>() / n;
    let overtime_ratio = if total == 0 {
        0.0
    } else {
        overtime_pay as f64 / total as f64 * 100.0
    };

    vec![
        Metric::new(
            "Total Direct Labor Cost",
            format!("{} {}", thousands(total), currency),
            "Sum of direct labor cost for the period",
        ),
        Metric::new(
            "Average Hourly Rate",
            format!("{} {}", thousands(avg_hourly.round() as i64), currency),
            "Mean base hourly rate across employees",
        ),
        Metric::new(
            "Total Overtime Hours",
            format!("{:.1} h", overtime_hours),
            "Estimated overtime hours for the period",
        ),
        Metric::new(
            "Overtime Ratio",
            format!("{:.1}%", overtime_ratio),
            "Overtime pay as a share of direct labor cost",
        ),
        Metric::new(
            "Average Productivity",
            format!("{:.1}", avg_productivity),
            "Mean productivity score",
        ),
    ]
}

/// General-variant summary figures. Empty for an empty scope.
pub fn summary_statistics(records: &[PayrollRecord], currency: &str) -> Vec<Metric> {
    if records.is_empty() {
        return Vec::new();
    }
    let total = sum_amounts(records.iter().map(|r| r.total));
    let mut departments: Vec<&str> = records.iter().map(|r| r.department.as_str()).collect();
    departments.sort_unstable();
    departments.dedup();
    let avg = (total as f64 / records.len() as f64).round() as i64;

    vec![
        Metric::new(
            "Employees",
            records.len().to_string(),
            "Employees paid in the period",
        ),
        Metric::new(
            "Total Payroll Cost",
            format!("{} {}", thousands(total), currency),
            "Sum of net pay",
        ),
        Metric::new(
            "Average Net Pay",
            format!("{} {}", thousands(avg), currency),
            "Net pay per employee",
        ),
        Metric::new(
            "Departments",
            departments.len().to_string(),
            "Departments with at least one employee",
        ),
    ]
}

pub fn metrics_table(metrics: &[Metric]) -> Table {
    Table::new(
        vec!["Metric".into(), "Value".into(), "Description".into()],
        metrics
            .iter()
            .map(|m| {
                vec![
                    Cell::from(m.label.as_str()),
                    Cell::from(m.value.as_str()),
                    Cell::from(m.description.as_str()),
                ]
            })
            .collect(),
    )
}

// ============ Bundle ============

fn or_empty<T: Default>(result: PayrollResult<T>, section: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            warn!(section, error = %e, "read failed, leaving section empty");
            T::default()
        }
    }
}

/// Build the ordered section bundle for `variant` over `scope`.
pub async fn build_report(
    store: &dyn PeriodStore,
    variant: Variant,
    scope: Scope,
    trend_months: usize,
    currency: &str,
) -> ReportBundle {
    let (period, records) = or_empty(analytics::scoped_records(store, scope).await, "scope");
    let trend_until = match scope {
        Scope::Period(p) => Some(p),
        Scope::Latest => period,
    };
    let history = match trend_until {
        Some(until) => or_empty(
            analytics::recent_records(store, trend_months, Some(until)).await,
            "trend",
        ),
        None => Vec::new(),
    };

    let sections = match variant {
        Variant::General => assemble([
            (
                "Department Summary",
                Table::from_rows(&analytics::department_summary(&records), variant),
            ),
            (
                "Monthly Trend",
                Table::from_rows(&analytics::monthly_trend(&history), variant),
            ),
            (
                "Position Analysis",
                Table::from_rows(&analytics::position_summary(&records), variant),
            ),
            (
                "Payroll Detail",
                Table::from_rows(&analytics::detail_rows(&records), variant),
            ),
            (
                "Summary Statistics",
                metrics_table(&summary_statistics(&records, currency)),
            ),
        ]),
        Variant::Direct => assemble([
            (
                "Department Analysis",
                Table::from_rows(&analytics::department_summary(&records), variant),
            ),
            (
                "Position Analysis",
                Table::from_rows(&analytics::position_summary(&records), variant),
            ),
            (
                "Efficiency Analysis",
                Table::from_rows(&analytics::efficiency_analysis(&records), variant),
            ),
            (
                "Overtime Pattern",
                Table::from_rows(&analytics::overtime_distribution(&records), variant),
            ),
            (
                "Overtime Trend",
                Table::from_rows(&analytics::overtime_trend(&history), variant),
            ),
            (
                "Hourly Cost Analysis",
                Table::from_rows(&analytics::hourly_cost_analysis(&records), variant),
            ),
            (
                "Direct Labor Detail",
                Table::from_rows(&analytics::detail_rows(&records), variant),
            ),
            (
                "Dashboard Summary",
                metrics_table(&headline_metrics(&records, currency)),
            ),
        ]),
    };

    ReportBundle {
        variant,
        period,
        sections,
    }
}

/// Write the bundle as a workbook. Returns `false` (and writes nothing) when
/// the bundle has no sections.
pub fn write_report(bundle: &ReportBundle, path: &Path) -> PayrollResult<bool> {
    if bundle.is_empty() {
        warn!(path = %path.display(), "no data to report, workbook not written");
        return Ok(false);
    }
    let sheets: Vec<Sheet<'_>> = bundle
        .sections
        .iter()
        .map(|s| Sheet {
            name: &s.name,
            headers: &s.table.columns,
            rows: &s.table.rows,
        })
        .collect();
    xlsx::write_workbook_file(path, &sheets)
        .map_err(|e| PayrollError::Spreadsheet(e.to_string()))?;
    info!(
        path = %path.display(),
        sheets = sheets.len(),
        "report written"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::record;
    use crate::store::InMemoryStore;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(-3_400_000), "-3,400,000");
    }

    #[test]
    fn assemble_drops_empty_tables_in_order() {
        let full = Table::new(vec!["a".into()], vec![vec![Cell::from(1_i64)]]);
        let sections = assemble([
            ("First", full.clone()),
            ("Empty", Table::default()),
            ("Last", full),
        ]);
        let names: Vec<_> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["First", "Last"]);
    }

    #[test]
    fn metrics_are_empty_for_empty_scope() {
        assert!(headline_metrics(&[], "KRW").is_empty());
        assert!(summary_statistics(&[], "KRW").is_empty());
    }

    #[test]
    fn headline_metrics_report_overtime_share() {
        let mut r = record("E1", "Dev", 2025, 1, 1_000_000);
        r.overtime_pay = 250_000;
        r.overtime_hours = 10.0;
        let metrics = headline_metrics(&[r], "KRW");
        assert_eq!(metrics.len(), 5);
        assert_eq!(metrics[0].value, "1,000,000 KRW");
        assert_eq!(metrics[2].value, "10.0 h");
        assert_eq!(metrics[3].value, "25.0%");
    }

    #[test]
    fn detail_headers_match_cells() {
        let r = record("E1", "Dev", 2025, 1, 100);
        for variant in Variant::all() {
            assert_eq!(
                PayrollRecord::headers(variant).len(),
                r.cells(variant).len()
            );
            let summary = &analytics::department_summary(std::slice::from_ref(&r))[0];
            assert_eq!(
                DepartmentSummary::headers(variant).len(),
                summary.cells(variant).len()
            );
            let position = &analytics::position_summary(std::slice::from_ref(&r))[0];
            assert_eq!(
                PositionSummary::headers(variant).len(),
                position.cells(variant).len()
            );
        }
    }

    #[tokio::test]
    async fn empty_store_reports_nothing() {
        let store = InMemoryStore::new();
        for variant in Variant::all() {
            let bundle = build_report(&store, variant, Scope::Latest, 12, "KRW").await;
            assert!(bundle.is_empty());
            assert_eq!(bundle.period, None);
        }
    }

    #[tokio::test]
    async fn section_order_is_fixed() {
        let store = InMemoryStore::new();
        let mut r = record("E1", "Dev", 2025, 1, 1_000_000);
        r.overtime_pay = 100_000;
        r.overtime_hours = 4.0;
        store.replace_period(&[r]).await.unwrap();

        let general = build_report(&store, Variant::General, Scope::Latest, 12, "KRW").await;
        assert_eq!(
            general.section_names(),
            [
                "Department Summary",
                "Monthly Trend",
                "Position Analysis",
                "Payroll Detail",
                "Summary Statistics"
            ]
        );

        let direct = build_report(&store, Variant::Direct, Scope::Latest, 12, "KRW").await;
        assert_eq!(
            direct.section_names(),
            [
                "Department Analysis",
                "Position Analysis",
                "Efficiency Analysis",
                "Overtime Pattern",
                "Overtime Trend",
                "Hourly Cost Analysis",
                "Direct Labor Detail",
                "Dashboard Summary"
            ]
        );
    }

    #[test]
    fn empty_bundle_writes_no_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("report.xlsx");
        let bundle = ReportBundle {
            variant: Variant::General,
            period: None,
            sections: Vec::new(),
        };
        assert!(!write_report(&bundle, &path).unwrap());
        assert!(!path.exists());
    }
}
