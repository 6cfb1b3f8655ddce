//! Record normalization: raw spreadsheet rows → typed [`PayrollRecord`]s.
//!
//! A single pass resolves header aliases, checks required columns, coerces
//! numbers, fills defaults, and computes every derived field. The result is
//! either a complete batch or a [`PayrollError`]; nothing partially typed
//! escapes this module.
//!
//! # Coercion policy
//!
//! Amounts are permissive: an empty, non-numeric, negative, or non-finite
//! value becomes `0`, fractional amounts are truncated, and anything above
//! [`MAX_AMOUNT`] is clamped to it. Only structural
//! problems (missing required columns, rows without an identifier, invalid
//! periods, duplicate identifiers) are errors.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Days, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::{Config, NormalizeConfig};
use crate::error::{PayrollError, PayrollResult};
use crate::models::{sum_amounts, PayrollRecord, Period, Variant};
use crate::tabular::{Cell, RawTable};

pub const DEFAULT_DEPARTMENT: &str = "unclassified";
pub const DEFAULT_POSITION: &str = "general";
pub const DEFAULT_WORK_TYPE: &str = "regular";
pub const DEFAULT_PROJECT_CODE: &str = "DEFAULT";

/// Largest amount a single cell can carry (one trillion).
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Canonical input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    EmployeeId,
    EmployeeName,
    Department,
    Position,
    WorkType,
    BaseSalary,
    OvertimePay,
    Allowances,
    Bonuses,
    Deductions,
    NightShiftPay,
    HolidayPay,
    SkillAllowance,
    Total,
    WorkHours,
    ProductivityScore,
    CostCenter,
    ProjectCode,
    PaymentDate,
    Year,
    Month,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::EmployeeId,
        Field::EmployeeName,
        Field::Department,
        Field::Position,
        Field::WorkType,
        Field::BaseSalary,
        Field::OvertimePay,
        Field::Allowances,
        Field::Bonuses,
        Field::Deductions,
        Field::NightShiftPay,
        Field::HolidayPay,
        Field::SkillAllowance,
        Field::Total,
        Field::WorkHours,
        Field::ProductivityScore,
        Field::CostCenter,
        Field::ProjectCode,
        Field::PaymentDate,
        Field::Year,
        Field::Month,
    ];

    /// Columns without which a batch is rejected.
    pub const REQUIRED: [Field; 3] = [Field::EmployeeId, Field::EmployeeName, Field::BaseSalary];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::EmployeeId => "employee_id",
            Field::EmployeeName => "employee_name",
            Field::Department => "department",
            Field::Position => "position",
            Field::WorkType => "work_type",
            Field::BaseSalary => "base_salary",
            Field::OvertimePay => "overtime_pay",
            Field::Allowances => "allowances",
            Field::Bonuses => "bonuses",
            Field::Deductions => "deductions",
            Field::NightShiftPay => "night_shift_pay",
            Field::HolidayPay => "holiday_pay",
            Field::SkillAllowance => "skill_allowance",
            Field::Total => "net_salary",
            Field::WorkHours => "work_hours",
            Field::ProductivityScore => "productivity_score",
            Field::CostCenter => "cost_center",
            Field::ProjectCode => "project_code",
            Field::PaymentDate => "payment_date",
            Field::Year => "year",
            Field::Month => "month",
        }
    }

    pub fn from_canonical(name: &str) -> Option<Field> {
        let key = alias_key(name);
        if key == "direct_total" {
            return Some(Field::Total);
        }
        Field::ALL
            .into_iter()
            .find(|f| f.canonical_name() == key)
    }
}

/// Source labels used by payroll ledgers, mapped to canonical fields.
const BUILTIN_ALIASES: &[(&str, Field)] = &[
    ("사번", Field::EmployeeId),
    ("사원번호", Field::EmployeeId),
    ("employee id", Field::EmployeeId),
    ("성명", Field::EmployeeName),
    ("이름", Field::EmployeeName),
    ("name", Field::EmployeeName),
    ("부서", Field::Department),
    ("직급", Field::Position),
    ("직책", Field::Position),
    ("근무형태", Field::WorkType),
    ("기본급", Field::BaseSalary),
    ("연장근무수당", Field::OvertimePay),
    ("제수당", Field::Allowances),
    ("상여금", Field::Bonuses),
    ("공제액", Field::Deductions),
    ("야근수당", Field::NightShiftPay),
    ("휴일근무수당", Field::HolidayPay),
    ("기술수당", Field::SkillAllowance),
    ("실지급액", Field::Total),
    ("직접인건비", Field::Total),
    ("근무시간", Field::WorkHours),
    ("생산성점수", Field::ProductivityScore),
    ("코스트센터", Field::CostCenter),
    ("프로젝트코드", Field::ProjectCode),
    ("지급일", Field::PaymentDate),
    ("년도", Field::Year),
    ("연도", Field::Year),
    ("월", Field::Month),
];

fn alias_key(label: &str) -> String {
    label.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Header label → canonical field lookup.
#[derive(Debug, Clone)]
pub struct ColumnAliases {
    map: HashMap<String, Field>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        let mut map = HashMap::new();
        for field in Field::ALL {
            map.insert(field.canonical_name().to_string(), field);
        }
        map.insert("direct_total".to_string(), Field::Total);
        for (label, field) in BUILTIN_ALIASES {
            map.insert(alias_key(label), *field);
        }
        Self { map }
    }
}

impl ColumnAliases {
    /// Built-in aliases plus `label → canonical name` pairs. Pairs naming an
    /// unknown canonical field are skipped with a warning.
    pub fn with_extra(extra: &HashMap<String, String>) -> Self {
        let mut aliases = Self::default();
        for (label, canonical) in extra {
            match Field::from_canonical(canonical) {
                Some(field) => {
                    aliases.map.insert(alias_key(label), field);
                }
                None => warn!(label = %label, canonical = %canonical, "ignoring alias to unknown field"),
            }
        }
        aliases
    }

    pub fn resolve(&self, header: &str) -> Option<Field> {
        self.map.get(&alias_key(header)).copied()
    }
}

/// Hourly and overtime figures derived from base pay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRates {
    pub hourly_rate: f64,
    pub overtime_rate: f64,
    pub overtime_hours: f64,
}

/// `hourly = base / (weekly hours × weeks per month)`,
/// `overtime rate = hourly × multiplier`, `overtime hours = overtime pay / overtime rate`.
pub fn derive_rates(
    base_salary: i64,
    overtime_pay: i64,
    work_hours: f64,
    settings: &NormalizeConfig,
) -> DerivedRates {
    let monthly_hours = work_hours * settings.weeks_per_month;
    let hourly_rate = if monthly_hours > 0.0 {
        base_salary as f64 / monthly_hours
    } else {
        0.0
    };
    let overtime_rate = hourly_rate * settings.overtime_multiplier;
    let overtime_hours = if overtime_rate > 0.0 {
        overtime_pay as f64 / overtime_rate
    } else {
        0.0
    };
    DerivedRates {
        hourly_rate,
        overtime_rate,
        overtime_hours,
    }
}

/// Derived total for a record: net pay (general) or direct labor cost (direct).
pub fn derived_total(variant: Variant, r: &PayrollRecord) -> i64 {
    match variant {
        Variant::General => {
            sum_amounts([r.base_salary, r.overtime_pay, r.allowances, r.bonuses])
                .saturating_sub(r.deductions)
        }
        Variant::Direct => sum_amounts([
            r.base_salary,
            r.overtime_pay,
            r.night_shift_pay,
            r.holiday_pay,
            r.skill_allowance,
        ]),
    }
}

fn parse_number(cell: &Cell) -> Option<f64> {
    let v = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        Cell::Empty => return None,
    };
    v.is_finite().then_some(v)
}

/// Non-negative integer amount up to [`MAX_AMOUNT`]; anything unparseable is 0.
pub fn coerce_amount(cell: &Cell) -> i64 {
    match parse_number(cell) {
        Some(v) if v >= MAX_AMOUNT as f64 => MAX_AMOUNT,
        Some(v) if v > 0.0 => v.trunc() as i64,
        _ => 0,
    }
}

fn parse_period_part(cell: &Cell, suffix: char) -> Option<i64> {
    match cell {
        Cell::Text(s) => s
            .trim()
            .trim_end_matches(suffix)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64),
        other => parse_number(other)
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64),
    }
}

/// Spreadsheet day serials count from 1899-12-30.
fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}

fn parse_payment_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) => date_from_serial(*n),
        Cell::Text(s) => {
            let date_part = s.trim().split([' ', 'T']).next().unwrap_or_default();
            ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        }
        Cell::Empty => None,
    }
}

struct RowView<'a> {
    table: &'a RawTable,
    row: usize,
    columns: &'a HashMap<Field, usize>,
}

impl<'a> RowView<'a> {
    fn cell(&self, field: Field) -> &'a Cell {
        static EMPTY: Cell = Cell::Empty;
        match self.columns.get(&field) {
            Some(&col) => self.table.cell(self.row, col),
            None => &EMPTY,
        }
    }

    fn text(&self, field: Field) -> Option<String> {
        let s = self.cell(field).as_display();
        (!s.is_empty()).then_some(s)
    }
}

/// Turns a [`RawTable`] into a validated batch of records for one variant.
#[derive(Debug, Clone)]
pub struct Normalizer {
    variant: Variant,
    aliases: ColumnAliases,
    settings: NormalizeConfig,
}

impl Normalizer {
    pub fn new(variant: Variant, aliases: ColumnAliases, settings: NormalizeConfig) -> Self {
        Self {
            variant,
            aliases,
            settings,
        }
    }

    pub fn from_config(config: &Config, variant: Variant) -> Self {
        Self::new(
            variant,
            ColumnAliases::with_extra(&config.aliases),
            config.normalize.clone(),
        )
    }

    /// Normalize every data row. `today` supplies the period when the input
    /// has no year or month column at all.
    pub fn normalize(&self, table: &RawTable, today: NaiveDate) -> PayrollResult<Vec<PayrollRecord>> {
        let columns = self.map_columns(table);

        let missing: Vec<String> = Field::REQUIRED
            .iter()
            .filter(|f| !columns.contains_key(f))
            .map(|f| f.canonical_name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PayrollError::MissingField(missing));
        }
        if !columns.contains_key(&Field::Department) {
            info!(
                "no department column; defaulting every row to '{}'",
                DEFAULT_DEPARTMENT
            );
        }

        let supplied_total = self.variant == Variant::General
            && columns.get(&Field::Total).is_some_and(|&col| {
                sum_amounts((0..table.rows.len()).map(|row| coerce_amount(table.cell(row, col)))) != 0
            });

        let mut seen: HashSet<(Period, String)> = HashSet::new();
        let mut records = Vec::with_capacity(table.rows.len());

        for row in 0..table.rows.len() {
            let line = row + 2;
            if columns.values().all(|&col| table.cell(row, col).is_empty()) {
                continue;
            }
            let record = self.normalize_row(table, row, line, &columns, supplied_total, today)?;
            let key = (record.period(), record.employee_id.clone());
            if !seen.insert(key) {
                let period = record.period();
                return Err(PayrollError::DuplicateEmployee {
                    employee_id: record.employee_id,
                    period,
                });
            }
            records.push(record);
        }

        info!(
            variant = %self.variant,
            rows = records.len(),
            "normalized payroll rows"
        );
        Ok(records)
    }

    fn map_columns(&self, table: &RawTable) -> HashMap<Field, usize> {
        let mut columns = HashMap::new();
        let mut dropped = Vec::new();
        for (idx, header) in table.headers.iter().enumerate() {
            match self.aliases.resolve(header) {
                Some(field) => {
                    if columns.contains_key(&field) {
                        warn!(
                            header = %header,
                            field = field.canonical_name(),
                            "duplicate column for field, keeping the first"
                        );
                    } else {
                        columns.insert(field, idx);
                    }
                }
                None if header.trim().is_empty() => {}
                None => dropped.push(header.as_str()),
            }
        }
        if !dropped.is_empty() {
            debug!(columns = ?dropped, "dropping unrecognized columns");
        }
        columns
    }

    fn normalize_row(
        &self,
        table: &RawTable,
        row: usize,
        line: usize,
        columns: &HashMap<Field, usize>,
        supplied_total: bool,
        today: NaiveDate,
    ) -> PayrollResult<PayrollRecord> {
        let view = RowView {
            table,
            row,
            columns,
        };
        let cell = |field: Field| view.cell(field);
        let text = |field: Field| view.text(field);
        let amount = |field: Field| coerce_amount(view.cell(field));
        let invalid = |reason: String| PayrollError::InvalidRow { row: line, reason };

        let employee_id = text(Field::EmployeeId)
            .ok_or_else(|| invalid("employee_id is empty".to_string()))?;
        let employee_name = text(Field::EmployeeName)
            .ok_or_else(|| invalid(format!("employee_name is empty for '{}'", employee_id)))?;

        let year = if columns.contains_key(&Field::Year) {
            parse_period_part(cell(Field::Year), '년')
                .ok_or_else(|| invalid("missing or invalid year".to_string()))?
        } else {
            today.year() as i64
        };
        let month = if columns.contains_key(&Field::Month) {
            parse_period_part(cell(Field::Month), '월')
                .ok_or_else(|| invalid("missing or invalid month".to_string()))?
        } else {
            today.month() as i64
        };
        let period = i32::try_from(year)
            .ok()
            .zip(u32::try_from(month).ok())
            .and_then(|(y, m)| Period::new(y, m))
            .ok_or_else(|| invalid(format!("period {}-{} is out of range", year, month)))?;

        let department = text(Field::Department).unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string());
        let work_hours = parse_number(cell(Field::WorkHours))
            .filter(|h| *h > 0.0)
            .unwrap_or(self.settings.default_work_hours);
        let productivity_score = parse_number(cell(Field::ProductivityScore))
            .filter(|p| *p >= 0.0)
            .unwrap_or(self.settings.default_productivity);

        let base_salary = amount(Field::BaseSalary);
        let overtime_pay = amount(Field::OvertimePay);
        let rates = derive_rates(base_salary, overtime_pay, work_hours, &self.settings);

        let mut record = PayrollRecord {
            employee_id,
            employee_name,
            position: text(Field::Position).unwrap_or_else(|| DEFAULT_POSITION.to_string()),
            work_type: text(Field::WorkType).unwrap_or_else(|| DEFAULT_WORK_TYPE.to_string()),
            cost_center: text(Field::CostCenter).unwrap_or_else(|| department.clone()),
            project_code: text(Field::ProjectCode)
                .unwrap_or_else(|| DEFAULT_PROJECT_CODE.to_string()),
            department,
            base_salary,
            overtime_pay,
            allowances: amount(Field::Allowances),
            bonuses: amount(Field::Bonuses),
            deductions: amount(Field::Deductions),
            night_shift_pay: amount(Field::NightShiftPay),
            holiday_pay: amount(Field::HolidayPay),
            skill_allowance: amount(Field::SkillAllowance),
            total: 0,
            work_hours,
            overtime_hours: rates.overtime_hours,
            hourly_rate: rates.hourly_rate,
            overtime_rate: rates.overtime_rate,
            productivity_score,
            payment_date: parse_payment_date(cell(Field::PaymentDate))
                .unwrap_or_else(|| period.payment_date(self.settings.payment_day)),
            year: period.year,
            month: period.month,
        };

        record.total = if supplied_total {
            amount(Field::Total)
        } else {
            derived_total(self.variant, &record)
        };

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Cell::text(*c)).collect())
                .collect(),
        )
    }

    fn normalizer(variant: Variant) -> Normalizer {
        Normalizer::new(variant, ColumnAliases::default(), NormalizeConfig::default())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn general_total_subtracts_deductions() {
        let t = table(
            &["사번", "성명", "부서", "기본급", "연장근무수당", "제수당", "상여금", "공제액", "년도", "월"],
            &[&["E001", "Kim", "Dev", "3000000", "200000", "100000", "500000", "400000", "2025", "1"]],
        );
        let records = normalizer(Variant::General).normalize(&t, today()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total, 3_400_000);
        assert_eq!(records[0].period(), Period::new(2025, 1).unwrap());
        assert_eq!(records[0].payment_date.to_string(), "2025-01-25");
    }

    #[test]
    fn direct_rates_follow_base_pay() {
        let t = table(
            &["employee_id", "employee_name", "department", "base_salary", "overtime_pay", "night_shift_pay"],
            &[&["E001", "Lee", "Production", "4330000", "375000", "100000"]],
        );
        let r = &normalizer(Variant::Direct).normalize(&t, today()).unwrap()[0];
        assert!((r.hourly_rate - 25_000.0).abs() < 1e-6);
        assert!((r.overtime_rate - 37_500.0).abs() < 1e-6);
        assert!((r.overtime_hours - 10.0).abs() < 1e-9);
        assert_eq!(r.work_hours, 40.0);
        assert_eq!(r.productivity_score, 100.0);
        assert_eq!(r.total, 4_330_000 + 375_000 + 100_000);
    }

    #[test]
    fn direct_total_ignores_deductions_and_supplied_total() {
        let t = table(
            &["사번", "성명", "부서", "기본급", "공제액", "실지급액"],
            &[&["E001", "Park", "QA", "1000000", "300000", "1"]],
        );
        let r = &normalizer(Variant::Direct).normalize(&t, today()).unwrap()[0];
        assert_eq!(r.total, 1_000_000);
    }

    #[test]
    fn general_keeps_supplied_net_pay_unless_all_zero() {
        let t = table(
            &["사번", "성명", "부서", "기본급", "실지급액"],
            &[&["E001", "Park", "QA", "1000000", "900000"]],
        );
        let r = &normalizer(Variant::General).normalize(&t, today()).unwrap()[0];
        assert_eq!(r.total, 900_000);

        let zero = table(
            &["사번", "성명", "부서", "기본급", "실지급액"],
            &[&["E001", "Park", "QA", "1000000", "0"]],
        );
        let r = &normalizer(Variant::General).normalize(&zero, today()).unwrap()[0];
        assert_eq!(r.total, 1_000_000);
    }

    #[test]
    fn missing_department_defaults_to_unclassified() {
        let t = table(&["사번", "성명", "기본급"], &[&["E001", "Choi", "2500000"]]);
        let r = &normalizer(Variant::General).normalize(&t, today()).unwrap()[0];
        assert_eq!(r.department, DEFAULT_DEPARTMENT);
        assert_eq!(r.cost_center, DEFAULT_DEPARTMENT);
        assert_eq!(r.position, DEFAULT_POSITION);
    }

    #[test]
    fn missing_base_salary_is_rejected() {
        let t = table(&["사번", "성명", "부서"], &[&["E001", "Choi", "Dev"]]);
        let err = normalizer(Variant::General).normalize(&t, today()).unwrap_err();
        match err {
            PayrollError::MissingField(fields) => assert_eq!(fields, vec!["base_salary"]),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn bad_numbers_coerce_to_zero() {
        let t = table(
            &["사번", "성명", "기본급", "연장근무수당", "상여금"],
            &[&["E001", "Jung", "1,200,000", "n/a", "-500"]],
        );
        let r = &normalizer(Variant::General).normalize(&t, today()).unwrap()[0];
        assert_eq!(r.base_salary, 1_200_000);
        assert_eq!(r.overtime_pay, 0);
        assert_eq!(r.bonuses, 0);
        assert_eq!(r.overtime_hours, 0.0);
    }

    #[test]
    fn absent_period_columns_use_today() {
        let t = table(&["사번", "성명", "기본급"], &[&["E001", "Jung", "1000"]]);
        let r = &normalizer(Variant::General).normalize(&t, today()).unwrap()[0];
        assert_eq!((r.year, r.month), (2025, 3));
        assert_eq!(r.payment_date.to_string(), "2025-03-25");
    }

    #[test]
    fn present_period_column_does_not_default_per_row() {
        let t = table(
            &["사번", "성명", "기본급", "년도", "월"],
            &[&["E001", "A", "1000", "2024", "12"], &["E002", "B", "1000", "2024", ""]],
        );
        let err = normalizer(Variant::General).normalize(&t, today()).unwrap_err();
        assert!(matches!(err, PayrollError::InvalidRow { row: 3, .. }));
    }

    #[test]
    fn huge_amounts_are_clamped_not_overflowed() {
        let t = table(
            &["사번", "성명", "기본급", "연장근무수당", "제수당", "상여금"],
            &[&["E001", "Kim", "1e19", "5", "9223372036854775807", "1e300"]],
        );
        let r = &normalizer(Variant::General).normalize(&t, today()).unwrap()[0];
        assert_eq!(r.base_salary, MAX_AMOUNT);
        assert_eq!(r.allowances, MAX_AMOUNT);
        assert_eq!(r.total, 3 * MAX_AMOUNT + 5);

        let r = &normalizer(Variant::Direct).normalize(&t, today()).unwrap()[0];
        assert_eq!(r.total, MAX_AMOUNT + 5);
        assert!(r.hourly_rate.is_finite());
    }

    #[test]
    fn derived_total_saturates() {
        let t = table(&["사번", "성명", "기본급"], &[&["E001", "Kim", "1"]]);
        let mut r = normalizer(Variant::Direct).normalize(&t, today()).unwrap().remove(0);
        r.base_salary = i64::MAX;
        r.overtime_pay = 1;
        assert_eq!(derived_total(Variant::Direct, &r), i64::MAX);
        r.deductions = i64::MAX;
        r.base_salary = 0;
        r.overtime_pay = 0;
        r.allowances = 0;
        r.bonuses = 0;
        assert_eq!(derived_total(Variant::General, &r), -i64::MAX);
    }

    #[test]
    fn duplicate_employee_in_period_is_rejected() {
        let t = table(
            &["사번", "성명", "기본급"],
            &[&["E001", "A", "1000"], &["E001", "A again", "2000"]],
        );
        match normalizer(Variant::General).normalize(&t, today()).unwrap_err() {
            PayrollError::DuplicateEmployee { employee_id, period } => {
                assert_eq!(employee_id, "E001");
                assert_eq!(period, Period::new(2025, 3).unwrap());
            }
            other => panic!("expected DuplicateEmployee, got {other:?}"),
        }
    }

    #[test]
    fn blank_rows_are_skipped_but_blank_ids_are_not() {
        let t = table(
            &["사번", "성명", "기본급"],
            &[&["E001", "A", "1000"], &["", "", ""], &["", "Ghost", "5"]],
        );
        let err = normalizer(Variant::General).normalize(&t, today()).unwrap_err();
        assert!(matches!(err, PayrollError::InvalidRow { row: 4, .. }));

        let t = table(&["사번", "성명", "기본급"], &[&["E001", "A", "1000"], &["", "", ""]]);
        assert_eq!(normalizer(Variant::General).normalize(&t, today()).unwrap().len(), 1);
    }

    #[test]
    fn payment_date_accepts_text_and_serials() {
        assert_eq!(
            parse_payment_date(&Cell::text("2025/02/10 00:00:00")),
            NaiveDate::from_ymd_opt(2025, 2, 10)
        );
        assert_eq!(
            parse_payment_date(&Cell::Number(45_682.0)),
            NaiveDate::from_ymd_opt(2025, 1, 25)
        );
        assert_eq!(parse_payment_date(&Cell::text("soon")), None);
    }

    #[test]
    fn extra_aliases_extend_the_builtin_table() {
        let mut extra = HashMap::new();
        extra.insert("Emp No".to_string(), "employee_id".to_string());
        extra.insert("Bogus".to_string(), "nonsense".to_string());
        let aliases = ColumnAliases::with_extra(&extra);
        assert_eq!(aliases.resolve("emp no"), Some(Field::EmployeeId));
        assert_eq!(aliases.resolve(" 기본급 "), Some(Field::BaseSalary));
        assert_eq!(aliases.resolve("Employee-ID"), Some(Field::EmployeeId));
        assert_eq!(aliases.resolve("Bogus"), None);
    }

    #[test]
    fn numeric_identifiers_lose_the_fraction() {
        let t = RawTable::new(
            vec!["사번".into(), "성명".into(), "기본급".into()],
            vec![vec![Cell::Number(1001.0), Cell::text("Kim"), Cell::Number(2_000_000.9)]],
        );
        let r = &normalizer(Variant::General).normalize(&t, today()).unwrap()[0];
        assert_eq!(r.employee_id, "1001");
        assert_eq!(r.base_salary, 2_000_000);
    }
}
