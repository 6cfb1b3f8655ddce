//! Core data models shared by the normalizer, the stores, and analytics.
//!
//! A [`PayrollRecord`] is one employee's pay for one [`Period`]. Records are
//! produced in bulk by the normalizer and are immutable once stored.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

/// Which of the two payroll datasets a manager operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Net payroll cost: earnings minus deductions.
    General,
    /// Direct labor cost: hour-linked earnings only, plus overtime and
    /// productivity metrics.
    Direct,
}

impl Variant {
    pub fn table(self) -> &'static str {
        match self {
            Variant::General => "payroll",
            Variant::Direct => "direct_labor",
        }
    }

    /// Column holding the derived total for this variant.
    pub fn total_column(self) -> &'static str {
        match self {
            Variant::General => "net_salary",
            Variant::Direct => "direct_total",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::General => "general",
            Variant::Direct => "direct",
        }
    }

    pub fn all() -> [Variant; 2] {
        [Variant::General, Variant::Direct]
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "total" | "payroll" => Ok(Variant::General),
            "direct" | "direct-labor" | "direct_labor" => Ok(Variant::Direct),
            other => Err(format!(
                "unknown variant '{}'. Must be general or direct.",
                other
            )),
        }
    }
}

/// A `(year, month)` pair. Ordering is lexicographic, so the maximum period
/// in a store is its latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (1900..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Payment date on `day` of this period, clamped to the month's length.
    pub fn payment_date(self, day: u32) -> NaiveDate {
        (1..=day.max(1))
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(self.year, self.month, d))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = String;

    /// Parses `YYYY-MM` (also `YYYY/MM` and `YYYY.MM`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (y, m) = s
            .split_once(['-', '/', '.'])
            .ok_or_else(|| format!("invalid period '{}': expected YYYY-MM", s))?;
        let year: i32 = y
            .parse()
            .map_err(|_| format!("invalid year in period '{}'", s))?;
        let month: u32 = m
            .parse()
            .map_err(|_| format!("invalid month in period '{}'", s))?;
        Period::new(year, month).ok_or_else(|| format!("period out of range: '{}'", s))
    }
}

/// Sum of amounts, clamped to the `i64` range instead of overflowing.
pub fn sum_amounts(amounts: impl IntoIterator<Item = i64>) -> i64 {
    amounts.into_iter().fold(0, i64::saturating_add)
}

/// One employee's normalized pay for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayrollRecord {
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub position: String,
    pub work_type: String,
    pub base_salary: i64,
    pub overtime_pay: i64,
    pub allowances: i64,
    pub bonuses: i64,
    pub deductions: i64,
    pub night_shift_pay: i64,
    pub holiday_pay: i64,
    pub skill_allowance: i64,
    /// `net_salary` (general) or `direct_total` (direct).
    pub total: i64,
    pub work_hours: f64,
    pub overtime_hours: f64,
    pub hourly_rate: f64,
    pub overtime_rate: f64,
    pub productivity_score: f64,
    pub cost_center: String,
    pub project_code: String,
    pub payment_date: NaiveDate,
    pub year: i32,
    pub month: u32,
}

impl PayrollRecord {
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.work_hours + self.overtime_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_ordering_is_year_then_month() {
        let dec = Period::new(2024, 12).unwrap();
        let jan = Period::new(2025, 1).unwrap();
        let feb = Period::new(2025, 2).unwrap();
        assert!(dec < jan && jan < feb);
        assert_eq!([feb, dec, jan].into_iter().max(), Some(feb));
    }

    #[test]
    fn period_parses_common_separators() {
        assert_eq!("2025-01".parse::<Period>().unwrap(), Period::new(2025, 1).unwrap());
        assert_eq!("2025/3".parse::<Period>().unwrap(), Period::new(2025, 3).unwrap());
        assert!("2025-13".parse::<Period>().is_err());
        assert!("202501".parse::<Period>().is_err());
    }

    #[test]
    fn payment_date_clamps_to_month_end() {
        let feb = Period::new(2025, 2).unwrap();
        assert_eq!(feb.payment_date(25).to_string(), "2025-02-25");
        assert_eq!(feb.payment_date(31).to_string(), "2025-02-28");
    }

    #[test]
    fn variant_parses_aliases() {
        assert_eq!("direct".parse::<Variant>().unwrap(), Variant::Direct);
        assert_eq!("General".parse::<Variant>().unwrap(), Variant::General);
        assert!("indirect".parse::<Variant>().is_err());
        assert_eq!(Variant::Direct.total_column(), "direct_total");
    }
}
