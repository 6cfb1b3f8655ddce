//! # PayPulse
//!
//! A labor-cost ledger: monthly payroll spreadsheets go in, period-scoped
//! records are persisted to SQLite, and department, position, trend, overtime
//! and efficiency analytics come out as multi-sheet `.xlsx` reports.
//!
//! Two ledgers share one pipeline, selected by [`models::Variant`]:
//! `general` tracks net payroll cost, `direct` tracks direct labor cost with
//! overtime-hour estimation and productivity metrics.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────┐
//! │ .xlsx/.csv │──▶│ Normalizer │──▶│ PeriodStore │
//! │  (tabular) │   │            │   │  (SQLite)   │
//! └────────────┘   └────────────┘   └──────┬──────┘
//!                                          │
//!                        ┌─────────────────┤
//!                        ▼                 ▼
//!                  ┌───────────┐     ┌───────────┐
//!                  │ analytics │────▶│  report   │──▶ .xlsx
//!                  └───────────┘     └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! paypulse init
//! paypulse load ./payroll_2025_01.xlsx
//! paypulse --variant direct load ./direct_2025_01.xlsx
//! paypulse show departments
//! paypulse report --output ./reports/2025-01.xlsx
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Records, periods, variants |
//! | [`error`] | Error taxonomy |
//! | [`tabular`] | Spreadsheet/CSV input |
//! | [`xlsx`] | OOXML reader and writer |
//! | [`normalize`] | Alias resolution, coercion, derived fields |
//! | [`db`] | Database connection |
//! | [`schema`] | Table and index creation |
//! | [`store`] | Period-scoped persistence |
//! | [`analytics`] | Summaries and trends |
//! | [`report`] | Report sections and headline metrics |
//! | [`manager`] | Load/report orchestration |

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod manager;
pub mod models;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod show;
pub mod stats;
pub mod store;
pub mod tabular;
pub mod xlsx;
