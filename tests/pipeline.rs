//! End-to-end pipeline tests against real SQLite files: load, replace,
//! report, and read the report back.

use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use paypulse::analytics::Scope;
use paypulse::config::Config;
use paypulse::error::PayrollError;
use paypulse::manager::LaborCostManager;
use paypulse::models::{Period, Variant};
use paypulse::store::PeriodStore;
use paypulse::tabular::{self, Cell};
use paypulse::xlsx::{self, Sheet};

const GENERAL_JAN: &str = "\
사번,성명,부서,직급,기본급,연장근무수당,제수당,상여금,공제액,년도,월
E001,김철수,개발,대리,3000000,200000,100000,500000,400000,2025,1
E002,이영희,개발,사원,2500000,0,100000,0,300000,2025,1
E003,박민수,영업,과장,3500000,150000,200000,0,450000,2025,1
";

const GENERAL_FEB: &str = "\
사번,성명,부서,직급,기본급,년도,월
E001,김철수,개발,대리,3100000,2025,2
";

fn config_in(tmp: &TempDir) -> Config {
    let mut cfg = Config::default();
    cfg.db.general_path = tmp.path().join("data/general.sqlite");
    cfg.db.direct_path = tmp.path().join("data/direct.sqlite");
    cfg.report.general_output = tmp.path().join("reports/general.xlsx");
    cfg.report.direct_output = tmp.path().join("reports/direct.xlsx");
    cfg
}

fn write(tmp: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = tmp.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn jan() -> Period {
    Period::new(2025, 1).unwrap()
}

#[tokio::test]
async fn reloading_a_period_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let cfg = config_in(&tmp);
    let input = write(&tmp, "jan.csv", GENERAL_JAN);

    let manager = LaborCostManager::open(&cfg, Variant::General).await.unwrap();
    manager.load_file(&input, today()).await.unwrap();
    let first = manager.store().query_period(jan()).await.unwrap();
    manager.load_file(&input, today()).await.unwrap();
    let second = manager.store().query_period(jan()).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    let e001 = first.iter().find(|r| r.employee_id == "E001").unwrap();
    assert_eq!(e001.total, 3_400_000);
    manager.close().await;
}

#[tokio::test]
async fn reloading_one_period_leaves_others_alone() {
    let tmp = TempDir::new().unwrap();
    let cfg = config_in(&tmp);
    let jan_file = write(&tmp, "jan.csv", GENERAL_JAN);
    let feb_file = write(&tmp, "feb.csv", GENERAL_FEB);
    let feb = Period::new(2025, 2).unwrap();

    let manager = LaborCostManager::open(&cfg, Variant::General).await.unwrap();
    manager.load_file(&jan_file, today()).await.unwrap();
    manager.load_file(&feb_file, today()).await.unwrap();
    let feb_before = manager.store().query_period(feb).await.unwrap();

    let smaller_jan = write(
        &tmp,
        "jan2.csv",
        "사번,성명,부서,기본급,년도,월\nE009,최지우,인사,2000000,2025,1\n",
    );
    manager.load_file(&smaller_jan, today()).await.unwrap();

    let jan_rows = manager.store().query_period(jan()).await.unwrap();
    assert_eq!(jan_rows.len(), 1);
    assert_eq!(jan_rows[0].employee_id, "E009");
    assert_eq!(manager.store().query_period(feb).await.unwrap(), feb_before);
    assert_eq!(manager.store().latest_period().await.unwrap(), feb);
    manager.close().await;
}

#[tokio::test]
async fn rejected_input_keeps_stored_period() {
    let tmp = TempDir::new().unwrap();
    let cfg = config_in(&tmp);
    let manager = LaborCostManager::open(&cfg, Variant::General).await.unwrap();
    manager
        .load_file(&write(&tmp, "jan.csv", GENERAL_JAN), today())
        .await
        .unwrap();

    let no_salary = write(&tmp, "bad.csv", "사번,성명,부서,년도,월\nE001,김철수,개발,2025,1\n");
    let err = manager.load_file(&no_salary, today()).await.unwrap_err();
    assert!(matches!(err, PayrollError::MissingField(_)));

    let missing = manager
        .load_file(&tmp.path().join("absent.xlsx"), today())
        .await
        .unwrap_err();
    assert!(matches!(missing, PayrollError::InputNotFound(_)));

    // A duplicate key at the storage layer rolls back the whole replace.
    let mut dup = manager.store().query_period(jan()).await.unwrap();
    dup.push(dup[0].clone());
    assert!(matches!(
        manager.store().replace_period(&dup).await,
        Err(PayrollError::StorageWrite { .. })
    ));

    assert_eq!(manager.store().query_period(jan()).await.unwrap().len(), 3);
    manager.close().await;
}

#[tokio::test]
async fn xlsx_input_loads_like_csv() {
    let tmp = TempDir::new().unwrap();
    let cfg = config_in(&tmp);
    let input = tmp.path().join("direct.xlsx");

    let headers: Vec<String> = ["사번", "성명", "부서", "기본급", "연장근무수당", "야근수당", "년도", "월"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = vec![vec![
        Cell::from("P001"),
        Cell::from("정대호"),
        Cell::from("생산1팀"),
        Cell::from(4_330_000_i64),
        Cell::from(375_000_i64),
        Cell::from(100_000_i64),
        Cell::from(2025_i64),
        Cell::from(1_i64),
    ]];
    xlsx::write_workbook_file(
        &input,
        &[Sheet {
            name: "Sheet1",
            headers: &headers,
            rows: &rows,
        }],
    )
    .unwrap();

    let manager = LaborCostManager::open(&cfg, Variant::Direct).await.unwrap();
    let summary = manager.load_file(&input, today()).await.unwrap();
    assert_eq!(summary.periods, vec![(jan(), 1)]);

    let r = &manager.store().query_period(jan()).await.unwrap()[0];
    assert!((r.hourly_rate - 25_000.0).abs() < 1e-6);
    assert!((r.overtime_hours - 10.0).abs() < 1e-9);
    assert_eq!(r.total, 4_805_000);
    assert_eq!(r.department, "생산1팀");
    manager.close().await;
}

#[tokio::test]
async fn exported_report_reads_back() {
    let tmp = TempDir::new().unwrap();
    let cfg = config_in(&tmp);
    let manager = LaborCostManager::open(&cfg, Variant::General).await.unwrap();
    manager
        .load_file(&write(&tmp, "jan.csv", GENERAL_JAN), today())
        .await
        .unwrap();

    let output = cfg.report.general_output.clone();
    let bundle = manager
        .export_report(Scope::Latest, &output)
        .await
        .unwrap()
        .expect("report should be written");
    manager.close().await;

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(
        xlsx::sheet_names(&bytes).unwrap(),
        bundle.section_names()
    );

    let first = tabular::read_table(Path::new(&output)).unwrap();
    let dept = bundle.section("Department Summary").unwrap();
    assert_eq!(first.headers, dept.table.columns);
    assert_eq!(first.rows.len(), 2);
    assert_eq!(first.cell(0, 0), &Cell::Text("개발".to_string()));
}

#[tokio::test]
async fn empty_ledger_writes_no_report() {
    let tmp = TempDir::new().unwrap();
    let cfg = config_in(&tmp);
    let manager = LaborCostManager::open(&cfg, Variant::Direct).await.unwrap();
    let output = cfg.report.direct_output.clone();

    assert!(manager.build_report(Scope::Latest).await.is_empty());
    assert!(manager
        .export_report(Scope::Latest, &output)
        .await
        .unwrap()
        .is_none());
    assert!(!output.exists());
    manager.close().await;
}
