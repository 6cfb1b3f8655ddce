//! In-memory [`PeriodStore`] for tests and dry runs.
//!
//! Periods live in a `BTreeMap` behind a single `RwLock`, so a replace is
//! one write-guarded swap and readers never see a half-replaced period.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{PayrollError, PayrollResult};
use crate::models::{sum_amounts, PayrollRecord, Period};

use super::{batch_period, sort_records, PeriodCount, PeriodStore};

#[derive(Default)]
pub struct InMemoryStore {
    periods: RwLock<BTreeMap<Period, Vec<PayrollRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PeriodStore for InMemoryStore {
    async fn replace_period(&self, records: &[PayrollRecord]) -> PayrollResult<usize> {
        let Some(period) = batch_period(records)? else {
            return Ok(0);
        };

        // Same uniqueness rule as the SQL table.
        let mut ids = HashSet::new();
        if let Some(dup) = records.iter().find(|r| !ids.insert(r.employee_id.as_str())) {
            return Err(PayrollError::DuplicateEmployee {
                employee_id: dup.employee_id.clone(),
                period,
            });
        }

        let mut batch = records.to_vec();
        sort_records(&mut batch);
        self.periods.write().await.insert(period, batch);
        Ok(records.len())
    }

    async fn latest_period(&self) -> PayrollResult<Period> {
        self.periods
            .read()
            .await
            .keys()
            .next_back()
            .copied()
            .ok_or(PayrollError::EmptyStore)
    }

    async fn query_period(&self, period: Period) -> PayrollResult<Vec<PayrollRecord>> {
        Ok(self
            .periods
            .read()
            .await
            .get(&period)
            .cloned()
            .unwrap_or_default())
    }

    async fn period_counts(&self) -> PayrollResult<Vec<PeriodCount>> {
        Ok(self
            .periods
            .read()
            .await
            .iter()
            .map(|(period, records)| PeriodCount {
                period: *period,
                records: records.len(),
                total: sum_amounts(records.iter().map(|r| r.total)),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::record;
    use super::*;

    #[tokio::test]
    async fn duplicate_ids_leave_prior_period_intact() {
        let store = InMemoryStore::new();
        let jan = Period::new(2025, 1).unwrap();
        store
            .replace_period(&[record("E1", "Dev", 2025, 1, 10)])
            .await
            .unwrap();

        let dup = [record("E2", "Dev", 2025, 1, 20), record("E2", "Ops", 2025, 1, 30)];
        match store.replace_period(&dup).await {
            Err(PayrollError::DuplicateEmployee { employee_id, period }) => {
                assert_eq!(employee_id, "E2");
                assert_eq!(period, jan);
            }
            other => panic!("expected DuplicateEmployee, got {other:?}"),
        }

        let rows = store.query_period(jan).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, "E1");
    }

    #[tokio::test]
    async fn latest_is_lexicographic_maximum() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.latest_period().await,
            Err(PayrollError::EmptyStore)
        ));
        store
            .replace_period(&[record("E1", "Dev", 2025, 1, 10)])
            .await
            .unwrap();
        store
            .replace_period(&[record("E1", "Dev", 2024, 12, 10)])
            .await
            .unwrap();
        assert_eq!(store.latest_period().await.unwrap(), Period::new(2025, 1).unwrap());

        let counts = store.period_counts().await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].period, Period::new(2024, 12).unwrap());
        assert_eq!(counts[1].total, 10);
    }
}
