//! Client dataset lookup for decision consumers.
//!
//! Records are kept in memory and reduced to the dashboard feature set,
//! in dashboard order.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Features shown and scored by the dashboard, in request order.
pub const IMPORTANT_FEATURES: [&str; 20] = [
    "EXT_SOURCES_MAX",
    "HOUR_APPR_PROCESS_START",
    "EXT_SOURCES_MIN",
    "BURO_AMT_CREDIT_MAX_OVERDUE_MEAN",
    "CREDIT_TO_GOODS_RATIO",
    "INS_D365INS_IS_DPD_UNDER_120_MEAN",
    "POS_CNT_INSTALMENT_MIN",
    "PREV_HOUR_APPR_PROCESS_START_MAX",
    "INSTAL_INS_IS_DPD_UNDER_120_MEAN",
    "PREV_DAYS_TERMINATION_MAX",
    "PREV_APP_CREDIT_PERC_MAX",
    "PREV_DAYS_LAST_DUE_DIFF_MEAN",
    "INSTAL_LATE_PAYMENT_MEAN",
    "INS_D365DPD_DIFF_MAX",
    "INCOME_TO_EMPLOYED_RATIO",
    "EXT_SOURCE_2",
    "REGION_POPULATION_RELATIVE",
    "PREV_SIMPLE_INTERESTS_MEAN",
    "PAYMENT_RATE",
    "DAYS_EMPLOYED",
];

/// Supplies the feature vector of a selected entity
pub trait FeatureProvider {
    fn features(&self, entity_id: &str) -> Option<Vec<f64>>;
}

impl<F> FeatureProvider for F
where
    F: Fn(&str) -> Option<Vec<f64>>,
{
    fn features(&self, entity_id: &str) -> Option<Vec<f64>> {
        self(entity_id)
    }
}

/// In-memory client table keyed by an id column
#[derive(Debug, Default)]
pub struct ClientDataset {
    ids: Vec<String>,
    rows: HashMap<String, Vec<f64>>,
}

impl ClientDataset {
    /// Build from JSON records, selecting `columns` in order.
    ///
    /// Missing or null cells become NaN; a missing id is an error.
    pub fn from_records(
        records: Vec<Map<String, Value>>,
        id_column: &str,
        columns: &[&str],
    ) -> Result<Self> {
        let mut dataset = Self::default();

        for (row, record) in records.iter().enumerate() {
            let id = record
                .get(id_column)
                .and_then(id_to_string)
                .with_context(|| format!("Record {row} has no '{id_column}' value"))?;

            let features = columns
                .iter()
                .map(|column| {
                    record
                        .get(*column)
                        .and_then(Value::as_f64)
                        .unwrap_or(f64::NAN)
                })
                .collect();

            if dataset.rows.insert(id.clone(), features).is_none() {
                dataset.ids.push(id);
            }
        }

        Ok(dataset)
    }

    /// Load a JSON array of records from disk
    pub fn load_json<P: AsRef<Path>>(path: P, id_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        let records: Vec<Map<String, Value>> = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse dataset {}", path.display()))?;

        let dataset = Self::from_records(records, id_column, &IMPORTANT_FEATURES)?;
        info!(path = %path.display(), clients = dataset.len(), "Client dataset loaded");
        Ok(dataset)
    }

    /// Client ids in file order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FeatureProvider for ClientDataset {
    fn features(&self, entity_id: &str) -> Option<Vec<f64>> {
        self.rows.get(entity_id).cloned()
    }
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(values).unwrap()
    }

    #[test]
    fn test_select_columns_in_order() {
        let dataset = ClientDataset::from_records(
            records(json!([
                {"SK_ID_CURR": 100002, "B": 2.0, "A": 1.0, "C": 9.0},
                {"SK_ID_CURR": 100003, "A": 3.0, "B": null}
            ])),
            "SK_ID_CURR",
            &["A", "B"],
        )
        .unwrap();

        assert_eq!(dataset.ids(), &["100002".to_string(), "100003".to_string()]);
        assert_eq!(dataset.features("100002"), Some(vec![1.0, 2.0]));

        let second = dataset.features("100003").unwrap();
        assert_eq!(second[0], 3.0);
        assert!(second[1].is_nan());
        assert_eq!(dataset.features("999"), None);
    }

    #[test]
    fn test_missing_id_is_error() {
        let err = ClientDataset::from_records(records(json!([{"A": 1.0}])), "SK_ID_CURR", &["A"])
            .unwrap_err();
        assert!(err.to_string().contains("SK_ID_CURR"));
    }

    #[test]
    fn test_closure_provider() {
        let provider = |id: &str| (id == "a").then(|| vec![1.0]);
        assert_eq!(provider.features("a"), Some(vec![1.0]));
        assert_eq!(provider.features("b"), None);
    }
}
