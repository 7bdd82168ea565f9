//! WebAssembly module for the lot lineage engine
//!
//! Provides client-side computation for:
//! - Merging batch rows into virtual batches
//! - Unit expansion for label printing
//! - Discard, resize and delete allocation plans
//!
//! Every function takes and returns JSON so the host can pass its rows as-is.

use lot_lineage::{
    build_forest, expand_units, format_unit_label, merge_virtual_batches_with, plan_delete,
    plan_discard, plan_resize, validate_policy, Amount, BatchRecord, GroupingPolicy, UnresolvedParent,
    VirtualBatch,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use lot_lineage::models::*;

/// Virtual batches plus the rows whose parents were not in the snapshot
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub batches: Vec<VirtualBatch>,
    pub unresolved: Vec<UnresolvedParent>,
}

#[cfg(target_arch = "wasm32")]
fn warn_unresolved(unresolved: &[UnresolvedParent]) {
    if !unresolved.is_empty() {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "{} batches reference parents outside this snapshot",
            unresolved.len()
        )));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn warn_unresolved(_unresolved: &[UnresolvedParent]) {}

fn to_js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

fn parse_batch(batch_json: &str) -> Result<VirtualBatch, String> {
    serde_json::from_str(batch_json).map_err(|e| format!("Invalid virtual batch JSON: {}", e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn build(records_json: &str, policy_json: Option<&str>) -> Result<BuildResult, String> {
    let records: Vec<BatchRecord> = serde_json::from_str(records_json)
        .map_err(|e| format!("Invalid batch records JSON: {}", e))?;
    let policy: GroupingPolicy = match policy_json {
        Some(json) => {
            serde_json::from_str(json).map_err(|e| format!("Invalid policy JSON: {}", e))?
        }
        None => GroupingPolicy::default(),
    };
    validate_policy(&policy).map_err(|e| format!("Invalid policy: {}", e))?;

    let forest = build_forest(&records).map_err(|e| e.to_string())?;
    Ok(BuildResult {
        batches: merge_virtual_batches_with(&forest.roots, &policy),
        unresolved: forest.unresolved,
    })
}

fn discard_plan(batch_json: &str, amount: f64) -> Result<String, String> {
    let batch = parse_batch(batch_json)?;
    let Amount(amount) =
        Amount::try_from_f64(amount, batch.total_quantity).map_err(|e| e.to_string())?;
    let plan = plan_discard(&batch, amount).map_err(|e| e.to_string())?;
    to_json(&plan)
}

fn resize_plan(batch_json: &str, new_total: f64) -> Result<String, String> {
    let batch = parse_batch(batch_json)?;
    let Amount(new_total) =
        Amount::try_from_f64(new_total, batch.total_quantity).map_err(|e| e.to_string())?;
    let plan = plan_resize(&batch, new_total).map_err(|e| e.to_string())?;
    to_json(&plan)
}

fn next_name(names_json: &str, genetic_name: &str) -> Result<String, String> {
    let names: Vec<String> = serde_json::from_str(names_json)
        .map_err(|e| format!("Invalid names JSON: {}", e))?;
    Ok(lot_lineage::next_batch_name(
        names.iter().map(String::as_str),
        genetic_name,
    ))
}

/// Merge batch rows into virtual batches
#[wasm_bindgen]
pub fn build_virtual_batches(
    records_json: &str,
    policy_json: Option<String>,
) -> Result<String, JsValue> {
    let result = build(records_json, policy_json.as_deref()).map_err(to_js_error)?;

    warn_unresolved(&result.unresolved);
    to_json(&result).map_err(to_js_error)
}

/// Expand a virtual batch into its addressable units
#[wasm_bindgen]
pub fn expand_batch_units(batch_json: &str) -> Result<String, JsValue> {
    let batch = parse_batch(batch_json).map_err(to_js_error)?;
    to_json(&expand_units(&batch)).map_err(to_js_error)
}

/// Plan a discard of `amount` units
#[wasm_bindgen]
pub fn plan_batch_discard(batch_json: &str, amount: f64) -> Result<String, JsValue> {
    discard_plan(batch_json, amount).map_err(to_js_error)
}

/// Plan bringing a virtual batch to `new_total` units
#[wasm_bindgen]
pub fn plan_batch_resize(batch_json: &str, new_total: f64) -> Result<String, JsValue> {
    resize_plan(batch_json, new_total).map_err(to_js_error)
}

/// Plan deleting every row of a virtual batch
#[wasm_bindgen]
pub fn plan_batch_delete(batch_json: &str) -> Result<String, JsValue> {
    let batch = parse_batch(batch_json).map_err(to_js_error)?;
    to_json(&plan_delete(&batch)).map_err(to_js_error)
}

/// Label for one unit of a row
#[wasm_bindgen]
pub fn batch_unit_label(name: &str, quantity: u32, index_in_batch: u32) -> String {
    format_unit_label(name, quantity as u64, index_in_batch as u64)
}

/// Next free batch name for a genetic line
#[wasm_bindgen]
pub fn next_batch_name(names_json: &str, genetic_name: &str) -> Result<String, JsValue> {
    next_name(names_json, genetic_name).map_err(to_js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS: &str = r#"[
        {"id": "00000000-0000-0000-0000-000000000001", "name": "AAA-0001", "quantity": 5,
         "geneticId": "00000000-0000-0000-0000-0000000000a1",
         "locationId": "00000000-0000-0000-0000-0000000000b1",
         "createdAt": "2024-01-10T09:00:00Z"},
        {"id": "00000000-0000-0000-0000-000000000002", "name": "AAA-0002", "quantity": 3,
         "geneticId": "00000000-0000-0000-0000-0000000000a1",
         "locationId": "00000000-0000-0000-0000-0000000000b1",
         "createdAt": "2024-01-10T15:00:00Z"},
        {"id": "00000000-0000-0000-0000-000000000003", "name": "AAA-0003", "quantity": 1,
         "parentBatchId": "00000000-0000-0000-0000-0000000000ff",
         "createdAt": "2024-01-12T09:00:00Z"}
    ]"#;

    fn merged_batch_json() -> String {
        let result = build(RECORDS, None).unwrap();
        let batch = result
            .batches
            .into_iter()
            .find(|b| b.primary.name == "AAA-0001")
            .unwrap();
        serde_json::to_string(&batch).unwrap()
    }

    #[test]
    fn test_build_reports_unresolved() {
        let result = build(RECORDS, None).unwrap();
        assert_eq!(result.batches.len(), 2);
        assert_eq!(result.unresolved.len(), 1);
    }

    #[test]
    fn test_build_with_policy() {
        let result = build(RECORDS, Some(r#"{"utcOffsetMinutes": -600}"#)).unwrap();
        // 09:00 and 15:00 UTC fall on different days at UTC-10
        assert_eq!(result.batches.len(), 3);
    }

    #[test]
    fn test_build_rejects_out_of_range_offset() {
        let err = build(RECORDS, Some(r#"{"utcOffsetMinutes": 2147483647}"#))
            .err()
            .unwrap();
        assert!(err.contains("UTC offset"));
    }

    #[test]
    fn test_build_rejects_bad_json() {
        assert!(build("not json", None).is_err());
    }

    #[test]
    fn test_discard_plan_json() {
        let plan: serde_json::Value =
            serde_json::from_str(&discard_plan(&merged_batch_json(), 6.0).unwrap()).unwrap();
        assert_eq!(plan["kind"], "discard");
        assert_eq!(plan["entries"][0]["newQuantity"], 0);
        assert_eq!(plan["entries"][0]["becameExhausted"], true);
        assert_eq!(plan["entries"][1]["newQuantity"], 2);
    }

    #[test]
    fn test_discard_rejects_bad_amounts() {
        let batch = merged_batch_json();
        assert!(discard_plan(&batch, 0.0).is_err());
        assert!(discard_plan(&batch, -1.0).is_err());
        assert!(discard_plan(&batch, 2.5).is_err());
        assert!(discard_plan(&batch, 9.0).is_err());
    }

    #[test]
    fn test_resize_plan_json() {
        let plan: serde_json::Value =
            serde_json::from_str(&resize_plan(&merged_batch_json(), 10.0).unwrap()).unwrap();
        assert_eq!(plan["entries"].as_array().unwrap().len(), 1);
        assert_eq!(plan["entries"][0]["newQuantity"], 7);
    }

    #[test]
    fn test_unit_label() {
        assert_eq!(batch_unit_label("AAA-0001", 5, 3), "AAA-0001 - U#003");
        assert_eq!(batch_unit_label("AAA-0001", 1, 1), "AAA-0001");
    }

    #[test]
    fn test_next_name() {
        assert_eq!(
            next_name(r#"["AAA-0001", "AAA-0004"]"#, "aardvark").unwrap(),
            "AAR-0001"
        );
        assert_eq!(next_name(r#"["BLU-0009"]"#, "Blue").unwrap(), "BLU-0010");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_units_round_trip_through_bindings() {
        let result = build(tests_records(), None).unwrap();
        let batch = serde_json::to_string(&result.batches[0]).unwrap();
        let units = expand_batch_units(&batch).unwrap();
        assert!(units.starts_with('['));
    }

    #[wasm_bindgen_test]
    fn test_invalid_amount_is_js_error() {
        let result = build(tests_records(), None).unwrap();
        let batch = serde_json::to_string(&result.batches[0]).unwrap();
        assert!(plan_batch_discard(&batch, 0.0).is_err());
    }

    fn tests_records() -> &'static str {
        r#"[{"id": "00000000-0000-0000-0000-000000000001", "name": "AAA-0001",
             "quantity": 2, "createdAt": "2024-01-10T09:00:00Z"}]"#
    }
}
