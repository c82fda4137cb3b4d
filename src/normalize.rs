//! Response normalization: arbitrary backend payloads into the fixed
//! vehicle-detail schema plus the raw text for the terminal panel.
//!
//! The backend is loose about shape. A run may return the extraction
//! object directly, wrap it under `result.extraction_output` or `data`,
//! or hand back a `message` string with JSON (and a plate number) buried
//! inside pipeline stdout. Everything here is pure and infallible:
//! unrecognized input degrades to raw text with all fields at the
//! sentinel, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Sentinel rendered for any field the payload does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// Indian registration mark: two letters, RTO digits, series letters,
/// number, groups optionally split by a space or hyphen.
static PLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{2}[ -]?[0-9]{1,2}[ -]?[A-Z]{1,3}[ -]?[0-9]{1,4}").unwrap());

/// Fixed display schema, one string per summary row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleDetails {
    pub plate: String,
    pub owner: String,
    pub make_model: String,
    pub fuel: String,
    pub reg_date: String,
    pub insurance_upto: String,
    pub registered_at: String,
    pub status: String,
    /// Only rendered when the payload carries it.
    pub status_as_on: Option<String>,
}

impl Default for VehicleDetails {
    fn default() -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            plate: na(),
            owner: na(),
            make_model: na(),
            fuel: na(),
            reg_date: na(),
            insurance_upto: na(),
            registered_at: na(),
            status: na(),
            status_as_on: None,
        }
    }
}

impl VehicleDetails {
    /// Rows in display order, for the summary table.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Plate Number", self.plate.clone()),
            ("Owner Name", self.owner.clone()),
            ("Make & Model", self.make_model.clone()),
            ("Fuel Type", self.fuel.clone()),
            ("Registration", self.reg_date.clone()),
            ("Insurance Until", self.insurance_upto.clone()),
            ("Registered At", self.registered_at.clone()),
            ("Status", self.status.clone()),
        ];
        if let Some(as_on) = &self.status_as_on {
            rows.push(("Status As On", as_on.clone()));
        }
        rows
    }
}

/// Normalizer output: the schema plus the raw panel text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedResult {
    pub details: VehicleDetails,
    pub raw: String,
}

/// Payload classification, matched in order.
enum Payload<'a> {
    /// Object without a generic `message` field: already the candidate
    /// details container.
    Direct(&'a Map<String, Value>),
    /// A `message` string (or a bare string payload) to display and mine.
    MessageText(String),
    /// Anything else: nothing to display, nothing to mine.
    Opaque,
}

fn classify(payload: &Value) -> Payload<'_> {
    match payload {
        Value::Object(map) if !map.contains_key("message") => Payload::Direct(map),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(msg)) => Payload::MessageText(msg.clone()),
            _ => Payload::Opaque,
        },
        // A bare string reply is treated like a message body.
        Value::String(s) => Payload::MessageText(s.clone()),
        _ => Payload::Opaque,
    }
}

/// Where the field-bearing object actually lives inside a container.
enum Container<'a> {
    /// Container itself carries recognizable vehicle keys.
    Recognized(&'a Map<String, Value>),
    /// Nested under `result.extraction_output`.
    Extraction(&'a Map<String, Value>),
    /// Nested under `data`, which carries recognizable keys.
    Data(&'a Map<String, Value>),
    /// Nothing matched; the container is used unchanged.
    AsIs(&'a Map<String, Value>),
}

impl<'a> Container<'a> {
    fn fields(&self) -> &'a Map<String, Value> {
        match self {
            Container::Recognized(m)
            | Container::Extraction(m)
            | Container::Data(m)
            | Container::AsIs(m) => m,
        }
    }
}

/// Loose truthiness matching the upstream field-fallback behavior:
/// absent, null, false, empty string and zero all count as missing.
fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn has_recognized_keys(map: &Map<String, Value>) -> bool {
    map.get("rc_vehicle_no").is_some_and(truthy) || map.get("rc_version").is_some_and(truthy)
}

/// Resolve the candidate container to the field-bearing object, first
/// match wins.
fn resolve(map: &Map<String, Value>) -> Container<'_> {
    if has_recognized_keys(map) {
        return Container::Recognized(map);
    }
    if let Some(Value::Object(inner)) = map.get("result").and_then(|r| r.get("extraction_output")) {
        return Container::Extraction(inner);
    }
    if let Some(Value::Object(data)) = map.get("data")
        && has_recognized_keys(data)
    {
        return Container::Data(data);
    }
    Container::AsIs(map)
}

/// First truthy value among the given keys, rendered as a string.
fn pick(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| truthy(v))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

/// Find the first top-level-looking JSON object inside free text: from
/// the first `{` to the last `}`. Returns it only when it parses.
fn extract_json_from_message(msg: &str) -> Option<Map<String, Value>> {
    let first = msg.find('{')?;
    let last = msg.rfind('}')?;
    if last < first {
        return None;
    }
    match serde_json::from_str(msg[first..=last].trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Scan free text for a registration mark, separators stripped.
fn extract_plate_from_text(msg: &str) -> Option<String> {
    PLATE_RE
        .find(msg)
        .map(|m| m.as_str().replace([' ', '-'], ""))
}

/// Map the resolved fields onto the fixed schema, one synonym chain per
/// field.
fn map_fields(fields: &Map<String, Value>, plate_from_text: Option<String>) -> VehicleDetails {
    let na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    // Make & model joins the maker description and model when either is
    // present, else falls back to the combined synonym field.
    let make_model = {
        let desc = pick(fields, &["rc_maker_desc"]);
        let model = pick(fields, &["rc_maker_model"]);
        let parts: Vec<String> = [desc, model].into_iter().flatten().collect();
        if parts.is_empty() {
            pick(fields, &["manufacturer_model"])
        } else {
            Some(parts.join(" "))
        }
    };

    VehicleDetails {
        // The structured field wins over anything mined from text.
        plate: na(pick(fields, &["rc_vehicle_no"]).or(plate_from_text)),
        owner: na(pick(fields, &["rc_owner_name", "owner_name"])),
        make_model: na(make_model),
        fuel: na(pick(fields, &["rc_fuel_desc", "fuel_type"])),
        reg_date: na(pick(fields, &["rc_regn_dt", "registration_date"])),
        insurance_upto: na(pick(fields, &["rc_insurance_upto", "insurance_validity"])),
        registered_at: na(pick(fields, &["rc_registered_at", "registered_place"])),
        status: na(pick(fields, &["rc_status", "status_verification"])),
        status_as_on: pick(fields, &["rc_status_as_on"]),
    }
}

/// Normalize an arbitrary backend payload. Pure and deterministic; the
/// plate is re-derived on every call, never cached.
pub fn normalize(payload: &Value) -> NormalizedResult {
    match classify(payload) {
        Payload::Direct(map) => {
            let raw = serde_json::to_string_pretty(payload).unwrap_or_default();
            let container = resolve(map);
            NormalizedResult {
                details: map_fields(container.fields(), None),
                raw,
            }
        }
        Payload::MessageText(msg) => {
            let plate = extract_plate_from_text(&msg);
            let details = match extract_json_from_message(&msg) {
                Some(embedded) => {
                    let container = resolve(&embedded);
                    map_fields(container.fields(), plate)
                }
                None => map_fields(&Map::new(), plate),
            };
            NormalizedResult { details, raw: msg }
        }
        Payload::Opaque => NormalizedResult {
            details: VehicleDetails::default(),
            raw: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plate_extracted_from_plain_text() {
        let out = normalize(&json!({ "message": "detected plate MH12AB1234 in frame" }));
        assert_eq!(out.details.plate, "MH12AB1234");
    }

    #[test]
    fn plate_separators_are_stripped() {
        let out = normalize(&json!({ "message": "plate: MH-12-AB-1234" }));
        assert_eq!(out.details.plate, "MH12AB1234");
        let out = normalize(&json!({ "message": "plate: MH 12 AB 1234" }));
        assert_eq!(out.details.plate, "MH12AB1234");
    }

    #[test]
    fn nested_extraction_output_is_resolved() {
        let out = normalize(&json!({
            "result": { "extraction_output": { "rc_vehicle_no": "DL1CAB0001" } }
        }));
        assert_eq!(out.details.plate, "DL1CAB0001");
    }

    #[test]
    fn data_subobject_needs_recognized_keys() {
        // `data` with recognizable keys is descended into.
        let out = normalize(&json!({
            "data": { "rc_vehicle_no": "KA01AB1234", "rc_owner_name": "S Rao" }
        }));
        assert_eq!(out.details.plate, "KA01AB1234");
        assert_eq!(out.details.owner, "S Rao");

        // `data` without them is not; the container is used as-is.
        let out = normalize(&json!({ "data": { "foo": "bar" } }));
        assert_eq!(out.details.plate, NOT_AVAILABLE);
    }

    #[test]
    fn empty_object_yields_all_sentinels() {
        let out = normalize(&json!({}));
        assert_eq!(out.details, VehicleDetails::default());
        for (_, v) in out.details.rows() {
            assert_eq!(v, NOT_AVAILABLE);
        }
    }

    #[test]
    fn direct_object_with_recognized_keys_is_not_descended() {
        // Recognized keys on the container win over any nested shapes.
        let out = normalize(&json!({
            "rc_vehicle_no": "MH14GH5678",
            "result": { "extraction_output": { "rc_vehicle_no": "WRONG" } }
        }));
        assert_eq!(out.details.plate, "MH14GH5678");
    }

    #[test]
    fn normalization_is_idempotent_for_recognized_shapes() {
        let payload = json!({
            "rc_vehicle_no": "GJ05CD4321",
            "rc_owner_name": "A Patel",
            "rc_fuel_desc": "PETROL"
        });
        let first = normalize(&payload);
        let second = normalize(&payload);
        assert_eq!(first.details, second.details);
        assert_eq!(first.details.plate, "GJ05CD4321");
        assert_eq!(first.details.owner, "A Patel");
        assert_eq!(first.details.fuel, "PETROL");
    }

    #[test]
    fn message_with_embedded_json_is_mined() {
        let msg = "OCR Started\nchecking MH12AB1234\n{\"result\": {\"extraction_output\": \
                   {\"rc_owner_name\": \"R Sharma\", \"rc_vehicle_no\": \"MH12AB1234\"}}}\nOCR Done";
        let out = normalize(&json!({ "message": msg }));
        assert_eq!(out.details.plate, "MH12AB1234");
        assert_eq!(out.details.owner, "R Sharma");
        // The raw panel shows the whole message, not just the JSON.
        assert_eq!(out.raw, msg);
    }

    #[test]
    fn message_without_json_keeps_raw_text() {
        let out = normalize(&json!({ "message": "OCR completed successfully" }));
        assert_eq!(out.raw, "OCR completed successfully");
        assert_eq!(out.details.plate, NOT_AVAILABLE);
        assert_eq!(out.details.owner, NOT_AVAILABLE);
    }

    #[test]
    fn make_model_joins_maker_fields() {
        let out = normalize(&json!({
            "rc_vehicle_no": "TN10AB1000",
            "rc_maker_desc": "MARUTI SUZUKI",
            "rc_maker_model": "SWIFT VXI"
        }));
        assert_eq!(out.details.make_model, "MARUTI SUZUKI SWIFT VXI");
    }

    #[test]
    fn make_model_falls_back_to_combined_field() {
        let out = normalize(&json!({ "manufacturer_model": "HONDA CITY" }));
        assert_eq!(out.details.make_model, "HONDA CITY");
    }

    #[test]
    fn structured_plate_wins_over_text_match() {
        let msg = "found KA05XY9999 {\"rc_vehicle_no\": \"KA05XY1111\"}";
        let out = normalize(&json!({ "message": msg }));
        assert_eq!(out.details.plate, "KA05XY1111");
    }

    #[test]
    fn empty_string_fields_fall_through_synonyms() {
        let out = normalize(&json!({
            "rc_owner_name": "",
            "owner_name": "Fallback Owner"
        }));
        assert_eq!(out.details.owner, "Fallback Owner");
    }

    #[test]
    fn non_object_payloads_degrade_quietly() {
        let out = normalize(&json!(42));
        assert_eq!(out.details, VehicleDetails::default());
        assert_eq!(out.raw, "");

        // A bare string is treated as a message body.
        let out = normalize(&json!("plate MH01ZZ1 seen"));
        assert_eq!(out.raw, "plate MH01ZZ1 seen");
        assert_eq!(out.details.plate, "MH01ZZ1");
    }

    #[test]
    fn non_string_message_is_opaque() {
        let out = normalize(&json!({ "message": { "nested": true } }));
        assert_eq!(out.details, VehicleDetails::default());
        assert_eq!(out.raw, "");
    }

    #[test]
    fn status_as_on_row_is_optional() {
        let out = normalize(&json!({ "rc_vehicle_no": "MH12AB1234" }));
        assert_eq!(out.details.rows().len(), 8);

        let out = normalize(&json!({
            "rc_vehicle_no": "MH12AB1234",
            "rc_status_as_on": "2025-01-01"
        }));
        assert_eq!(out.details.rows().len(), 9);
    }
}
