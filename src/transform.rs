//! Maps one raw Dodge project record onto a flat CRM lead row.

use crate::correlation::{CorrelationEntry, CorrelationTable};
use crate::country::country_code;
use crate::extract::{
    clean_text, extract_path, extract_text, find_owner_contact, format_date_to_iso, format_phone,
    pad_zip, value_text,
};
use crate::models::{LeadRow, CRM_PLACEHOLDERS};
use serde_json::Value;
use std::collections::HashSet;

const GEO_DEFAULT: &str = "0.0000";

static NO_DATA: Value = Value::Null;

/// Why a record produced no row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Lead id already committed in a past run, or a repeat of an id
    /// accepted earlier in the same batch. Both count toward the run's
    /// `duplicates_skipped`.
    Duplicate(String),
    /// No `types` entry flagged primary.
    MissingPrimaryType,
    /// Primary type absent from the correlation table.
    UnknownType(String),
    /// Primary type present but not flagged for inclusion.
    ExcludedType(String),
    /// Record is not a JSON object.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accepted(Box<LeadRow>),
    Skipped(SkipReason),
}

/// Dodge report number, `""` when absent.
pub fn lead_id(record: &Value) -> String {
    extract_text(record, &["value", "summary", "dodgeReportNumber"])
}

/// `value` of the first entry in `list` flagged `primary == "Y"`.
fn primary_entry(data: &Value, list: &str) -> String {
    data.get(list)
        .and_then(Value::as_array)
        .and_then(|items| {
            items.iter().find(|item| {
                item.get("primary")
                    .map(value_text)
                    .is_some_and(|flag| flag == "Y")
            })
        })
        .and_then(|item| extract_path(item, &["value"]))
        .map(value_text)
        .unwrap_or_default()
}

/// Treats empty strings and numeric zero as missing coordinates.
fn geo_or_default(data: &Value, key: &str) -> String {
    match extract_path(data, &["geo", key]) {
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => GEO_DEFAULT.to_string(),
        Some(v) => {
            let text = value_text(v);
            if text.is_empty() {
                GEO_DEFAULT.to_string()
            } else {
                text
            }
        }
        None => GEO_DEFAULT.to_string(),
    }
}

/// Splits a full name on the first whitespace run into (first, last).
pub fn split_contact_name(full_name: &str) -> (String, String) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Decides whether `record` becomes a lead row.
///
/// `seen` holds ids committed by earlier runs and is only read. Ids of
/// accepted rows go into `accepted`; the caller commits them once the
/// artifact is safely stored.
pub fn transform(
    record: &Value,
    table: &CorrelationTable,
    seen: &HashSet<String>,
    accepted: &mut HashSet<String>,
) -> Decision {
    if !record.is_object() {
        tracing::warn!("Skipping project record that is not a JSON object");
        return Decision::Skipped(SkipReason::Malformed);
    }

    let dr_number = lead_id(record);
    if !dr_number.is_empty() && (seen.contains(&dr_number) || accepted.contains(&dr_number)) {
        tracing::info!("Skipping duplicate DRNumber: {}", dr_number);
        return Decision::Skipped(SkipReason::Duplicate(dr_number));
    }

    let data = record
        .get("value")
        .and_then(|v| v.get("data"))
        .unwrap_or(&NO_DATA);

    let primary_type = primary_entry(data, "types");
    if primary_type.is_empty() {
        tracing::warn!("Project has no primary type; Project: {}", dr_number);
        return Decision::Skipped(SkipReason::MissingPrimaryType);
    }

    let Some(correlation) = table.get(&primary_type) else {
        tracing::info!("Skipping project (unknown type): {}", primary_type);
        return Decision::Skipped(SkipReason::UnknownType(primary_type));
    };
    if !correlation.include {
        tracing::info!("Skipping project (excluded type): {}", primary_type);
        return Decision::Skipped(SkipReason::ExcludedType(primary_type));
    }

    let mut row = build_row(record, data, primary_type, correlation);
    for field in row.fields_mut() {
        *field = clean_text(field);
    }

    if !dr_number.is_empty() {
        accepted.insert(dr_number);
    }
    Decision::Accepted(Box::new(row))
}

fn build_row(
    record: &Value,
    data: &Value,
    primary_type: String,
    correlation: &CorrelationEntry,
) -> LeadRow {
    let address = |key: &str| {
        extract_text(
            data,
            &["locations", "projectAddress", key, "value"],
        )
    };

    let [crm_1, crm_2, crm_3, crm_4, crm_5, crm_6, crm_7] = CRM_PLACEHOLDERS.map(String::from);

    let mut row = LeadRow {
        current_opportunity_phase: primary_entry(data, "stages"),
        name: extract_text(data, &["projectName", "value"]),
        opportunity_street: extract_text(
            data,
            &["locations", "projectAddress", "addressLines", "line1", "value"],
        ),
        opportunity_city: address("city"),
        opportunity_state: address("stateID"),
        opportunity_postal_code: pad_zip(&address("zipCode5")),
        opportunity_country: country_code(Some(address("countryID").as_str())).to_string(),
        market_segment_code: correlation.segment_code.clone(),
        opportunity_type: primary_type,
        opportunity_description: extract_text(data, &["notes", "notes"]),
        start_date: extract_path(data, &["additionalDetails", "targetStartDate", "value"])
            .map(format_date_to_iso)
            .unwrap_or_default(),
        end_date: extract_path(data, &["additionalDetails", "targetFinishDate", "value"])
            .map(format_date_to_iso)
            .unwrap_or_default(),
        account_longitude: geo_or_default(data, "longitude"),
        account_latitude: geo_or_default(data, "latitude"),
        crm_field_1: crm_1,
        crm_field_2: crm_2,
        crm_field_3: crm_3,
        crm_field_4: crm_4,
        crm_field_5: crm_5,
        crm_field_6: crm_6,
        crm_field_7: crm_7,
        ..LeadRow::default()
    };

    if let Some(owner) = find_owner_contact(record) {
        let field = |key: &str| extract_text(owner, &[key]);
        let phone = format_phone(&field("phoneAreaCode"), &field("phoneNumber"));
        let (first_name, last_name) = split_contact_name(&field("contactName"));

        row.company = field("firmName");
        row.account_phone = phone.clone();
        row.account_web_site = field("url");
        row.account_fax = format_phone(&field("faxAreaCode"), &field("faxNumber"));
        row.account_street = extract_text(owner, &["addressLines", "line1"]);
        row.customer_city = field("city");
        row.customer_state = field("state");
        row.account_county = field("county");
        row.account_postal_code = pad_zip(&field("zipCode5"));
        row.customer_country = country_code(Some(field("country").as_str())).to_string();
        row.contact_job_title = field("contactTitle");
        row.contact_email = field("email");
        row.contact_phone = phone;
        row.contact_first_name = first_name;
        row.contact_last_name = last_name;
    } else {
        // No owner: company/contact fields stay empty, geo keeps its default
        row.account_longitude = GEO_DEFAULT.to_string();
        row.account_latitude = GEO_DEFAULT.to_string();
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> CorrelationTable {
        let mut table = CorrelationTable::new();
        table.insert(
            "Office",
            CorrelationEntry {
                include: true,
                segment_code: "SEG-OFF".to_string(),
                ..Default::default()
            },
        );
        table.insert(
            "Parking Garage",
            CorrelationEntry {
                include: false,
                ..Default::default()
            },
        );
        table
    }

    fn project(dr: &str, primary_type: &str) -> Value {
        json!({
            "value": {
                "summary": {"dodgeReportNumber": {"value": dr}},
                "data": {
                    "projectName": {"value": "  Main Street\nOffices  "},
                    "types": [
                        {"primary": "N", "value": "Retail"},
                        {"primary": "Y", "value": primary_type}
                    ],
                    "stages": [{"primary": "Y", "value": "Bidding"}],
                    "notes": {"notes": "Three   storey\r\nbuilding"},
                    "locations": {"projectAddress": {
                        "addressLines": {"line1": {"value": "1 Main St"}},
                        "city": {"value": "Memphis"},
                        "stateID": {"value": "TN"},
                        "zipCode5": {"value": "8103"},
                        "countryID": {"value": "UNITED STATES"}
                    }},
                    "additionalDetails": {
                        "targetStartDate": {"value": "2025-11-01T00:00:00Z"},
                        "targetFinishDate": {"value": "31/10/2026"}
                    },
                    "geo": {"latitude": 35.1495, "longitude": -90.049},
                    "contacts": [{
                        "contactRole": {"value": "Owner"},
                        "firmName": "Acme Holdings",
                        "phoneAreaCode": "901",
                        "phoneNumber": "4953300",
                        "faxAreaCode": "",
                        "faxNumber": "4953301",
                        "url": "acme.example",
                        "addressLines": {"line1": "9 Elm Ave"},
                        "city": "Nashville",
                        "state": "TN",
                        "county": "Davidson",
                        "zipCode5": "372",
                        "country": "USA",
                        "contactTitle": "Director",
                        "contactName": "Jane   van Houten",
                        "email": "jane@acme.example"
                    }]
                }
            }
        })
    }

    fn accept(record: &Value) -> LeadRow {
        let mut accepted = HashSet::new();
        match transform(record, &table(), &HashSet::new(), &mut accepted) {
            Decision::Accepted(row) => *row,
            other => panic!("expected a row, got {:?}", other),
        }
    }

    #[test]
    fn test_maps_full_record() {
        let row = accept(&project("DR-1", "Office"));

        assert_eq!(row.current_opportunity_phase, "Bidding");
        assert_eq!(row.name, "Main Street Offices");
        assert_eq!(row.opportunity_type, "Office");
        assert_eq!(row.opportunity_description, "Three storey building");
        assert_eq!(row.opportunity_street, "1 Main St");
        assert_eq!(row.opportunity_city, "Memphis");
        assert_eq!(row.opportunity_postal_code, "08103");
        assert_eq!(row.opportunity_country, "US");
        assert_eq!(row.market_segment_code, "SEG-OFF");
        assert_eq!(row.start_date, "2025-11-01T00:00:00");
        assert_eq!(row.end_date, "2026-10-31T00:00:00");

        assert_eq!(row.company, "Acme Holdings");
        assert_eq!(row.account_phone, "901-4953300");
        assert_eq!(row.account_fax, "4953301");
        assert_eq!(row.account_longitude, "-90.049");
        assert_eq!(row.account_latitude, "35.1495");
        assert_eq!(row.account_street, "9 Elm Ave");
        assert_eq!(row.account_postal_code, "00372");
        assert_eq!(row.customer_country, "US");
        assert_eq!(row.contact_phone, "901-4953300");
        assert_eq!(row.contact_first_name, "Jane");
        assert_eq!(row.contact_last_name, "van Houten");
        assert_eq!(row.crm_field_1, "YOUR_VALUE_1");
        assert_eq!(row.crm_field_7, "YOUR_VALUE_7");
    }

    #[test]
    fn test_duplicate_is_skipped_and_seen_untouched() {
        let seen: HashSet<String> = ["DR-1".to_string()].into_iter().collect();
        let mut accepted = HashSet::new();
        let decision = transform(&project("DR-1", "Office"), &table(), &seen, &mut accepted);
        assert_eq!(
            decision,
            Decision::Skipped(SkipReason::Duplicate("DR-1".to_string()))
        );
        assert!(accepted.is_empty());
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_repeat_within_batch_is_duplicate() {
        let seen = HashSet::new();
        let mut accepted = HashSet::new();
        let record = project("DR-7", "Office");
        assert!(matches!(
            transform(&record, &table(), &seen, &mut accepted),
            Decision::Accepted(_)
        ));
        assert!(accepted.contains("DR-7"));
        assert!(matches!(
            transform(&record, &table(), &seen, &mut accepted),
            Decision::Skipped(SkipReason::Duplicate(_))
        ));
    }

    #[test]
    fn test_unknown_and_excluded_types_are_denied() {
        let mut accepted = HashSet::new();
        let seen = HashSet::new();
        assert_eq!(
            transform(&project("DR-2", "Stadium"), &table(), &seen, &mut accepted),
            Decision::Skipped(SkipReason::UnknownType("Stadium".to_string()))
        );
        assert_eq!(
            transform(&project("DR-3", "Parking Garage"), &table(), &seen, &mut accepted),
            Decision::Skipped(SkipReason::ExcludedType("Parking Garage".to_string()))
        );
        assert!(accepted.is_empty());
    }

    #[test]
    fn test_missing_primary_type() {
        let mut record = project("DR-4", "Office");
        record["value"]["data"]["types"] = json!([{"primary": "N", "value": "Office"}]);
        let mut accepted = HashSet::new();
        assert_eq!(
            transform(&record, &table(), &HashSet::new(), &mut accepted),
            Decision::Skipped(SkipReason::MissingPrimaryType)
        );
    }

    #[test]
    fn test_no_owner_leaves_owner_fields_empty() {
        let mut record = project("DR-5", "Office");
        record["value"]["data"]["contacts"] = json!([{"contactRole": {"value": "Architect"}}]);
        record["value"]["data"]["geo"] = json!({"latitude": 35.1, "longitude": -90.0});
        let row = accept(&record);

        assert_eq!(row.company, "");
        assert_eq!(row.account_phone, "");
        assert_eq!(row.customer_country, "");
        assert_eq!(row.contact_first_name, "");
        assert_eq!(row.account_longitude, "0.0000");
        assert_eq!(row.account_latitude, "0.0000");
        assert_eq!(row.name, "Main Street Offices");
    }

    #[test]
    fn test_missing_geo_defaults() {
        let mut record = project("DR-6", "Office");
        record["value"]["data"]["geo"] = json!({"latitude": "", "longitude": 0});
        let row = accept(&record);
        assert_eq!(row.account_longitude, "0.0000");
        assert_eq!(row.account_latitude, "0.0000");
    }

    #[test]
    fn test_record_without_id_is_accepted_but_not_tracked() {
        let mut record = project("", "Office");
        record["value"]["summary"] = json!({});
        let mut accepted = HashSet::new();
        let decision = transform(&record, &table(), &HashSet::new(), &mut accepted);
        assert!(matches!(decision, Decision::Accepted(_)));
        assert!(accepted.is_empty());
    }

    #[test]
    fn test_malformed_record() {
        let mut accepted = HashSet::new();
        assert_eq!(
            transform(&json!("not a project"), &table(), &HashSet::new(), &mut accepted),
            Decision::Skipped(SkipReason::Malformed)
        );
        assert_eq!(
            transform(&json!({"value": 7}), &table(), &HashSet::new(), &mut accepted),
            Decision::Skipped(SkipReason::MissingPrimaryType)
        );
    }

    #[test]
    fn test_split_contact_name() {
        assert_eq!(
            split_contact_name("  John  Smith Jr "),
            ("John".to_string(), "Smith Jr".to_string())
        );
        assert_eq!(split_contact_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_contact_name(""), (String::new(), String::new()));
    }
}
