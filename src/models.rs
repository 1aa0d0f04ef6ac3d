use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============ CRM Output ============

/// Placeholder CRM-system columns appended to every row.
pub const CRM_PLACEHOLDERS: [&str; 7] = [
    "YOUR_VALUE_1",
    "YOUR_VALUE_2",
    "YOUR_VALUE_3",
    "YOUR_VALUE_4",
    "YOUR_VALUE_5",
    "YOUR_VALUE_6",
    "YOUR_VALUE_7",
];

/// Column headers of the output artifact, in output order.
pub const LEAD_COLUMNS: [&str; 36] = [
    "Current_Opportunity_Phase",
    "Name",
    "Opportunity_Street",
    "Opportunity_City",
    "Opportunity_State",
    "Opportunity_Postal_Code",
    "Opportunity_Country",
    "Market_Segment_Code",
    "Opportunity_Type",
    "Opportunity_Description",
    "Company",
    "Account_Information_Phone",
    "Account_Information_Web_Site",
    "Account_Information_Fax",
    "Account_Information_Longitude",
    "Account_Information_Latitude",
    "Account_Information_Street",
    "Customer_Information_City",
    "Customer_Information_State",
    "Account_Information_County",
    "Account_Information_Postal_Code",
    "Customer_Information_Country",
    "Contact_Information_Job_Title",
    "Contact_Information_EMail",
    "Contact_Information_Phone",
    "Start_Date",
    "End_Date",
    "Main_Contact_Person_First_name",
    "Main_Contact_Person_Last_name",
    "CRM_Field_1",
    "CRM_Field_2",
    "CRM_Field_3",
    "CRM_Field_4",
    "CRM_Field_5",
    "CRM_Field_6",
    "CRM_Field_7",
];

/// One flat CRM lead. Field order matches [`LEAD_COLUMNS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadRow {
    // Project
    #[serde(rename = "Current_Opportunity_Phase")]
    pub current_opportunity_phase: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Opportunity_Street")]
    pub opportunity_street: String,
    #[serde(rename = "Opportunity_City")]
    pub opportunity_city: String,
    #[serde(rename = "Opportunity_State")]
    pub opportunity_state: String,
    #[serde(rename = "Opportunity_Postal_Code")]
    pub opportunity_postal_code: String,
    #[serde(rename = "Opportunity_Country")]
    pub opportunity_country: String,
    #[serde(rename = "Market_Segment_Code")]
    pub market_segment_code: String,
    #[serde(rename = "Opportunity_Type")]
    pub opportunity_type: String,
    #[serde(rename = "Opportunity_Description")]
    pub opportunity_description: String,

    // Owner company
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Account_Information_Phone")]
    pub account_phone: String,
    #[serde(rename = "Account_Information_Web_Site")]
    pub account_web_site: String,
    #[serde(rename = "Account_Information_Fax")]
    pub account_fax: String,
    #[serde(rename = "Account_Information_Longitude")]
    pub account_longitude: String,
    #[serde(rename = "Account_Information_Latitude")]
    pub account_latitude: String,
    #[serde(rename = "Account_Information_Street")]
    pub account_street: String,
    #[serde(rename = "Customer_Information_City")]
    pub customer_city: String,
    #[serde(rename = "Customer_Information_State")]
    pub customer_state: String,
    #[serde(rename = "Account_Information_County")]
    pub account_county: String,
    #[serde(rename = "Account_Information_Postal_Code")]
    pub account_postal_code: String,
    #[serde(rename = "Customer_Information_Country")]
    pub customer_country: String,

    // Owner contact person
    #[serde(rename = "Contact_Information_Job_Title")]
    pub contact_job_title: String,
    #[serde(rename = "Contact_Information_EMail")]
    pub contact_email: String,
    #[serde(rename = "Contact_Information_Phone")]
    pub contact_phone: String,

    // Dates
    #[serde(rename = "Start_Date")]
    pub start_date: String,
    #[serde(rename = "End_Date")]
    pub end_date: String,

    #[serde(rename = "Main_Contact_Person_First_name")]
    pub contact_first_name: String,
    #[serde(rename = "Main_Contact_Person_Last_name")]
    pub contact_last_name: String,

    // CRM placeholders
    #[serde(rename = "CRM_Field_1")]
    pub crm_field_1: String,
    #[serde(rename = "CRM_Field_2")]
    pub crm_field_2: String,
    #[serde(rename = "CRM_Field_3")]
    pub crm_field_3: String,
    #[serde(rename = "CRM_Field_4")]
    pub crm_field_4: String,
    #[serde(rename = "CRM_Field_5")]
    pub crm_field_5: String,
    #[serde(rename = "CRM_Field_6")]
    pub crm_field_6: String,
    #[serde(rename = "CRM_Field_7")]
    pub crm_field_7: String,
}

impl LeadRow {
    /// Mutable access to every field, in column order.
    pub fn fields_mut(&mut self) -> [&mut String; 36] {
        [
            &mut self.current_opportunity_phase,
            &mut self.name,
            &mut self.opportunity_street,
            &mut self.opportunity_city,
            &mut self.opportunity_state,
            &mut self.opportunity_postal_code,
            &mut self.opportunity_country,
            &mut self.market_segment_code,
            &mut self.opportunity_type,
            &mut self.opportunity_description,
            &mut self.company,
            &mut self.account_phone,
            &mut self.account_web_site,
            &mut self.account_fax,
            &mut self.account_longitude,
            &mut self.account_latitude,
            &mut self.account_street,
            &mut self.customer_city,
            &mut self.customer_state,
            &mut self.account_county,
            &mut self.account_postal_code,
            &mut self.customer_country,
            &mut self.contact_job_title,
            &mut self.contact_email,
            &mut self.contact_phone,
            &mut self.start_date,
            &mut self.end_date,
            &mut self.contact_first_name,
            &mut self.contact_last_name,
            &mut self.crm_field_1,
            &mut self.crm_field_2,
            &mut self.crm_field_3,
            &mut self.crm_field_4,
            &mut self.crm_field_5,
            &mut self.crm_field_6,
            &mut self.crm_field_7,
        ]
    }
}

// ============ Run Tracking ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Recorded result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    #[serde(default)]
    pub projects_found: usize,
    #[serde(default)]
    pub unique_projects: usize,
    #[serde(default)]
    pub duplicates_skipped: usize,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub blob_uploaded: bool,
    #[serde(default)]
    pub sharepoint_uploaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    /// A successful run that produced no artifact.
    pub fn empty_success(projects_found: usize, duplicates_skipped: usize) -> Self {
        Self {
            status: RunStatus::Success,
            projects_found,
            unique_projects: 0,
            duplicates_skipped,
            output_file: None,
            blob_uploaded: false,
            sharepoint_uploaded: false,
            error: None,
        }
    }

    /// A failed run with zero counts.
    pub fn failed(projects_found: usize, error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            projects_found,
            unique_projects: 0,
            duplicates_skipped: 0,
            output_file: None,
            blob_uploaded: false,
            sharepoint_uploaded: false,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

// ============ Lead Search ============

/// Inclusive publish-date range for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl SearchWindow {
    /// `[today - days_back, today]`. A span reaching past the calendar
    /// range starts at [`NaiveDate::MIN`].
    pub fn ending(today: NaiveDate, days_back: i64) -> Self {
        let min = Duration::try_days(days_back)
            .and_then(|span| today.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        Self { min, max: today }
    }
}

/// Request body for `POST /project/search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub criteria: SearchCriteria,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub project_types: Vec<String>,
    pub publish_date_range: DateRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(project_types: Vec<String>, window: SearchWindow, limit: usize) -> Self {
        Self {
            criteria: SearchCriteria {
                project_types,
                publish_date_range: DateRange {
                    min: window.min.format("%Y-%m-%d").to_string(),
                    max: window.max.format("%Y-%m-%d").to_string(),
                },
            },
            pagination: Pagination { offset: 0, limit },
        }
    }
}

/// One page of raw project records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub projects: Vec<Value>,
    #[serde(default)]
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lead_row_serializes_in_column_order() {
        let row = LeadRow::default();
        let value = serde_json::to_value(&row).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        // serde_json maps are sorted unless preserve_order is on, so compare as sets
        assert_eq!(keys.len(), LEAD_COLUMNS.len());
        for column in LEAD_COLUMNS {
            assert!(value.get(column).is_some(), "missing column {}", column);
        }
    }

    #[test]
    fn test_search_window_and_request_body() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let window = SearchWindow::ending(today, 2);
        assert_eq!(window.min, NaiveDate::from_ymd_opt(2025, 2, 27).unwrap());

        let body = serde_json::to_value(SearchRequest::new(
            vec!["Office".to_string()],
            window,
            100,
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({
                "criteria": {
                    "projectTypes": ["Office"],
                    "publishDateRange": {"min": "2025-02-27", "max": "2025-03-01"}
                },
                "pagination": {"offset": 0, "limit": 100}
            })
        );
    }

    #[test]
    fn test_search_window_saturates_on_huge_spans() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 31).unwrap();
        assert_eq!(SearchWindow::ending(today, 99_999_999_999).min, NaiveDate::MIN);
        assert_eq!(SearchWindow::ending(today, i64::MAX).min, NaiveDate::MIN);
        assert_eq!(SearchWindow::ending(today, 0).min, today);
    }

    #[test]
    fn test_run_outcome_reads_legacy_records() {
        let legacy = json!({
            "status": "failed",
            "error": "Blob storage upload failed",
            "projects_found": 12,
            "unique_projects": 4,
            "duplicates_skipped": 1,
            "output_file": "processed_api_20250101_110000.xlsx",
            "blob_uploaded": false,
            "sharepoint_uploaded": false
        });
        let outcome: RunOutcome = serde_json::from_value(legacy).unwrap();
        assert_eq!(outcome.status, RunStatus::Failed);
        assert_eq!(outcome.unique_projects, 4);
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_search_page_tolerates_missing_fields() {
        let page: SearchPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.projects.is_empty());
        assert_eq!(page.total, 0);
    }
}
