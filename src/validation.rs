use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{NewReport, NewTask, DATE_FORMAT};

/// Largest value accepted for any task counter.
pub const MAX_COUNT: i64 = i32::MAX as i64;

lazy_static! {
    /// 24-hour wall-clock time, zero padded: "09:05", "23:59".
    pub static ref TIME_REGEX: Regex = Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every problem found in one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[cfg(test)]
    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Raw task input as typed by a user. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSubmission {
    pub category_id: Option<String>,
    pub date: Option<String>,
    pub batch_count: Option<String>,
    pub claim_count: Option<String>,
    pub sheet_count: Option<String>,
    pub email: Option<String>,
    pub form: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub unknown: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSubmission {
    pub report_date: Option<String>,
    pub tasks: Vec<TaskSubmission>,
}

impl TaskSubmission {
    /// Parse a `key=value,key=value` task spec.
    ///
    /// Keys: `category`, `date`, `batch`, `claim`, `sheets`, `email`, `form`,
    /// `start`, `end`. Anything else is kept in `unknown` and rejected by
    /// validation.
    pub fn parse_spec(spec: &str) -> Self {
        let mut task = Self::default();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                task.unknown.push(pair.to_string());
                continue;
            };
            let value = Some(value.trim().to_string());
            match key.trim() {
                "category" | "category_id" => task.category_id = value,
                "date" => task.date = value,
                "batch" | "batch_count" => task.batch_count = value,
                "claim" | "claim_count" => task.claim_count = value,
                "sheets" | "sheet" | "sheet_count" => task.sheet_count = value,
                "email" => task.email = value,
                "form" => task.form = value,
                "start" | "start_time" => task.start_time = value,
                "end" | "end_time" => task.end_time = value,
                other => task.unknown.push(other.to_string()),
            }
        }
        task
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

fn non_negative(
    raw: &Option<String>,
    field: String,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let raw = present(raw)?;
    match raw.parse::<i64>() {
        Ok(n) if (0..=MAX_COUNT).contains(&n) => Some(n),
        Ok(n) if n < 0 => {
            errors.add(field, "must be zero or greater");
            None
        }
        Ok(_) => {
            errors.add(field, format!("must be at most {MAX_COUNT}"));
            None
        }
        Err(_) => {
            errors.add(field, "must be an integer");
            None
        }
    }
}

fn wall_clock(raw: &Option<String>, field: String, errors: &mut ValidationErrors) -> Option<String> {
    let raw = present(raw)?;
    if TIME_REGEX.is_match(raw) {
        Some(raw.to_string())
    } else {
        errors.add(field, "must be a time in HH:MM format");
        None
    }
}

/// Check a whole submission against the category registry.
///
/// Either every field is valid and a [`NewReport`] comes back, or all the
/// offending fields are reported together.
pub fn validate_submission(
    submission: &ReportSubmission,
    known_categories: &HashSet<i64>,
) -> std::result::Result<NewReport, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let report_date = match present(&submission.report_date) {
        None => {
            errors.add("report_date", "is required");
            None
        }
        Some(raw) => {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                errors.add("report_date", "must be a valid date (YYYY-MM-DD)");
            }
            parsed
        }
    };

    if submission.tasks.is_empty() {
        errors.add("tasks", "at least one task is required");
    }

    let mut tasks = Vec::with_capacity(submission.tasks.len());
    for (i, raw) in submission.tasks.iter().enumerate() {
        let field = |name: &str| format!("tasks.{i}.{name}");

        for key in &raw.unknown {
            errors.add(format!("tasks.{i}"), format!("unknown field '{key}'"));
        }

        let category_id = match present(&raw.category_id) {
            None => {
                errors.add(field("category_id"), "is required");
                None
            }
            Some(v) => match v.parse::<i64>() {
                Ok(id) if known_categories.contains(&id) => Some(id),
                Ok(_) => {
                    errors.add(field("category_id"), "does not reference an existing category");
                    None
                }
                Err(_) => {
                    errors.add(field("category_id"), "must be an integer");
                    None
                }
            },
        };

        let task_date = present(&raw.date).and_then(|v| {
            let parsed = parse_date(v);
            if parsed.is_none() {
                errors.add(field("date"), "must be a valid date (YYYY-MM-DD)");
            }
            parsed
        });

        let task = NewTask {
            category_id: category_id.unwrap_or_default(),
            task_date,
            batch_count: non_negative(&raw.batch_count, field("batch_count"), &mut errors),
            claim_count: non_negative(&raw.claim_count, field("claim_count"), &mut errors),
            sheet_count: non_negative(&raw.sheet_count, field("sheet_count"), &mut errors),
            email: non_negative(&raw.email, field("email"), &mut errors),
            form: non_negative(&raw.form, field("form"), &mut errors),
            start_time: wall_clock(&raw.start_time, field("start_time"), &mut errors),
            end_time: wall_clock(&raw.end_time, field("end_time"), &mut errors),
        };
        tasks.push(task);
    }

    match report_date {
        Some(report_date) if errors.is_empty() => Ok(NewReport { report_date, tasks }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> HashSet<i64> {
        [1, 2, 3].into_iter().collect()
    }

    fn submission(date: &str, specs: &[&str]) -> ReportSubmission {
        ReportSubmission {
            report_date: Some(date.to_string()),
            tasks: specs.iter().map(|s| TaskSubmission::parse_spec(s)).collect(),
        }
    }

    #[test]
    fn test_time_regex() {
        assert!(TIME_REGEX.is_match("00:00"));
        assert!(TIME_REGEX.is_match("09:30"));
        assert!(TIME_REGEX.is_match("23:59"));
        assert!(!TIME_REGEX.is_match("24:00"));
        assert!(!TIME_REGEX.is_match("9:30"));
        assert!(!TIME_REGEX.is_match("12:60"));
        assert!(!TIME_REGEX.is_match("12:30:00"));
    }

    #[test]
    fn test_parse_spec_keys() {
        let t = TaskSubmission::parse_spec("category=2, claim=10, sheets=3, start=08:00, end=09:15");
        assert_eq!(t.category_id.as_deref(), Some("2"));
        assert_eq!(t.claim_count.as_deref(), Some("10"));
        assert_eq!(t.sheet_count.as_deref(), Some("3"));
        assert_eq!(t.start_time.as_deref(), Some("08:00"));
        assert_eq!(t.end_time.as_deref(), Some("09:15"));
        assert!(t.unknown.is_empty());
    }

    #[test]
    fn test_valid_submission() {
        let sub = submission("2025-03-04", &["category=1,batch=2,claim=5", "category=3,email=7"]);
        let report = validate_submission(&sub, &known()).unwrap();
        assert_eq!(report.report_date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.tasks[0].batch_count, Some(2));
        assert_eq!(report.tasks[1].email, Some(7));
        assert_eq!(report.tasks[1].claim_count, None);
    }

    #[test]
    fn test_empty_values_are_absent() {
        let sub = submission("2025-03-04", &["category=1,claim=,start="]);
        let report = validate_submission(&sub, &known()).unwrap();
        assert_eq!(report.tasks[0].claim_count, None);
        assert_eq!(report.tasks[0].start_time, None);
    }

    #[test]
    fn test_missing_date_and_tasks() {
        let sub = ReportSubmission::default();
        let errors = validate_submission(&sub, &known()).unwrap_err();
        assert!(errors.has("report_date"));
        assert!(errors.has("tasks"));
    }

    #[test]
    fn test_invalid_calendar_date() {
        let sub = submission("2025-02-30", &["category=1"]);
        let errors = validate_submission(&sub, &known()).unwrap_err();
        assert!(errors.has("report_date"));
    }

    #[test]
    fn test_collects_every_bad_field() {
        let sub = submission(
            "2025-03-04",
            &["category=9,claim=-1", "claim=abc,start=7:00,end=25:00,date=nope,color=red"],
        );
        let errors = validate_submission(&sub, &known()).unwrap_err();
        for field in [
            "tasks.0.category_id",
            "tasks.0.claim_count",
            "tasks.1.category_id",
            "tasks.1.claim_count",
            "tasks.1.start_time",
            "tasks.1.end_time",
            "tasks.1.date",
            "tasks.1",
        ] {
            assert!(errors.has(field), "missing error for {field}: {errors}");
        }
        assert!(!errors.has("report_date"));
    }

    #[test]
    fn test_counter_upper_bound() {
        let max = format!("category=1,claim={MAX_COUNT}");
        let report = validate_submission(&submission("2025-03-04", &[max.as_str()]), &known()).unwrap();
        assert_eq!(report.tasks[0].claim_count, Some(MAX_COUNT));

        let over = format!("category=1,claim={},form=9223372036854775807", MAX_COUNT + 1);
        let errors = validate_submission(&submission("2025-03-04", &[over.as_str()]), &known()).unwrap_err();
        assert!(errors.has("tasks.0.claim_count"));
        assert!(errors.has("tasks.0.form"));
    }

    #[test]
    fn test_display_lists_fields() {
        let sub = submission("bad", &["category=1"]);
        let errors = validate_submission(&sub, &known()).unwrap_err();
        assert_eq!(errors.to_string(), "report_date: must be a valid date (YYYY-MM-DD)");
    }
}
