use crate::error::AppError;
use actix_multipart::Multipart;
use futures_util::StreamExt;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

pub const REQUIRED: &str = "This field is required.";

/// Field-level validation messages, keyed by form field name.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Ok(()) when nothing was recorded, otherwise a 422 carrying the messages.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A `multipart/form-data` body read fully into memory.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn from_multipart(mut payload: Multipart, max_bytes: usize) -> Result<Self, AppError> {
        let mut form = FormData::default();
        let mut total = 0usize;

        while let Some(item) = payload.next().await {
            let mut field = item.map_err(|e| AppError::Upload(e.to_string()))?;

            let (name, filename) = {
                let cd = field.content_disposition();
                (
                    cd.get_name().unwrap_or_default().to_string(),
                    cd.get_filename().map(str::to_string),
                )
            };

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| AppError::Upload(e.to_string()))?;
                total += chunk.len();
                if total > max_bytes {
                    return Err(AppError::Upload(format!(
                        "request body exceeds {} bytes",
                        max_bytes
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            match filename {
                // an unselected file input still sends an empty filename
                Some(filename) if !filename.is_empty() => {
                    form.files.insert(name, UploadedFile { filename, bytes });
                }
                Some(_) => {}
                None => {
                    let text = String::from_utf8(bytes)
                        .map_err(|_| AppError::Upload(format!("field `{}` is not UTF-8", name)))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_file(mut self, name: &str, filename: &str, bytes: &[u8]) -> Self {
        self.files.insert(
            name.to_string(),
            UploadedFile {
                filename: filename.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        self
    }

    /// Trimmed, non-empty text value.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required<'a>(&'a self, name: &str, errors: &mut FieldErrors) -> Option<&'a str> {
        let value = self.text(name);
        if value.is_none() {
            errors.add(name, REQUIRED);
        }
        value
    }

    pub fn required_parsed<T: FromStr>(&self, name: &str, errors: &mut FieldErrors) -> Option<T> {
        let raw = self.required(name, errors)?;
        parse_field(name, raw, errors)
    }

    pub fn optional_parsed<T: FromStr>(&self, name: &str, errors: &mut FieldErrors) -> Option<T> {
        let raw = self.text(name)?;
        parse_field(name, raw, errors)
    }

    /// Checkbox semantics: present and truthy.
    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.text(name).map(str::to_ascii_lowercase).as_deref(),
            Some("on" | "true" | "1" | "yes")
        )
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn require_file(&mut self, name: &str, errors: &mut FieldErrors) -> Option<UploadedFile> {
        let file = self.take_file(name);
        if file.is_none() {
            errors.add(name, REQUIRED);
        }
        file
    }
}

fn parse_field<T: FromStr>(name: &str, raw: &str, errors: &mut FieldErrors) -> Option<T> {
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(name, format!("Enter a valid value (got `{}`).", raw));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn required_records_missing_and_blank_fields() {
        let form = FormData::default().with_field("title", "   ");
        let mut errors = FieldErrors::default();

        assert!(form.required("title", &mut errors).is_none());
        assert!(form.required("body", &mut errors).is_none());
        assert_eq!(errors.get("title"), Some(&[REQUIRED.to_string()][..]));
        assert!(errors.get("body").is_some());
    }

    #[test]
    fn parsed_fields_report_bad_values() {
        let form = FormData::default()
            .with_field("start_date", "2024-03-01")
            .with_field("end_date", "03/05/2024");
        let mut errors = FieldErrors::default();

        let start: Option<NaiveDate> = form.required_parsed("start_date", &mut errors);
        let end: Option<NaiveDate> = form.required_parsed("end_date", &mut errors);

        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(end.is_none());
        assert!(errors.get("end_date").is_some());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn optional_fields_are_silent_when_absent() {
        let form = FormData::default();
        let mut errors = FieldErrors::default();
        let value: Option<u64> = form.optional_parsed("object_id", &mut errors);
        assert!(value.is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn flags_follow_checkbox_values() {
        let form = FormData::default()
            .with_field("featured", "on")
            .with_field("archived", "false");
        assert!(form.flag("featured"));
        assert!(!form.flag("archived"));
        assert!(!form.flag("missing"));
    }

    #[test]
    fn missing_file_is_a_field_error() {
        let mut form = FormData::default().with_file("file", "a.pdf", b"%PDF");
        let mut errors = FieldErrors::default();
        assert!(form.require_file("file", &mut errors).is_some());
        assert!(form.require_file("file", &mut errors).is_none());
        assert!(errors.get("file").is_some());
    }
}
