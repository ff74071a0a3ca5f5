//! Operation results and non-fatal diagnostics
//!
//! Every extraction produces exactly one [`Status`]. The status owns its
//! message, payload and [`WarningList`]; dropping it releases all of them.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Status codes shared by the extraction backend and the pipeline.
///
/// Zero is success, any negative value is a failure.
pub mod codes {
    /// Operation completed
    pub const OK: i32 = 0;
    /// The operation cannot complete (unsupported format)
    pub const FAILED: i32 = -25;
    /// No further operations are possible
    pub const FATAL: i32 = -30;
    /// The source is missing or could not be opened or hashed
    pub const OPEN_ERROR: i32 = -100;
    /// The next entry header could not be read
    pub const NEXT_ERROR: i32 = -200;
    /// Entry data could not be copied out
    pub const COPY_ERROR: i32 = -300;
    /// Output could not be created or written
    pub const WRITE_ERROR: i32 = -400;
}

/// A single non-fatal diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Source line, 0 when not applicable
    pub line: u32,
    /// File or context the warning refers to
    pub file: Option<String>,
    pub message: Option<String>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), 0) => write!(f, "{}: ", file)?,
            (Some(file), line) => write!(f, "{}:{}: ", file, line)?,
            (None, 0) => {}
            (None, line) => write!(f, "line {}: ", line)?,
        }
        f.write_str(self.message.as_deref().unwrap_or("(no message)"))
    }
}

/// Append-only, chronologically ordered warnings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WarningList {
    warnings: Vec<Warning>,
}

impl WarningList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning, copying the given strings
    pub fn push(&mut self, line: u32, file: Option<&str>, message: Option<&str>) {
        self.warnings.push(Warning {
            line,
            file: file.map(str::to_owned),
            message: message.map(str::to_owned),
        });
    }

    /// Append all of `other` after the warnings already recorded
    pub fn append(&mut self, other: WarningList) {
        self.warnings.extend(other.warnings);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.warnings.iter()
    }
}

impl IntoIterator for WarningList {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.into_iter()
    }
}

impl<'a> IntoIterator for &'a WarningList {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.iter()
    }
}

/// Record a warning tagged with the caller's source file and line
#[macro_export]
macro_rules! record_warning {
    ($list:expr, $($arg:tt)+) => {
        $list.push(line!(), Some(file!()), Some(&format!($($arg)+)))
    };
}

/// Terminal result of an operation
///
/// `payload` carries operation-specific data; the extraction pipeline puts the
/// absolute output directory there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status<T = ()> {
    code: i32,
    message: Option<String>,
    payload: Option<T>,
    warnings: WarningList,
}

impl<T> Status<T> {
    /// Build a status, copying `message`
    pub fn report(
        code: i32,
        message: Option<&str>,
        payload: Option<T>,
        warnings: WarningList,
    ) -> Self {
        Self {
            code,
            message: message.map(str::to_owned),
            payload,
            warnings,
        }
    }

    pub fn success(warnings: WarningList) -> Self {
        Self::report(codes::OK, None, None, warnings)
    }

    pub fn failure(code: i32, message: &str, warnings: WarningList) -> Self {
        Self::report(code, Some(message), None, warnings)
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn is_success(&self) -> bool {
        self.code == codes::OK
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn warnings(&self) -> &WarningList {
        &self.warnings
    }

    pub fn warnings_mut(&mut self) -> &mut WarningList {
        &mut self.warnings
    }

    /// Replace the payload, keeping code, message and warnings
    pub fn with_payload<U>(self, payload: U) -> Status<U> {
        Status {
            code: self.code,
            message: self.message,
            payload: Some(payload),
            warnings: self.warnings,
        }
    }

    /// Put `earlier` in front of the warnings already held
    pub fn prepend_warnings(&mut self, mut earlier: WarningList) {
        earlier.append(std::mem::take(&mut self.warnings));
        self.warnings = earlier;
    }

    /// Convert a failure code into [`Error::Extraction`]
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Extraction {
                code: self.code,
                message: self.message.unwrap_or_else(|| "no message".to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_message() {
        let status: Status = Status::success(WarningList::new());
        assert!(status.is_success());
        assert_eq!(status.code(), codes::OK);
        assert_eq!(status.message(), None);
        assert_eq!(status.payload(), None);
        assert!(status.warnings().is_empty());
    }

    #[test]
    fn test_report_copies_message() {
        let message = String::from("cannot open archive");
        let payload = Some("here".to_string());
        let status: Status<String> =
            Status::report(codes::OPEN_ERROR, Some(&message), payload, WarningList::new());
        drop(message);

        assert!(!status.is_success());
        assert_eq!(status.message(), Some("cannot open archive"));
        assert_eq!(status.payload().map(String::as_str), Some("here"));
    }

    #[test]
    fn test_warnings_keep_insertion_order() {
        let mut warnings = WarningList::new();
        warnings.push(0, Some("a.txt"), Some("first"));
        warnings.push(12, None, Some("second"));
        warnings.push(0, None, None);

        let messages: Vec<_> = warnings.iter().map(|w| w.message.clone()).collect();
        assert_eq!(
            messages,
            vec![Some("first".to_string()), Some("second".to_string()), None]
        );
    }

    #[test]
    fn test_success_may_carry_warnings() {
        let mut warnings = WarningList::new();
        warnings.push(0, Some("../evil"), Some("skipped"));
        let status: Status = Status::success(warnings);

        assert!(status.is_success());
        assert_eq!(status.warnings().len(), 1);
    }

    #[test]
    fn test_prepend_and_with_payload_preserve_order() {
        let mut late = WarningList::new();
        late.push(0, None, Some("from extractor"));
        let mut status: Status = Status::success(late);

        let mut early = WarningList::new();
        early.push(0, None, Some("from placement"));
        status.prepend_warnings(early);

        let status = status.with_payload(7u8);
        let messages: Vec<_> = status
            .warnings()
            .iter()
            .filter_map(|w| w.message.as_deref())
            .collect();
        assert_eq!(messages, vec!["from placement", "from extractor"]);
        assert_eq!(status.payload(), Some(&7));
    }

    #[test]
    fn test_record_warning_macro_captures_location() {
        let mut warnings = WarningList::new();
        record_warning!(warnings, "entry {} skipped", 3);

        let warning = warnings.iter().next().unwrap();
        assert!(warning.line > 0);
        assert!(warning.file.as_deref().unwrap().ends_with("status.rs"));
        assert_eq!(warning.message.as_deref(), Some("entry 3 skipped"));
    }

    #[test]
    fn test_warning_display() {
        let mut warnings = WarningList::new();
        warnings.push(0, Some("dir/a.txt"), Some("permission denied"));
        warnings.push(42, Some("lib.rs"), Some("odd"));

        let rendered: Vec<_> = warnings.iter().map(|w| w.to_string()).collect();
        assert_eq!(rendered, vec!["dir/a.txt: permission denied", "lib.rs:42: odd"]);
    }

    #[test]
    fn test_into_result() {
        let ok: Status = Status::success(WarningList::new());
        assert!(ok.into_result().is_ok());

        let failed: Status = Status::failure(codes::FAILED, "unsupported", WarningList::new());
        match failed.into_result() {
            Err(Error::Extraction { code, message }) => {
                assert_eq!(code, codes::FAILED);
                assert_eq!(message, "unsupported");
            }
            other => panic!("expected extraction error, got {:?}", other),
        }
    }

    #[test]
    fn test_status_json_shape() {
        let mut warnings = WarningList::new();
        warnings.push(0, Some("../escape.txt"), Some("entry skipped"));
        let output = std::path::PathBuf::from("/srv/out");
        let status = Status::<()>::success(warnings).with_payload(output);

        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "code": 0,
                "message": null,
                "payload": "/srv/out",
                "warnings": [
                    { "line": 0, "file": "../escape.txt", "message": "entry skipped" }
                ]
            })
        );
    }

    #[test]
    fn test_failure_json_carries_message() {
        let status: Status = Status::failure(codes::FAILED, "unsupported", WarningList::new());

        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["code"], codes::FAILED);
        assert_eq!(json["message"], "unsupported");
        assert!(json["payload"].is_null());
        assert_eq!(json["warnings"], serde_json::json!([]));
    }
}
