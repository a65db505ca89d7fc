//! Exam identification, read off the first lines of the paper.
//!
//! Exam papers open with a title like `臺北市某某國小 113學年度 第一學期 五年級 數學 期中評量`.
//! A handful of patterns pick the pieces out; whatever isn't found falls back to the caller's
//! defaults, then to [`NOT_DETECTED`].

use chrono::{DateTime, Local};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::util::leading_chars;

/// Fallback for fields neither the exam text nor the caller could provide
pub const NOT_DETECTED: &str = "未偵測";

/// How much of the exam head is searched
pub const SCAN_CHARS: usize = 800;

static SCHOOL_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2,3})\s*學年度?").expect("School year pattern is valid"));
static SEMESTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(第\s*[一二12]\s*學期|[上下]\s*學期)").expect("Semester pattern is valid")
});
static ASSESSMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((?:期中|期末|定期|平時|第\s*[一二三四1-4]\s*次(?:定期)?)\s*(?:評量|考試|測驗|考查))")
        .expect("Assessment pattern is valid")
});
static GRADE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([一二三四五六1-6])\s*年\s*級").expect("Grade pattern is valid"));
static SUBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(國語|數學|自然(?:科學|與生活科技)?|社會|英語|英文|生活|健康與體育|閩南語|客語)")
        .expect("Subject pattern is valid")
});

/// Values used when the exam text does not name a field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataDefaults {
    pub grade: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReportMetadata {
    pub school_year: String,
    pub semester: String,
    pub assessment: String,
    pub grade: String,
    pub subject: String,
    /// `YYYY-MM-DD HH:MM`, local time
    pub generated_at: String,
    pub display: String,
}

fn capture(pattern: &Regex, head: &str) -> Option<String> {
    pattern.captures(head).and_then(|captures| {
        captures
            .get(1)
            .map(|found| found.as_str().split_whitespace().collect())
    })
}

impl ReportMetadata {
    /// Reads metadata from the exam head, stamping it with the current local time
    pub fn extract(exam_text: &str, defaults: &MetadataDefaults) -> Self {
        Self::extract_at(exam_text, defaults, Local::now())
    }

    pub fn extract_at(exam_text: &str, defaults: &MetadataDefaults, now: DateTime<Local>) -> Self {
        let head = leading_chars(exam_text, SCAN_CHARS);
        let or_default = |found: Option<String>, default: &Option<String>| {
            found
                .or_else(|| default.clone())
                .unwrap_or_else(|| NOT_DETECTED.to_owned())
        };

        let school_year = capture(&SCHOOL_YEAR, head)
            .map(|year| format!("{year}學年度"))
            .unwrap_or_else(|| NOT_DETECTED.to_owned());
        let semester = capture(&SEMESTER, head).unwrap_or_else(|| NOT_DETECTED.to_owned());
        let assessment = capture(&ASSESSMENT, head).unwrap_or_else(|| NOT_DETECTED.to_owned());
        let grade = or_default(
            capture(&GRADE, head).map(|grade| format!("{grade}年級")),
            &defaults.grade,
        );
        let subject = or_default(capture(&SUBJECT, head), &defaults.subject);
        let generated_at = now.format("%Y-%m-%d %H:%M").to_string();

        let display = [&school_year, &semester, &grade, &subject, &assessment]
            .into_iter()
            .filter(|field| field.as_str() != NOT_DETECTED)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let display = if display.is_empty() {
            NOT_DETECTED.to_owned()
        } else {
            display
        };
        debug!("Exam identified as {display:?}");

        Self {
            school_year,
            semester,
            assessment,
            grade,
            subject,
            generated_at,
            display,
        }
    }

    /// Date part of the generation timestamp
    pub fn generated_date(&self) -> &str {
        self.generated_at
            .split_once(' ')
            .map(|(date, _)| date)
            .unwrap_or(&self.generated_at)
    }
}
