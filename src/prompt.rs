use std::{fmt::Display, str::FromStr};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use smart_default::SmartDefault;

/// How hard the reviewer should be on the paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, SmartDefault)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Strictness {
    Lenient,
    #[default]
    Standard,
    Strict,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown strictness {:?}, expected one of 寬鬆/標準/嚴格 or lenient/standard/strict", .0)]
pub struct UnknownStrictness(pub String);

impl FromStr for Strictness {
    type Err = UnknownStrictness;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "寬鬆" | "lenient" => Ok(Self::Lenient),
            "標準" | "standard" => Ok(Self::Standard),
            "嚴格" | "strict" => Ok(Self::Strict),
            _ => Err(UnknownStrictness(s.to_owned())),
        }
    }
}

impl Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Strictness::Lenient => "寬鬆",
            Strictness::Standard => "標準",
            Strictness::Strict => "嚴格",
        })
    }
}

impl Strictness {
    fn instruction(self) -> &'static str {
        match self {
            Strictness::Lenient => "只指出會影響作答的明顯錯誤，細節問題可以略過。",
            Strictness::Standard => "指出錯誤與不夠清楚的敘述，並說明理由。",
            Strictness::Strict => "逐題嚴格檢查用字、標點、配分與課綱對應，任何疑慮都要提出。",
        }
    }
}

/// Parameters picked before a review
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReviewParams {
    #[default("五年級".to_owned())]
    pub grade: String,
    #[default("數學".to_owned())]
    pub subject: String,
    /// Units or lessons the exam is supposed to cover
    #[default("全冊".to_owned())]
    pub scope: String,
    pub strictness: Strictness,
}

const TEMPLATE: &str = "\
你是一位資深的國小{subject}教師，正在審查一份{grade}的試卷。
命題範圍：{scope}
審查標準：{strictness}。{instruction}

請依照下列格式，以 Markdown 輸出審題報告：
### Step 1: 命題範圍
檢查題目是否超出命題範圍。
### Step 2: 題目品質
檢查題意、用字、選項與答案是否正確清楚。
### Step 3: 難易度與配分
以表格列出各大題的難易度與配分是否恰當。
### Step 4: 總結
整體評價。
### 行動建議
條列需要修改的地方。

有問題的項目請以 ❌ 開頭，需要注意的項目請以 ⚠️ 開頭。
{reference}
=== 試卷內容 ===
{exam}
";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("Placeholder pattern is valid"));

/// Fills the review template
///
/// The template is scanned once, so placeholder-like text inside parameters, reference or exam
/// is copied as is. The section headings it asks for are the ones the default segmenter cuts on.
pub fn build_prompt(params: &ReviewParams, exam_text: &str, reference: Option<&str>) -> String {
    let reference = reference
        .map(str::trim)
        .filter(|material| !material.is_empty())
        .map(|material| format!("\n=== 參考教材 ===\n{material}\n"))
        .unwrap_or_default();
    PLACEHOLDER
        .replace_all(TEMPLATE, |captures: &Captures| match &captures[1] {
            "subject" => params.subject.clone(),
            "grade" => params.grade.clone(),
            "scope" => params.scope.clone(),
            "strictness" => params.strictness.to_string(),
            "instruction" => params.strictness.instruction().to_owned(),
            "reference" => reference.clone(),
            "exam" => exam_text.trim().to_owned(),
            _ => captures[0].to_owned(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test {
        {$name:ident, $input:literal, $expected:expr} => {
            #[test]
            fn $name() {
                // act
                let result: Result<Strictness, _> = $input.parse();

                // assert
                assert_eq!(result, $expected);
            }
        };
    }

    test! {lenient_zh, "寬鬆", Ok(Strictness::Lenient)}
    test! {standard_en, "Standard", Ok(Strictness::Standard)}
    test! {strict_padded, " strict ", Ok(Strictness::Strict)}
    test! {unknown, "harsh", Err(UnknownStrictness("harsh".into()))}

    #[test]
    fn parameters_substituted() {
        // arrange
        let params = ReviewParams {
            grade: "三年級".into(),
            subject: "國語".into(),
            scope: "第一課至第四課".into(),
            strictness: Strictness::Strict,
        };

        // act
        let prompt = build_prompt(&params, "一、選擇題 {grade}", None);

        // assert
        assert!(prompt.contains("國小國語教師"));
        assert!(prompt.contains("三年級的試卷"));
        assert!(prompt.contains("命題範圍：第一課至第四課"));
        assert!(prompt.contains("審查標準：嚴格。逐題"));
        assert!(prompt.ends_with("=== 試卷內容 ===\n一、選擇題 {grade}\n"));
        assert!(!prompt.contains("參考教材"));
    }

    #[test]
    fn reference_included() {
        // act
        let prompt = build_prompt(&ReviewParams::default(), "exam", Some("  課本第三單元  "));

        // assert
        assert!(prompt.contains("=== 參考教材 ===\n課本第三單元\n"));
    }

    #[test]
    fn blank_reference_skipped() {
        let prompt = build_prompt(&ReviewParams::default(), "exam", Some(" \n "));
        assert!(!prompt.contains("參考教材"));
    }

    #[test]
    fn substituted_text_not_rescanned() {
        // arrange
        let params = ReviewParams {
            grade: "{scope}".into(),
            scope: "第{exam}單元".into(),
            ..Default::default()
        };

        // act
        let prompt = build_prompt(&params, "EXAMTEXT {grade}", Some("課本 {exam} 範例"));

        // assert
        assert_eq!(prompt.matches("EXAMTEXT").count(), 1);
        assert!(prompt.contains("{scope}的試卷"));
        assert!(prompt.contains("命題範圍：第{exam}單元"));
        assert!(prompt.contains("=== 參考教材 ===\n課本 {exam} 範例\n"));
        assert!(prompt.ends_with("EXAMTEXT {grade}\n"));
    }

    #[test]
    fn every_placeholder_filled() {
        let prompt = build_prompt(&ReviewParams::default(), "exam", Some("ref"));
        assert!(!PLACEHOLDER.is_match(&prompt), "{prompt}");
    }

    #[test]
    fn markers_match_segmenter() {
        // arrange
        let prompt = build_prompt(&ReviewParams::default(), "exam", None);
        let segmenter = crate::segment::Segmenter::default();

        // act
        let cards = segmenter.segment(&prompt);

        // assert
        // preamble, four steps, action plan
        assert_eq!(cards.len(), 6);
    }
}
