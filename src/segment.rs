use std::{borrow::Cow, ops::RangeInclusive};

use itertools::Itertools;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use smart_default::SmartDefault;

use crate::{data::Card, util::contains_warning_glyph};

#[derive(Debug, thiserror::Error)]
pub enum SegmenterError {
    #[error("Marker vocabulary is empty")]
    NoMarkers,
    #[error("{}", .0)]
    Pattern(#[from] regex::Error),
}

/// Section markers a report is cut on.
///
/// Should match the headings [`crate::prompt::build_prompt`] asks for.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault)]
pub struct SegmenterConfig {
    /// `Step N` markers, for N in this range
    #[default(1..=6)]
    pub steps: RangeInclusive<u8>,
    /// Literal phrases opening the action-plan section
    #[default(vec!["行動建議".to_owned(), "Action Plan".to_owned()])]
    pub action_plan: Vec<String>,
}

/// Splits report text into display cards
#[derive(Debug, Clone)]
pub struct Segmenter {
    marker: Regex,
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Result<Self, SegmenterError> {
        let steps = config.steps.clone().map(|n| n.to_string()).join("|");
        let phrases = config
            .action_plan
            .iter()
            .filter(|phrase| !phrase.trim().is_empty())
            .map(|phrase| regex::escape(phrase.trim()))
            .join("|");
        let alternatives = match (steps.is_empty(), phrases.is_empty()) {
            (true, true) => return Err(SegmenterError::NoMarkers),
            (false, true) => format!(r"Step[ \t]*(?:{steps})\b"),
            (true, false) => format!("(?:{phrases})"),
            (false, false) => format!(r"Step[ \t]*(?:{steps})\b|(?:{phrases})"),
        };
        // optional heading hashes, bold delimiters and emoji before the marker; bullets are content
        let marker = Regex::new(&format!(
            r"(?m)^[ \t]*(?:#{{1,6}}[ \t]+)?(?:\*\*[ \t]*)?(?:[\p{{So}}\x{{FE0F}}\x{{200D}}]+[ \t]*)?(?:\*\*[ \t]*)?(?:{alternatives})"
        ))?;
        Ok(Self { marker })
    }

    /// Cuts `text` at every line opening with a section marker
    ///
    /// The marker line starts the new card. Text before the first marker becomes a card of its
    /// own; blank cards are dropped.
    pub fn segment<'source>(&self, text: &'source str) -> Vec<Card<'source>> {
        let starts = self.marker.find_iter(text).map(|found| found.start());
        let cards: Vec<_> = std::iter::once(0)
            .chain(starts)
            .chain(std::iter::once(text.len()))
            .dedup()
            .tuple_windows()
            .map(|(from, to)| text[from..to].trim())
            .filter(|section| !section.is_empty())
            .map(|section| Card {
                text: Cow::Borrowed(section),
                is_alert: contains_warning_glyph(section),
            })
            .collect();
        debug!(
            "Segmented report into {} cards, {} alerts",
            cards.len(),
            cards.iter().filter(|card| card.is_alert).count()
        );
        cards
    }
}

static DEFAULT: Lazy<Segmenter> = Lazy::new(|| {
    Segmenter::new(&SegmenterConfig::default()).expect("Default marker vocabulary is valid")
});

impl Default for Segmenter {
    /// Shares the compiled pattern of the default vocabulary
    fn default() -> Self {
        DEFAULT.clone()
    }
}
