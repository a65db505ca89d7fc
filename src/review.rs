use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use log::{debug, warn};

use crate::{
    assemble::Assembler,
    data::{Card, Document, ToStaticExt},
    meta::{MetadataDefaults, ReportMetadata},
    prompt::{build_prompt, ReviewParams},
    segment::Segmenter,
};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Service is out of quota for now, a later attempt may succeed
    #[error("Generation quota exhausted: {}", .0)]
    Quota(String),
    #[error("Generation model or resource not found: {}", .0)]
    NotFound(String),
    #[error("{}", .0)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// The text generation service: prompt in, report text out
pub trait Generate {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<F> Generate for F
where
    F: Fn(&str) -> Result<String, GenerationError>,
{
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self(prompt)
    }
}

/// Everything a finished review produces
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Review {
    pub metadata: ReportMetadata,
    pub raw: String,
    pub document: Document<'static>,
    pub cards: Vec<Card<'static>>,
}

/// Review pipeline with its assembler and segmenter
#[derive(Debug, Clone, Default)]
pub struct Reviewer {
    pub assembler: Assembler,
    pub segmenter: Segmenter,
}

impl Reviewer {
    /// Runs a single review
    ///
    /// The generator is called exactly once. Its failure is returned as is; no document is built then.
    pub fn review(
        &self,
        generator: &impl Generate,
        params: &ReviewParams,
        exam_text: &str,
        reference: Option<&str>,
    ) -> Result<Review, GenerationError> {
        let prompt = build_prompt(params, exam_text, reference);
        debug!("Requesting review, prompt is {} chars", prompt.chars().count());
        let raw = generator.generate(&prompt).map_err(|err| {
            warn!("No report available: {err}");
            err
        })?;

        let defaults = MetadataDefaults {
            grade: Some(params.grade.clone()),
            subject: Some(params.subject.clone()),
        };
        let metadata = ReportMetadata::extract(exam_text, &defaults);
        Ok(self.from_report(raw, metadata))
    }

    /// Builds document and cards out of an already generated report
    pub fn from_report(&self, raw: String, metadata: ReportMetadata) -> Review {
        let document = self.assembler.assemble(&raw, &metadata).to_static();
        let cards = self
            .segmenter
            .segment(&raw)
            .iter()
            .map(ToStaticExt::to_static)
            .collect();
        Review {
            metadata,
            raw,
            document,
            cards,
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Review {:?} was already stored", .0)]
pub struct AlreadyStored(pub String);

/// Finished reviews by request id.
///
/// Each id is written once; stored reviews are shared read-only.
#[derive(Debug, Default)]
pub struct ReviewCache {
    reviews: RwLock<HashMap<String, Arc<Review>>>,
}

impl ReviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        request_id: impl Into<String>,
        review: Review,
    ) -> Result<Arc<Review>, AlreadyStored> {
        let request_id = request_id.into();
        // a poisoned lock still holds a consistent map, entries are only ever added whole
        let mut reviews = self
            .reviews
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if reviews.contains_key(&request_id) {
            return Err(AlreadyStored(request_id));
        }
        let review = Arc::new(review);
        reviews.insert(request_id, Arc::clone(&review));
        Ok(review)
    }

    pub fn get(&self, request_id: &str) -> Option<Arc<Review>> {
        self.reviews
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(request_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.reviews
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::data::Block;

    const EXAM: &str = "113學年度 第二學期 四年級 自然 期末評量\n1. 植物需要什麼？";
    const REPORT: &str = "### Step 1: 命題範圍\n符合範圍。\n### Step 2: 題目品質\n⚠️ 第1題題意不清";

    #[test]
    fn review_builds_both_outputs() {
        // arrange
        let calls = Cell::new(0);
        let generator = |prompt: &str| -> Result<String, GenerationError> {
            calls.set(calls.get() + 1);
            assert!(prompt.contains("植物需要什麼"));
            Ok(REPORT.to_owned())
        };

        // act
        let review = Reviewer::default()
            .review(&generator, &ReviewParams::default(), EXAM, None)
            .expect("Review should succeed");

        // assert
        assert_eq!(calls.get(), 1);
        assert_eq!(review.metadata.grade, "四年級");
        assert_eq!(review.cards.len(), 2);
        assert!(review.cards[1].is_alert);
        assert!(matches!(review.document.blocks[2], Block::Heading { level: 3, .. }));
        assert_eq!(review.raw, REPORT);
    }

    #[test]
    fn defaults_fill_missing_metadata() {
        // arrange
        let generator = |_: &str| -> Result<String, GenerationError> { Ok(String::new()) };
        let params = ReviewParams {
            grade: "二年級".into(),
            subject: "生活".into(),
            ..Default::default()
        };

        // act
        let review = Reviewer::default()
            .review(&generator, &params, "小考", None)
            .expect("Review should succeed");

        // assert
        assert_eq!(review.metadata.grade, "二年級");
        assert_eq!(review.metadata.subject, "生活");
        assert_eq!(review.document.blocks.len(), 2);
        assert!(review.cards.is_empty());
    }

    #[test]
    fn generation_failure_surfaces() {
        // arrange
        let generator =
            |_: &str| -> Result<String, GenerationError> { Err(GenerationError::Quota("429".into())) };

        // act
        let result = Reviewer::default().review(&generator, &ReviewParams::default(), EXAM, None);

        // assert
        assert!(matches!(result, Err(GenerationError::Quota(_))));
    }

    #[test]
    fn cache_is_write_once() {
        // arrange
        let cache = ReviewCache::new();
        let reviewer = Reviewer::default();
        let metadata = ReportMetadata::extract(EXAM, &MetadataDefaults::default());
        let first = reviewer.from_report(REPORT.to_owned(), metadata.clone());
        let second = reviewer.from_report("other".to_owned(), metadata);

        // act
        let stored = cache.insert("req-1", first).expect("First insert should succeed");
        let rejected = cache.insert("req-1", second);

        // assert
        assert_eq!(rejected, Err(AlreadyStored("req-1".into())));
        assert_eq!(cache.len(), 1);
        let fetched = cache.get("req-1").expect("Review should be stored");
        assert!(Arc::ptr_eq(&stored, &fetched));
        assert_eq!(fetched.raw, REPORT);
        assert!(cache.get("req-2").is_none());
    }
}
