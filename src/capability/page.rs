//! Page access contract
//!
//! The DOM-facing collaborator: collects readable segments (skipping
//! scripts, styles, media, navigation chrome, hidden elements and the like
//! -- the exclusion policy is owned by the implementor), applies and clears
//! visual marks, and exposes raw page text for translation, Q&A and
//! summaries.

use crate::reading::Segment;

pub trait PageAccess: Send + Sync {
    /// Capture the page's readable segments in document order. Called fresh
    /// at the start of each reading session.
    fn collect_segments(&self) -> Vec<Segment>;

    /// Whether a previously captured segment is still present on the page.
    fn segment_available(&self, segment: &Segment) -> bool;

    /// Visually mark the segment as the one being read.
    fn mark(&self, segment: &Segment);

    /// Clear the visual mark. Must tolerate segments that have since been
    /// removed from the page.
    fn unmark(&self, segment: &Segment);

    /// The page's visible text, truncated to at most `max_chars` characters.
    fn page_text(&self, max_chars: usize) -> String;

    /// Replace the page's visible text with its translation.
    fn apply_translation(&self, translated: &str);
}
