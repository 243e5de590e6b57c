/// Result types produced by a scan.
///
/// Records are created once by the chunk scanner and never mutated afterwards:
/// a [`PartialResult`] owns the records of one chunk, the merger moves them into
/// a [`ScanResult`], and a renderer finally borrows them. Nothing in the engine
/// shares a record between threads, so none of these types need interior
/// mutability.
///
/// Renderers highlight a record through [`MatchRecord::highlight`], which works
/// the same way for structured matches (exact span) and keyword hints (matched
/// keyword text located in the line).
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Category;

/// Half-open byte range `[start, end)` into a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One detected occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 1-based line number in the original input
    pub line_number: usize,
    /// The full line, without its line terminator
    pub line_text: String,
    /// Location of the match; absent for keyword hints
    pub span: Option<Span>,
    /// The text that triggered the match
    pub matched_text: String,
}

/// A line split around its match for highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight<'a> {
    pub before: &'a str,
    pub matched: &'a str,
    pub after: &'a str,
}

impl MatchRecord {
    pub fn structured(
        line_number: usize,
        line_text: impl Into<String>,
        span: Span,
        matched_text: impl Into<String>,
    ) -> Self {
        Self {
            line_number,
            line_text: line_text.into(),
            span: Some(span),
            matched_text: matched_text.into(),
        }
    }

    pub fn keyword(
        line_number: usize,
        line_text: impl Into<String>,
        matched_text: impl Into<String>,
    ) -> Self {
        Self {
            line_number,
            line_text: line_text.into(),
            span: None,
            matched_text: matched_text.into(),
        }
    }

    pub fn is_keyword_hint(&self) -> bool {
        self.span.is_none()
    }

    /// Splits the line into the text before, at and after the match.
    ///
    /// Keyword hints carry no span, so the first occurrence of the matched
    /// text is used. If it cannot be located the whole line is returned as
    /// `before`.
    pub fn highlight(&self) -> Highlight<'_> {
        let line = self.line_text.as_str();
        let span = self.span.or_else(|| {
            line.find(self.matched_text.as_str())
                .map(|start| Span::new(start, start + self.matched_text.len()))
        });
        match span {
            Some(span) if span.end <= line.len() => Highlight {
                before: &line[..span.start],
                matched: &line[span.start..span.end],
                after: &line[span.end..],
            },
            _ => Highlight {
                before: line,
                matched: "",
                after: "",
            },
        }
    }
}

/// The records found in one chunk, per category, with the chunk's own counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResult {
    /// Position of the chunk in the partitioned input
    pub chunk_index: usize,
    /// Records per category, each list in line order
    pub records: BTreeMap<Category, Vec<MatchRecord>>,
    /// Lines of the chunk that were scanned
    pub lines_scanned: usize,
    /// Candidates dropped by an exclusion predicate
    pub excluded: usize,
}

impl PartialResult {
    /// An empty result with an entry for each of `categories`
    pub fn new(chunk_index: usize, categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            chunk_index,
            records: categories.into_iter().map(|c| (c, Vec::new())).collect(),
            lines_scanned: 0,
            excluded: 0,
        }
    }

    pub fn total_matches(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

/// The records found in the whole input, per category.
///
/// Categories iterate in catalog order; within a category records are in
/// non-decreasing line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Records per active category, including categories without matches
    pub categories: BTreeMap<Category, Vec<MatchRecord>>,
    /// Number of input lines, skipped ones included
    pub lines_scanned: usize,
    /// Line numbers dropped because they could not be decoded
    pub skipped_lines: Vec<usize>,
}

impl ScanResult {
    /// Creates a new empty scan result
    pub fn new() -> Self {
        Default::default()
    }

    /// Records for `category`; empty if the category was not active
    pub fn get(&self, category: Category) -> &[MatchRecord] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[MatchRecord])> {
        self.categories.iter().map(|(c, r)| (*c, r.as_slice()))
    }

    pub fn total_matches(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_matches() == 0
    }

    /// Counts for presentation layers
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            total_lines: self.lines_scanned,
            skipped_lines: self.skipped_lines.len(),
            categories: self
                .iter()
                .map(|(category, records)| CategoryCount {
                    category,
                    matches: records.len(),
                })
                .collect(),
            total_matches: self.total_matches(),
        }
    }
}

/// Match count for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub matches: usize,
}

/// Plain-data summary of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_lines: usize,
    pub skipped_lines: usize,
    /// Per-category counts in catalog order
    pub categories: Vec<CategoryCount>,
    pub total_matches: usize,
}

impl ScanSummary {
    pub fn matches_for(&self, category: Category) -> Option<usize> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.matches)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_record_highlight() {
        let line = "Contact: john.doe@example.com or 9876543210";
        let record = MatchRecord::structured(7, line, Span::new(9, 29), "john.doe@example.com");

        let h = record.highlight();
        assert_eq!(h.before, "Contact: ");
        assert_eq!(h.matched, "john.doe@example.com");
        assert_eq!(h.after, " or 9876543210");
        assert!(!record.is_keyword_hint());
    }

    #[test]
    fn test_keyword_record_highlight() {
        let record = MatchRecord::keyword(
            3,
            "Please update your home_address to 221B Baker Street",
            "home_address",
        );
        let h = record.highlight();
        assert_eq!(h.before, "Please update your ");
        assert_eq!(h.matched, "home_address");
        assert_eq!(h.after, " to 221B Baker Street");
        assert!(record.is_keyword_hint());
    }

    #[test]
    fn test_highlight_falls_back_to_whole_line() {
        let record = MatchRecord::keyword(1, "no such text", "address");
        let h = record.highlight();
        assert_eq!(h.before, "no such text");
        assert_eq!(h.matched, "");
        assert_eq!(h.after, "");
    }

    #[test]
    fn test_span_at_line_edges() {
        let record = MatchRecord::structured(1, "ABCDE1234F", Span::new(0, 10), "ABCDE1234F");
        let h = record.highlight();
        assert_eq!(h.before, "");
        assert_eq!(h.matched, "ABCDE1234F");
        assert_eq!(h.after, "");
        assert_eq!(record.span.unwrap().len(), 10);
    }

    #[test]
    fn test_partial_result_new_has_every_category() {
        let partial = PartialResult::new(4, [Category::Pan, Category::Address]);
        assert_eq!(partial.chunk_index, 4);
        assert_eq!(partial.records.len(), 2);
        assert_eq!(partial.total_matches(), 0);
    }

    #[test]
    fn test_scan_result_summary() {
        let mut result = ScanResult::new();
        result.lines_scanned = 10;
        result.skipped_lines = vec![4];
        result.categories.insert(
            Category::Email,
            vec![
                MatchRecord::structured(1, "a@b.co", Span::new(0, 6), "a@b.co"),
                MatchRecord::structured(9, "c@d.io", Span::new(0, 6), "c@d.io"),
            ],
        );
        result.categories.insert(Category::Pan, Vec::new());

        let summary = result.summary();
        assert_eq!(summary.total_lines, 10);
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(summary.total_matches, 2);
        // catalog order, not insertion order
        assert_eq!(summary.categories[0].category, Category::Pan);
        assert_eq!(summary.matches_for(Category::Email), Some(2));
        assert_eq!(summary.matches_for(Category::Ip), None);

        assert_eq!(result.get(Category::Email).len(), 2);
        assert!(result.get(Category::Ip).is_empty());
        assert!(!result.is_empty());
    }

    #[test]
    fn test_summary_json_uses_category_names() {
        let summary = ScanSummary {
            total_lines: 1,
            skipped_lines: 0,
            categories: vec![CategoryCount {
                category: Category::VoterId,
                matches: 1,
            }],
            total_matches: 1,
        };
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"VoterID\""));
        assert!(json.contains("\"total_lines\": 1"));
    }
}
