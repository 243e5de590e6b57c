use once_cell::sync::Lazy;
use regex::{Match, Regex};
use tracing::trace;

use super::Category;
use crate::errors::{Result, ScanError};
use crate::results::Span;

/// Test applied to the character immediately outside a candidate match.
///
/// The `regex` crate has no look-around, so "not preceded/followed by X" is
/// checked here instead. A rejected candidate makes the search resume one
/// character after the candidate's start, which finds the same matches a
/// look-around pattern would.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Neighbour must not be an ASCII uppercase letter or ASCII digit
    NotUpperAlnum,
    /// Neighbour must not be a word character (alphanumeric or `_`)
    NotWord,
    /// Neighbour must not be a decimal digit (Unicode `Nd`, what `\d` matches)
    NotDigit,
}

static DECIMAL_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d$").expect("Failed to compile decimal digit class"));

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

impl Guard {
    /// Returns true if `neighbour` (None at the line edge) is acceptable
    pub fn allows(self, neighbour: Option<char>) -> bool {
        let Some(c) = neighbour else {
            return true;
        };
        match self {
            Guard::NotUpperAlnum => !(c.is_ascii_uppercase() || c.is_ascii_digit()),
            Guard::NotWord => !(c.is_alphanumeric() || c == '_'),
            Guard::NotDigit => !is_decimal_digit(c),
        }
    }
}

/// Post-match filter dropping candidates that are syntactically valid but not PII
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// RFC 1918 ranges and the loopback address
    PrivateNetwork,
}

impl Exclusion {
    pub fn excludes(self, matched_text: &str) -> bool {
        match self {
            Exclusion::PrivateNetwork => is_private_network(matched_text),
        }
    }
}

fn is_private_network(address: &str) -> bool {
    let octets: Vec<u16> = match address.split('.').map(str::parse::<u16>).collect() {
        Ok(octets) => octets,
        Err(_) => return false,
    };
    matches!(
        octets.as_slice(),
        [10, _, _, _] | [192, 168, _, _] | [127, 0, 0, 1]
    ) || matches!(octets.as_slice(), [172, second, _, _] if (16..=31).contains(second))
}

struct MatcherDefinition {
    category: Category,
    pattern: &'static str,
    leading: Option<Guard>,
    trailing: Option<Guard>,
    exclusion: Option<Exclusion>,
}

const fn plain(category: Category, pattern: &'static str) -> MatcherDefinition {
    MatcherDefinition {
        category,
        pattern,
        leading: None,
        trailing: None,
        exclusion: None,
    }
}

// Trailing "not a word character" guards are written as `\b` where the match
// always ends in a word character; the guards only cover the rest.
const DEFINITIONS: [MatcherDefinition; 11] = [
    MatcherDefinition {
        category: Category::Pan,
        pattern: r"[A-Z]{5}[0-9]{4}[A-Z]",
        leading: Some(Guard::NotUpperAlnum),
        trailing: Some(Guard::NotUpperAlnum),
        exclusion: None,
    },
    MatcherDefinition {
        category: Category::Email,
        pattern: r"[\w.-]+@[\w.-]+\.[a-zA-Z]{2,10}\b",
        leading: Some(Guard::NotWord),
        trailing: None,
        exclusion: None,
    },
    MatcherDefinition {
        category: Category::Mobile,
        pattern: r"(?:\+91[-\s]?|91[-\s]?|91|0)?[6-9]\d{9}",
        leading: Some(Guard::NotDigit),
        trailing: Some(Guard::NotDigit),
        exclusion: None,
    },
    MatcherDefinition {
        category: Category::Upi,
        pattern: r"[a-zA-Z0-9._-]{2,256}@[a-zA-Z0-9]{2,64}\b",
        leading: Some(Guard::NotWord),
        trailing: None,
        exclusion: None,
    },
    plain(Category::Mac, r"(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}"),
    MatcherDefinition {
        category: Category::Ip,
        pattern: r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b",
        leading: None,
        trailing: None,
        exclusion: Some(Exclusion::PrivateNetwork),
    },
    plain(Category::Coordinates, r"-?\d{1,3}\.\d+,\s*-?\d{1,3}\.\d+"),
    plain(Category::CardNumber, r"(?:\d{4}[-\s]?){3}\d{4}|\d{15,16}"),
    plain(Category::Gstin, r"\d{2}[A-Z]{5}\d{4}[A-Z][A-Z\d]Z[A-Z\d]"),
    plain(Category::DlNumber, r"[A-Z]{2}\d{2}[-\s]?\d{11}"),
    plain(Category::VoterId, r"[A-Z]{3}[0-9]{7}"),
];

/// A compiled matcher for one structured category
#[derive(Debug, Clone)]
pub struct StructuredMatcher {
    category: Category,
    regex: Regex,
    leading: Option<Guard>,
    trailing: Option<Guard>,
    exclusion: Option<Exclusion>,
}

impl StructuredMatcher {
    fn compile(definition: &MatcherDefinition) -> Result<Self> {
        let regex = Regex::new(definition.pattern).map_err(|source| ScanError::InvalidPattern {
            category: definition.category,
            source,
        })?;
        Ok(Self {
            category: definition.category,
            regex,
            leading: definition.leading,
            trailing: definition.trailing,
            exclusion: definition.exclusion,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn exclusion(&self) -> Option<Exclusion> {
        self.exclusion
    }

    /// Whether the exclusion predicate rejects `matched_text`
    pub fn excludes(&self, matched_text: &str) -> bool {
        self.exclusion.is_some_and(|e| e.excludes(matched_text))
    }

    /// Every non-overlapping candidate in `line` that passes the guards.
    /// Exclusions are not applied here.
    pub fn find_iter<'m, 't>(&'m self, line: &'t str) -> GuardedMatches<'m, 't> {
        GuardedMatches {
            matcher: self,
            line,
            pos: 0,
        }
    }

    fn guards_allow(&self, line: &str, start: usize, end: usize) -> bool {
        let before = line[..start].chars().next_back();
        let after = line[end..].chars().next();
        self.leading.map_or(true, |g| g.allows(before))
            && self.trailing.map_or(true, |g| g.allows(after))
    }
}

/// Iterator over guarded matches of a [`StructuredMatcher`] within one line
#[derive(Debug)]
pub struct GuardedMatches<'m, 't> {
    matcher: &'m StructuredMatcher,
    line: &'t str,
    pos: usize,
}

impl<'m, 't> Iterator for GuardedMatches<'m, 't> {
    type Item = (Span, &'t str);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos <= self.line.len() {
            let m: Match<'t> = self.matcher.regex.find_at(self.line, self.pos)?;
            if self.matcher.guards_allow(self.line, m.start(), m.end()) {
                self.pos = if m.end() > m.start() {
                    m.end()
                } else {
                    next_char_boundary(self.line, m.end())
                };
                return Some((Span::new(m.start(), m.end()), m.as_str()));
            }
            trace!(
                "{} candidate '{}' rejected by guard",
                self.matcher.category,
                m.as_str()
            );
            self.pos = next_char_boundary(self.line, m.start());
        }
        None
    }
}

fn next_char_boundary(line: &str, pos: usize) -> usize {
    pos + line[pos..].chars().next().map_or(1, char::len_utf8)
}

/// The ordered set of structured matchers
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    matchers: Vec<StructuredMatcher>,
}

impl PatternCatalog {
    pub fn new() -> Result<Self> {
        Self::build(|_| true)
    }

    pub fn with_categories(categories: &[Category]) -> Result<Self> {
        Self::build(|c| categories.contains(&c))
    }

    fn build(mut keep: impl FnMut(Category) -> bool) -> Result<Self> {
        let matchers = DEFINITIONS
            .iter()
            .filter(|d| keep(d.category))
            .map(StructuredMatcher::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { matchers })
    }

    pub fn matchers(&self) -> &[StructuredMatcher] {
        &self.matchers
    }

    pub fn get(&self, category: Category) -> Option<&StructuredMatcher> {
        self.matchers.iter().find(|m| m.category == category)
    }

    /// Exclusion predicate for `category`; categories without one never exclude
    pub fn excludes(&self, category: Category, matched_text: &str) -> bool {
        self.get(category)
            .is_some_and(|m| m.excludes(matched_text))
    }
}
