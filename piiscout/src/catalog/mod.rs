/// The fixed PII taxonomy and the compiled matchers behind it.
///
/// Every category is either *structured* (a regex plus optional guards and an
/// optional exclusion predicate, see [`patterns`]) or a *keyword hint* (an
/// ordered list of separator-tolerant phrases, see [`keywords`]). The
/// declaration order of [`Category`] is the catalog order: it decides the order
/// in which matchers run on a line and the order categories appear in results.
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{Result, ScanError};

pub mod keywords;
pub mod patterns;

pub use keywords::{KeywordCatalog, KeywordSet};
pub use patterns::{Exclusion, Guard, PatternCatalog, StructuredMatcher};

static SHARED_CATALOG: OnceCell<Arc<Catalog>> = OnceCell::new();

/// A named PII category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "PAN")]
    Pan,
    Email,
    Mobile,
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "MAC")]
    Mac,
    #[serde(rename = "IP")]
    Ip,
    Coordinates,
    CardNumber,
    #[serde(rename = "GSTIN")]
    Gstin,
    #[serde(rename = "DLNumber")]
    DlNumber,
    #[serde(rename = "VoterID")]
    VoterId,
    Address,
    Name,
    DateOfBirth,
    AccountNumber,
    #[serde(rename = "CustomerID")]
    CustomerId,
    SensitiveIdentifierHint,
    InsurancePolicy,
}

/// How a category is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Structured,
    Keyword,
}

impl Category {
    /// Every category, in catalog order
    pub const ALL: [Category; 18] = [
        Category::Pan,
        Category::Email,
        Category::Mobile,
        Category::Upi,
        Category::Mac,
        Category::Ip,
        Category::Coordinates,
        Category::CardNumber,
        Category::Gstin,
        Category::DlNumber,
        Category::VoterId,
        Category::Address,
        Category::Name,
        Category::DateOfBirth,
        Category::AccountNumber,
        Category::CustomerId,
        Category::SensitiveIdentifierHint,
        Category::InsurancePolicy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Pan => "PAN",
            Category::Email => "Email",
            Category::Mobile => "Mobile",
            Category::Upi => "UPI",
            Category::Mac => "MAC",
            Category::Ip => "IP",
            Category::Coordinates => "Coordinates",
            Category::CardNumber => "CardNumber",
            Category::Gstin => "GSTIN",
            Category::DlNumber => "DLNumber",
            Category::VoterId => "VoterID",
            Category::Address => "Address",
            Category::Name => "Name",
            Category::DateOfBirth => "DateOfBirth",
            Category::AccountNumber => "AccountNumber",
            Category::CustomerId => "CustomerID",
            Category::SensitiveIdentifierHint => "SensitiveIdentifierHint",
            Category::InsurancePolicy => "InsurancePolicy",
        }
    }

    pub fn kind(self) -> CategoryKind {
        match self {
            Category::Address
            | Category::Name
            | Category::DateOfBirth
            | Category::AccountNumber
            | Category::CustomerId
            | Category::SensitiveIdentifierHint
            | Category::InsurancePolicy => CategoryKind::Keyword,
            _ => CategoryKind::Structured,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ScanError;

    /// Parses a category name, ignoring case
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ScanError::config_error(format!("Unknown category: {}", wanted)))
    }
}

/// Both catalogs, restricted to the active categories
#[derive(Debug, Clone)]
pub struct Catalog {
    patterns: PatternCatalog,
    keywords: KeywordCatalog,
}

impl Catalog {
    /// Compiles the full catalog
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: PatternCatalog::new()?,
            keywords: KeywordCatalog::new()?,
        })
    }

    /// Compiles a catalog holding only `categories`; catalog order is kept
    /// whatever order they are given in.
    pub fn with_categories(categories: &[Category]) -> Result<Self> {
        if categories.is_empty() {
            return Err(ScanError::config_error("At least one category must be active"));
        }
        debug!("Building catalog restricted to {:?}", categories);
        Ok(Self {
            patterns: PatternCatalog::with_categories(categories)?,
            keywords: KeywordCatalog::with_categories(categories)?,
        })
    }

    /// The full catalog, compiled once per process
    pub fn shared() -> Result<Arc<Catalog>> {
        SHARED_CATALOG
            .get_or_try_init(|| Catalog::new().map(Arc::new))
            .cloned()
    }

    pub fn patterns(&self) -> &PatternCatalog {
        &self.patterns
    }

    pub fn keywords(&self) -> &KeywordCatalog {
        &self.keywords
    }

    /// Active categories in catalog order
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.patterns
            .matchers()
            .iter()
            .map(StructuredMatcher::category)
            .chain(self.keywords.sets().iter().map(KeywordSet::category))
    }

    pub fn contains(&self, category: Category) -> bool {
        self.categories().any(|c| c == category)
    }

    pub fn len(&self) -> usize {
        self.patterns.matchers().len() + self.keywords.sets().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
