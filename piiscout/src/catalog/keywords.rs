use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};

use super::Category;
use crate::errors::{Result, ScanError};

/// Any run of these may stand in for the whitespace inside a keyword phrase
const SEPARATOR_RUN: &str = r"[\s._-]*";

// Lists run from specific compound phrases to generic words: the first phrase
// that matches is the one reported for the line.
const ADDRESS: &[&str] = &[
    "full address",
    "complete address",
    "residential address",
    "permanent address",
    "current address",
    "correspondence address",
    "present address",
    "mailing address",
    "billing address",
    "shipping address",
    "registered address",
    "home address",
    "office address",
    "work address",
    "business address",
    "shop address",
    "delivery address",
    "native address",
    "address line1",
    "address line2",
    "address",
    "house no",
    "building name",
    "flat no",
    "apartment",
    "door number",
    "plot no",
    "unit number",
    "street name",
    "street",
    "road",
    "lane",
    "locality",
    "colony",
    "sector",
    "village",
    "district",
    "taluk",
    "mandal",
    "tehsil",
    "municipality",
    "town",
    "city",
    "state",
    "region",
    "zone",
    "division",
    "province",
    "pincode",
    "postal code",
    "zip code",
    "zip",
    "pin",
    "area",
    "block",
    "floor",
    "tower",
    "geo location",
    "location",
    "place",
    "addr1",
    "addr2",
    "addr",
];

const NAME: &[&str] = &["name"];

const DATE_OF_BIRTH: &[&str] = &[
    "date of birth",
    "birth date",
    "birth day",
    "born on",
    "d.o.b",
    "dob",
    "birth",
];

const ACCOUNT_NUMBER: &[&str] = &[
    "beneficiary account number",
    "bank account number",
    "account number",
    "acc number",
    "acct number",
    "a/c number",
    "account no",
    "acc no",
    "a/c no",
    "accountnumbr",
    "accountnum",
    "account id",
    "beneficiary account",
    "beneficiary acct",
    "beneficiary acc",
    "credited to account",
    "debited from account",
    "receiving account",
    "sender account",
    "payee account",
    "receiver account",
    "to account",
    "from account",
    "bank account",
    "account",
];

const CUSTOMER_ID: &[&str] = &[
    "customer id number",
    "cust id number",
    "customer id",
    "cust id",
    "customer number",
    "cust number",
    "customer no",
    "cust no",
];

const SENSITIVE_IDENTIFIER_HINT: &[&str] = &[
    "national identification number",
    "national id",
    "natl id",
    "document number",
    "doc number",
    "document id",
    "doc id",
    "identity document",
    "identity card",
    "identity no",
    "identification card",
    "id proof",
    "proof of identity",
    "proof of address",
    "address proof",
    "poi",
    "poa",
];

const INSURANCE_POLICY: &[&str] = &[
    "insurance policy",
    "insurance number",
    "insurance id",
    "insurance no",
    "policy number",
    "policy no",
    "policy id",
    "ins id",
    "insurance",
];

const GROUPS: [(Category, &[&str]); 7] = [
    (Category::Address, ADDRESS),
    (Category::Name, NAME),
    (Category::DateOfBirth, DATE_OF_BIRTH),
    (Category::AccountNumber, ACCOUNT_NUMBER),
    (Category::CustomerId, CUSTOMER_ID),
    (Category::SensitiveIdentifierHint, SENSITIVE_IDENTIFIER_HINT),
    (Category::InsurancePolicy, INSURANCE_POLICY),
];

/// Builds the regex source for a keyword phrase: words are escaped literally
/// and the gaps between them accept any run of space, dot, underscore or hyphen.
pub fn keyword_pattern(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(SEPARATOR_RUN)
}

/// The keyword that fired for a line and the text it matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordHit<'t> {
    pub keyword: &'static str,
    pub text: &'t str,
}

/// Ordered keyword phrases for one hint category
#[derive(Debug, Clone)]
pub struct KeywordSet {
    category: Category,
    phrases: &'static [&'static str],
    // The set answers "which phrases occur" in one pass; the lowest index wins
    // and its own regex then locates the text.
    set: RegexSet,
    regexes: Vec<Regex>,
}

impl KeywordSet {
    fn compile(category: Category, phrases: &'static [&'static str]) -> Result<Self> {
        let invalid = |source| ScanError::InvalidPattern { category, source };
        let patterns: Vec<String> = phrases.iter().map(|p| keyword_pattern(p)).collect();

        let set = RegexSetBuilder::new(&patterns)
            .case_insensitive(true)
            .build()
            .map_err(invalid)?;
        let regexes = patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(invalid)?;

        Ok(Self {
            category,
            phrases,
            set,
            regexes,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn phrases(&self) -> &'static [&'static str] {
        self.phrases
    }

    /// The first phrase, in list order, that occurs anywhere in `line`
    pub fn first_match<'t>(&self, line: &'t str) -> Option<KeywordHit<'t>> {
        let index = self.set.matches(line).into_iter().next()?;
        let found = self.regexes[index].find(line)?;
        Some(KeywordHit {
            keyword: self.phrases[index],
            text: found.as_str(),
        })
    }
}

/// All keyword hint categories
#[derive(Debug, Clone)]
pub struct KeywordCatalog {
    sets: Vec<KeywordSet>,
}

impl KeywordCatalog {
    pub fn new() -> Result<Self> {
        Self::build(|_| true)
    }

    pub fn with_categories(categories: &[Category]) -> Result<Self> {
        Self::build(|c| categories.contains(&c))
    }

    fn build(mut keep: impl FnMut(Category) -> bool) -> Result<Self> {
        let sets = GROUPS
            .iter()
            .filter(|(category, _)| keep(*category))
            .map(|&(category, phrases)| KeywordSet::compile(category, phrases))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sets })
    }

    pub fn sets(&self) -> &[KeywordSet] {
        &self.sets
    }

    pub fn get(&self, category: Category) -> Option<&KeywordSet> {
        self.sets.iter().find(|s| s.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(category: Category, line: &str) -> Option<(&'static str, String)> {
        let catalog = KeywordCatalog::new().unwrap();
        catalog
            .get(category)
            .unwrap()
            .first_match(line)
            .map(|h| (h.keyword, h.text.to_string()))
    }

    #[test]
    fn test_keyword_pattern() {
        assert_eq!(
            keyword_pattern("date of birth"),
            r"date[\s._-]*of[\s._-]*birth"
        );
        assert_eq!(keyword_pattern("d.o.b"), r"d\.o\.b");
        assert_eq!(keyword_pattern("a/c  no"), r"a/c[\s._-]*no");
    }

    #[test]
    fn test_separator_tolerance() {
        for line in [
            "date of birth: 1990-01-01",
            "date_of_birth=1990-01-01",
            "date-of-birth 1990",
            "date.of.birth",
            "dateofbirth",
            "DATE__OF  BIRTH",
        ] {
            let (keyword, _) = hit(Category::DateOfBirth, line).unwrap();
            assert_eq!(keyword, "date of birth", "line: {}", line);
        }
    }

    #[test]
    fn test_specific_variant_beats_generic_substring() {
        let (keyword, text) = hit(
            Category::Address,
            "Please update your home_address to 221B Baker Street",
        )
        .unwrap();
        assert_eq!(keyword, "home address");
        assert_eq!(text, "home_address");
    }

    #[test]
    fn test_list_order_beats_line_position() {
        let (keyword, text) =
            hit(Category::DateOfBirth, "born on 1 Jan, Birth-Date unknown").unwrap();
        assert_eq!(keyword, "birth date");
        assert_eq!(text, "Birth-Date");
    }

    #[test]
    fn test_matched_text_keeps_original_casing() {
        let (_, text) = hit(Category::CustomerId, "CUST_ID: 99812").unwrap();
        assert_eq!(text, "CUST_ID");
        let (_, text) = hit(Category::InsurancePolicy, "Policy No. 55-1").unwrap();
        assert_eq!(text, "Policy No");
    }

    #[test]
    fn test_categories_without_hits() {
        assert!(hit(Category::Name, "nothing to see").is_none());
        assert!(hit(Category::AccountNumber, "balance 5000").is_none());
        assert!(hit(Category::SensitiveIdentifierHint, "hello world").is_none());
    }

    #[test]
    fn test_account_variants() {
        assert_eq!(
            hit(Category::AccountNumber, "A/C No: 0012").unwrap().0,
            "a/c no"
        );
        assert_eq!(
            hit(Category::AccountNumber, "bank_account_number=1").unwrap().0,
            "bank account number"
        );
    }

    #[test]
    fn test_every_group_compiles_in_catalog_order() {
        let catalog = KeywordCatalog::new().unwrap();
        let categories: Vec<_> = catalog.sets().iter().map(KeywordSet::category).collect();
        assert_eq!(
            categories,
            vec![
                Category::Address,
                Category::Name,
                Category::DateOfBirth,
                Category::AccountNumber,
                Category::CustomerId,
                Category::SensitiveIdentifierHint,
                Category::InsurancePolicy,
            ]
        );
        for set in catalog.sets() {
            assert!(!set.phrases().is_empty());
        }
    }
}
