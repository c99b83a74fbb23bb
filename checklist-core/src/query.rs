//! Free-text search over experiment descriptions.
//!
//! Terms separated by spaces must all match. Within a term, `|` separates
//! alternatives of which one must match, and a leading `-` negates an
//! alternative. Matching is case-insensitive substring containment.
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Alternative {
    needle: String,
    negated: bool,
}

impl Alternative {
    fn matches(&self, haystack: &str) -> bool {
        haystack.contains(self.needle.as_str()) != self.negated
    }
}

type Alternatives = SmallVec<[Alternative; 2]>;

/// Parsed search query; keeps the raw text it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    text: String,
    terms: Vec<Alternatives>,
}

impl SearchQuery {
    /// An empty alternative is contained in every description, so `"zzz|"`
    /// matches everything and a lone `"-"` matches nothing.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let terms = text
            .split(' ')
            .map(|term| {
                term.split('|')
                    .map(|alt| {
                        let (negated, needle) = match alt.strip_prefix('-') {
                            Some(rest) => (true, rest),
                            None => (false, alt),
                        };
                        Alternative {
                            needle: needle.to_lowercase(),
                            negated,
                        }
                    })
                    .collect::<Alternatives>()
            })
            .collect();
        Self {
            text: text.to_string(),
            terms,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when no query text was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn matches(&self, description: &str) -> bool {
        self.matches_lowercase(&description.to_lowercase())
    }

    /// Match against text that is already lower-cased.
    #[must_use]
    pub fn matches_lowercase(&self, haystack: &str) -> bool {
        self.terms
            .iter()
            .all(|alternatives| alternatives.iter().any(|alt| alt.matches(haystack)))
    }
}
