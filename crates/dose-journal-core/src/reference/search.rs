//! Substance search by name, common name and category.
//!
//! Ranking:
//! - exact or prefix match on a name: 1.0
//! - exact category match: 0.9
//! - otherwise the best fuzzy similarity over all names, if above the threshold

use strsim::{jaro_winkler, normalized_levenshtein};

use super::SubstanceFile;
use crate::models::Substance;

const CATEGORY_SCORE: f64 = 0.9;

/// How a search hit matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Prefix,
    Category,
    Fuzzy,
    /// Empty query, every substance is listed
    Listing,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub substance: &'a Substance,
    pub score: f64,
    pub kind: MatchKind,
}

impl SubstanceFile {
    /// Search substances, best hits first.
    pub fn search(&self, query: &str, threshold: f64) -> Vec<SearchHit<'_>> {
        let query = query.trim().to_lowercase();

        let mut hits: Vec<SearchHit> = if query.is_empty() {
            self.substances
                .iter()
                .map(|substance| SearchHit {
                    substance,
                    score: 1.0,
                    kind: MatchKind::Listing,
                })
                .collect()
        } else {
            self.substances
                .iter()
                .filter_map(|substance| score_substance(substance, &query, threshold))
                .collect()
        };

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.substance.name.to_lowercase().cmp(&b.substance.name.to_lowercase()))
        });
        hits
    }
}

fn score_substance<'a>(substance: &'a Substance, query: &str, threshold: f64) -> Option<SearchHit<'a>> {
    let names: Vec<String> = std::iter::once(&substance.name)
        .chain(substance.common_names.iter())
        .map(|n| n.to_lowercase())
        .collect();

    let hit = |score, kind| Some(SearchHit { substance, score, kind });

    if names.iter().any(|n| n == query) {
        return hit(1.0, MatchKind::Exact);
    }
    if names.iter().any(|n| n.starts_with(query)) {
        return hit(1.0, MatchKind::Prefix);
    }
    if substance.is_in_category(query) {
        return hit(CATEGORY_SCORE, MatchKind::Category);
    }

    let best = names
        .iter()
        .map(|n| fuzzy_match(query, n))
        .fold(0.0, f64::max);
    if best >= threshold {
        hit(best, MatchKind::Fuzzy)
    } else {
        None
    }
}

/// Compute fuzzy string similarity using combined metrics.
pub fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler favours shared prefixes, Levenshtein overall similarity
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SubstanceFile {
        let mut mdma = Substance::new("MDMA");
        mdma.common_names = vec!["Molly".into(), "Ecstasy".into()];
        mdma.categories = vec!["entactogen".into()];

        let mut mda = Substance::new("MDA");
        mda.categories = vec!["entactogen".into(), "psychedelic".into()];

        let mut ketamine = Substance::new("Ketamine");
        ketamine.categories = vec!["dissociative".into()];

        SubstanceFile::new(vec![], vec![ketamine, mdma, mda])
    }

    #[test]
    fn test_exact_beats_prefix() {
        let file = setup();
        let hits = file.search("MDA", 0.75);

        assert_eq!(hits[0].substance.name, "MDA");
        assert_eq!(hits[0].kind, MatchKind::Exact);
        assert_eq!(hits[1].substance.name, "MDMA");
        assert_eq!(hits[1].kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_common_name_prefix() {
        let file = setup();
        let hits = file.search("moll", 0.75);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].substance.name, "MDMA");
        assert_eq!(hits[0].kind, MatchKind::Prefix);
    }

    #[test]
    fn test_category_search() {
        let file = setup();
        let hits = file.search("Entactogen", 0.75);
        let names: Vec<&str> = hits.iter().map(|h| h.substance.name.as_str()).collect();
        assert_eq!(names, vec!["MDA", "MDMA"]);
        assert!(hits.iter().all(|h| h.kind == MatchKind::Category));
    }

    #[test]
    fn test_typo() {
        let file = setup();
        let hits = file.search("ketamin", 0.75);
        assert_eq!(hits[0].substance.name, "Ketamine");

        let hits = file.search("ketamime", 0.75);
        assert_eq!(hits[0].substance.name, "Ketamine");
        assert_eq!(hits[0].kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_empty_query_lists_all() {
        let file = setup();
        let names: Vec<&str> = file
            .search("  ", 0.75)
            .iter()
            .map(|h| h.substance.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ketamine", "MDA", "MDMA"]);
    }

    #[test]
    fn test_unrelated_query() {
        let file = setup();
        assert!(file.search("zzzzzz", 0.75).is_empty());
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(fuzzy_match("ketamine", "ketamine") > 0.99);
        assert!(fuzzy_match("ketamine", "ketamime") > 0.85);
        assert!(fuzzy_match("ketamine", "caffeine") < 0.75);
    }
}
