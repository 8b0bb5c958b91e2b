//! Interaction expansion and alerts.
//!
//! Reference interaction lists mix substance names, category names and
//! wildcard names (`2C-x`, `DOx`). Expansion turns them into plain substance
//! names, one tier at a time in the order dangerous → unsafe → uncertain:
//!
//! 1. category entries are replaced by the category's members
//! 2. wildcard entries are replaced by every known substance they match
//! 3. in bidirectional mode, substances whose own same-tier list names this
//!    substance (directly, by one of its categories, or by wildcard) are added
//! 4. names already reported at a higher tier are dropped
//! 5. the substance itself is dropped
//!
//! Unknown names are kept as-is. Names are compared case-insensitively.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Ingestion, InteractionLists, InteractionSeverity, Substance};

/// Category name → names of the substances in it.
pub type CategoryMembership = HashMap<String, Vec<String>>;

/// Another substance's interaction lists, for wildcard and reverse lookups.
#[derive(Debug, Clone, Copy)]
pub struct InteractionSource<'a> {
    pub name: &'a str,
    pub categories: &'a [String],
    pub lists: &'a InteractionLists,
}

/// Expand one substance's interaction lists.
///
/// `known` is the universe of substances used to resolve wildcards and, when
/// `bidirectional` is set, to find substances that list this one.
pub fn expand_interactions(
    substance_name: &str,
    own_categories: &[String],
    lists: &InteractionLists,
    category_membership: &CategoryMembership,
    known: &[InteractionSource<'_>],
    bidirectional: bool,
) -> InteractionLists {
    let categories = lowercase_keys(category_membership);
    let self_key = substance_name.to_lowercase();
    let mut reported: HashSet<String> = HashSet::from([self_key.clone()]);
    let mut expanded = InteractionLists::default();

    for severity in InteractionSeverity::ALL {
        let mut candidates: Vec<&str> = Vec::new();

        for entry in lists.get(severity) {
            if let Some(members) = categories.get(&entry.to_lowercase()) {
                candidates.extend(members.iter().map(String::as_str));
            } else if let Some(pattern) = Wildcard::parse(entry) {
                let matches: Vec<&str> = known
                    .iter()
                    .map(|source| source.name)
                    .filter(|name| pattern.matches(name))
                    .collect();
                if matches.is_empty() {
                    debug!(substance = substance_name, entry = %entry, "wildcard matched no known substance");
                    candidates.push(entry);
                } else {
                    candidates.extend(matches);
                }
            } else {
                candidates.push(entry);
            }
        }

        if bidirectional {
            candidates.extend(
                known
                    .iter()
                    .filter(|source| source.lists.get(severity).iter().any(|entry| {
                        names_substance(entry, substance_name, own_categories)
                    }))
                    .map(|source| source.name),
            );
        }

        let tier = expanded.get_mut(severity);
        for name in candidates {
            if reported.insert(name.to_lowercase()) {
                tier.push(name.to_string());
            }
        }
    }

    expanded
}

/// Whether an interaction entry refers to the given substance.
fn names_substance(entry: &str, substance_name: &str, categories: &[String]) -> bool {
    let lower = entry.to_lowercase();
    lower == substance_name.to_lowercase()
        || categories.iter().any(|c| c.to_lowercase() == lower)
        || Wildcard::parse(entry).is_some_and(|pattern| pattern.matches(substance_name))
}

fn lowercase_keys(membership: &CategoryMembership) -> HashMap<String, &Vec<String>> {
    membership
        .iter()
        .map(|(name, members)| (name.to_lowercase(), members))
        .collect()
}

/// A substance name where a standalone lowercase `x` stands for any run of
/// non-whitespace characters (`2C-x` matches `2C-B`, `DOx` matches `DOM`).
#[derive(Debug, Clone, PartialEq)]
struct Wildcard {
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Literal(char),
    Any,
}

impl Wildcard {
    fn parse(entry: &str) -> Option<Self> {
        let chars: Vec<char> = entry.chars().collect();
        let mut has_wildcard = false;
        let tokens = chars
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let prev_lower = i > 0 && chars[i - 1].is_lowercase();
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if c == 'x' && !prev_lower && !next_lower {
                    has_wildcard = true;
                    Token::Any
                } else {
                    Token::Literal(c.to_lowercase().next().unwrap_or(c))
                }
            })
            .collect();

        has_wildcard.then_some(Self { tokens })
    }

    fn matches(&self, name: &str) -> bool {
        let chars: Vec<char> = name
            .chars()
            .map(|c| c.to_lowercase().next().unwrap_or(c))
            .collect();
        match_tokens(&self.tokens, &chars)
    }
}

fn match_tokens(tokens: &[Token], chars: &[char]) -> bool {
    match tokens.split_first() {
        None => chars.is_empty(),
        Some((Token::Literal(c), rest)) => {
            chars.first() == Some(c) && match_tokens(rest, &chars[1..])
        }
        Some((Token::Any, rest)) => (1..=chars.len())
            .take_while(|&n| !chars[n - 1].is_whitespace())
            .any(|n| match_tokens(rest, &chars[n..])),
    }
}

/// Precomputed lookups for expanding any substance of a reference dataset.
pub struct InteractionExpander<'a> {
    category_membership: &'a CategoryMembership,
    sources: Vec<InteractionSource<'a>>,
    bidirectional: bool,
}

impl<'a> InteractionExpander<'a> {
    /// Build from a substance list and its category membership.
    pub fn new(
        substances: &'a [Substance],
        category_membership: &'a CategoryMembership,
        bidirectional: bool,
    ) -> Self {
        static EMPTY: InteractionLists = InteractionLists {
            dangerous: Vec::new(),
            unsafe_: Vec::new(),
            uncertain: Vec::new(),
        };
        let sources = substances
            .iter()
            .map(|s| InteractionSource {
                name: &s.name,
                categories: &s.categories,
                lists: s.interactions.as_ref().unwrap_or(&EMPTY),
            })
            .collect();

        Self {
            category_membership,
            sources,
            bidirectional,
        }
    }

    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    /// Expanded lists for a substance. Empty when it has no interaction data
    /// and nothing refers to it.
    pub fn expand(&self, substance: &Substance) -> InteractionLists {
        let lists = substance.interactions.clone().unwrap_or_default();
        self.expand_lists(&substance.name, &substance.categories, &lists)
    }

    /// Expand arbitrary lists as if they belonged to the named substance.
    pub fn expand_lists(
        &self,
        substance_name: &str,
        own_categories: &[String],
        lists: &InteractionLists,
    ) -> InteractionLists {
        expand_interactions(
            substance_name,
            own_categories,
            lists,
            self.category_membership,
            &self.sources,
            self.bidirectional,
        )
    }

    pub fn category_membership(&self) -> &CategoryMembership {
        self.category_membership
    }
}

/// `now - lookback`, clamped to the earliest representable time.
pub fn lookback_cutoff(now: DateTime<Utc>, lookback: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(lookback).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// A recently ingested substance that interacts with the one being checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionAlert {
    pub severity: InteractionSeverity,
    pub with_substance: String,
    pub last_ingested: DateTime<Utc>,
}

/// Match ingestions since `now - lookback` against expanded interaction lists.
///
/// One alert per interacting substance, using its latest ingestion time,
/// ordered by severity and then name.
pub fn check_recent(
    substance_name: &str,
    expanded: &InteractionLists,
    ingestions: &[Ingestion],
    now: DateTime<Utc>,
    lookback: Duration,
) -> Vec<InteractionAlert> {
    let cutoff = lookback_cutoff(now, lookback);
    let mut latest: HashMap<String, (&str, DateTime<Utc>)> = HashMap::new();

    for ingestion in ingestions.iter().filter(|i| i.time >= cutoff) {
        if ingestion.substance_name.to_lowercase() == substance_name.to_lowercase() {
            continue;
        }
        let current = (ingestion.substance_name.as_str(), ingestion.time);
        let entry = latest
            .entry(ingestion.substance_name.to_lowercase())
            .or_insert(current);
        // the alert names the substance as spelled in its latest ingestion
        if ingestion.time > entry.1 {
            *entry = current;
        }
    }

    let mut alerts: Vec<InteractionAlert> = latest
        .into_values()
        .filter_map(|(name, time)| {
            severity_of(expanded, name).map(|severity| InteractionAlert {
                severity,
                with_substance: name.to_string(),
                last_ingested: time,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.with_substance.cmp(&b.with_substance))
    });
    alerts
}

fn severity_of(lists: &InteractionLists, name: &str) -> Option<InteractionSeverity> {
    let lower = name.to_lowercase();
    InteractionSeverity::ALL
        .into_iter()
        .find(|severity| lists.get(*severity).iter().any(|n| n.to_lowercase() == lower))
}
