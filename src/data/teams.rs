//! Team identity matching across sources.
//!
//! basketball-reference, ESPN and the NBA live feed each abbreviate a few
//! franchises differently. Everything is mapped onto the NBA tricode.

/// Source-specific abbreviations → NBA tricode. No target appears as a key.
const TEAM_ALIASES: &[(&str, &str)] = &[
    // basketball-reference
    ("BRK", "BKN"),
    ("CHO", "CHA"),
    ("PHO", "PHX"),
    // ESPN
    ("GS", "GSW"),
    ("NY", "NYK"),
    ("NO", "NOP"),
    ("SA", "SAS"),
    ("UTAH", "UTA"),
    ("WSH", "WAS"),
    // legacy codes still seen on older pages
    ("NJN", "BKN"),
    ("NOH", "NOP"),
    ("CHH", "CHA"),
    ("SEA", "OKC"),
];

/// Uppercase, strip non-alphanumerics, then resolve aliases.
pub fn canonical_team_code(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    TEAM_ALIASES
        .iter()
        .find(|(alias, _)| *alias == cleaned)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(cleaned)
}

/// Order-independent key for a matchup: the two canonical codes, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let a = canonical_team_code(a);
        let b = canonical_team_code(b);
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_one_franchise() {
        assert_eq!(canonical_team_code("BRK"), canonical_team_code("BKN"));
        assert_eq!(canonical_team_code("CHO"), "CHA");
        assert_eq!(canonical_team_code("pho"), "PHX");
        assert_eq!(canonical_team_code("GS"), "GSW");
        assert_eq!(canonical_team_code("Utah"), "UTA");
        assert_eq!(canonical_team_code("WSH"), "WAS");
    }

    #[test]
    fn cleaning_strips_punctuation_and_case() {
        assert_eq!(canonical_team_code(" l.a.l "), "LAL");
        assert_eq!(canonical_team_code("n-y"), "NYK");
        assert_eq!(canonical_team_code(""), "");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let inputs = [
            "BRK", "BKN", "CHO", "PHO", "GS", "NY", "NO", "SA", "UTAH", "WSH", "NJN", "SEA", "lal",
            "b-o-s", "", "  ", "x1",
        ];
        for raw in inputs {
            let once = canonical_team_code(raw);
            assert_eq!(canonical_team_code(&once), once, "not idempotent for {raw:?}");
        }
        for (_, target) in TEAM_ALIASES {
            assert!(
                TEAM_ALIASES.iter().all(|(alias, _)| alias != target),
                "{target} is both an alias and a target"
            );
        }
    }

    #[test]
    fn pair_key_is_order_independent() {
        assert_eq!(PairKey::new("LAL", "BOS"), PairKey::new("BOS", "LAL"));
        assert_eq!(PairKey::new("BRK", "PHO"), PairKey::new("PHX", "BKN"));
        assert_ne!(PairKey::new("LAL", "BOS"), PairKey::new("LAC", "BOS"));
        assert_eq!(PairKey::new("BOS", "LAL").to_string(), "BOS|LAL");
    }
}
