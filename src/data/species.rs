//! Lipid species name parsing.
//!
//! Acquisition software reports species as e.g. `PC 34:1`, `TG 52:3` or
//! `PE O-36:4`. Only the first `<carbon>:<double bonds>` token is read: for
//! sum-composition names that is the total, for chain-resolved names such as
//! `TG 16:0_18:1_18:2` it is the first chain only.

use std::sync::OnceLock;

use regex::Regex;

/// Carbon and double-bond counts from the first composition token of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainComposition {
    pub carbon: i64,
    pub double_bonds: i64,
}

fn composition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+):(\d+)").expect("valid regex"))
}

/// Parse the first `<digits>:<digits>` token of a species name.
pub fn parse_composition(name: &str) -> Option<ChainComposition> {
    let caps = composition_pattern().captures(name)?;
    let carbon = caps.get(1)?.as_str().parse().ok()?;
    let double_bonds = caps.get(2)?.as_str().parse().ok()?;
    Some(ChainComposition {
        carbon,
        double_bonds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_names() {
        assert_eq!(
            parse_composition("PC 34:1"),
            Some(ChainComposition { carbon: 34, double_bonds: 1 })
        );
        assert_eq!(
            parse_composition("PE O-36:4"),
            Some(ChainComposition { carbon: 36, double_bonds: 4 })
        );
        assert_eq!(
            parse_composition("PC34:1"),
            Some(ChainComposition { carbon: 34, double_bonds: 1 })
        );
    }

    #[test]
    fn chain_resolved_names_yield_the_first_chain() {
        assert_eq!(
            parse_composition("TG 16:0_18:1_18:2"),
            Some(ChainComposition { carbon: 16, double_bonds: 0 })
        );
    }

    #[test]
    fn rejects_names_without_composition() {
        assert_eq!(parse_composition("Unknown"), None);
        assert_eq!(parse_composition("PC 34"), None);
    }
}
