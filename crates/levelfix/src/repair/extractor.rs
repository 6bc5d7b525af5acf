use regex::Regex;
use std::sync::LazyLock;

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("quoted pattern compiles"));

/// Canonical level shape: a single uppercase code, a dash, a free-text
/// label. Applied to quote content after trimming.
static CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[A-Z]\s*-\s*[^"]+$"#).expect("candidate pattern compiles"));

/// Scans the full text of a `Description` for a quoted "Code - Label"
/// value. When several quoted substrings qualify, the last occurrence
/// wins; observed exports append the authoritative value at the end.
pub(crate) fn extract_candidate(text: &str) -> Option<String> {
    QUOTED
        .captures_iter(text)
        .filter_map(|captures| {
            let content = captures.get(1)?.as_str().trim();
            CANDIDATE.is_match(content).then(|| content.to_string())
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_single_quoted_level() {
        assert_eq!(
            extract_candidate("Poste \"A - Peu Qualifié\" à pourvoir"),
            Some("A - Peu Qualifié".to_string())
        );
    }

    #[test]
    fn last_of_several_candidates_wins() {
        let text = "D'abord \"A - Peu Qualifié\", ensuite \"B - Qualifié\"";
        assert_eq!(extract_candidate(text), Some("B - Qualifié".to_string()));
    }

    #[test]
    fn quoted_text_without_the_level_shape_is_ignored() {
        assert_eq!(extract_candidate("Citation \"sans code\" ici"), None);
        assert_eq!(extract_candidate("Code minuscule \"a - niveau\""), None);
        assert_eq!(extract_candidate("Texte sans guillemets"), None);
    }

    #[test]
    fn non_candidate_quotes_do_not_shadow_an_earlier_match() {
        let text = "Niveau \"C - Très Qualifié\" selon la fiche \"voir annexe\"";
        assert_eq!(extract_candidate(text), Some("C - Très Qualifié".to_string()));
    }

    #[test]
    fn surrounding_whitespace_is_stripped_but_inner_kept() {
        assert_eq!(
            extract_candidate("Poste \"  B -  Qualifié confirmé \""),
            Some("B -  Qualifié confirmé".to_string())
        );
    }

    #[test]
    fn whitespace_around_dash_is_optional() {
        assert_eq!(
            extract_candidate("Niveau \"D-Expert\""),
            Some("D-Expert".to_string())
        );
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(extract_candidate(""), None);
    }
}
