use super::program::Program;

/// Splits a comma-separated interest list into lower-cased, non-blank tokens.
pub fn interest_tokens(interests: &str) -> Vec<String> {
    interests
        .split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Returns the programs with a keyword tag containing any interest token.
///
/// Matching is a case-insensitive substring test, so short tokens such as
/// `"ia"` also match tags like `"Matériaux"`. Catalog order is preserved.
pub fn recommend<'a>(programs: &'a [Program], interests: &str) -> Vec<&'a Program> {
    let tokens = interest_tokens(interests);
    if tokens.is_empty() {
        return Vec::new();
    }

    programs
        .iter()
        .filter(|program| {
            program.tags.iter().any(|tag| {
                let tag = tag.to_lowercase();
                tokens.iter().any(|token| tag.contains(token.as_str()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::program::{Currency, Fee, ProgramCatalog};
    use rust_decimal_macros::dec;

    fn program(code: &str, tags: &[&str]) -> Program {
        Program::new(
            code,
            code,
            "School",
            Fee::new(dec!(500)).unwrap(),
            Currency::mad(),
            tags,
        )
    }

    #[test]
    fn test_matches_tag_substring_case_insensitively() {
        let programs = vec![
            program("Info", &["Informatique", "IA", "Programmation"]),
            program("Civil", &["Construction", "BTP", "Environnement"]),
        ];

        let matches = recommend(&programs, "IA");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].code, "Info");
    }

    #[test]
    fn test_any_token_matches_and_order_is_kept() {
        let programs = vec![
            program("A", &["Energie"]),
            program("B", &["Logistique"]),
            program("C", &["Programmation"]),
        ];

        let codes: Vec<_> = recommend(&programs, " programmation , ENERGIE")
            .iter()
            .map(|p| p.code.as_str())
            .collect();
        assert_eq!(codes, ["A", "C"]);
    }

    #[test]
    fn test_short_tokens_match_inside_words() {
        let catalog = ProgramCatalog::default();
        let codes: Vec<_> = recommend(catalog.programs(), "ia")
            .iter()
            .map(|p| p.code.as_str())
            .collect();
        // "Matériaux" contains "ia" as well.
        assert_eq!(codes, ["Data", "Mechanique", "AI"]);
    }

    #[test]
    fn test_blank_interests_match_nothing() {
        let catalog = ProgramCatalog::default();
        assert!(recommend(catalog.programs(), "").is_empty());
        assert!(recommend(catalog.programs(), " , ,").is_empty());
    }

    #[test]
    fn test_no_match() {
        let catalog = ProgramCatalog::default();
        assert!(recommend(catalog.programs(), "médecine").is_empty());
    }
}
