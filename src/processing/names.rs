use crate::models::{MrzField, MrzFields};

pub struct NameNormalizer;

impl NameNormalizer {
    /// Clean an MRZ given-names value into display form.
    ///
    /// Keeps only `A-Z` and spaces, drops the trailing `K` run that OCR makes
    /// of `<` fillers, and collapses spaces. Null input gives an empty string.
    pub fn normalize_given_names(raw: Option<&str>) -> String {
        let filtered: String = raw
            .unwrap_or_default()
            .trim()
            .chars()
            .filter(|c| c.is_ascii_uppercase() || *c == ' ')
            .collect();

        let mut cleaned = filtered.trim();
        loop {
            let stripped = cleaned.trim_end_matches('K').trim();
            if stripped == cleaned {
                break;
            }
            cleaned = stripped;
        }

        cleaned.split_whitespace().collect::<Vec<&str>>().join(" ")
    }

    /// Copy of `mrz` with its given names normalized. Failed sets pass through.
    pub fn apply(mrz: &MrzFields) -> MrzFields {
        if mrz.is_failed() {
            return mrz.clone();
        }
        let names = Self::normalize_given_names(mrz.get(MrzField::GivenNames));
        mrz.clone().with(MrzField::GivenNames, Some(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        NameNormalizer::normalize_given_names(Some(raw))
    }

    #[test]
    fn trailing_filler_is_removed() {
        assert_eq!(normalize("JOHN KKKK"), "JOHN");
        assert_eq!(normalize("GILDONG KKKKKKKKKKKK  "), "GILDONG");
        assert_eq!(normalize("JOHN K K"), "JOHN");
    }

    #[test]
    fn digits_are_dropped_not_substituted() {
        assert_eq!(normalize("J0HN D0E"), "JHN DE");
        assert_ne!(normalize("J0HN  D0E"), "JOHN DOE");
    }

    #[test]
    fn lowercase_and_punctuation_are_dropped() {
        assert_eq!(normalize("  MARY-ANNE<<LEE "), "MARYANNELEE");
        assert_eq!(normalize("john SMITH"), "SMITH");
    }

    #[test]
    fn internal_spaces_collapse() {
        assert_eq!(normalize("MIN   JI  SOO"), "MIN JI SOO");
        assert_eq!(normalize("MIN 1 JI"), "MIN JI");
    }

    #[test]
    fn null_and_empty_give_empty_string() {
        assert_eq!(NameNormalizer::normalize_given_names(None), "");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("KKKK"), "");
        assert_eq!(normalize("1234"), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "JOHN KKKK",
            "JOHN K K",
            "J0HN  D0E",
            "  ERIK ",
            "A  B   C KK K",
            "K JOHN",
            "HONG<GIL<DONG<<<<",
            "홍길동 HONG",
            "",
            " K ",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn apply_replaces_only_given_names() {
        let mrz = MrzFields::new()
            .with(MrzField::Surname, Some("HONG".to_string()))
            .with(MrzField::GivenNames, Some("GILDONG KKKK".to_string()));
        let normalized = NameNormalizer::apply(&mrz);
        assert_eq!(normalized.get(MrzField::GivenNames), Some("GILDONG"));
        assert_eq!(normalized.get(MrzField::Surname), Some("HONG"));
    }

    #[test]
    fn apply_fills_missing_names_with_empty_string() {
        let normalized = NameNormalizer::apply(&MrzFields::new());
        assert_eq!(normalized.get(MrzField::GivenNames), Some(""));
    }

    #[test]
    fn apply_leaves_failed_set_alone() {
        let failed = MrzFields::failed("no valid MRZ found");
        assert_eq!(NameNormalizer::apply(&failed), failed);
    }
}
