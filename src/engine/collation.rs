//! Locale-aware string ordering for title sorts.

use icu_collator::{Collator, CollatorOptions};
use icu_locid::Locale;
use std::cmp::Ordering;

/// Locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "pt-BR";

/// Title comparison using the collation rules of a locale.
///
/// Falls back to a case-folded comparison when the locale cannot be
/// loaded, so sorting never fails.
pub struct Collation {
    locale: String,
    collator: Option<Collator>,
}

impl Collation {
    pub fn new(locale: &str) -> Self {
        let collator = match locale.parse::<Locale>() {
            Ok(parsed) => match Collator::try_new(&(&parsed).into(), CollatorOptions::new()) {
                Ok(collator) => Some(collator),
                Err(e) => {
                    tracing::warn!(locale, error = %e, "No collation data for locale, using case-folded order");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(locale, error = %e, "Invalid collation locale, using case-folded order");
                None
            }
        };

        Self {
            locale: locale.to_string(),
            collator,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Whether locale rules are in effect (as opposed to the fallback)
    pub fn is_localized(&self) -> bool {
        self.collator.is_some()
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => fallback_compare(a, b),
        }
    }
}

impl Default for Collation {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

impl std::fmt::Debug for Collation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collation")
            .field("locale", &self.locale)
            .field("localized", &self.is_localized())
            .finish()
    }
}

fn fallback_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accents_sort_with_base_letter() {
        let collation = Collation::default();
        // Code-point order would put "Á" after "Z"
        assert_eq!(collation.compare("Análise", "Zebra"), Ordering::Less);
        assert_eq!(collation.compare("Ética", "Estudos"), Ordering::Greater);
    }

    #[test]
    fn test_case_is_folded() {
        let collation = Collation::default();
        assert_eq!(collation.compare("corpus", "Discurso"), Ordering::Less);
    }

    #[test]
    fn test_invalid_locale_falls_back() {
        let collation = Collation::new("not a locale!");
        assert!(!collation.is_localized());
        assert_eq!(collation.compare("b", "A"), Ordering::Greater);
        assert_eq!(collation.compare("a", "B"), Ordering::Less);
    }
}
