//! Slug derivation for workspace names.

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, strips diacritics-free non-alphanumerics, and collapses runs
/// of separators into single hyphens. `"Pet Shop  LTDA."` → `"pet-shop-ltda"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Pet Shop"), "pet-shop");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(slugify("Pet   Shop -- LTDA."), "pet-shop-ltda");
    }

    #[test]
    fn trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  Acme!  "), "acme");
    }

    #[test]
    fn empty_input_yields_empty_slug() {
        assert_eq!(slugify("...---"), "");
    }
}
