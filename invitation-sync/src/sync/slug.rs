//! Slug generation for guest keys

use deunicode::deunicode;

/// Convert a display name to a URL-safe kebab-case slug.
///
/// Non-Latin text is transliterated to ASCII first, everything that is not
/// ASCII alphanumeric becomes a single hyphen, and hyphens never lead or trail.
///
/// Example: "Siti Nurhaliza, S.H." → "siti-nurhaliza-s-h"
pub fn slugify(name: &str) -> String {
    deunicode(name)
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
