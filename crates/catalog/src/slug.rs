//! Course slug derivation.
//!
//! Slugs are derived from the English title, the organization name, and a
//! short id suffix, which makes them unique without a retry loop against the
//! store.

use coursehub_core::CourseId;

/// Derive the unique slug for a course.
pub fn derive(title_en: &str, organization_name: &str, id: CourseId) -> String {
    let id_str = id.to_string();
    // UUIDv7 front bytes are a timestamp; the tail is the random part.
    let suffix = &id_str[id_str.len() - 8..];

    let mut parts = Vec::with_capacity(3);
    for raw in [title_en, organization_name] {
        let s = slugify(raw);
        if !s.is_empty() {
            parts.push(s);
        }
    }
    parts.push(suffix.to_string());
    parts.join("-")
}

/// Lowercase, keep ASCII alphanumerics, collapse everything else to single
/// dashes. Non-ASCII (e.g. Myanmar script) is dropped; the id suffix keeps the
/// slug non-empty and unique regardless.
fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_dash = true;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_readable_slug() {
        let id = CourseId::new();
        let slug = derive("Intro to Photography!", "Bright Futures", id);
        assert!(slug.starts_with("intro-to-photography-bright-futures-"));
        let id_str = id.to_string();
        assert!(slug.ends_with(&id_str[id_str.len() - 8..]));
    }

    #[test]
    fn survives_non_ascii_titles() {
        let id = CourseId::new();
        let slug = derive("ဓာတ်ပုံပညာ", "အဖွဲ့", id);
        // Only the id suffix remains.
        assert_eq!(slug.len(), 8);
    }

    #[test]
    fn collapses_repeated_separators() {
        assert_eq!(slugify("  a -- b  "), "a-b");
        assert_eq!(slugify("---"), "");
    }
}
