use deunicode::deunicode;

use super::site_models::DriveEntry;

/// Converts a Drive name into a URL-safe path segment.
///
/// camelCase and acronym boundaries become separators, `&` reads as "and"
/// and apostrophes vanish. Anything outside ASCII is transliterated, so
/// Cyrillic, Greek or Turkish names keep a readable slug. Every other run
/// of non-alphanumeric characters collapses into a single `-`.
pub fn slugify(name: &str) -> String {
    let ascii = deunicode(&decamelize(name).replace('&', " and "));

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for c in ascii.chars() {
        if c == '\'' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Slug of a Drive entry, falling back to its id when the name has no
/// letters or digits to keep.
pub fn entry_slug(entry: &DriveEntry) -> String {
    match slugify(&entry.name) {
        slug if slug.is_empty() => slugify(&entry.id),
        slug => slug,
    }
}

/// Joins entry slugs with `/`, outermost first.
pub fn slug_path<'a>(entries: impl IntoIterator<Item = &'a DriveEntry>) -> String {
    entries
        .into_iter()
        .map(entry_slug)
        .collect::<Vec<_>>()
        .join("/")
}

/// Inserts a space at ASCII case boundaries.
///
/// `fooBar` and `v2Beta` split before the capital. An acronym run splits
/// before its last capital when a lowercase word follows (`XMLHttp` gives
/// `XML Http`), except for a plural `s` (`APIs` stays whole). A run of two
/// or more capitals also splits from a following digit (`API2`).
fn decamelize(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|j| chars[j]);
        let before_prev = i.checked_sub(2).map(|j| chars[j]);
        let next = chars.get(i + 1).copied();

        let split = match prev {
            Some(p) if c.is_ascii_uppercase() => {
                p.is_ascii_lowercase()
                    || p.is_ascii_digit()
                    || (p.is_ascii_uppercase()
                        && next.is_some_and(|n| n.is_ascii_lowercase() && n != 's'))
            }
            Some(p) if c.is_ascii_digit() => {
                p.is_ascii_uppercase() && before_prev.is_some_and(|b| b.is_ascii_uppercase())
            }
            _ => false,
        };

        if split {
            out.push(' ');
        }
        out.push(c);
    }

    out
}
