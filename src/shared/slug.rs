//! URL-safe identifiers derived from display names

/// Lowercase, ASCII, hyphen-separated form of `input`
///
/// Runs of non-alphanumeric characters collapse into a single hyphen and
/// edge hyphens are trimmed; non-ASCII letters are transliterated.
/// May return an empty string when `input` has no alphanumerics.
pub fn slugify(input: &str) -> String {
    ::slug::slugify(input)
}
