use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for slug fields
    /// Must be lowercase alphanumeric with single hyphens between segments
    /// - Valid: "electronics", "clothing-fashion", "t-shirt", "4k-tv"
    /// - Invalid: "-tv", "tv-", "home--garden", "Books", "face_cream"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_regex_valid() {
        assert!(SLUG_REGEX.is_match("electronics"));
        assert!(SLUG_REGEX.is_match("clothing-fashion"));
        assert!(SLUG_REGEX.is_match("t-shirt"));
        assert!(SLUG_REGEX.is_match("4k-tv"));
        assert!(SLUG_REGEX.is_match("a"));
    }

    #[test]
    fn test_slug_regex_invalid() {
        assert!(!SLUG_REGEX.is_match("-tv")); // starts with hyphen
        assert!(!SLUG_REGEX.is_match("tv-")); // ends with hyphen
        assert!(!SLUG_REGEX.is_match("home--garden")); // double hyphen
        assert!(!SLUG_REGEX.is_match("Books")); // uppercase
        assert!(!SLUG_REGEX.is_match("face_cream")); // underscore
        assert!(!SLUG_REGEX.is_match("")); // empty
        assert!(!SLUG_REGEX.is_match("home garden")); // space
    }
}
