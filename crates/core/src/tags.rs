//! Comma-joined tag lists as stored on clients and restaurants.

use crate::errors::ValidationError;

/// Minimum number of tags accepted at registration.
pub const MIN_REGISTRATION_TAGS: usize = 5;

/// Splits a stored tag string into trimmed, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalizes a tag string to its stored form (`a,b,c`).
pub fn normalize_tags(raw: &str) -> String {
    parse_tags(raw).join(",")
}

pub fn validate_registration_tags(raw: &str) -> Result<(), ValidationError> {
    let actual = parse_tags(raw).len();
    if actual < MIN_REGISTRATION_TAGS {
        return Err(ValidationError::NotEnoughTags {
            required: MIN_REGISTRATION_TAGS,
            actual,
        });
    }
    Ok(())
}

/// True when any of `candidate` tags contains any of `wanted` tags, ignoring case.
pub fn matches_any_tag(candidate: &str, wanted: &[String]) -> bool {
    let candidate = parse_tags(candidate)
        .into_iter()
        .map(|tag| tag.to_lowercase())
        .collect::<Vec<_>>();
    wanted.iter().any(|wanted_tag| {
        let wanted_tag = wanted_tag.to_lowercase();
        candidate.iter().any(|tag| tag.contains(&wanted_tag))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_drops_empty_entries() {
        assert_eq!(
            parse_tags(" pizza, vegan ,,sushi , "),
            vec!["pizza", "vegan", "sushi"]
        );
        assert_eq!(normalize_tags(" a , b,c "), "a,b,c");
    }

    #[test]
    fn registration_requires_five_tags() {
        assert!(validate_registration_tags("a,b,c,d,e").is_ok());
        assert_eq!(
            validate_registration_tags("a,b,,c,d"),
            Err(ValidationError::NotEnoughTags {
                required: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn tag_match_is_case_insensitive_substring() {
        let wanted = vec!["Pizza".to_string(), "thai".to_string()];
        assert!(matches_any_tag("burgers,wood-fired PIZZA", &wanted));
        assert!(!matches_any_tag("burgers,sushi", &wanted));
        assert!(!matches_any_tag("", &wanted));
    }
}
