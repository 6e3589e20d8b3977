//! Validation and sanitizing helpers for DTOs.

use validator::ValidationError;

/// Longest display name kept after sanitizing.
pub const MAX_DISPLAY_NAME_CHARS: usize = 20;
/// Longest vote option kept after sanitizing.
pub const MAX_OPTION_CHARS: usize = 64;

const SLUG_MIN: usize = 4;
const SLUG_MAX: usize = 32;
const GAME_ID_MAX: usize = 64;

/// Validates a room slug: 4 to 32 characters of `[a-z0-9-]`, alphanumeric at both ends.
///
/// ```ignore
/// validate_slug("abcd1234")  // Ok
/// validate_slug("my-room")   // Ok
/// validate_slug("-room")     // Err - leading hyphen
/// validate_slug("AB12")      // Err - uppercase
/// ```
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if !(SLUG_MIN..=SLUG_MAX).contains(&slug.len()) {
        let mut err = ValidationError::new("slug_length");
        err.message = Some(
            format!(
                "slug must be {SLUG_MIN}-{SLUG_MAX} characters (got {})",
                slug.len()
            )
            .into(),
        );
        return Err(err);
    }

    let is_lower_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let edges_ok = slug.starts_with(is_lower_alnum) && slug.ends_with(is_lower_alnum);
    if !edges_ok || !slug.chars().all(|c| is_lower_alnum(c) || c == '-') {
        let mut err = ValidationError::new("slug_format");
        err.message = Some(
            "slug may only contain lowercase letters, digits and inner hyphens".into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates a game identifier: 1 to 64 characters of `[a-z0-9_-]`.
pub fn validate_game_id(game_id: &str) -> Result<(), ValidationError> {
    let well_formed = !game_id.is_empty()
        && game_id.len() <= GAME_ID_MAX
        && game_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !well_formed {
        let mut err = ValidationError::new("game_id_format");
        err.message = Some(
            format!("game id must be 1-{GAME_ID_MAX} characters of [a-z0-9_-]").into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Strip control characters, collapse whitespace runs, trim and truncate to `max_chars`.
///
/// Returns `None` when nothing visible remains.
pub fn sanitize_text(input: &str, max_chars: usize) -> Option<String> {
    let collapsed = input
        .split(|c: char| c.is_whitespace())
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let truncated: String = collapsed.chars().take(max_chars).collect();
    let trimmed = truncated.trim_end();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Sanitize a player display name.
pub fn sanitize_display_name(input: &str) -> Option<String> {
    sanitize_text(input, MAX_DISPLAY_NAME_CHARS)
}

/// Sanitize a Script Murder vote option.
pub fn sanitize_option(input: &str) -> Option<String> {
    sanitize_text(input, MAX_OPTION_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug_valid() {
        assert!(validate_slug("abcd1234").is_ok());
        assert!(validate_slug("my-room").is_ok());
        assert!(validate_slug("a1b2").is_ok());
        assert!(validate_slug(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn test_validate_slug_invalid() {
        assert!(validate_slug("abc").is_err()); // too short
        assert!(validate_slug(&"a".repeat(33)).is_err()); // too long
        assert!(validate_slug("-room").is_err());
        assert!(validate_slug("room-").is_err());
        assert!(validate_slug("Room1").is_err());
        assert!(validate_slug("room_1").is_err());
        assert!(validate_slug("../etc").is_err());
    }

    #[test]
    fn test_validate_game_id() {
        assert!(validate_game_id("party_room").is_ok());
        assert!(validate_game_id("quiz-2").is_ok());
        assert!(validate_game_id("").is_err());
        assert!(validate_game_id("Quiz").is_err());
        assert!(validate_game_id("a b").is_err());
        assert!(validate_game_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_sanitize_display_name() {
        assert_eq!(
            sanitize_display_name("  Ada \t\n Lovelace ").as_deref(),
            Some("Ada Lovelace")
        );
        assert_eq!(sanitize_display_name("Bo\u{7}b").as_deref(), Some("Bob"));
        assert_eq!(sanitize_display_name(" \u{1b} \n"), None);
        assert_eq!(
            sanitize_display_name("abcdefghijklmnopqrstuvwxyz").as_deref(),
            Some("abcdefghijklmnopqrst")
        );
    }

    #[test]
    fn test_truncation_does_not_leave_trailing_space() {
        let name = format!("{} tail", "x".repeat(19));
        assert_eq!(sanitize_display_name(&name), Some("x".repeat(19)));
    }

    #[test]
    fn test_sanitize_option_counts_chars() {
        let option = "é".repeat(70);
        assert_eq!(sanitize_option(&option).map(|o| o.chars().count()), Some(64));
    }
}
