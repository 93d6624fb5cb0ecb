//! Topic name and filter validation
//!
//! Key rules:
//! - Topic names MUST NOT contain wildcards (+ or #)
//! - Topic filters MAY contain wildcards
//! - Multi-level wildcard (#) must occupy the entire last level
//! - Single-level wildcard (+) must occupy an entire level
//! - Both are bounded by the gateway's maximum topic length in bytes

/// Absolute upper bound on topic length in bytes
pub const MAX_TOPIC_LENGTH: usize = 1024;

/// Validate a topic filter (used in SUBSCRIBE, UNSUBSCRIBE and REGISTER)
///
/// Topic filters:
/// - Must be at least 1 character
/// - Must not exceed `max_length` bytes
/// - Must not contain null character
/// - Multi-level wildcard (#) must be the entire last level
/// - Single-level wildcard (+) must occupy an entire level
pub fn validate_subscription(filter: &str, max_length: usize) -> Result<(), &'static str> {
    if filter.is_empty() {
        return Err("topic filter cannot be empty");
    }

    if filter.len() > max_length {
        return Err("topic filter exceeds maximum length");
    }

    if filter.contains('\0') {
        return Err("topic filter cannot contain null character");
    }

    let mut levels = filter.split('/').peekable();
    while let Some(level) = levels.next() {
        if level.contains('#') {
            if level != "#" {
                return Err("multi-level wildcard must occupy entire level");
            }
            if levels.peek().is_some() {
                return Err("multi-level wildcard must be last level");
            }
        }

        if level.contains('+') && level != "+" {
            return Err("single-level wildcard must occupy entire level");
        }
    }

    Ok(())
}

/// Validate a topic name (used for PUBLISH and will topics)
pub fn validate_topic_name(topic: &str, max_length: usize) -> Result<(), &'static str> {
    if topic.is_empty() {
        return Err("topic name cannot be empty");
    }

    if topic.len() > max_length {
        return Err("topic name exceeds maximum length");
    }

    if topic.contains('\0') {
        return Err("topic name cannot contain null character");
    }

    if is_wild(topic) {
        return Err("topic name cannot contain wildcards");
    }

    Ok(())
}

/// Whether a topic contains a wildcard character
pub fn is_wild(topic: &str) -> bool {
    topic.contains('+') || topic.contains('#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("test" ; "single level")]
    #[test_case("test/topic" ; "two levels")]
    #[test_case("/test/topic" ; "leading separator")]
    #[test_case("test/topic/" ; "trailing separator")]
    #[test_case("+" ; "single wildcard")]
    #[test_case("#" ; "multi wildcard")]
    #[test_case("test/+" ; "trailing single wildcard")]
    #[test_case("test/#" ; "trailing multi wildcard")]
    #[test_case("+/+/+" ; "only single wildcards")]
    #[test_case("test/+/topic" ; "inner single wildcard")]
    #[test_case("/" ; "separator only")]
    fn test_valid_subscription(filter: &str) {
        assert!(validate_subscription(filter, MAX_TOPIC_LENGTH).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("test+" ; "partial single wildcard")]
    #[test_case("test#" ; "partial multi wildcard")]
    #[test_case("test/#/more" ; "inner multi wildcard")]
    #[test_case("+test" ; "leading partial wildcard")]
    #[test_case("a\0b" ; "null character")]
    fn test_invalid_subscription(filter: &str) {
        assert!(validate_subscription(filter, MAX_TOPIC_LENGTH).is_err());
    }

    #[test]
    fn test_subscription_max_length() {
        let topic = "a".repeat(16);
        assert!(validate_subscription(&topic, 16).is_ok());
        assert_eq!(
            validate_subscription(&topic, 15),
            Err("topic filter exceeds maximum length")
        );
    }

    #[test]
    fn test_validate_topic_name() {
        assert!(validate_topic_name("test/topic", MAX_TOPIC_LENGTH).is_ok());
        assert!(validate_topic_name("", MAX_TOPIC_LENGTH).is_err());
        assert!(validate_topic_name("test/+/topic", MAX_TOPIC_LENGTH).is_err());
        assert!(validate_topic_name("test/#", MAX_TOPIC_LENGTH).is_err());
        assert!(validate_topic_name("abc", 2).is_err());
    }

    #[test]
    fn test_is_wild() {
        assert!(is_wild("a/+/b"));
        assert!(is_wild("a/#"));
        assert!(!is_wild("a/b"));
    }
}
