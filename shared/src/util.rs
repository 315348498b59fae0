/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Calendar day (UTC) of a Unix-millis timestamp, as `YYYY-MM-DD`
pub fn day_of(millis: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Fresh operation identifier
pub fn operation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of() {
        assert_eq!(day_of(0).as_deref(), Some("1970-01-01"));
        assert_eq!(day_of(1_790_000_000_000).as_deref(), Some("2026-09-21"));
    }

    #[test]
    fn test_operation_ids_are_unique() {
        assert_ne!(operation_id(), operation_id());
    }
}
