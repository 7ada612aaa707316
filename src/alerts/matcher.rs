//! Location matching between an alert and the watched city.

/// Returns whether `watched_location` is one of `alert_locations`.
///
/// The comparison is an exact, case-sensitive membership test. Names are not
/// normalized, so `"תל אביב - מרכז העיר"` does not match `"תל אביב"`.
pub fn matches(alert_locations: &[String], watched_location: &str) -> bool {
    alert_locations
        .iter()
        .any(|location| location == watched_location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_matches_exact_location() {
        assert!(matches(&locations(&["שדרות", "אביגדור"]), "אביגדור"));
    }

    #[test]
    fn test_no_partial_match() {
        assert!(!matches(&locations(&["תל אביב - מרכז העיר"]), "תל אביב"));
        assert!(!matches(&locations(&["תל אביב"]), "תל אביב - מרכז העיר"));
        assert!(!matches(&locations(&[" אביגדור"]), "אביגדור"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!matches(&locations(&["Sderot"]), "sderot"));
    }

    #[test]
    fn test_empty_locations() {
        assert!(!matches(&[], "אביגדור"));
        assert!(!matches(&[], ""));
    }

    #[test]
    fn test_same_inputs_same_result() {
        let alert_locations = locations(&["אביגדור"]);
        assert_eq!(
            matches(&alert_locations, "אביגדור"),
            matches(&alert_locations, "אביגדור")
        );
        assert_eq!(
            matches(&alert_locations, "שדרות"),
            matches(&alert_locations, "שדרות")
        );
    }
}
