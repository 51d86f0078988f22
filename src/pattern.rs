/// Filename selection for batch transfers.
///
/// A pattern is a literal, case-sensitive substring. No glob or regex
/// expansion happens here: broadening the semantics would silently change
/// which files a batch operation selects and overwrites. The empty pattern
/// selects every filename.
pub fn matches(filename: &str, pattern: &str) -> bool {
    filename.contains(pattern)
}

#[cfg(test)]
mod tests {
    use super::matches;

    #[test]
    fn substring_anywhere_matches() {
        assert!(matches("2024ModelProspApps_final.csv", "ModelProspApps"));
        assert!(matches("report.csv", "report"));
        assert!(matches("report.csv", ".csv"));
    }

    #[test]
    fn non_substring_does_not_match() {
        assert!(!matches("report.csv", "reports"));
        assert!(!matches("report.csv", "csv.report"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!matches("Report.csv", "report"));
    }

    #[test]
    fn empty_pattern_selects_everything() {
        assert!(matches("anything.txt", ""));
        assert!(matches("", ""));
    }

    #[test]
    fn wildcards_are_literal_characters() {
        assert!(!matches("report.csv", "*.csv"));
        assert!(matches("weird*name.csv", "*name"));
    }
}
