use crate::store::InstallationView;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallationFilter {
    pub active_only: bool,
    pub limit: Option<usize>,
}

pub fn apply_filters(
    installations: Vec<InstallationView>,
    filter: &InstallationFilter,
) -> Vec<InstallationView> {
    // `--limit 0` means no limit.
    let limit = filter.limit.filter(|n| *n > 0).unwrap_or(usize::MAX);
    installations
        .into_iter()
        .filter(|view| !filter.active_only || view.is_active())
        .take(limit)
        .collect()
}

/// Case-insensitive substring match on machine name, tool name, or notes.
pub fn matches_query(view: &InstallationView, query: &str) -> bool {
    let query = query.to_lowercase();
    let notes = view.notes.as_deref().unwrap_or("").to_lowercase();

    view.machine.to_lowercase().contains(&query)
        || view.tool.to_lowercase().contains(&query)
        || notes.contains(&query)
}

#[cfg(test)]
mod tests {
    use super::{apply_filters, matches_query, InstallationFilter};
    use crate::store::InstallationView;

    fn installation(
        id: i64,
        machine: &str,
        tool: &str,
        removal_date: Option<&str>,
        notes: Option<&str>,
    ) -> InstallationView {
        InstallationView {
            id,
            machine: machine.to_string(),
            tool: tool.to_string(),
            tool_type: None,
            installed_date: "2025-01-10".to_string(),
            installation_time: None,
            removal_date: removal_date.map(|value| value.to_string()),
            notes: notes.map(|value| value.to_string()),
            created_at: None,
        }
    }

    #[test]
    fn query_matches_any_of_three_fields_ignoring_case() {
        let view = installation(1, "Srv01", "Drill", None, Some("Replaced BIT"));
        assert!(matches_query(&view, "srv"));
        assert!(matches_query(&view, "DRILL"));
        assert!(matches_query(&view, "bit"));
        assert!(!matches_query(&view, "lathe"));
    }

    #[test]
    fn empty_query_matches_everything() {
        let view = installation(1, "srv01", "drill", None, None);
        assert!(matches_query(&view, ""));
    }

    #[test]
    fn missing_notes_never_match_non_empty_query() {
        let view = installation(1, "a", "b", None, None);
        assert!(!matches_query(&view, "note"));
    }

    #[test]
    fn query_folds_non_ascii_case() {
        let view = installation(1, "Prüfstand", "drill", None, None);
        assert!(matches_query(&view, "PRÜF"));
    }

    #[test]
    fn active_only_hides_removed_installations() {
        let rows = vec![
            installation(1, "a", "x", None, None),
            installation(2, "a", "y", Some("2025-02-01"), None),
        ];
        let filter = InstallationFilter {
            active_only: true,
            limit: None,
        };
        let filtered = apply_filters(rows, &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn limit_applies_after_filtering() {
        let rows = vec![
            installation(1, "a", "x", Some("2025-02-01"), None),
            installation(2, "a", "y", None, None),
            installation(3, "a", "z", None, None),
        ];
        let filter = InstallationFilter {
            active_only: true,
            limit: Some(1),
        };
        let filtered = apply_filters(rows, &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 2);
    }

    #[test]
    fn zero_limit_keeps_everything() {
        let rows = vec![
            installation(1, "a", "x", None, None),
            installation(2, "a", "y", None, None),
        ];
        let filter = InstallationFilter {
            active_only: false,
            limit: Some(0),
        };
        assert_eq!(apply_filters(rows, &filter).len(), 2);
    }

    #[test]
    fn default_filter_keeps_everything() {
        let rows = vec![
            installation(1, "a", "x", Some("2025-02-01"), None),
            installation(2, "a", "y", None, None),
        ];
        assert_eq!(apply_filters(rows, &InstallationFilter::default()).len(), 2);
    }
}
