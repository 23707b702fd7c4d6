//! Initial view selection from a dashboard location.
//!
//! Accepts the fragment format of dashboard links, `/dashboard/<tab>[/<component>]`,
//! as well as the bare `<tab>[/<component>]`.

use crate::app::View;

/// A parsed dashboard location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub view: View,
    /// Entity (or Docker host) to focus once data has arrived.
    pub component: Option<String>,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            view: View::Availability,
            component: None,
        }
    }
}

impl Route {
    /// Parse a location. Unknown or missing tabs select the availability tab.
    pub fn parse(fragment: &str) -> Self {
        let trimmed = fragment.trim().trim_start_matches('#');
        let mut segments = trimmed.split('/').filter(|s| !s.is_empty()).peekable();

        if segments.peek() == Some(&"dashboard") {
            segments.next();
        }

        let Some(tab) = segments.next() else {
            return Self::default();
        };
        let Some(view) = View::from_key(tab) else {
            tracing::debug!(tab, "Unknown tab in route, showing availability");
            return Self::default();
        };

        Self {
            view,
            component: segments.next().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_path() {
        let route = Route::parse("/dashboard/containers/web");
        assert_eq!(route.view, View::Containers);
        assert_eq!(route.component.as_deref(), Some("web"));
    }

    #[test]
    fn test_parse_bare_tab() {
        assert_eq!(Route::parse("jmx").view, View::Jmx);
        assert_eq!(Route::parse("#/dashboard/schedint").view, View::ScheduledInterruptions);
        assert_eq!(Route::parse("dockerActions/local").component.as_deref(), Some("local"));
    }

    #[test]
    fn test_unknown_or_empty_defaults_to_availability() {
        assert_eq!(Route::parse(""), Route::default());
        assert_eq!(Route::parse("/dashboard"), Route::default());
        assert_eq!(Route::parse("/dashboard/nope/web"), Route::default());
    }
}
