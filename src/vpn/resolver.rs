//! Maps a user-supplied location onto a provider region token.

use tracing::warn;

use super::VpnClient;
use crate::config::Location;

impl VpnClient {
    /// Resolve `location` to a connectable region token.
    ///
    /// Returns `None` when the provider offers no match or the region
    /// query itself fails; either way the caller skips the location.
    pub async fn resolve(&self, location: &Location) -> Option<String> {
        let available = match self.regions().await {
            Ok(regions) => regions,
            Err(e) => {
                warn!(error = %e, "could not list available regions");
                return None;
            }
        };
        match_region(location, &available)
    }
}

/// Pick the region token matching `location` from the available set.
///
/// Two candidates are tried: `country-city` and bare `country`, both
/// lowercased. The more specific form wins when both are present.
pub fn match_region(location: &Location, available: &[String]) -> Option<String> {
    let country = location.country.to_lowercase();
    let city_form = location
        .city
        .as_ref()
        .map(|city| format!("{}-{}", country, city.to_lowercase()));

    if let Some(candidate) = city_form {
        if available.iter().any(|region| *region == candidate) {
            return Some(candidate);
        }
    }

    if available.iter().any(|region| *region == country) {
        return Some(country);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(country: &str, city: Option<&str>) -> Location {
        Location {
            country: country.to_string(),
            city: city.map(str::to_string),
        }
    }

    fn tokens(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefers_country_city_form() {
        let available = tokens(&["romania", "romania-bucharest"]);
        let region = match_region(&location("Romania", Some("Bucharest")), &available);
        assert_eq!(region.as_deref(), Some("romania-bucharest"));
    }

    #[test]
    fn test_falls_back_to_country_only() {
        let available = tokens(&["romania"]);
        let region = match_region(&location("Romania", Some("Bucharest")), &available);
        assert_eq!(region.as_deref(), Some("romania"));
    }

    #[test]
    fn test_no_match_returns_none() {
        let available = tokens(&["germany-frankfurt", "spain"]);
        let region = match_region(&location("France", Some("Paris")), &available);
        assert_eq!(region, None);
    }

    #[test]
    fn test_match_is_case_insensitive_on_input() {
        let available = tokens(&["netherlands-amsterdam"]);
        let region = match_region(&location("NETHERLANDS", Some("Amsterdam")), &available);
        assert_eq!(region.as_deref(), Some("netherlands-amsterdam"));
    }

    #[test]
    fn test_missing_city_matches_country() {
        let available = tokens(&["canada", "canada-toronto"]);
        let region = match_region(&location("Canada", None), &available);
        assert_eq!(region.as_deref(), Some("canada"));
    }

    #[test]
    fn test_empty_available_set() {
        let region = match_region(&location("Romania", Some("Bucharest")), &[]);
        assert_eq!(region, None);
    }
}
