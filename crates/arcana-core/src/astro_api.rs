//! Astrology data enrichment for the astrology engine prompt.
//!
//! Two layers: a pure sun-sign lookup from the birth date (always available),
//! and an optional remote chart API (`ASTRO_API_URL` + `ASTRO_API_KEY`).
//! Remote failure or absent credentials degrade silently to the local layer;
//! the engine prompt simply carries less context.

use crate::submission::Person;
use std::time::Duration;

const ENV_ASTRO_API_URL: &str = "ASTRO_API_URL";
const ENV_ASTRO_API_KEY: &str = "ASTRO_API_KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const SIGNS: [(&str, (u32, u32), (u32, u32)); 12] = [
    ("Aries", (3, 21), (4, 19)),
    ("Taurus", (4, 20), (5, 20)),
    ("Gemini", (5, 21), (6, 20)),
    ("Cancer", (6, 21), (7, 22)),
    ("Leo", (7, 23), (8, 22)),
    ("Virgo", (8, 23), (9, 22)),
    ("Libra", (9, 23), (10, 22)),
    ("Scorpio", (10, 23), (11, 21)),
    ("Sagittarius", (11, 22), (12, 21)),
    ("Capricorn", (12, 22), (1, 19)),
    ("Aquarius", (1, 20), (2, 18)),
    ("Pisces", (2, 19), (3, 20)),
];

/// Sun sign for an ISO-ish `YYYY-MM-DD` date, or `None` when the date does not
/// carry a usable month/day.
pub fn sun_sign(date_of_birth: &str) -> Option<&'static str> {
    let mut parts = date_of_birth
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());
    let _year = parts.next()?;
    let month = parts.next()?;
    let day = parts.next()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    SIGNS
        .iter()
        .find(|(_, (sm, sd), (em, ed))| {
            (month == *sm && day >= *sd) || (month == *em && day <= *ed)
        })
        .map(|(name, _, _)| *name)
}

/// Optional remote chart-data client. Absent credentials mean every lookup is
/// `None` and the prompt falls back to the sun-sign layer.
pub struct AstroDataClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AstroDataClient {
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var(ENV_ASTRO_API_URL).ok()?.trim().to_string();
        let api_key = std::env::var(ENV_ASTRO_API_KEY).ok()?.trim().to_string();
        if api_url.is_empty() || api_key.is_empty() {
            return None;
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Some(Self { api_url, api_key, client })
    }

    /// Raw chart payload for this person's birth data; errors are logged and
    /// absorbed into `None`.
    pub async fn chart_context(&self, person: &Person) -> Option<String> {
        let body = serde_json::json!({
            "date": person.date_of_birth,
            "time": person.time_of_birth,
            "place": person.birth_place,
        });
        let res = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await;
        match res {
            Ok(res) if res.status().is_success() => match res.text().await {
                Ok(text) if !text.trim().is_empty() => Some(text),
                _ => None,
            },
            Ok(res) => {
                tracing::warn!(target: "arcana::astro", status = %res.status(), "Chart API returned error status");
                None
            }
            Err(e) => {
                tracing::warn!(target: "arcana::astro", error = %e, "Chart API request failed");
                None
            }
        }
    }
}

/// Prompt context block for the astrology engine: sun sign plus whatever the
/// remote chart API returned.
pub async fn build_chart_context(client: Option<&AstroDataClient>, person: &Person) -> String {
    let mut parts = Vec::new();
    if let Some(sign) = sun_sign(&person.date_of_birth) {
        parts.push(format!("Sun sign: {}", sign));
    }
    if let Some(client) = client {
        if let Some(chart) = client.chart_context(person).await {
            parts.push(format!("Chart data: {}", chart));
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_sign_boundaries() {
        assert_eq!(sun_sign("1990-05-14"), Some("Taurus"));
        assert_eq!(sun_sign("1990-03-21"), Some("Aries"));
        assert_eq!(sun_sign("1990-04-19"), Some("Aries"));
        assert_eq!(sun_sign("1990-12-25"), Some("Capricorn"));
        assert_eq!(sun_sign("1990-01-10"), Some("Capricorn"));
        assert_eq!(sun_sign("1990-02-01"), Some("Aquarius"));
    }

    #[test]
    fn test_sun_sign_unusable_dates() {
        assert_eq!(sun_sign(""), None);
        assert_eq!(sun_sign("1990"), None);
        assert_eq!(sun_sign("1990-13-40"), None);
    }
}
