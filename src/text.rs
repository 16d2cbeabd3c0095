//! Small text helpers shared by the extractors.

use regex::Regex;

use crate::error::ScraperError;

/// Strip the spaces and newlines netkeiba scatters through cell text.
pub fn arrange_string(s: &str) -> String {
    s.replace(' ', "").replace('\n', "")
}

/// Extract the netkeiba numeric ID from a URL: the last run of digits.
///
/// Works for both path IDs (`/horse/2019104567/`) and query IDs
/// (`?race_id=202206050811`).
pub fn id_from_url(url: &str) -> Result<u64, ScraperError> {
    let re = Regex::new(r"\d+").unwrap();
    let digits = re
        .find_iter(url)
        .last()
        .ok_or_else(|| ScraperError::parse("numeric ID", url))?;
    digits
        .as_str()
        .parse::<u64>()
        .map_err(|_| ScraperError::parse("numeric ID", url))
}
