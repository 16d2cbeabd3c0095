//! Win-odds extractor over the netkeiba odds JSON API.
//!
//! Unlike the HTML extractors this page carries a single JSON payload; it
//! is parsed once at construction and indexed by horse number afterwards.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use crate::category::PageCategory;
use crate::error::ScraperError;
use crate::fetch::Fetcher;
use crate::page::Page;
use crate::text::id_from_url;
use crate::url::PageUrl;

/// Sentinel popularity rank the API reports for scratched runners.
const SCRATCHED_RANK: i64 = 9999;

/// API response envelope. `status` is "result" when real odds are on sale,
/// "NG" before sales open and "yoso" for preview-only pages.
#[derive(Deserialize)]
struct OddsResponse {
    status: String,
    data: Option<OddsData>,
}

#[derive(Deserialize)]
struct OddsData {
    /// bet type ("1" = win) -> zero-padded horse number -> [odds, _, rank]
    odds: HashMap<String, HashMap<String, Vec<String>>>,
}

/// Typed accessors over one win-odds payload.
pub struct WinOdds {
    url: String,
    race_id: u64,
    win_odds: HashMap<String, Vec<String>>,
}

impl WinOdds {
    /// Fetch the win odds for one race and build the extractor.
    pub async fn create(race_id: u64) -> Result<WinOdds, ScraperError> {
        let url = PageUrl::win_odds(race_id)?;
        let page = Fetcher::new().fetch_one(url).await?;
        WinOdds::new(page)
    }

    /// Fetch the win odds for many races concurrently. Output order mirrors
    /// `race_ids`; a failed fetch or an unsaleable race fails only its slot.
    pub async fn create_many(
        race_ids: &[u64],
    ) -> Result<Vec<Result<WinOdds, ScraperError>>, ScraperError> {
        let urls = race_ids
            .iter()
            .map(|&id| PageUrl::win_odds(id))
            .collect::<Result<Vec<_>, _>>()?;
        let pages = Fetcher::new().fetch_all(urls).await;
        Ok(pages
            .into_iter()
            .map(|page| page.and_then(WinOdds::new))
            .collect())
    }

    /// Build an extractor over an already fetched payload.
    pub fn new(page: Page) -> Result<WinOdds, ScraperError> {
        super::check_category(&page, PageCategory::Odds)?;
        let race_id = id_from_url(page.url())?;

        let body: String = page.html().root_element().text().collect();
        let response: OddsResponse = serde_json::from_str(body.trim())
            .map_err(|_| ScraperError::parse("odds JSON payload", page.url()))?;

        if response.status == "NG" || response.status == "yoso" {
            tracing::error!(
                "odds not available; ticket sales may not have opened. URL: {}",
                page.url()
            );
            return Err(ScraperError::TableNotFound(format!(
                "win odds at {}",
                page.url()
            )));
        }

        let win_odds = response
            .data
            .and_then(|mut data| data.odds.remove("1"))
            .ok_or_else(|| ScraperError::parse("win odds entries", page.url()))?;

        Ok(WinOdds {
            url: page.url().to_string(),
            race_id,
            win_odds,
        })
    }

    pub fn race_id(&self) -> u64 {
        self.race_id
    }

    /// Number of runners in the payload (scratched runners included).
    pub fn horse_count(&self) -> usize {
        self.win_odds.len()
    }

    /// Win odds for a horse number in `[1, horse_count]`. Absent for
    /// scratched runners.
    pub fn win_odds(&self, horse_number: u8) -> Result<Option<f64>, ScraperError> {
        let entry = self.entry(horse_number)?;
        let odds: f64 = entry
            .first()
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| ScraperError::parse("win odds value", &self.url))?;
        if odds < 0.0 {
            warn!(
                "win odds not available; the runner may have been scratched. \
                 horse number: {}, URL: {}",
                horse_number, self.url
            );
            return Ok(None);
        }
        Ok(Some(odds))
    }

    /// Win-market popularity rank for a horse number in `[1, horse_count]`.
    /// Absent for scratched runners.
    pub fn popularity(&self, horse_number: u8) -> Result<Option<u32>, ScraperError> {
        let entry = self.entry(horse_number)?;
        let rank: i64 = entry
            .get(2)
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| ScraperError::parse("popularity value", &self.url))?;
        if rank == SCRATCHED_RANK {
            warn!(
                "popularity not available; the runner may have been scratched. \
                 horse number: {}, URL: {}",
                horse_number, self.url
            );
            return Ok(None);
        }
        Ok(Some(rank as u32))
    }

    fn entry(&self, horse_number: u8) -> Result<&Vec<String>, ScraperError> {
        let count = self.horse_count();
        if horse_number == 0 || horse_number as usize > count {
            tracing::error!(
                "horse number {} out of range (runners: {}). URL: {}",
                horse_number,
                count,
                self.url
            );
            return Err(ScraperError::TableIndex {
                index: horse_number as usize,
                len: count,
                url: self.url.clone(),
            });
        }
        let key = format!("{horse_number:02}");
        self.win_odds
            .get(&key)
            .ok_or_else(|| ScraperError::parse("win odds entry", &self.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_JSON: &str = r#"{
        "status": "result",
        "data": {
            "official_datetime": "2022-12-25 15:25:00",
            "odds": {
                "1": {
                    "01": ["5.4", "5.0", "3"],
                    "02": ["2.3", "2.2", "1"],
                    "03": ["-1.0", "0.0", "9999"]
                }
            }
        }
    }"#;

    fn sample_odds() -> WinOdds {
        let url = PageUrl::win_odds(202206050811).unwrap();
        WinOdds::new(Page::from_html(url, SAMPLE_JSON)).unwrap()
    }

    #[test]
    fn test_win_odds_and_popularity() {
        let odds = sample_odds();
        assert_eq!(odds.race_id(), 202206050811);
        assert_eq!(odds.horse_count(), 3);
        assert_eq!(odds.win_odds(1).unwrap(), Some(5.4));
        assert_eq!(odds.win_odds(2).unwrap(), Some(2.3));
        assert_eq!(odds.popularity(1).unwrap(), Some(3));
        assert_eq!(odds.popularity(2).unwrap(), Some(1));
    }

    #[test]
    fn test_scratched_runner_is_absent() {
        let odds = sample_odds();
        assert_eq!(odds.win_odds(3).unwrap(), None);
        assert_eq!(odds.popularity(3).unwrap(), None);
    }

    #[test]
    fn test_horse_number_out_of_range() {
        let odds = sample_odds();
        assert!(matches!(
            odds.win_odds(5),
            Err(ScraperError::TableIndex { index: 5, len: 3, .. })
        ));
        assert!(matches!(
            odds.popularity(0),
            Err(ScraperError::TableIndex { index: 0, .. })
        ));
    }

    #[test]
    fn test_not_on_sale_is_fatal() {
        let url = PageUrl::win_odds(202206050811).unwrap();
        let page = Page::from_html(url, r#"{"status": "NG", "data": null}"#);
        assert!(matches!(
            WinOdds::new(page),
            Err(ScraperError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_preview_only_is_fatal() {
        let url = PageUrl::win_odds(202206050811).unwrap();
        let page = Page::from_html(url, r#"{"status": "yoso", "data": null}"#);
        assert!(matches!(
            WinOdds::new(page),
            Err(ScraperError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_garbage_payload_is_parse_error() {
        let url = PageUrl::win_odds(202206050811).unwrap();
        let page = Page::from_html(url, "<html><body>not json</body></html>");
        assert!(matches!(WinOdds::new(page), Err(ScraperError::Parse { .. })));
    }

    #[test]
    fn test_accessors_are_idempotent() {
        let odds = sample_odds();
        assert_eq!(odds.win_odds(2).unwrap(), odds.win_odds(2).unwrap());
    }
}
