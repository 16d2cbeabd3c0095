//! URL construction for the supported netkeiba page templates.

use percent_encoding::{percent_encode, NON_ALPHANUMERIC};

use crate::category::PageCategory;
use crate::course::CourseType;
use crate::error::ScraperError;
use crate::venue::Venue;

const SHUTUBA_URL: &str = "https://race.netkeiba.com/race/shutuba.html?race_id=";
const RESULT_URL: &str = "https://race.netkeiba.com/race/result.html?race_id=";
const ODDS_URL: &str =
    "https://race.netkeiba.com/api/api_get_jra_odds.html?type=1&action=init&race_id=";
const OIKIRI_URL: &str = "https://race.netkeiba.com/race/oikiri.html?race_id=";
const HORSE_URL: &str = "https://db.netkeiba.com/horse/";
const SEARCH_URL: &str = "https://db.netkeiba.com/?pid=race_list&sort=date&list=100";

/// A fully-formed request target plus its page category.
///
/// Built by the per-category factories below; immutable afterwards.
#[derive(Debug, Clone)]
pub struct PageUrl {
    url: String,
    category: PageCategory,
}

impl PageUrl {
    /// Entry-list (shutuba) page for a race.
    pub fn race_card(race_id: u64) -> Result<PageUrl, ScraperError> {
        validate_race_id(race_id)?;
        Ok(PageUrl {
            url: format!("{SHUTUBA_URL}{race_id}"),
            category: PageCategory::RaceCard,
        })
    }

    /// Result page for a race.
    pub fn race_result(race_id: u64) -> Result<PageUrl, ScraperError> {
        validate_race_id(race_id)?;
        Ok(PageUrl {
            url: format!("{RESULT_URL}{race_id}"),
            category: PageCategory::RaceResult,
        })
    }

    /// Win-odds JSON API for a race.
    pub fn win_odds(race_id: u64) -> Result<PageUrl, ScraperError> {
        validate_race_id(race_id)?;
        Ok(PageUrl {
            url: format!("{ODDS_URL}{race_id}"),
            category: PageCategory::Odds,
        })
    }

    /// Training-evaluation (oikiri) page for a race.
    pub fn training_evaluation(race_id: u64) -> Result<PageUrl, ScraperError> {
        validate_race_id(race_id)?;
        Ok(PageUrl {
            url: format!("{OIKIRI_URL}{race_id}"),
            category: PageCategory::TrainingEvaluation,
        })
    }

    /// Profile page for a horse.
    pub fn horse_profile(horse_id: u64) -> Result<PageUrl, ScraperError> {
        validate_horse_id(horse_id)?;
        Ok(PageUrl {
            url: format!("{HORSE_URL}{horse_id}"),
            category: PageCategory::HorseProfile,
        })
    }

    /// Race search over the db pages.
    ///
    /// The free-text race name is percent-encoded in EUC-JP, the legacy
    /// encoding db.netkeiba.com expects for query text.
    pub fn race_search(query: &RaceSearchQuery) -> Result<PageUrl, ScraperError> {
        let track = match query.course_type {
            CourseType::Turf => 1,
            CourseType::Dirt => 2,
            CourseType::Jump => {
                return Err(ScraperError::InvalidValue(
                    "race search only accepts turf or dirt courses".to_string(),
                ))
            }
        };
        let (encoded, _, _) = encoding_rs::EUC_JP.encode(&query.race_name);
        let word = percent_encode(&encoded, NON_ALPHANUMERIC).to_string();
        let url = format!(
            "{SEARCH_URL}&word={word}&track%5B%5D={track}\
             &start_year={}&start_mon={}&end_year={}&end_mon={}\
             &jyo%5B%5D={}&kyori%5B%5D={}",
            query.start_year,
            query.start_month,
            query.end_year,
            query.end_month,
            query.venue.code(),
            query.distance,
        );
        Ok(PageUrl {
            url,
            category: PageCategory::RaceSearch,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn category(&self) -> PageCategory {
        self.category
    }

    /// Point a category at an arbitrary target, for tests against a local
    /// mock server.
    #[cfg(test)]
    pub(crate) fn raw(url: String, category: PageCategory) -> PageUrl {
        PageUrl { url, category }
    }
}

/// Parameters for a race search.
#[derive(Debug, Clone)]
pub struct RaceSearchQuery {
    /// Free-text race name, e.g. "有馬記念"
    pub race_name: String,
    pub venue: Venue,
    /// Race distance in meters
    pub distance: u32,
    pub course_type: CourseType,
    pub start_year: u16,
    pub start_month: u8,
    pub end_year: u16,
    pub end_month: u8,
}

/// netkeiba race IDs are exactly 12 digits (YYYY + venue + meeting + day + race).
fn validate_race_id(race_id: u64) -> Result<(), ScraperError> {
    if !(100_000_000_000..=999_999_999_999).contains(&race_id) {
        return Err(ScraperError::InvalidValue(format!(
            "race ID must be 12 digits, got {race_id}"
        )));
    }
    Ok(())
}

/// netkeiba horse IDs are exactly 10 digits (birth year + serial).
fn validate_horse_id(horse_id: u64) -> Result<(), ScraperError> {
    if !(1_000_000_000..=9_999_999_999).contains(&horse_id) {
        return Err(ScraperError::InvalidValue(format!(
            "horse ID must be 10 digits, got {horse_id}"
        )));
    }
    Ok(())
}
