//! Entry-list (shutuba) extractor.

use chrono::NaiveDate;
use ego_tree::NodeId;
use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::category::PageCategory;
use crate::course::CourseType;
use crate::error::ScraperError;
use crate::fetch::Fetcher;
use crate::page::Page;
use crate::text::{arrange_string, id_from_url};
use crate::url::PageUrl;
use crate::venue::Venue;

use super::{own_text, select_href, select_text};

/// Typed accessors over one entry-list (shutuba) page.
///
/// Entry lists are published before the draw is fixed, so frame and horse
/// numbers, the jockey, and the horse weight can all be legitimately
/// missing; those accessors return `Ok(None)` with a warning. A horse that
/// is scratched after publication keeps its name and ID but loses its
/// weight figures.
pub struct RaceCard {
    page: Page,
    race_id: u64,
    rows: Vec<NodeId>,
}

impl RaceCard {
    /// Fetch one entry list and build its extractor.
    pub async fn create(race_id: u64) -> Result<RaceCard, ScraperError> {
        let url = PageUrl::race_card(race_id)?;
        let page = Fetcher::new().fetch_one(url).await?;
        RaceCard::new(page)
    }

    /// Fetch many entry lists concurrently. Output order mirrors
    /// `race_ids`; a failed fetch or a bad page fails only its own slot.
    pub async fn create_many(
        race_ids: &[u64],
    ) -> Result<Vec<Result<RaceCard, ScraperError>>, ScraperError> {
        let urls = race_ids
            .iter()
            .map(|&id| PageUrl::race_card(id))
            .collect::<Result<Vec<_>, _>>()?;
        let pages = Fetcher::new().fetch_all(urls).await;
        Ok(pages
            .into_iter()
            .map(|page| page.and_then(RaceCard::new))
            .collect())
    }

    /// Build an extractor over an already fetched page.
    pub fn new(page: Page) -> Result<RaceCard, ScraperError> {
        super::check_category(&page, PageCategory::RaceCard)?;
        let race_id = id_from_url(page.url())?;
        let rows = super::collect_rows(page.html(), "table.Shutuba_Table", "tr.HorseList")
            .unwrap_or_default();
        if rows.is_empty() {
            tracing::error!("no entry table found. URL: {}", page.url());
            return Err(ScraperError::TableNotFound(format!(
                "entry list at {}",
                page.url()
            )));
        }
        Ok(RaceCard {
            race_id,
            rows,
            page,
        })
    }

    pub fn race_id(&self) -> u64 {
        self.race_id
    }

    pub fn race_name(&self) -> Result<String, ScraperError> {
        super::scrape_race_name(self.page.html(), self.page.url())
    }

    pub fn race_date(&self) -> Result<NaiveDate, ScraperError> {
        super::scrape_race_date(self.page.html(), self.page.url())
    }

    pub fn course_type(&self) -> Result<CourseType, ScraperError> {
        Ok(super::scrape_course_distance(self.page.html(), self.page.url())?.0)
    }

    pub fn distance(&self) -> Result<u32, ScraperError> {
        Ok(super::scrape_course_distance(self.page.html(), self.page.url())?.1)
    }

    pub fn venue_name(&self) -> Result<String, ScraperError> {
        super::scrape_venue_name(self.page.html(), self.page.url())
    }

    pub fn venue(&self) -> Result<Venue, ScraperError> {
        Venue::from_name(&self.venue_name()?)
    }

    /// Number of entries in the table.
    pub fn horse_count(&self) -> usize {
        self.rows.len()
    }

    /// Frame (gate group) number. Absent while the draw is not fixed.
    pub fn frame_number(&self, index: usize) -> Result<Option<u8>, ScraperError> {
        let row = self.row(index)?;
        let text = select_text(row, "td[class*='Waku'] span").unwrap_or_default();
        match arrange_string(&text).parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                warn!(
                    "frame number not available; the draw may not be fixed yet. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Horse (runner) number. Absent while the entry list is not fixed.
    pub fn horse_number(&self, index: usize) -> Result<Option<u8>, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td[class*='Umaban']").unwrap();
        let text = row
            .select(&sel)
            .next()
            .map(own_text)
            .unwrap_or_default();
        match arrange_string(&text).parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                warn!(
                    "horse number not available; the entry list may not be fixed yet. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    pub fn horse_name(&self, index: usize) -> Result<String, ScraperError> {
        let row = self.row(index)?;
        let name = select_text(row, "span.HorseName a")
            .ok_or_else(|| ScraperError::parse("horse name", self.page.url()))?;
        Ok(arrange_string(&name))
    }

    pub fn horse_id(&self, index: usize) -> Result<u64, ScraperError> {
        let row = self.row(index)?;
        let href = select_href(row, "span.HorseName a")
            .ok_or_else(|| ScraperError::parse("horse ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Sex and age token, e.g. "牡3". Scratched entries keep it in a
    /// different cell, which is handled here.
    pub fn sex_age(&self, index: usize) -> Result<String, ScraperError> {
        let row = self.row(index)?;
        if let Some(text) = select_text(row, "td.Barei") {
            return Ok(arrange_string(&text));
        }
        select_text(row, "span.Age")
            .map(|text| arrange_string(&text))
            .ok_or_else(|| ScraperError::parse("sex and age", self.page.url()))
    }

    /// Weight carried by the jockey, in kg.
    pub fn jockey_weight(&self, index: usize) -> Result<f64, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td").unwrap();
        let td = row
            .select(&sel)
            .nth(5)
            .ok_or_else(|| ScraperError::parse("jockey weight", self.page.url()))?;
        arrange_string(&own_text(td))
            .parse()
            .map_err(|_| ScraperError::parse("jockey weight", self.page.url()))
    }

    /// Jockey name. Absent while the ride is not fixed.
    pub fn jockey_name(&self, index: usize) -> Result<Option<String>, ScraperError> {
        let row = self.row(index)?;
        match select_text(row, "td.Jockey a") {
            Some(name) => Ok(Some(arrange_string(&name))),
            None => {
                warn!(
                    "jockey not available; the ride may not be fixed yet. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Jockey ID. Absent while the ride is not fixed.
    pub fn jockey_id(&self, index: usize) -> Result<Option<u64>, ScraperError> {
        let row = self.row(index)?;
        match select_href(row, "td.Jockey a") {
            Some(href) => Ok(Some(id_from_url(&href)?)),
            None => {
                warn!(
                    "jockey ID not available; the ride may not be fixed yet. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Training centre the horse belongs to (栗東/美浦).
    pub fn stable_area(&self, index: usize) -> Result<String, ScraperError> {
        let row = self.row(index)?;
        let area = select_text(row, "td.Trainer span")
            .ok_or_else(|| ScraperError::parse("stable area", self.page.url()))?;
        Ok(arrange_string(&area))
    }

    pub fn trainer_name(&self, index: usize) -> Result<String, ScraperError> {
        let row = self.row(index)?;
        let name = select_text(row, "td.Trainer a")
            .ok_or_else(|| ScraperError::parse("trainer name", self.page.url()))?;
        Ok(arrange_string(&name))
    }

    pub fn trainer_id(&self, index: usize) -> Result<u64, ScraperError> {
        let row = self.row(index)?;
        let href = select_href(row, "td.Trainer a")
            .ok_or_else(|| ScraperError::parse("trainer ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Horse body weight in kg. Absent before the weigh-in or for a
    /// scratched entry.
    pub fn horse_weight(&self, index: usize) -> Result<Option<u32>, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td.Weight").unwrap();
        let Some(td) = row.select(&sel).next() else {
            warn!(
                "horse weight not available; the entry may have been scratched. \
                 index: {}, URL: {}",
                index,
                self.page.url()
            );
            return Ok(None);
        };
        match arrange_string(&own_text(td)).parse() {
            Ok(weight) => Ok(Some(weight)),
            Err(_) => {
                warn!(
                    "horse weight not available; it may not be fixed yet. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Body-weight change since the last run. Absent whenever the weight
    /// itself is.
    pub fn horse_weight_diff(&self, index: usize) -> Result<Option<i32>, ScraperError> {
        let row = self.row(index)?;
        let diff = select_text(row, "td.Weight small")
            .map(|text| arrange_string(&text))
            .and_then(|text| {
                text.trim_start_matches('(')
                    .trim_end_matches(')')
                    .parse()
                    .ok()
            });
        if diff.is_none() {
            warn!(
                "horse weight change not available; the weight may not be fixed \
                 or the entry scratched. index: {}, URL: {}",
                index,
                self.page.url()
            );
        }
        Ok(diff)
    }

    fn row(&self, index: usize) -> Result<ElementRef<'_>, ScraperError> {
        super::nth_row(self.page.html(), &self.rows, index, self.page.url())
    }
}
