//! Training-evaluation (oikiri) extractor.

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

/// Typed accessors over one training-evaluation (oikiri) page.
pub struct TrainingReport {
    page: Page,
    race_id: u64,
    rows: Vec<NodeId>,
}

impl TrainingReport {
    /// Fetch one training-evaluation page and build its extractor.
    pub async fn create(race_id: u64) -> Result<TrainingReport, ScraperError> {
        let url = PageUrl::training_evaluation(race_id)?;
        let page = Fetcher::new().fetch_one(url).await?;
        TrainingReport::new(page)
    }

    /// Fetch many training-evaluation pages concurrently. Output order
    /// mirrors `race_ids`; a failed fetch or a bad page fails only its slot.
    pub async fn create_many(
        race_ids: &[u64],
    ) -> Result<Vec<Result<TrainingReport, ScraperError>>, ScraperError> {
        let urls = race_ids
            .iter()
            .map(|&id| PageUrl::training_evaluation(id))
            .collect::<Result<Vec<_>, _>>()?;
        let pages = Fetcher::new().fetch_all(urls).await;
        Ok(pages
            .into_iter()
            .map(|page| page.and_then(TrainingReport::new))
            .collect())
    }

    /// Build an extractor over an already fetched page.
    pub fn new(page: Page) -> Result<TrainingReport, ScraperError> {
        super::check_category(&page, PageCategory::TrainingEvaluation)?;
        let race_id = id_from_url(page.url())?;
        let rows = super::collect_rows(page.html(), "table.OikiriTable", "tr.HorseList")
            .unwrap_or_default();
        if rows.is_empty() {
            tracing::error!("no training evaluation table found. URL: {}", page.url());
            return Err(ScraperError::TableNotFound(format!(
                "training evaluation at {}",
                page.url()
            )));
        }
        Ok(TrainingReport {
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

    /// Frame number. Absent while the draw is not fixed.
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

    /// Horse number. Absent while the entry list is not fixed.
    pub fn horse_number(&self, index: usize) -> Result<Option<u8>, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td[class*='Umaban']").unwrap();
        let text = row.select(&sel).next().map(own_text).unwrap_or_default();
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
        let name = select_text(row, "div.Horse_Name a")
            .ok_or_else(|| ScraperError::parse("horse name", self.page.url()))?;
        Ok(arrange_string(&name))
    }

    pub fn horse_id(&self, index: usize) -> Result<u64, ScraperError> {
        let row = self.row(index)?;
        let href = select_href(row, "div.Horse_Name a")
            .ok_or_else(|| ScraperError::parse("horse ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Published training grade. Absent when the evaluators left the cell
    /// blank.
    pub fn evaluation(&self, index: usize) -> Result<Option<String>, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td").unwrap();
        let text = row
            .select(&sel)
            .nth(5)
            .map(own_text)
            .map(|text| arrange_string(&text))
            .filter(|text| !text.is_empty());
        if text.is_none() {
            warn!(
                "training evaluation not available; none may have been published. \
                 index: {}, URL: {}",
                index,
                self.page.url()
            );
        }
        Ok(text)
    }

    fn row(&self, index: usize) -> Result<ElementRef<'_>, ScraperError> {
        super::nth_row(self.page.html(), &self.rows, index, self.page.url())
    }
}
