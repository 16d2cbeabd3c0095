//! Race-search result extractor (db.netkeiba.com race list).

use chrono::NaiveDate;
use ego_tree::NodeId;
use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::category::PageCategory;
use crate::error::ScraperError;
use crate::fetch::Fetcher;
use crate::page::Page;
use crate::text::{arrange_string, id_from_url};
use crate::url::{PageUrl, RaceSearchQuery};

use super::{own_text, select_href, select_text};

/// Typed accessors over one race-search result page.
///
/// A search that matches nothing is a normal outcome: the page then carries
/// no results table and `race_count()` is zero.
pub struct RaceSearch {
    page: Page,
    rows: Vec<NodeId>,
}

impl RaceSearch {
    /// Run one search and build the extractor over its result page.
    pub async fn create(query: &RaceSearchQuery) -> Result<RaceSearch, ScraperError> {
        let url = PageUrl::race_search(query)?;
        let page = Fetcher::new().fetch_one(url).await?;
        RaceSearch::new(page)
    }

    /// Build an extractor over an already fetched page.
    pub fn new(page: Page) -> Result<RaceSearch, ScraperError> {
        super::check_category(&page, PageCategory::RaceSearch)?;
        let rows = match super::collect_rows(page.html(), "table.race_table_01", "tr") {
            // The first row is the column header
            Some(rows) => rows.into_iter().skip(1).collect(),
            None => {
                warn!("no races matched the search. URL: {}", page.url());
                Vec::new()
            }
        };
        Ok(RaceSearch { rows, page })
    }

    /// Number of races the search matched.
    pub fn race_count(&self) -> usize {
        self.rows.len()
    }

    pub fn race_date(&self, index: usize) -> Result<NaiveDate, ScraperError> {
        let cell = self.cell(index, 0)?;
        let text = select_text(cell, "a")
            .ok_or_else(|| ScraperError::parse("race date", self.page.url()))?;
        NaiveDate::parse_from_str(arrange_string(&text).as_str(), "%Y/%m/%d")
            .map_err(|_| ScraperError::parse("race date", self.page.url()))
    }

    pub fn race_name(&self, index: usize) -> Result<String, ScraperError> {
        let cell = self.cell(index, 4)?;
        let text = select_text(cell, "a")
            .ok_or_else(|| ScraperError::parse("race name", self.page.url()))?;
        Ok(arrange_string(&text))
    }

    pub fn race_id(&self, index: usize) -> Result<u64, ScraperError> {
        let cell = self.cell(index, 4)?;
        let href = select_href(cell, "a")
            .ok_or_else(|| ScraperError::parse("race ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Field size of the matched race.
    pub fn horse_count(&self, index: usize) -> Result<u32, ScraperError> {
        let cell = self.cell(index, 7)?;
        arrange_string(&own_text(cell))
            .parse()
            .map_err(|_| ScraperError::parse("field size", self.page.url()))
    }

    fn cell(&self, index: usize, cell: usize) -> Result<ElementRef<'_>, ScraperError> {
        let row = super::nth_row(self.page.html(), &self.rows, index, self.page.url())?;
        let sel = Selector::parse("td").unwrap();
        row.select(&sel)
            .nth(cell)
            .ok_or_else(|| ScraperError::parse("search result cell", self.page.url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::CourseType;
    use crate::venue::Venue;

    const SAMPLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>レース検索結果 | netkeiba</title></head>
<body>
<table class="race_table_01 nk_tb_common">
  <tr>
    <th>日付</th><th>開催</th><th>天気</th><th>R</th><th>レース名</th><th>映像</th><th>距離</th><th>頭数</th>
  </tr>
  <tr>
    <td><a href="https://db.netkeiba.com/race/list/20221225/">2022/12/25</a></td>
    <td><a href="https://db.netkeiba.com/race/sum/06/20221225/">5中山8</a></td>
    <td>晴</td>
    <td>11</td>
    <td><a href="https://db.netkeiba.com/race/202206050811/">有馬記念</a></td>
    <td></td>
    <td>芝2500</td>
    <td>16</td>
  </tr>
  <tr>
    <td><a href="https://db.netkeiba.com/race/list/20211226/">2021/12/26</a></td>
    <td><a href="https://db.netkeiba.com/race/sum/06/20211226/">5中山8</a></td>
    <td>曇</td>
    <td>11</td>
    <td><a href="https://db.netkeiba.com/race/202106050811/">有馬記念</a></td>
    <td></td>
    <td>芝2500</td>
    <td>16</td>
  </tr>
</table>
</body>
</html>"#;

    fn sample_query() -> RaceSearchQuery {
        RaceSearchQuery {
            race_name: "有馬記念".to_string(),
            venue: Venue::Nakayama,
            distance: 2500,
            course_type: CourseType::Turf,
            start_year: 2021,
            start_month: 1,
            end_year: 2022,
            end_month: 12,
        }
    }

    fn sample_search() -> RaceSearch {
        let url = PageUrl::race_search(&sample_query()).unwrap();
        RaceSearch::new(Page::from_html(url, SAMPLE_HTML)).unwrap()
    }

    #[test]
    fn test_matched_races() {
        let search = sample_search();
        assert_eq!(search.race_count(), 2);
        assert_eq!(
            search.race_date(0).unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 25).unwrap()
        );
        assert_eq!(search.race_name(0).unwrap(), "有馬記念");
        assert_eq!(search.race_id(0).unwrap(), 202206050811);
        assert_eq!(search.horse_count(0).unwrap(), 16);
        assert_eq!(search.race_id(1).unwrap(), 202106050811);
    }

    #[test]
    fn test_no_match_is_legal() {
        let url = PageUrl::race_search(&sample_query()).unwrap();
        let search =
            RaceSearch::new(Page::from_html(url, "<html><body>該当レースなし</body></html>"))
                .unwrap();
        assert_eq!(search.race_count(), 0);
        assert!(matches!(
            search.race_date(0),
            Err(ScraperError::TableIndex { index: 0, len: 0, .. })
        ));
    }

    #[test]
    fn test_out_of_range_index() {
        let search = sample_search();
        assert!(matches!(
            search.race_name(2),
            Err(ScraperError::TableIndex { index: 2, len: 2, .. })
        ));
    }
}
