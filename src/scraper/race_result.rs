//! Race-result extractor.

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

/// Typed accessors over one race-result page.
///
/// Horses scratched or excluded after the entry list closed still appear in
/// the result table without a finishing position, time, odds or weight;
/// those accessors return `Ok(None)` with a warning.
pub struct RaceResult {
    page: Page,
    race_id: u64,
    rows: Vec<NodeId>,
}

impl RaceResult {
    /// Fetch one result page and build its extractor.
    pub async fn create(race_id: u64) -> Result<RaceResult, ScraperError> {
        let url = PageUrl::race_result(race_id)?;
        let page = Fetcher::new().fetch_one(url).await?;
        RaceResult::new(page)
    }

    /// Fetch many result pages concurrently. Output order mirrors
    /// `race_ids`; a failed fetch or a bad page fails only its own slot.
    pub async fn create_many(
        race_ids: &[u64],
    ) -> Result<Vec<Result<RaceResult, ScraperError>>, ScraperError> {
        let urls = race_ids
            .iter()
            .map(|&id| PageUrl::race_result(id))
            .collect::<Result<Vec<_>, _>>()?;
        let pages = Fetcher::new().fetch_all(urls).await;
        Ok(pages
            .into_iter()
            .map(|page| page.and_then(RaceResult::new))
            .collect())
    }

    /// Build an extractor over an already fetched page.
    pub fn new(page: Page) -> Result<RaceResult, ScraperError> {
        super::check_category(&page, PageCategory::RaceResult)?;
        let race_id = id_from_url(page.url())?;
        let rows = super::collect_rows(page.html(), "table#All_Result_Table", "tr.HorseList")
            .unwrap_or_default();
        if rows.is_empty() {
            tracing::error!("no result table found. URL: {}", page.url());
            return Err(ScraperError::TableNotFound(format!(
                "race result at {}",
                page.url()
            )));
        }
        Ok(RaceResult {
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

    /// Number of rows in the result table (scratched runners included).
    pub fn horse_count(&self) -> usize {
        self.rows.len()
    }

    /// Finishing position. Absent for scratched or excluded runners.
    pub fn finish_rank(&self, index: usize) -> Result<Option<u32>, ScraperError> {
        let row = self.row(index)?;
        let text = select_text(row, "div.Rank").unwrap_or_default();
        match arrange_string(&text).parse() {
            Ok(rank) => Ok(Some(rank)),
            Err(_) => {
                warn!(
                    "finish rank not available; the runner may have been scratched \
                     or excluded. index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    pub fn frame_number(&self, index: usize) -> Result<u8, ScraperError> {
        let row = self.row(index)?;
        let text = select_text(row, "td[class*='Waku'] div")
            .ok_or_else(|| ScraperError::parse("frame number", self.page.url()))?;
        arrange_string(&text)
            .parse()
            .map_err(|_| ScraperError::parse("frame number", self.page.url()))
    }

    pub fn horse_number(&self, index: usize) -> Result<u8, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td").unwrap();
        let td = row
            .select(&sel)
            .nth(2)
            .ok_or_else(|| ScraperError::parse("horse number", self.page.url()))?;
        let text = select_text(td, "div")
            .ok_or_else(|| ScraperError::parse("horse number", self.page.url()))?;
        arrange_string(&text)
            .parse()
            .map_err(|_| ScraperError::parse("horse number", self.page.url()))
    }

    pub fn horse_name(&self, index: usize) -> Result<String, ScraperError> {
        let row = self.row(index)?;
        let name = select_text(row, "span.Horse_Name a")
            .ok_or_else(|| ScraperError::parse("horse name", self.page.url()))?;
        Ok(arrange_string(&name))
    }

    pub fn horse_id(&self, index: usize) -> Result<u64, ScraperError> {
        let row = self.row(index)?;
        let href = select_href(row, "span.Horse_Name a")
            .ok_or_else(|| ScraperError::parse("horse ID", self.page.url()))?;
        id_from_url(&href)
    }

    pub fn sex_age(&self, index: usize) -> Result<String, ScraperError> {
        let row = self.row(index)?;
        let text = select_text(row, "div.Horse_Info_Detail span")
            .ok_or_else(|| ScraperError::parse("sex and age", self.page.url()))?;
        Ok(arrange_string(&text))
    }

    /// Weight carried by the jockey, in kg.
    pub fn jockey_weight(&self, index: usize) -> Result<f64, ScraperError> {
        let row = self.row(index)?;
        let text = select_text(row, "span.JockeyWeight")
            .ok_or_else(|| ScraperError::parse("jockey weight", self.page.url()))?;
        arrange_string(&text)
            .parse()
            .map_err(|_| ScraperError::parse("jockey weight", self.page.url()))
    }

    pub fn jockey_name(&self, index: usize) -> Result<String, ScraperError> {
        let row = self.row(index)?;
        let name = select_text(row, "td.Jockey a")
            .ok_or_else(|| ScraperError::parse("jockey name", self.page.url()))?;
        Ok(arrange_string(&name))
    }

    pub fn jockey_id(&self, index: usize) -> Result<u64, ScraperError> {
        let row = self.row(index)?;
        let href = select_href(row, "td.Jockey a")
            .ok_or_else(|| ScraperError::parse("jockey ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Finishing time, e.g. "2:32.4". Absent for scratched or excluded
    /// runners.
    pub fn finish_time(&self, index: usize) -> Result<Option<String>, ScraperError> {
        let row = self.row(index)?;
        let time = select_text(row, "span.RaceTime")
            .map(|text| arrange_string(&text))
            .filter(|text| !text.is_empty());
        if time.is_none() {
            warn!(
                "finish time not available; the runner may have been scratched \
                 or excluded. index: {}, URL: {}",
                index,
                self.page.url()
            );
        }
        Ok(time)
    }

    /// Win-market popularity rank. Absent for scratched runners.
    pub fn popularity(&self, index: usize) -> Result<Option<u32>, ScraperError> {
        let row = self.row(index)?;
        let text = select_text(row, "span.OddsPeople").unwrap_or_default();
        match arrange_string(&text).parse() {
            Ok(rank) => Ok(Some(rank)),
            Err(_) => {
                warn!(
                    "popularity not available; the runner may have been scratched. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Win odds at post time. Absent for scratched runners.
    pub fn win_odds(&self, index: usize) -> Result<Option<f64>, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td").unwrap();
        let text = row
            .select(&sel)
            .nth(10)
            .and_then(|td| select_text(td, "span"))
            .unwrap_or_default();
        match arrange_string(&text).parse() {
            Ok(odds) => Ok(Some(odds)),
            Err(_) => {
                warn!(
                    "win odds not available; the runner may have been scratched. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Last-3-furlong time in seconds. Absent for scratched or excluded
    /// runners.
    pub fn last_3f_time(&self, index: usize) -> Result<Option<f64>, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td").unwrap();
        let text = row
            .select(&sel)
            .nth(11)
            .map(own_text)
            .unwrap_or_default();
        match arrange_string(&text).parse() {
            Ok(time) => Ok(Some(time)),
            Err(_) => {
                warn!(
                    "last 3F time not available; the runner may have been scratched \
                     or excluded. index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Corner passing order, e.g. "14-15-14-15". Absent for scratched or
    /// excluded runners.
    pub fn corner_passings(&self, index: usize) -> Result<Option<String>, ScraperError> {
        let row = self.row(index)?;
        let passings = select_text(row, "td.PassageRate")
            .map(|text| arrange_string(&text))
            .filter(|text| !text.is_empty());
        if passings.is_none() {
            warn!(
                "corner passing order not available; the runner may have been \
                 scratched or excluded. index: {}, URL: {}",
                index,
                self.page.url()
            );
        }
        Ok(passings)
    }

    /// Training centre the horse belongs to (栗東/美浦).
    pub fn stable_area(&self, index: usize) -> Result<String, ScraperError> {
        let row = self.row(index)?;
        let area = select_text(row, "td.Trainer span")
            .ok_or_else(|| ScraperError::parse("stable area", self.page.url()))?;
        Ok(arrange_string(&area))
    }

    /// Horse body weight in kg. Absent for scratched runners.
    pub fn horse_weight(&self, index: usize) -> Result<Option<u32>, ScraperError> {
        let row = self.row(index)?;
        let sel = Selector::parse("td.Weight").unwrap();
        let text = row.select(&sel).next().map(own_text).unwrap_or_default();
        match arrange_string(&text).parse() {
            Ok(weight) => Ok(Some(weight)),
            Err(_) => {
                warn!(
                    "horse weight not available; the runner may have been scratched. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Body-weight change since the last run. Absent for scratched runners
    /// and when the previous weight could not be measured.
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
                "horse weight change not available; the runner may have been \
                 scratched or the previous weight unmeasurable. index: {}, URL: {}",
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

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>有馬記念 レース結果 | 2022年12月25日 中山11R レース情報(JRA) - netkeiba</title></head>
<body>
<div class="RaceList_NameBox">
  <div class="RaceName">有馬記念<span class="Icon_GradeType Icon_GradeType1"></span></div>
  <div class="RaceData01">15:25発走 / <span>芝2500m</span> (右)</div>
  <div class="RaceData02"><span>5回</span><span>中山</span><span>8日目</span></div>
</div>
<table id="All_Result_Table" class="RaceTable01">
  <tr class="HorseList">
    <td class="Result_Num"><div class="Rank">1</div></td>
    <td class="Num Waku7"><div>7</div></td>
    <td class="Num"><div>9</div></td>
    <td class="Horse_Info"><span class="Horse_Name"><a href="https://db.netkeiba.com/horse/2019105219">イクイノックス</a></span></td>
    <td class="Horse_Info"><div class="Horse_Info_Detail">牡3<span>牡3</span></div></td>
    <td class="Num Txt_C"><span class="JockeyWeight">55</span></td>
    <td class="Jockey"><a href="https://db.netkeiba.com/jockey/result/recent/05339/">ルメール</a></td>
    <td class="Time"><span class="RaceTime">2:32.4</span></td>
    <td class="Time"></td>
    <td class="Odds Txt_C"><span class="OddsPeople">1</span></td>
    <td class="Odds Txt_R"><span>2.3</span></td>
    <td class="Time BgBlue02">35.4</td>
    <td class="PassageRate">3-3-3-2</td>
    <td class="Trainer"><span>美浦</span><a href="https://db.netkeiba.com/trainer/result/recent/01110/">木村哲也</a></td>
    <td class="Weight">492<small>(+2)</small></td>
  </tr>
  <tr class="HorseList">
    <td class="Result_Num"><div class="Rank">取消</div></td>
    <td class="Num Waku3"><div>3</div></td>
    <td class="Num"><div>5</div></td>
    <td class="Horse_Info"><span class="Horse_Name"><a href="https://db.netkeiba.com/horse/2015104961">ヴェラアズール</a></span></td>
    <td class="Horse_Info"><div class="Horse_Info_Detail">牡7<span>牡7</span></div></td>
    <td class="Num Txt_C"><span class="JockeyWeight">57.5</span></td>
    <td class="Jockey"><a href="https://db.netkeiba.com/jockey/result/recent/01088/">松山弘平</a></td>
    <td class="Time"><span class="RaceTime"></span></td>
    <td class="Time"></td>
    <td class="Odds Txt_C"><span class="OddsPeople"></span></td>
    <td class="Odds Txt_R"><span></span></td>
    <td class="Time"></td>
    <td class="PassageRate"></td>
    <td class="Trainer"><span>栗東</span><a href="https://db.netkeiba.com/trainer/result/recent/01101/">渡辺薫彦</a></td>
    <td class="Weight">計不</td>
  </tr>
</table>
</body>
</html>"#;

    fn sample_result() -> RaceResult {
        let url = PageUrl::race_result(202206050811).unwrap();
        RaceResult::new(Page::from_html(url, SAMPLE_HTML)).unwrap()
    }

    #[test]
    fn test_race_header() {
        let result = sample_result();
        assert_eq!(result.race_id(), 202206050811);
        assert_eq!(result.race_name().unwrap(), "有馬記念");
        assert_eq!(
            result.race_date().unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 25).unwrap()
        );
        assert_eq!(result.course_type().unwrap(), CourseType::Turf);
        assert_eq!(result.distance().unwrap(), 2500);
        assert_eq!(result.venue().unwrap(), Venue::Nakayama);
        assert_eq!(result.horse_count(), 2);
    }

    #[test]
    fn test_winner_row() {
        let result = sample_result();
        assert_eq!(result.finish_rank(0).unwrap(), Some(1));
        assert_eq!(result.frame_number(0).unwrap(), 7);
        assert_eq!(result.horse_number(0).unwrap(), 9);
        assert_eq!(result.horse_name(0).unwrap(), "イクイノックス");
        assert_eq!(result.horse_id(0).unwrap(), 2019105219);
        assert_eq!(result.sex_age(0).unwrap(), "牡3");
        assert_eq!(result.jockey_weight(0).unwrap(), 55.0);
        assert_eq!(result.jockey_name(0).unwrap(), "ルメール");
        assert_eq!(result.jockey_id(0).unwrap(), 5339);
        assert_eq!(result.finish_time(0).unwrap().as_deref(), Some("2:32.4"));
        assert_eq!(result.popularity(0).unwrap(), Some(1));
        assert_eq!(result.win_odds(0).unwrap(), Some(2.3));
        assert_eq!(result.last_3f_time(0).unwrap(), Some(35.4));
        assert_eq!(
            result.corner_passings(0).unwrap().as_deref(),
            Some("3-3-3-2")
        );
        assert_eq!(result.stable_area(0).unwrap(), "美浦");
        assert_eq!(result.horse_weight(0).unwrap(), Some(492));
        assert_eq!(result.horse_weight_diff(0).unwrap(), Some(2));
    }

    #[test]
    fn test_scratched_row_fields_are_absent() {
        let result = sample_result();
        assert_eq!(result.finish_rank(1).unwrap(), None);
        assert_eq!(result.finish_time(1).unwrap(), None);
        assert_eq!(result.popularity(1).unwrap(), None);
        assert_eq!(result.win_odds(1).unwrap(), None);
        assert_eq!(result.last_3f_time(1).unwrap(), None);
        assert_eq!(result.corner_passings(1).unwrap(), None);
        assert_eq!(result.horse_weight(1).unwrap(), None);
        assert_eq!(result.horse_weight_diff(1).unwrap(), None);
        // Identity still resolves
        assert_eq!(result.horse_name(1).unwrap(), "ヴェラアズール");
        assert_eq!(result.frame_number(1).unwrap(), 3);
    }

    #[test]
    fn test_out_of_range_index() {
        let result = sample_result();
        assert!(matches!(
            result.finish_rank(2),
            Err(ScraperError::TableIndex { index: 2, len: 2, .. })
        ));
        assert!(matches!(
            result.horse_name(10),
            Err(ScraperError::TableIndex { index: 10, .. })
        ));
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let url = PageUrl::race_result(202206050811).unwrap();
        let page = Page::from_html(url, "<html><body></body></html>");
        assert!(matches!(
            RaceResult::new(page),
            Err(ScraperError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_category_mismatch() {
        let url = PageUrl::race_card(202206050811).unwrap();
        let page = Page::from_html(url, SAMPLE_HTML);
        assert!(matches!(
            RaceResult::new(page),
            Err(ScraperError::CategoryMismatch { .. })
        ));
    }
}
