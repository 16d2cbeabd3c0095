//! Horse profile and race-history extractor (db.netkeiba.com).

use chrono::NaiveDate;
use regex::Regex;
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

use super::{own_text, select_href, select_text, split_course_distance, split_horse_weight};

/// Typed accessors over one horse profile page.
///
/// The profile and pedigree tables are always present; the race-history
/// table is not — a horse that has never raced has none, which is legal and
/// reported through [`HorseProfile::has_race_history`]. History rows cover
/// foreign starts too, where netkeiba leaves several columns unpopulated;
/// those accessors return `Ok(None)` with a warning.
pub struct HorseProfile {
    page: Page,
    horse_id: u64,
    profile_rows: Vec<NodeId>,
    history_rows: Vec<NodeId>,
    has_history: bool,
}

impl HorseProfile {
    /// Fetch one profile page and build its extractor.
    pub async fn create(horse_id: u64) -> Result<HorseProfile, ScraperError> {
        let url = PageUrl::horse_profile(horse_id)?;
        let page = Fetcher::new().fetch_one(url).await?;
        HorseProfile::new(page)
    }

    /// Fetch many profile pages concurrently. Output order mirrors
    /// `horse_ids`; a failed fetch or a bad page fails only its own slot.
    pub async fn create_many(
        horse_ids: &[u64],
    ) -> Result<Vec<Result<HorseProfile, ScraperError>>, ScraperError> {
        let urls = horse_ids
            .iter()
            .map(|&id| PageUrl::horse_profile(id))
            .collect::<Result<Vec<_>, _>>()?;
        let pages = Fetcher::new().fetch_all(urls).await;
        Ok(pages
            .into_iter()
            .map(|page| page.and_then(HorseProfile::new))
            .collect())
    }

    /// Build an extractor over an already fetched page.
    pub fn new(page: Page) -> Result<HorseProfile, ScraperError> {
        super::check_category(&page, PageCategory::HorseProfile)?;
        let horse_id = id_from_url(page.url())?;

        let profile_rows = super::collect_rows(page.html(), "table.db_prof_table", "tr")
            .unwrap_or_default();
        if profile_rows.is_empty() {
            tracing::error!("no horse profile found. URL: {}", page.url());
            return Err(ScraperError::TableNotFound(format!(
                "horse profile at {}",
                page.url()
            )));
        }

        // New horses have no history table at all. That is a legal page
        // state, not a scraping failure.
        let history_rows =
            super::collect_rows(page.html(), "table.db_h_race_results", "tbody tr");
        let has_history = history_rows.is_some();
        if !has_history {
            warn!(
                "no race history found; the horse may not have raced yet. URL: {}",
                page.url()
            );
        }

        Ok(HorseProfile {
            horse_id,
            profile_rows,
            history_rows: history_rows.unwrap_or_default(),
            has_history,
            page,
        })
    }

    pub fn horse_id(&self) -> u64 {
        self.horse_id
    }

    pub fn horse_name(&self) -> Result<String, ScraperError> {
        let sel = Selector::parse("div.horse_title h1").unwrap();
        let h1 = self
            .page
            .html()
            .select(&sel)
            .next()
            .ok_or_else(|| ScraperError::parse("horse name", self.page.url()))?;
        Ok(arrange_string(&own_text(h1)))
    }

    pub fn trainer_name(&self) -> Result<String, ScraperError> {
        let row = self.profile_row(1)?;
        let name = select_text(row, "a")
            .ok_or_else(|| ScraperError::parse("trainer name", self.page.url()))?;
        Ok(arrange_string(&name))
    }

    pub fn trainer_id(&self) -> Result<u64, ScraperError> {
        let row = self.profile_row(1)?;
        let href = select_href(row, "a")
            .ok_or_else(|| ScraperError::parse("trainer ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Training centre the horse belongs to (栗東/美浦), from the
    /// parenthesized token after the trainer link.
    pub fn stable_area(&self) -> Result<String, ScraperError> {
        let row = self.profile_row(1)?;
        let sel = Selector::parse("td").unwrap();
        let td = row
            .select(&sel)
            .next()
            .ok_or_else(|| ScraperError::parse("stable area", self.page.url()))?;
        let area = arrange_string(&own_text(td));
        let trimmed: String = area
            .chars()
            .filter(|c| *c != '(' && *c != ')')
            .collect();
        if trimmed.is_empty() {
            return Err(ScraperError::parse("stable area", self.page.url()));
        }
        Ok(trimmed)
    }

    /// Sire name from the pedigree table.
    pub fn father_name(&self) -> Result<String, ScraperError> {
        let father = self.father_cell()?;
        let name = select_text(father, "a")
            .ok_or_else(|| ScraperError::parse("father name", self.page.url()))?;
        Ok(arrange_string(&name))
    }

    /// Sire ID from the pedigree table.
    pub fn father_id(&self) -> Result<u64, ScraperError> {
        let father = self.father_cell()?;
        let href = select_href(father, "a")
            .ok_or_else(|| ScraperError::parse("father ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Whether the page carries a race-history table at all.
    pub fn has_race_history(&self) -> bool {
        self.has_history
    }

    /// Number of past starts in the history table.
    pub fn race_history_len(&self) -> usize {
        self.history_rows.len()
    }

    pub fn race_date(&self, index: usize) -> Result<NaiveDate, ScraperError> {
        let cell = self.history_cell(index, 0)?;
        let text = select_text(cell, "a")
            .ok_or_else(|| ScraperError::parse("race date", self.page.url()))?;
        NaiveDate::parse_from_str(arrange_string(&text).as_str(), "%Y/%m/%d")
            .map_err(|_| ScraperError::parse("race date", self.page.url()))
    }

    /// Venue display name, with the meeting numbers stripped ("5中山8" ->
    /// "中山"). Foreign courses come back as written.
    pub fn venue_name(&self, index: usize) -> Result<String, ScraperError> {
        let cell = self.history_cell(index, 1)?;
        let text = select_text(cell, "a")
            .ok_or_else(|| ScraperError::parse("venue name", self.page.url()))?;
        let re = Regex::new(r"[0-9]+").unwrap();
        Ok(re.replace_all(&arrange_string(&text), "").to_string())
    }

    /// Venue as a JRA course code. Fails for foreign and local courses
    /// outside the closed JRA set.
    pub fn venue(&self, index: usize) -> Result<Venue, ScraperError> {
        Venue::from_name(&self.venue_name(index)?)
    }

    pub fn race_name(&self, index: usize) -> Result<String, ScraperError> {
        let cell = self.history_cell(index, 4)?;
        let text = select_text(cell, "a")
            .ok_or_else(|| ScraperError::parse("race name", self.page.url()))?;
        Ok(arrange_string(&text))
    }

    pub fn race_id(&self, index: usize) -> Result<u64, ScraperError> {
        let cell = self.history_cell(index, 4)?;
        let href = select_href(cell, "a")
            .ok_or_else(|| ScraperError::parse("race ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Frame number. Absent for foreign races that run without one.
    pub fn frame_number(&self, index: usize) -> Result<Option<u8>, ScraperError> {
        let cell = self.history_cell(index, 7)?;
        match arrange_string(&own_text(cell)).parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                warn!(
                    "frame number not available; this may be a foreign race. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    pub fn horse_number(&self, index: usize) -> Result<u8, ScraperError> {
        let cell = self.history_cell(index, 8)?;
        arrange_string(&own_text(cell))
            .parse()
            .map_err(|_| ScraperError::parse("horse number", self.page.url()))
    }

    /// Win odds in that race. Absent when the start was scratched.
    pub fn win_odds(&self, index: usize) -> Result<Option<f64>, ScraperError> {
        let cell = self.history_cell(index, 9)?;
        match arrange_string(&own_text(cell)).parse() {
            Ok(odds) => Ok(Some(odds)),
            Err(_) => {
                warn!(
                    "win odds not available; the start may have been scratched. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Win-market popularity rank in that race. Absent when the start was
    /// scratched.
    pub fn popularity(&self, index: usize) -> Result<Option<u32>, ScraperError> {
        let cell = self.history_cell(index, 10)?;
        match arrange_string(&own_text(cell)).parse() {
            Ok(rank) => Ok(Some(rank)),
            Err(_) => {
                warn!(
                    "popularity not available; the start may have been scratched. \
                     index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Finishing position. Absent for scratched or excluded starts and for
    /// races that were called off.
    pub fn finish_rank(&self, index: usize) -> Result<Option<u32>, ScraperError> {
        let cell = self.history_cell(index, 11)?;
        let text = arrange_string(&own_text(cell));
        if text.is_empty() {
            warn!(
                "finish rank not available; the race may have been called off. \
                 index: {}, URL: {}",
                index,
                self.page.url()
            );
            return Ok(None);
        }
        match text.parse() {
            Ok(rank) => Ok(Some(rank)),
            Err(_) => {
                warn!(
                    "finish rank not available; the start may have been scratched \
                     or excluded. index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    pub fn jockey_name(&self, index: usize) -> Result<String, ScraperError> {
        let cell = self.history_cell(index, 12)?;
        let text = select_text(cell, "a")
            .ok_or_else(|| ScraperError::parse("jockey name", self.page.url()))?;
        Ok(arrange_string(&text))
    }

    pub fn jockey_id(&self, index: usize) -> Result<u64, ScraperError> {
        let cell = self.history_cell(index, 12)?;
        let href = select_href(cell, "a")
            .ok_or_else(|| ScraperError::parse("jockey ID", self.page.url()))?;
        id_from_url(&href)
    }

    /// Weight carried by the jockey, in kg.
    pub fn jockey_weight(&self, index: usize) -> Result<f64, ScraperError> {
        let cell = self.history_cell(index, 13)?;
        arrange_string(&own_text(cell))
            .parse()
            .map_err(|_| ScraperError::parse("jockey weight", self.page.url()))
    }

    pub fn course_type(&self, index: usize) -> Result<CourseType, ScraperError> {
        Ok(self.course_distance(index)?.0)
    }

    pub fn distance(&self, index: usize) -> Result<u32, ScraperError> {
        Ok(self.course_distance(index)?.1)
    }

    /// Finishing time, e.g. "2:32.4". Absent for scratched or excluded
    /// starts and for foreign races that publish none.
    pub fn finish_time(&self, index: usize) -> Result<Option<String>, ScraperError> {
        let cell = self.history_cell(index, 17)?;
        let text = arrange_string(&own_text(cell));
        if text.chars().count() <= 1 {
            warn!(
                "finish time not available; the start may have been scratched, \
                 excluded, or run abroad without a published time. index: {}, URL: {}",
                index,
                self.page.url()
            );
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// Margin to the winner. Absent for scratched, excluded, or foreign
    /// starts.
    pub fn margin(&self, index: usize) -> Result<Option<String>, ScraperError> {
        let cell = self.history_cell(index, 18)?;
        let text = arrange_string(&own_text(cell));
        if text.chars().count() <= 1 {
            warn!(
                "margin not available; the start may have been scratched, \
                 excluded, or run abroad. index: {}, URL: {}",
                index,
                self.page.url()
            );
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// Corner passing order. Absent for scratched, excluded, or foreign
    /// starts. A single digit is legal on straight courses.
    pub fn corner_passings(&self, index: usize) -> Result<Option<String>, ScraperError> {
        let cell = self.history_cell(index, 20)?;
        let text = arrange_string(&own_text(cell));
        if text.chars().count() <= 1 && text.parse::<u32>().is_err() {
            warn!(
                "corner passing order not available; the start may have been \
                 scratched, excluded, or run abroad. index: {}, URL: {}",
                index,
                self.page.url()
            );
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// Last-3-furlong time in seconds. Absent for scratched, excluded, or
    /// foreign starts.
    pub fn last_3f_time(&self, index: usize) -> Result<Option<f64>, ScraperError> {
        let cell = self.history_cell(index, 22)?;
        match arrange_string(&own_text(cell)).parse() {
            Ok(time) => Ok(Some(time)),
            Err(_) => {
                warn!(
                    "last 3F time not available; the start may have been scratched, \
                     excluded, or run abroad. index: {}, URL: {}",
                    index,
                    self.page.url()
                );
                Ok(None)
            }
        }
    }

    /// Horse body weight in that race. Absent for scratched starts and
    /// foreign races where it was not measured.
    pub fn horse_weight(&self, index: usize) -> Result<Option<u32>, ScraperError> {
        let (weight, _) = self.weight_token(index)?;
        if weight.is_none() {
            warn!(
                "horse weight not available; the start may have been scratched \
                 or run abroad. index: {}, URL: {}",
                index,
                self.page.url()
            );
        }
        Ok(weight)
    }

    /// Body-weight change in that race. Absent whenever the weight is.
    pub fn horse_weight_diff(&self, index: usize) -> Result<Option<i32>, ScraperError> {
        let (_, diff) = self.weight_token(index)?;
        if diff.is_none() {
            warn!(
                "horse weight change not available; the start may have been \
                 scratched or run abroad. index: {}, URL: {}",
                index,
                self.page.url()
            );
        }
        Ok(diff)
    }

    fn course_distance(&self, index: usize) -> Result<(CourseType, u32), ScraperError> {
        let cell = self.history_cell(index, 14)?;
        split_course_distance(&arrange_string(&own_text(cell)))
            .ok_or_else(|| ScraperError::parse("course and distance", self.page.url()))
    }

    fn weight_token(&self, index: usize) -> Result<(Option<u32>, Option<i32>), ScraperError> {
        let cell = self.history_cell(index, 23)?;
        Ok(split_horse_weight(&arrange_string(&own_text(cell))))
    }

    fn father_cell(&self) -> Result<ElementRef<'_>, ScraperError> {
        let sel = Selector::parse("table.blood_table tr td").unwrap();
        self.page
            .html()
            .select(&sel)
            .next()
            .ok_or_else(|| ScraperError::parse("pedigree table", self.page.url()))
    }

    fn profile_row(&self, index: usize) -> Result<ElementRef<'_>, ScraperError> {
        super::nth_row(self.page.html(), &self.profile_rows, index, self.page.url())
    }

    fn history_cell(&self, index: usize, cell: usize) -> Result<ElementRef<'_>, ScraperError> {
        let row = super::nth_row(self.page.html(), &self.history_rows, index, self.page.url())?;
        let sel = Selector::parse("td").unwrap();
        row.select(&sel)
            .nth(cell)
            .ok_or_else(|| ScraperError::parse("history cell", self.page.url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // History columns: 日付, 開催, 天気, R, レース名, 映像, 頭数, 枠番, 馬番,
    // オッズ, 人気, 着順, 騎手, 斤量, 距離, 馬場, 馬場指数, タイム, 着差,
    // タイム指数, 通過, ペース, 上り, 馬体重, 備考
    const SAMPLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>イクイノックス | 競走馬データ - netkeiba</title></head>
<body>
<div class="db_head_name fc"><div class="horse_title"><h1>イクイノックス</h1><p class="eng_name">Equinox</p></div></div>
<table class="blood_table">
  <tr><td rowspan="2" class="b_ml"><a href="https://db.netkeiba.com/horse/ped/2012102013/">キタサンブラック</a></td><td class="b_ml"><a href="https://db.netkeiba.com/horse/ped/2000103377/">ブラックタイド</a></td></tr>
</table>
<table class="db_prof_table">
  <tr><th>生年月日</th><td>2019年3月23日</td></tr>
  <tr><th>調教師</th><td><a href="https://db.netkeiba.com/trainer/01110/">木村哲也</a> (美浦)</td></tr>
  <tr><th>馬主</th><td><a href="https://db.netkeiba.com/owner/709006/">シルクレーシング</a></td></tr>
</table>
<table class="db_h_race_results nk_tb_common">
  <thead><tr><th>日付</th></tr></thead>
  <tbody>
  <tr>
    <td><a href="https://db.netkeiba.com/race/list/20221225/">2022/12/25</a></td>
    <td><a href="https://db.netkeiba.com/race/sum/06/20221225/">5中山8</a></td>
    <td>晴</td>
    <td>11</td>
    <td><a href="https://db.netkeiba.com/race/202206050811/">有馬記念(G1)</a></td>
    <td></td>
    <td>16</td>
    <td>7</td>
    <td>9</td>
    <td>2.3</td>
    <td>1</td>
    <td>1</td>
    <td><a href="https://db.netkeiba.com/jockey/result/recent/05339/">ルメール</a></td>
    <td>55</td>
    <td>芝2500</td>
    <td>良</td>
    <td></td>
    <td>2:32.4</td>
    <td>-0.4</td>
    <td></td>
    <td>3-3-3-2</td>
    <td>36.6-35.4</td>
    <td>35.4</td>
    <td>492(+2)</td>
    <td></td>
  </tr>
  <tr>
    <td><a href="https://db.netkeiba.com/race/list/20231126/">2023/11/26</a></td>
    <td><a href="https://db.netkeiba.com/race/sum/G0/20231126/">ロンシャン</a></td>
    <td>晴</td>
    <td>4</td>
    <td><a href="https://db.netkeiba.com/race/202300040104/">凱旋門賞(G1)</a></td>
    <td></td>
    <td>20</td>
    <td></td>
    <td>12</td>
    <td>4.6</td>
    <td>2</td>
    <td>4</td>
    <td><a href="https://db.netkeiba.com/jockey/result/recent/05339/">ルメール</a></td>
    <td>59.5</td>
    <td>芝2400</td>
    <td>重</td>
    <td></td>
    <td>-</td>
    <td>-</td>
    <td></td>
    <td>-</td>
    <td></td>
    <td>-</td>
    <td>計不</td>
    <td></td>
  </tr>
  </tbody>
</table>
</body>
</html>"#;

    const NO_HISTORY_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>新馬 | 競走馬データ - netkeiba</title></head>
<body>
<div class="horse_title"><h1>サンプルシンバ</h1></div>
<table class="db_prof_table">
  <tr><th>生年月日</th><td>2023年2月1日</td></tr>
  <tr><th>調教師</th><td><a href="https://db.netkeiba.com/trainer/01075/">中竹和也</a> (栗東)</td></tr>
</table>
</body>
</html>"#;

    fn sample_profile() -> HorseProfile {
        let url = PageUrl::horse_profile(2019105219).unwrap();
        HorseProfile::new(Page::from_html(url, SAMPLE_HTML)).unwrap()
    }

    #[test]
    fn test_profile_fields() {
        let profile = sample_profile();
        assert_eq!(profile.horse_id(), 2019105219);
        assert_eq!(profile.horse_name().unwrap(), "イクイノックス");
        assert_eq!(profile.trainer_name().unwrap(), "木村哲也");
        assert_eq!(profile.trainer_id().unwrap(), 1110);
        assert_eq!(profile.stable_area().unwrap(), "美浦");
        assert_eq!(profile.father_name().unwrap(), "キタサンブラック");
        assert_eq!(profile.father_id().unwrap(), 2012102013);
    }

    #[test]
    fn test_domestic_history_row() {
        let profile = sample_profile();
        assert!(profile.has_race_history());
        assert_eq!(profile.race_history_len(), 2);
        assert_eq!(
            profile.race_date(0).unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 25).unwrap()
        );
        assert_eq!(profile.venue_name(0).unwrap(), "中山");
        assert_eq!(profile.venue(0).unwrap(), Venue::Nakayama);
        assert_eq!(profile.race_name(0).unwrap(), "有馬記念(G1)");
        assert_eq!(profile.race_id(0).unwrap(), 202206050811);
        assert_eq!(profile.frame_number(0).unwrap(), Some(7));
        assert_eq!(profile.horse_number(0).unwrap(), 9);
        assert_eq!(profile.win_odds(0).unwrap(), Some(2.3));
        assert_eq!(profile.popularity(0).unwrap(), Some(1));
        assert_eq!(profile.finish_rank(0).unwrap(), Some(1));
        assert_eq!(profile.jockey_name(0).unwrap(), "ルメール");
        assert_eq!(profile.jockey_id(0).unwrap(), 5339);
        assert_eq!(profile.jockey_weight(0).unwrap(), 55.0);
        assert_eq!(profile.course_type(0).unwrap(), CourseType::Turf);
        assert_eq!(profile.distance(0).unwrap(), 2500);
        assert_eq!(profile.finish_time(0).unwrap().as_deref(), Some("2:32.4"));
        assert_eq!(profile.margin(0).unwrap().as_deref(), Some("-0.4"));
        assert_eq!(
            profile.corner_passings(0).unwrap().as_deref(),
            Some("3-3-3-2")
        );
        assert_eq!(profile.last_3f_time(0).unwrap(), Some(35.4));
        assert_eq!(profile.horse_weight(0).unwrap(), Some(492));
        assert_eq!(profile.horse_weight_diff(0).unwrap(), Some(2));
    }

    #[test]
    fn test_foreign_history_row() {
        let profile = sample_profile();
        assert_eq!(profile.frame_number(1).unwrap(), None);
        assert_eq!(profile.finish_time(1).unwrap(), None);
        assert_eq!(profile.margin(1).unwrap(), None);
        assert_eq!(profile.corner_passings(1).unwrap(), None);
        assert_eq!(profile.last_3f_time(1).unwrap(), None);
        assert_eq!(profile.horse_weight(1).unwrap(), None);
        assert_eq!(profile.horse_weight_diff(1).unwrap(), None);
        // Fields a foreign race still publishes
        assert_eq!(profile.venue_name(1).unwrap(), "ロンシャン");
        assert!(matches!(
            profile.venue(1),
            Err(ScraperError::InvalidValue(_))
        ));
        assert_eq!(profile.finish_rank(1).unwrap(), Some(4));
        assert_eq!(profile.horse_number(1).unwrap(), 12);
    }

    #[test]
    fn test_no_history_is_legal() {
        let url = PageUrl::horse_profile(2023100001).unwrap();
        let profile = HorseProfile::new(Page::from_html(url, NO_HISTORY_HTML)).unwrap();
        assert!(!profile.has_race_history());
        assert_eq!(profile.race_history_len(), 0);
        assert_eq!(profile.horse_name().unwrap(), "サンプルシンバ");
        // History accessors fail with an index error, not a crash
        assert!(matches!(
            profile.race_date(0),
            Err(ScraperError::TableIndex { index: 0, len: 0, .. })
        ));
    }

    #[test]
    fn test_missing_profile_table_is_fatal() {
        let url = PageUrl::horse_profile(2019105219).unwrap();
        let page = Page::from_html(url, "<html><body></body></html>");
        assert!(matches!(
            HorseProfile::new(page),
            Err(ScraperError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_out_of_range_history_index() {
        let profile = sample_profile();
        assert!(matches!(
            profile.win_odds(2),
            Err(ScraperError::TableIndex { index: 2, len: 2, .. })
        ));
    }

    #[test]
    fn test_category_mismatch() {
        let url = PageUrl::race_card(202206050811).unwrap();
        let page = Page::from_html(url, SAMPLE_HTML);
        assert!(matches!(
            HorseProfile::new(page),
            Err(ScraperError::CategoryMismatch { .. })
        ));
    }
}
