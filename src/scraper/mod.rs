//! Field extractors for the supported netkeiba page templates.
//!
//! One extractor per page category. Each validates the page category and
//! locates its primary table rows at construction, then serves lazy,
//! per-field accessors. Fields that can be missing for real-world reasons
//! (scratched horse, unconfirmed draw, foreign race) come back as
//! `Ok(None)` with a warning log; see [`crate::error::ScraperError`].

pub mod horse;
pub mod odds;
pub mod race_card;
pub mod race_result;
pub mod search;
pub mod training;

pub use horse::HorseProfile;
pub use odds::WinOdds;
pub use race_card::RaceCard;
pub use race_result::RaceResult;
pub use search::RaceSearch;
pub use training::TrainingReport;

use chrono::NaiveDate;
use regex::Regex;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::category::PageCategory;
use crate::course::CourseType;
use crate::error::ScraperError;
use crate::page::Page;
use crate::text::arrange_string;

/// Check that the page handed to an extractor is of the expected category.
pub(crate) fn check_category(page: &Page, expected: PageCategory) -> Result<(), ScraperError> {
    let actual = page.category();
    if actual != expected {
        tracing::error!("page from {} is {}, not {}", page.url(), actual, expected);
        return Err(ScraperError::CategoryMismatch { expected, actual });
    }
    Ok(())
}

/// Locate the rows of a page's primary table and keep their node IDs, so
/// per-row accessors can resolve a row without re-querying the whole tree.
///
/// Returns `None` when the table itself is absent.
pub(crate) fn collect_rows(
    html: &Html,
    table_selector: &str,
    row_selector: &str,
) -> Option<Vec<NodeId>> {
    let table_sel = Selector::parse(table_selector).unwrap();
    let row_sel = Selector::parse(row_selector).unwrap();
    let table = html.select(&table_sel).next()?;
    Some(table.select(&row_sel).map(|row| row.id()).collect())
}

/// Resolve a previously collected row, validating the index against the
/// row count.
pub(crate) fn nth_row<'a>(
    html: &'a Html,
    rows: &[NodeId],
    index: usize,
    url: &str,
) -> Result<ElementRef<'a>, ScraperError> {
    if index >= rows.len() {
        tracing::error!(
            "index {} out of range (rows: {}). URL: {}",
            index,
            rows.len(),
            url
        );
        return Err(ScraperError::TableIndex {
            index,
            len: rows.len(),
            url: url.to_string(),
        });
    }
    html.tree
        .get(rows[index])
        .and_then(ElementRef::wrap)
        .ok_or_else(|| ScraperError::parse("table row", url))
}

/// Text directly inside an element, excluding text of child elements.
///
/// Cells often mix their value with markup (`480<small>(+4)</small>`); this
/// picks out just the element's own text nodes.
pub(crate) fn own_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
    out
}

/// Full text of the first element matching `selector` under `scope`.
pub(crate) fn select_text(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    scope.select(&sel).next().map(|e| e.text().collect())
}

/// `href` of the first element matching `selector` under `scope`.
pub(crate) fn select_href(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    scope
        .select(&sel)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(str::to_string)
}

// Header accessors shared by the race.netkeiba.com page templates (race
// card, race result, training evaluation), which all carry the same
// RaceName / RaceData01 / RaceData02 header block.

/// Race name from the page header, without the grade icon markup.
pub(crate) fn scrape_race_name(html: &Html, url: &str) -> Result<String, ScraperError> {
    let sel = Selector::parse("div.RaceName").unwrap();
    let div = html
        .select(&sel)
        .next()
        .ok_or_else(|| ScraperError::parse("race name", url))?;
    Ok(arrange_string(&own_text(div)))
}

/// Race date from the page title (`YYYY年MM月DD日`).
///
/// A title without the date pattern means a fundamentally wrong page, so
/// this is an error rather than an absent field.
pub(crate) fn scrape_race_date(html: &Html, url: &str) -> Result<NaiveDate, ScraperError> {
    let sel = Selector::parse("title").unwrap();
    let title: String = html
        .select(&sel)
        .next()
        .map(|t| t.text().collect())
        .unwrap_or_default();
    let re = Regex::new(r"\d{4}年\d{1,2}月\d{1,2}日").unwrap();
    let matched = re
        .find(&title)
        .ok_or_else(|| ScraperError::parse("race date in title", url))?;
    NaiveDate::parse_from_str(matched.as_str(), "%Y年%m月%d日")
        .map_err(|_| ScraperError::parse("race date in title", url))
}

/// Course type and distance from the first RaceData01 span ("芝2500m").
pub(crate) fn scrape_course_distance(
    html: &Html,
    url: &str,
) -> Result<(CourseType, u32), ScraperError> {
    let sel = Selector::parse("div.RaceData01 span").unwrap();
    let span = html
        .select(&sel)
        .next()
        .ok_or_else(|| ScraperError::parse("course and distance", url))?;
    split_course_distance(&arrange_string(&own_text(span)))
        .ok_or_else(|| ScraperError::parse("course and distance", url))
}

/// Venue display name from the second RaceData02 span.
pub(crate) fn scrape_venue_name(html: &Html, url: &str) -> Result<String, ScraperError> {
    let sel = Selector::parse("div.RaceData02 span").unwrap();
    let span = html
        .select(&sel)
        .nth(1)
        .ok_or_else(|| ScraperError::parse("venue name", url))?;
    Ok(arrange_string(&span.text().collect::<String>()))
}

/// Split a course-type + distance token at its fixed offsets: the first
/// char is the surface glyph, the digit run after it is the distance. A
/// trailing unit or direction marker is ignored. "芝2000" -> (Turf, 2000).
pub(crate) fn split_course_distance(token: &str) -> Option<(CourseType, u32)> {
    let mut chars = token.chars();
    let course = CourseType::from_glyph(chars.next()?).ok()?;
    let digits: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok().map(|distance| (course, distance))
}

/// Split a horse-weight + delta token at its fixed offsets: the first three
/// chars are the weight, the parenthesized remainder the signed delta.
/// "480(+4)" -> (Some(480), Some(4)). "計不" (unmeasurable) yields neither.
pub(crate) fn split_horse_weight(token: &str) -> (Option<u32>, Option<i32>) {
    if token == "計不" {
        return (None, None);
    }
    let weight = token.chars().take(3).collect::<String>().parse::<u32>().ok();
    let delta = token
        .chars()
        .skip(3)
        .filter(|c| *c != '(' && *c != ')')
        .collect::<String>()
        .parse::<i32>()
        .ok();
    (weight, delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_course_distance() {
        assert_eq!(
            split_course_distance("芝2000"),
            Some((CourseType::Turf, 2000))
        );
        assert_eq!(
            split_course_distance("ダ1800m"),
            Some((CourseType::Dirt, 1800))
        );
        assert_eq!(
            split_course_distance("障3000m(右)"),
            Some((CourseType::Jump, 3000))
        );
        assert_eq!(split_course_distance("2000"), None);
        assert_eq!(split_course_distance("芝"), None);
        assert_eq!(split_course_distance(""), None);
    }

    #[test]
    fn test_split_horse_weight() {
        assert_eq!(split_horse_weight("480(+4)"), (Some(480), Some(4)));
        assert_eq!(split_horse_weight("502(-12)"), (Some(502), Some(-12)));
        assert_eq!(split_horse_weight("466(0)"), (Some(466), Some(0)));
        assert_eq!(split_horse_weight("計不"), (None, None));
        assert_eq!(split_horse_weight("480"), (Some(480), None));
    }

    #[test]
    fn test_own_text_skips_child_elements() {
        let html = Html::parse_fragment("<div>480<small>(+4)</small></div>");
        let sel = Selector::parse("div").unwrap();
        let div = html.select(&sel).next().unwrap();
        assert_eq!(own_text(div), "480");
    }
}
