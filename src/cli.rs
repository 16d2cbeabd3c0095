//! CLI commands for keiba-scraper.
//!
//! One subcommand per supported page template; each fetches the page and
//! prints its fields row by row.

use clap::{Parser, Subcommand};

use keiba_scraper::{
    CourseType, HorseProfile, RaceCard, RaceResult, RaceSearch, RaceSearchQuery, TrainingReport,
    Venue, WinOdds,
};

#[derive(Parser)]
#[command(name = "keiba-scraper")]
#[command(version, about = "Scrape netkeiba.com race pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the entry list (shutuba) of a race
    Card {
        /// 12-digit netkeiba race ID
        race_id: u64,
    },

    /// Print the result table of a race
    Result {
        /// 12-digit netkeiba race ID
        race_id: u64,
    },

    /// Print the win odds of a race
    Odds {
        /// 12-digit netkeiba race ID
        race_id: u64,
    },

    /// Print a horse's profile and race history
    Horse {
        /// 10-digit netkeiba horse ID
        horse_id: u64,
    },

    /// Print the training evaluations of a race
    Training {
        /// 12-digit netkeiba race ID
        race_id: u64,
    },

    /// Search past races and print the matches
    Search {
        /// Race name, e.g. 有馬記念
        #[arg(short, long)]
        name: String,

        /// Venue display name, e.g. 中山
        #[arg(short, long)]
        venue: String,

        /// Race distance in meters
        #[arg(short, long)]
        distance: u32,

        /// Course glyph: 芝 or ダ
        #[arg(short, long, default_value = "芝")]
        course: char,

        #[arg(long, default_value_t = 2010)]
        start_year: u16,

        #[arg(long, default_value_t = 1)]
        start_month: u8,

        #[arg(long, default_value_t = 2022)]
        end_year: u16,

        #[arg(long, default_value_t = 12)]
        end_month: u8,
    },
}

pub async fn run_card(race_id: u64) -> anyhow::Result<()> {
    let card = RaceCard::create(race_id).await?;
    println!(
        "{} {} {}{}m {}",
        card.race_date()?,
        card.race_name()?,
        card.course_type()?.glyph(),
        card.distance()?,
        card.venue_name()?
    );
    for index in 0..card.horse_count() {
        println!(
            "{:>2}  {}  {}  {}kg",
            format_opt(card.horse_number(index)?),
            card.horse_name(index)?,
            card.jockey_name(index)?.unwrap_or_else(|| "未定".to_string()),
            card.jockey_weight(index)?
        );
    }
    Ok(())
}

pub async fn run_result(race_id: u64) -> anyhow::Result<()> {
    let result = RaceResult::create(race_id).await?;
    println!(
        "{} {} {}{}m {}",
        result.race_date()?,
        result.race_name()?,
        result.course_type()?.glyph(),
        result.distance()?,
        result.venue_name()?
    );
    for index in 0..result.horse_count() {
        println!(
            "{:>2}着  {:>2}  {}  {}  {}",
            format_opt(result.finish_rank(index)?),
            result.horse_number(index)?,
            result.horse_name(index)?,
            result.finish_time(index)?.unwrap_or_else(|| "-".to_string()),
            format_opt(result.win_odds(index)?)
        );
    }
    Ok(())
}

pub async fn run_odds(race_id: u64) -> anyhow::Result<()> {
    let odds = WinOdds::create(race_id).await?;
    for horse_number in 1..=odds.horse_count() as u8 {
        println!(
            "{:>2}  {:>6}  人気 {}",
            horse_number,
            format_opt(odds.win_odds(horse_number)?),
            format_opt(odds.popularity(horse_number)?)
        );
    }
    Ok(())
}

pub async fn run_horse(horse_id: u64) -> anyhow::Result<()> {
    let profile = HorseProfile::create(horse_id).await?;
    println!(
        "{}  父: {}  調教師: {} ({})",
        profile.horse_name()?,
        profile.father_name()?,
        profile.trainer_name()?,
        profile.stable_area()?
    );
    if !profile.has_race_history() {
        println!("出走歴なし");
        return Ok(());
    }
    for index in 0..profile.race_history_len() {
        println!(
            "{}  {}  {}着",
            profile.race_date(index)?,
            profile.race_name(index)?,
            format_opt(profile.finish_rank(index)?)
        );
    }
    Ok(())
}

pub async fn run_training(race_id: u64) -> anyhow::Result<()> {
    let report = TrainingReport::create(race_id).await?;
    println!("{} {}", report.race_date()?, report.race_name()?);
    for index in 0..report.horse_count() {
        println!(
            "{:>2}  {}  評価: {}",
            format_opt(report.horse_number(index)?),
            report.horse_name(index)?,
            report.evaluation(index)?.unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_search(
    name: String,
    venue: String,
    distance: u32,
    course: char,
    start_year: u16,
    start_month: u8,
    end_year: u16,
    end_month: u8,
) -> anyhow::Result<()> {
    let query = RaceSearchQuery {
        race_name: name,
        venue: Venue::from_name(&venue)?,
        distance,
        course_type: CourseType::from_glyph(course)?,
        start_year,
        start_month,
        end_year,
        end_month,
    };
    let search = RaceSearch::create(&query).await?;
    println!("{} races matched", search.race_count());
    for index in 0..search.race_count() {
        println!(
            "{}  {}  {}頭  (race_id: {})",
            search.race_date(index)?,
            search.race_name(index)?,
            search.horse_count(index)?,
            search.race_id(index)?
        );
    }
    Ok(())
}

fn format_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}
