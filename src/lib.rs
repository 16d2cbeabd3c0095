//! Typed scraping APIs for netkeiba.com race pages.
//!
//! Six page templates are supported, each behind its own extractor: entry
//! lists ([`scraper::RaceCard`]), race results ([`scraper::RaceResult`]),
//! win odds ([`scraper::WinOdds`]), horse profiles
//! ([`scraper::HorseProfile`]), training evaluations
//! ([`scraper::TrainingReport`]) and race searches
//! ([`scraper::RaceSearch`]). Batches of pages are fetched concurrently by
//! [`fetch::Fetcher`], with results mapped back to their requests in input
//! order.
//!
//! ```no_run
//! use keiba_scraper::scraper::RaceCard;
//!
//! # async fn run() -> Result<(), keiba_scraper::error::ScraperError> {
//! let card = RaceCard::create(202206050811).await?;
//! for index in 0..card.horse_count() {
//!     println!("{}", card.horse_name(index)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod category;
pub mod config;
pub mod course;
pub mod error;
pub mod fetch;
pub mod page;
pub mod scraper;
pub mod text;
pub mod url;
pub mod venue;

pub use crate::category::PageCategory;
pub use crate::config::ScraperConfig;
pub use crate::course::CourseType;
pub use crate::error::ScraperError;
pub use crate::fetch::Fetcher;
pub use crate::page::Page;
pub use crate::scraper::{
    HorseProfile, RaceCard, RaceResult, RaceSearch, TrainingReport, WinOdds,
};
pub use crate::url::{PageUrl, RaceSearchQuery};
pub use crate::venue::Venue;
