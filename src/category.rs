//! Page categories for netkeiba.com templates.

use std::fmt;

/// Which netkeiba page template a URL (and the page fetched from it)
/// belongs to. Fixed at URL construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageCategory {
    /// Pre-race entry list (shutuba)
    RaceCard,
    /// Post-race result table
    RaceResult,
    /// Win-odds JSON API payload
    Odds,
    /// Training evaluation table (oikiri)
    TrainingEvaluation,
    /// Horse profile with pedigree and race history
    HorseProfile,
    /// Race search result listing
    RaceSearch,
}

impl fmt::Display for PageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageCategory::RaceCard => "race card",
            PageCategory::RaceResult => "race result",
            PageCategory::Odds => "odds",
            PageCategory::TrainingEvaluation => "training evaluation",
            PageCategory::HorseProfile => "horse profile",
            PageCategory::RaceSearch => "race search",
        };
        f.write_str(name)
    }
}
