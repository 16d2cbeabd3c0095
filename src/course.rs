//! Course (surface) types.

use crate::error::ScraperError;

/// Race surface, identified on netkeiba pages by a single glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseType {
    /// 芝 — turf
    Turf,
    /// ダ — dirt
    Dirt,
    /// 障 — jump (obstacle)
    Jump,
}

impl CourseType {
    pub const ALL: [CourseType; 3] = [CourseType::Turf, CourseType::Dirt, CourseType::Jump];

    /// The single-character glyph used on race pages.
    pub fn glyph(&self) -> char {
        match self {
            CourseType::Turf => '芝',
            CourseType::Dirt => 'ダ',
            CourseType::Jump => '障',
        }
    }

    /// Convert a page glyph back to a course type.
    pub fn from_glyph(glyph: char) -> Result<CourseType, ScraperError> {
        match glyph {
            '芝' => Ok(CourseType::Turf),
            'ダ' => Ok(CourseType::Dirt),
            '障' => Ok(CourseType::Jump),
            other => Err(ScraperError::InvalidValue(format!(
                "unknown course glyph: {other}"
            ))),
        }
    }
}
