//! Score accumulation and high-score persistence.
//!
//! The running score is an integer accumulator fed through the combo
//! multiplier. The only state that survives a session is the high-score
//! scalar, kept in a small RON profile next to the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile io: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile parse: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("profile encode: {0}")]
    Encode(#[from] ron::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Profile {
    high_score: u64,
}

#[derive(Debug)]
pub struct ScoreBoard {
    score: u64,
    high_score: u64,
    path: PathBuf,
}

impl ScoreBoard {
    /// Load the high score from `path`; a missing or invalid profile
    /// starts at zero with a warning.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let high_score = match Self::try_load(&path) {
            Ok(h) => h,
            Err(ProfileError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                log::warn!("Invalid profile at {:?}: {}, starting fresh", path, e);
                0
            }
        };
        Self {
            score: 0,
            high_score,
            path,
        }
    }

    fn try_load(path: &Path) -> Result<u64, ProfileError> {
        let data = std::fs::read_to_string(path)?;
        let profile: Profile = ron::from_str(&data)?;
        Ok(profile.high_score)
    }

    /// Add `base * multiplier` points and return the points awarded.
    pub fn award(&mut self, base: u32, multiplier: u32) -> u64 {
        let points = u64::from(base) * u64::from(multiplier.max(1));
        self.score += points;
        points
    }

    /// Fold the session score into the high score and persist it. Called
    /// once per terminal transition; persistence failure is logged, never
    /// surfaced to gameplay.
    pub fn commit(&mut self) {
        if self.score > self.high_score {
            self.high_score = self.score;
            log::info!("New high score: {}", self.high_score);
        }
        if let Err(e) = self.try_save() {
            log::warn!("Could not write profile to {:?}: {}", self.path, e);
        }
    }

    fn try_save(&self) -> Result<(), ProfileError> {
        let profile = Profile {
            high_score: self.high_score,
        };
        let s = ron::ser::to_string_pretty(&profile, ron::ser::PrettyConfig::default())?;
        std::fs::write(&self.path, s)?;
        Ok(())
    }

    /// Start a fresh session; the high score survives.
    pub fn reset(&mut self) {
        self.score = 0;
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }
}
