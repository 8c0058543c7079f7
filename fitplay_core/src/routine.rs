//! Routine file loading.
//!
//! Routines arrive as JSON records. Sectioned exercise data is a JSON object
//! whose key order is significant, so `Sections` carries its own serde
//! implementation that keeps document order instead of going through a map.

use crate::{Error, Exercise, ExerciseSection, Result, Routine, Sections};
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;

impl Serialize for Sections {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for section in &self.0 {
            map.serialize_entry(&section.name, &section.exercises)?;
        }
        map.end()
    }
}

struct SectionsVisitor;

impl<'de> Visitor<'de> for SectionsVisitor {
    type Value = Sections;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map from section name to a list of exercises")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Sections, A::Error> {
        let mut sections = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, exercises)) = access.next_entry::<String, Vec<Exercise>>()? {
            sections.push(ExerciseSection { name, exercises });
        }
        Ok(Sections(sections))
    }
}

impl<'de> Deserialize<'de> for Sections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(SectionsVisitor)
    }
}

/// Duration values as they appear in catalog data: numbers, numeric strings,
/// or junk. Anything unusable becomes 0, which playback treats as "missing".
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeconds {
    Whole(u64),
    Fractional(f64),
    Text(String),
    Other(IgnoredAny),
}

pub(crate) fn lenient_seconds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u32, D::Error> {
    let seconds = match RawSeconds::deserialize(deserializer)? {
        RawSeconds::Whole(n) => u32::try_from(n).ok(),
        RawSeconds::Fractional(f) if f.is_finite() && f >= 0.0 => Some(f.round() as u32),
        RawSeconds::Fractional(_) => None,
        RawSeconds::Text(text) => text.trim().trim_end_matches('s').trim().parse::<u32>().ok(),
        RawSeconds::Other(_) => None,
    };
    if seconds.is_none() {
        tracing::debug!("Unusable exercise duration, treating as missing");
    }
    Ok(seconds.unwrap_or(0))
}

impl Routine {
    /// Parse a routine from a JSON string
    pub fn from_json(contents: &str) -> Result<Self> {
        let routine: Routine = serde_json::from_str(contents)?;
        if routine.name.trim().is_empty() {
            return Err(Error::Routine("routine has an empty name".into()));
        }
        Ok(routine)
    }

    /// Load a routine from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let routine = Self::from_json(&contents)?;
        tracing::info!("Loaded routine '{}' from {:?}", routine.name, path);
        Ok(routine)
    }
}
