//! Completed-workout stats.
//!
//! When a session completes, the player reports a `StatsUpdate` to whatever
//! collaborator keeps the user's totals. Estimates come from `StatsPolicy`,
//! which the host configures; the built-in numbers are placeholders.
//!
//! The bundled `JsonlStatsSink` appends one JSON line per completion with
//! file locking, in the same spirit as an append-only log.

use crate::{ExerciseSequence, Result, Routine, StatsUpdate};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Host-supplied estimate rules for completed workouts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsPolicy {
    /// Used when neither the routine nor its category carries a calorie range
    #[serde(default = "default_calories_per_minute")]
    pub calories_per_minute: f64,

    /// Category name (case-insensitive) to "low-high" calorie range
    #[serde(default = "default_category_calories")]
    pub category_calories: BTreeMap<String, String>,
}

impl Default for StatsPolicy {
    fn default() -> Self {
        Self {
            calories_per_minute: default_calories_per_minute(),
            category_calories: default_category_calories(),
        }
    }
}

fn default_calories_per_minute() -> f64 {
    7.0
}

fn default_category_calories() -> BTreeMap<String, String> {
    // Catalog categories ship in Spanish; English names are kept as synonyms
    [
        ("cardio", "200-300"),
        ("hiit", "250-350"),
        ("fuerza", "150-250"),
        ("strength", "150-250"),
        ("yoga", "80-150"),
        ("flexibilidad", "80-150"),
        ("flexibility", "80-150"),
    ]
    .into_iter()
    .map(|(name, range)| (name.to_string(), range.to_string()))
    .collect()
}

/// Parse a "low-high" (or single number) calorie string into its midpoint
pub fn calorie_midpoint(range: &str) -> Option<u32> {
    let mut parts = range.split('-').map(|p| p.trim().parse::<u32>());
    let low = parts.next()?.ok()?;
    let high = match parts.next() {
        Some(part) => part.ok()?,
        None => low,
    };
    if parts.next().is_some() || high < low {
        return None;
    }
    Some(low + (high - low) / 2)
}

impl StatsPolicy {
    /// Estimate the stats increment for finishing `routine`
    pub fn estimate(&self, routine: &Routine, sequence: &ExerciseSequence) -> StatsUpdate {
        let minutes_active = sequence.total_seconds().div_ceil(60) as u32;

        let from_category = || {
            let category = routine.category.as_deref()?.to_lowercase();
            self.category_calories
                .iter()
                .find(|(name, _)| name.to_lowercase() == category)
                .and_then(|(_, range)| calorie_midpoint(range))
        };

        let calories_burned = routine
            .calories
            .as_deref()
            .and_then(calorie_midpoint)
            .or_else(from_category)
            .unwrap_or_else(|| (self.calories_per_minute * f64::from(minutes_active)).round() as u32);

        StatsUpdate {
            completed_workouts: 1,
            calories_burned,
            minutes_active,
        }
    }
}

/// One logged completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: Uuid,
    pub routine_id: String,
    pub routine_name: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub update: StatsUpdate,
}

impl CompletionRecord {
    pub fn new(routine: &Routine, update: StatsUpdate) -> Self {
        Self {
            id: Uuid::new_v4(),
            routine_id: routine.identity().to_string(),
            routine_name: routine.name.clone(),
            recorded_at: Utc::now(),
            update,
        }
    }
}

/// Receiver of completion events (the user-stats collaborator)
pub trait StatsSink {
    fn record(&mut self, record: &CompletionRecord) -> Result<()>;
}

/// Fire a completion event; failures are logged, never returned
pub fn report_completion(sink: &mut dyn StatsSink, record: &CompletionRecord) {
    match sink.record(record) {
        Ok(()) => tracing::info!(
            "Recorded completion of '{}' ({} kcal, {} min)",
            record.routine_name,
            record.update.calories_burned,
            record.update.minutes_active
        ),
        Err(e) => tracing::warn!(
            "Failed to record completion of '{}': {}",
            record.routine_name,
            e
        ),
    }
}

/// JSONL-based stats sink with file locking
pub struct JsonlStatsSink {
    path: PathBuf,
}

impl JsonlStatsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsSink for JsonlStatsSink {
    fn record(&mut self, record: &CompletionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended completion {} to {:?}", record.id, self.path);
        Ok(())
    }
}

/// Read all completion records, skipping malformed lines
pub fn read_records(path: &Path) -> Result<Vec<CompletionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<CompletionRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse completion at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} completions from {:?}", records.len(), path);
    Ok(records)
}

/// Aggregate of all logged completions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsTotals {
    pub completed_workouts: u64,
    pub calories_burned: u64,
    pub minutes_active: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl StatsTotals {
    pub fn from_records(records: &[CompletionRecord]) -> Self {
        records.iter().fold(Self::default(), |mut totals, r| {
            totals.completed_workouts += u64::from(r.update.completed_workouts);
            totals.calories_burned += u64::from(r.update.calories_burned);
            totals.minutes_active += u64::from(r.update.minutes_active);
            totals.last_completed_at = totals.last_completed_at.max(Some(r.recorded_at));
            totals
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Exercise, RoutineExercises};

    fn routine(calories: Option<&str>, category: Option<&str>) -> Routine {
        Routine {
            id: Some("r1".into()),
            name: "Test Routine".into(),
            trainer: None,
            level: None,
            duration: None,
            calories: calories.map(String::from),
            category: category.map(String::from),
            exercises: Some(RoutineExercises::Flat(vec![
                Exercise::new("a", 90, "", ""),
                Exercise::new("b", 60, "", ""),
            ])),
        }
    }

    fn sequence_for(routine: &Routine) -> ExerciseSequence {
        ExerciseSequence::build(routine)
    }

    #[test]
    fn test_calorie_midpoint() {
        assert_eq!(calorie_midpoint("150-250"), Some(200));
        assert_eq!(calorie_midpoint(" 60 - 100 "), Some(80));
        assert_eq!(calorie_midpoint("120"), Some(120));
        assert_eq!(calorie_midpoint("lots"), None);
        assert_eq!(calorie_midpoint("300-200"), None);
        assert_eq!(calorie_midpoint("1-2-3"), None);
    }

    #[test]
    fn test_estimate_prefers_routine_range() {
        let r = routine(Some("150-250"), Some("Cardio"));
        let update = StatsPolicy::default().estimate(&r, &sequence_for(&r));
        assert_eq!(update.completed_workouts, 1);
        assert_eq!(update.calories_burned, 200);
        assert_eq!(update.minutes_active, 3); // 150s rounds up
    }

    #[test]
    fn test_estimate_uses_category_table() {
        let r = routine(None, Some("Cardio"));
        let update = StatsPolicy::default().estimate(&r, &sequence_for(&r));
        assert_eq!(update.calories_burned, 250);
    }

    #[test]
    fn test_estimate_matches_catalog_categories() {
        let policy = StatsPolicy::default();
        for (category, expected) in [("Fuerza", 200), ("HIIT", 300), ("Yoga", 115), ("Flexibilidad", 115)] {
            let r = routine(None, Some(category));
            let update = policy.estimate(&r, &sequence_for(&r));
            assert_eq!(update.calories_burned, expected, "category {}", category);
        }
    }

    #[test]
    fn test_estimate_counts_untimed_steps() {
        let mut r = routine(None, None);
        r.exercises = Some(RoutineExercises::Flat(vec![
            Exercise::new("timed", 30, "", ""),
            Exercise::new("untimed", 0, "", ""),
        ]));
        let update = StatsPolicy::default().estimate(&r, &sequence_for(&r));
        assert_eq!(update.minutes_active, 1);
        assert_eq!(update.calories_burned, 7);

        let only_untimed = ExerciseSequence::from_steps(vec![Exercise::new("untimed", 0, "", "")])
            .with_fallback_seconds(90);
        let update = StatsPolicy::default().estimate(&r, &only_untimed);
        assert_eq!(update.minutes_active, 2);
        assert_eq!(update.calories_burned, 14);
    }

    #[test]
    fn test_estimate_falls_back_to_per_minute() {
        let r = routine(Some("unknown"), Some("Dance"));
        let policy = StatsPolicy {
            calories_per_minute: 10.0,
            ..StatsPolicy::default()
        };
        let update = policy.estimate(&r, &sequence_for(&r));
        assert_eq!(update.calories_burned, 30);
    }

    #[test]
    fn test_append_and_read_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stats").join("completions.jsonl");

        let r = routine(Some("100-200"), None);
        let update = StatsPolicy::default().estimate(&r, &sequence_for(&r));

        let mut sink = JsonlStatsSink::new(&path);
        for _ in 0..3 {
            sink.record(&CompletionRecord::new(&r, update.clone())).unwrap();
        }

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].routine_id, "r1");

        let totals = StatsTotals::from_records(&records);
        assert_eq!(totals.completed_workouts, 3);
        assert_eq!(totals.calories_burned, 450);
        assert_eq!(totals.minutes_active, 9);
        assert!(totals.last_completed_at.is_some());
    }

    #[test]
    fn test_read_skips_malformed_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("completions.jsonl");

        let r = routine(None, None);
        let mut sink = JsonlStatsSink::new(&path);
        let update = StatsPolicy::default().estimate(&r, &sequence_for(&r));
        sink.record(&CompletionRecord::new(&r, update)).unwrap();

        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("{ not json }\n\n");
        std::fs::write(&path, contents).unwrap();

        assert_eq!(read_records(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_read_missing_log_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let records = read_records(&temp_dir.path().join("none.jsonl")).unwrap();
        assert!(records.is_empty());
        assert_eq!(StatsTotals::from_records(&records), StatsTotals::default());
    }

    struct FailingSink;

    impl StatsSink for FailingSink {
        fn record(&mut self, _record: &CompletionRecord) -> Result<()> {
            Err(Error::Other("stats backend unavailable".into()))
        }
    }

    #[test]
    fn test_report_completion_swallows_failures() {
        crate::logging::init_test();
        let r = routine(None, None);
        let update = StatsPolicy::default().estimate(&r, &sequence_for(&r));
        // Must not panic or propagate
        report_completion(&mut FailingSink, &CompletionRecord::new(&r, update));
    }
}
