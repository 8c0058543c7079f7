//! Built-in default workout and routine validation.
//!
//! The default workout is what the player falls back to when a routine
//! carries no exercise data at all.

use crate::types::*;
use once_cell::sync::Lazy;

/// Cached default workout - built once and reused across all sessions
static DEFAULT_WORKOUT: Lazy<Routine> = Lazy::new(build_default_workout);

/// Get a reference to the cached default workout
pub fn default_workout() -> &'static Routine {
    &DEFAULT_WORKOUT
}

fn section(name: &str, exercises: Vec<Exercise>) -> ExerciseSection {
    ExerciseSection {
        name: name.into(),
        exercises,
    }
}

/// Builds the default warm-up / main set / cool-down workout
pub fn build_default_workout() -> Routine {
    let sections = vec![
        section(
            "Warm-up",
            vec![
                Exercise::new("Jumping Jacks", 30, "Full Body", "fitness"),
                Exercise::new("Arm Circles", 30, "Shoulders", "refresh"),
                Exercise::new("High Knees", 30, "Legs", "walk"),
                Exercise::new("Hip Rotations", 20, "Core", "sync"),
            ],
        ),
        section(
            "Main Set",
            vec![
                Exercise::new("Russian Twists", 30, "Abs", "ellipse"),
                Exercise::new("Squats", 40, "Legs", "trending-down"),
                Exercise::new("Hip Burners", 20, "Glutes", "diamond"),
                Exercise::new("Side Steps", 20, "Legs", "footsteps"),
                Exercise::new("Mountain Climbers", 40, "Core", "trending-up"),
                Exercise::new("Burpees", 30, "Full Body", "barbell"),
                Exercise::new("Plank", 45, "Core", "remove"),
                Exercise::new("Lunges", 30, "Legs", "walk"),
                Exercise::new("Push-ups", 30, "Chest", "diamond"),
            ],
        ),
        section(
            "Cool-down",
            vec![
                Exercise::new("Quad Stretch", 30, "Legs", "body"),
                Exercise::new("Hamstring Stretch", 30, "Legs", "body"),
                Exercise::new("Child's Pose", 45, "Back", "flower"),
                Exercise::new("Deep Breathing", 60, "Mind", "leaf"),
            ],
        ),
    ];

    Routine {
        id: Some("default_workout".into()),
        name: "Default Workout".into(),
        trainer: None,
        level: Some("Beginner".into()),
        duration: Some("10 min".into()),
        calories: Some("80-150".into()),
        category: None,
        exercises: Some(RoutineExercises::Sections(Sections(sections))),
    }
}

impl Routine {
    /// Validate the routine's exercise data for display and playback
    ///
    /// Returns a list of validation problems, or empty Vec if valid.
    /// Problems are advisory: the player copes with all of them.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let sections: Vec<(&str, &[Exercise])> = match &self.exercises {
            None => {
                errors.push(format!("Routine '{}' has no exercise data", self.name));
                return errors;
            }
            Some(RoutineExercises::Flat(list)) => vec![("", list.as_slice())],
            Some(RoutineExercises::Sections(sections)) => sections
                .0
                .iter()
                .map(|s| (s.name.as_str(), s.exercises.as_slice()))
                .collect(),
        };

        if sections.iter().all(|(_, list)| list.is_empty()) {
            errors.push(format!("Routine '{}' has no exercises", self.name));
        }

        for (section_name, list) in &sections {
            if !section_name.is_empty() && list.is_empty() {
                errors.push(format!("Section '{}' is empty", section_name));
            }
            for (i, exercise) in list.iter().enumerate() {
                if exercise.name.trim().is_empty() {
                    errors.push(format!("Exercise #{} has an empty name", i + 1));
                }
                if exercise.duration_seconds == 0 {
                    errors.push(format!(
                        "Exercise '{}' has no duration",
                        exercise.name
                    ));
                }
            }
        }

        errors
    }
}
