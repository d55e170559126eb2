use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An immutable guided stretch: a name, a total duration and the
/// instructions shown one after another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stretch {
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    pub total_secs: u64,
    pub steps: Vec<String>,
}

impl Stretch {
    pub fn new(name: impl Into<String>, total_secs: u64, steps: &[&str]) -> Self {
        Self {
            name: name.into(),
            emoji: String::new(),
            total_secs,
            steps: steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn with_emoji(mut self, emoji: &str) -> Self {
        self.emoji = emoji.to_string();
        self
    }

    /// Milliseconds each step is shown for.
    pub fn step_interval_ms(&self) -> u64 {
        let steps = self.steps.len().max(1) as u64;
        self.total_secs.saturating_mul(1000) / steps
    }

    pub fn last_step_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.steps.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "steps of stretch '{}'",
                self.name
            )));
        }
        if self.total_secs == 0 {
            return Err(ValidationError::invalid(
                "total_secs",
                format!("stretch '{}' must last at least one second", self.name),
            ));
        }
        Ok(())
    }
}

/// Ordered list of stretches offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StretchCatalog {
    stretches: Vec<Stretch>,
}

impl StretchCatalog {
    pub fn new(stretches: Vec<Stretch>) -> Result<Self, ValidationError> {
        if stretches.is_empty() {
            return Err(ValidationError::EmptyCollection("stretch catalog".into()));
        }
        for stretch in &stretches {
            stretch.validate()?;
        }
        Ok(Self { stretches })
    }

    /// The six desk-friendly stretches shipped with the app.
    pub fn builtin() -> Self {
        Self {
            stretches: builtin_stretches(),
        }
    }

    /// Built-in catalog followed by `custom` entries.
    pub fn with_custom(custom: &[Stretch]) -> Result<Self, ValidationError> {
        let mut stretches = builtin_stretches();
        stretches.extend(custom.iter().cloned());
        Self::new(stretches)
    }

    pub fn get(&self, index: usize) -> Result<&Stretch, ValidationError> {
        self.stretches
            .get(index)
            .ok_or_else(|| ValidationError::OutOfBounds {
                collection: "stretches".into(),
                index,
                len: self.stretches.len(),
            })
    }

    pub fn find(&self, name: &str) -> Option<(usize, &Stretch)> {
        self.stretches
            .iter()
            .enumerate()
            .find(|(_, s)| s.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stretch> {
        self.stretches.iter()
    }

    pub fn len(&self) -> usize {
        self.stretches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stretches.is_empty()
    }
}

impl Default for StretchCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_stretches() -> Vec<Stretch> {
    vec![
        Stretch::new(
            "Neck Roll",
            15,
            &[
                "Sit up tall and relax your shoulders.",
                "Slowly drop your chin to your chest.",
                "Roll your head gently to the right, ear toward shoulder.",
                "Continue rolling back, then to the left.",
                "Complete 3 slow circles in each direction.",
            ],
        )
        .with_emoji("🧘"),
        Stretch::new(
            "Shoulder Shrug & Release",
            10,
            &[
                "Inhale deeply and raise both shoulders up to your ears.",
                "Hold them tight for 3 seconds and feel the tension.",
                "Exhale and let your shoulders drop completely.",
                "Feel the tension melt away as you release.",
                "Repeat 3 more times, slower each time.",
            ],
        )
        .with_emoji("💆"),
        Stretch::new(
            "Seated Spinal Twist",
            20,
            &[
                "Sit tall in your chair with feet flat on the floor.",
                "Place your right hand on your left knee.",
                "Gently twist your upper body to the left.",
                "Look over your left shoulder and hold for 10 seconds.",
                "Breathe deeply, then slowly return and switch sides.",
            ],
        )
        .with_emoji("🔄"),
        Stretch::new(
            "Wrist & Finger Stretch",
            15,
            &[
                "Extend your right arm forward, palm facing up.",
                "With your left hand, gently pull your fingers down.",
                "Hold for 10 seconds and feel the stretch in your forearm.",
                "Now flip your palm down and pull fingers toward you.",
                "Switch hands and repeat. Great for typing fatigue!",
            ],
        )
        .with_emoji("🖐️"),
        Stretch::new(
            "Standing Forward Fold",
            20,
            &[
                "Stand up and place your feet hip-width apart.",
                "Take a deep breath in and raise your arms overhead.",
                "Exhale slowly and fold forward from your hips.",
                "Let your head and arms hang heavy. Don't force it.",
                "Hold for 15 seconds, breathing deeply. Slowly roll back up.",
            ],
        )
        .with_emoji("🙆"),
        Stretch::new(
            "Chest Opener",
            15,
            &[
                "Stand or sit tall. Clasp your hands behind your back.",
                "Straighten your arms and gently lift them away from you.",
                "Open your chest wide and squeeze your shoulder blades.",
                "Look up slightly and take 3 deep breaths.",
                "Release slowly. Feel the openness in your chest and shoulders.",
            ],
        )
        .with_emoji("🌅"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_six_valid_stretches() {
        let catalog = StretchCatalog::builtin();
        assert_eq!(catalog.len(), 6);
        for stretch in catalog.iter() {
            stretch.validate().unwrap();
            assert_eq!(stretch.steps.len(), 5);
        }
    }

    #[test]
    fn step_interval_divides_total_duration() {
        let stretch = Stretch::new("Twist", 20, &["a", "b", "c", "d", "e"]);
        assert_eq!(stretch.step_interval_ms(), 4_000);
        let shrug = StretchCatalog::builtin().get(1).unwrap().clone();
        assert_eq!(shrug.step_interval_ms(), 2_000);
    }

    #[test]
    fn get_out_of_range_reports_bounds() {
        let err = StretchCatalog::builtin().get(6).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfBounds {
                collection: "stretches".into(),
                index: 6,
                len: 6
            }
        );
    }

    #[test]
    fn custom_stretches_append_and_validate() {
        let extra = Stretch::new("Calf Raise", 12, &["Rise", "Lower"]);
        let catalog = StretchCatalog::with_custom(&[extra]).unwrap();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.find("calf raise").map(|(i, _)| i), Some(6));

        let broken = Stretch::new("Nothing", 10, &[]);
        assert!(StretchCatalog::with_custom(&[broken]).is_err());
    }
}
