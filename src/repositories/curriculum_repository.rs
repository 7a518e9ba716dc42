use std::{collections::HashMap, fs, path::Path};

use crate::errors::AppResult;

/// Below this many characters a piece of material is too thin to ground
/// question generation.
pub const MIN_MATERIAL_CHARS: usize = 100;

/// Maps a learner's age to the curriculum class whose material they read.
pub fn class_for_age(age: u8) -> &'static str {
    match age {
        0..=12 => "Class_7th",
        13 => "Class_8th",
        14 => "Class_9th",
        _ => "Class_10th",
    }
}

/// Age-appropriate reference material, already extracted and indexed.
#[cfg_attr(test, mockall::automock)]
pub trait CurriculumLibrary: Send + Sync {
    fn material_for(&self, age: u8, topic: &str) -> Option<String>;
}

/// Curriculum text held in memory: class name -> topic -> material.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCurriculum {
    classes: HashMap<String, HashMap<String, String>>,
}

impl InMemoryCurriculum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material(mut self, class_name: &str, topic: &str, material: &str) -> Self {
        self.insert(class_name, topic, material);
        self
    }

    pub fn insert(&mut self, class_name: &str, topic: &str, material: &str) {
        self.classes
            .entry(class_name.to_string())
            .or_default()
            .insert(normalize_topic(topic), material.to_string());
    }

    /// Loads `<dir>/<class>/<topic>.txt` files. Underscores in the file stem
    /// become spaces in the topic name.
    pub fn from_dir(dir: &Path) -> AppResult<Self> {
        let mut curriculum = Self::new();

        for class_entry in fs::read_dir(dir)? {
            let class_path = class_entry?.path();
            if !class_path.is_dir() {
                continue;
            }
            let Some(class_name) = class_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let class_name = class_name.to_string();

            for topic_entry in fs::read_dir(&class_path)? {
                let topic_path = topic_entry?.path();
                if topic_path.extension().and_then(|e| e.to_str()) != Some("txt") {
                    continue;
                }
                let Some(stem) = topic_path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let material = fs::read_to_string(&topic_path)?;
                curriculum.insert(&class_name, &stem.replace('_', " "), &material);
            }
        }

        log::info!(
            "Loaded curriculum for {} classes from {}",
            curriculum.classes.len(),
            dir.display()
        );
        Ok(curriculum)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn topic_material(&self, class_name: &str, topic: &str) -> Option<&str> {
        let topics = self.classes.get(class_name)?;
        let key = normalize_topic(topic);

        if let Some(material) = topics.get(&key) {
            return Some(material.as_str());
        }

        let mut related: Vec<(&String, &String)> = topics
            .iter()
            .filter(|(name, _)| name.contains(&key) || key.contains(name.as_str()))
            .collect();
        related.sort_by(|a, b| a.0.cmp(b.0));
        related.first().map(|(_, material)| material.as_str())
    }

    fn class_material(&self, class_name: &str) -> Option<String> {
        let topics = self.classes.get(class_name)?;
        let mut names: Vec<&String> = topics.keys().collect();
        names.sort();

        let joined = names
            .into_iter()
            .filter_map(|name| topics.get(name))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(joined)
    }
}

impl CurriculumLibrary for InMemoryCurriculum {
    fn material_for(&self, age: u8, topic: &str) -> Option<String> {
        let class_name = class_for_age(age);

        if let Some(material) = self.topic_material(class_name, topic) {
            if material.trim().len() >= MIN_MATERIAL_CHARS {
                return Some(material.to_string());
            }
        }

        log::debug!(
            "Thin material for topic '{}' in {}, trying the whole class",
            topic,
            class_name
        );
        self.class_material(class_name)
            .filter(|material| material.trim().len() >= MIN_MATERIAL_CHARS)
    }
}

fn normalize_topic(topic: &str) -> String {
    topic.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(seed: &str) -> String {
        seed.repeat(MIN_MATERIAL_CHARS / seed.len() + 1)
    }

    #[test]
    fn ages_map_to_classes() {
        assert_eq!(class_for_age(11), "Class_7th");
        assert_eq!(class_for_age(12), "Class_7th");
        assert_eq!(class_for_age(13), "Class_8th");
        assert_eq!(class_for_age(14), "Class_9th");
        assert_eq!(class_for_age(15), "Class_10th");
        assert_eq!(class_for_age(18), "Class_10th");
    }

    #[test]
    fn finds_topic_material_case_insensitively() {
        let text = long_text("Saving means keeping money aside. ");
        let curriculum = InMemoryCurriculum::new().with_material("Class_7th", "Saving Money", &text);

        assert_eq!(curriculum.material_for(11, "saving money"), Some(text.clone()));
        assert_eq!(curriculum.material_for(12, "  SAVING MONEY "), Some(text));
    }

    #[test]
    fn falls_back_to_related_topic_then_whole_class() {
        let saving = long_text("Saving means keeping money aside. ");
        let curriculum = InMemoryCurriculum::new()
            .with_material("Class_8th", "saving money", &saving)
            .with_material("Class_8th", "banks", "Too short.");

        assert_eq!(curriculum.material_for(13, "saving"), Some(saving.clone()));

        let whole_class = curriculum
            .material_for(13, "banks")
            .expect("class material should be long enough");
        assert!(whole_class.contains("Too short."));
        assert!(whole_class.contains("Saving means"));
    }

    #[test]
    fn returns_none_without_enough_material() {
        let curriculum = InMemoryCurriculum::new().with_material("Class_9th", "taxes", "Short.");

        assert_eq!(curriculum.material_for(14, "taxes"), None);
        assert_eq!(curriculum.material_for(11, "taxes"), None);
    }

    #[test]
    fn loads_material_from_directory() {
        let root = std::env::temp_dir().join(format!("curriculum-{}", uuid::Uuid::new_v4()));
        let class_dir = root.join("Class_7th");
        fs::create_dir_all(&class_dir).expect("create dir");
        let text = long_text("Interest is money paid for using money. ");
        fs::write(class_dir.join("simple_interest.txt"), &text).expect("write");
        fs::write(class_dir.join("notes.md"), "ignored").expect("write");

        let curriculum = InMemoryCurriculum::from_dir(&root).expect("load");
        assert_eq!(curriculum.material_for(11, "simple interest"), Some(text));

        fs::remove_dir_all(&root).expect("cleanup");
    }
}
