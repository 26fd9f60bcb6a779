use crate::error::{Result, TutorError};
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};

static LESSON_DIR: Dir = include_dir!("src/lessons");

const CATALOG_FILE: &str = "lessons.json";

/// Free-practice text used when no lesson is selected.
pub const SAMPLE_TEXT: &str = "The quick brown fox jumps over the lazy dog. This pangram contains every letter in the English alphabet at least once. Typing is an essential skill in today's digital world, and practicing regularly will help you improve your speed and accuracy.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// An ordered set of phrases sharing a title and difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_time: String,
    pub phrases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
}

impl Lesson {
    /// Wrap a single free-standing text as a one-phrase lesson.
    pub fn standalone(text: impl Into<String>) -> Self {
        Self {
            title: "Free Practice".to_string(),
            description: "Type the text at your own pace".to_string(),
            difficulty: Difficulty::Beginner,
            estimated_time: String::new(),
            phrases: vec![text.into()],
            fun_fact: None,
        }
    }

    /// Phrase at `index`, falling back to the first phrase when out of range.
    pub fn phrase(&self, index: usize) -> &str {
        self.phrases
            .get(index)
            .or_else(|| self.phrases.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.phrases.is_empty() {
            return Err(TutorError::EmptyLesson(self.title.clone()));
        }
        if let Some(index) = self.phrases.iter().position(|p| p.is_empty()) {
            return Err(TutorError::EmptyPhrase {
                title: self.title.clone(),
                index,
            });
        }
        Ok(())
    }
}

/// Where a lesson sits relative to the learner's completed count
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum LessonStatus {
    Completed,
    Available,
    Locked,
}

#[derive(Deserialize)]
struct CatalogFile {
    lessons: Vec<Lesson>,
}

/// Immutable, non-empty list of lessons
#[derive(Debug, Clone)]
pub struct Catalog {
    lessons: Vec<Lesson>,
}

impl Catalog {
    /// Load the lessons shipped with the crate.
    pub fn embedded() -> Result<Self> {
        let file = LESSON_DIR
            .get_file(CATALOG_FILE)
            .ok_or_else(|| TutorError::MissingAsset(CATALOG_FILE.to_string()))?;

        let contents = file
            .contents_utf8()
            .ok_or_else(|| TutorError::MissingAsset(CATALOG_FILE.to_string()))?;

        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_lessons(file.lessons)
    }

    pub fn from_lessons(lessons: Vec<Lesson>) -> Result<Self> {
        if lessons.is_empty() {
            return Err(TutorError::EmptyCatalog);
        }
        for lesson in &lessons {
            lesson.validate()?;
        }
        Ok(Self { lessons })
    }

    /// Lesson `id`, or the first lesson when `id` is out of range.
    pub fn lesson(&self, id: usize) -> &Lesson {
        self.lessons.get(id).unwrap_or(&self.lessons[0])
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Always false; a catalog cannot be built without lessons.
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter()
    }

    pub fn status(&self, index: usize, lessons_completed: usize) -> LessonStatus {
        match index.cmp(&lessons_completed) {
            std::cmp::Ordering::Less => LessonStatus::Completed,
            std::cmp::Ordering::Equal => LessonStatus::Available,
            std::cmp::Ordering::Greater => LessonStatus::Locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn lesson(title: &str, phrases: &[&str]) -> Lesson {
        Lesson {
            title: title.to_string(),
            description: String::new(),
            difficulty: Difficulty::Beginner,
            estimated_time: "1 min".to_string(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            fun_fact: None,
        }
    }

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();

        assert_eq!(catalog.len(), 10);
        assert!(!catalog.is_empty());
        assert_eq!(catalog.lesson(0).title, "Home Row Heroes");
        assert_eq!(catalog.lesson(0).phrase(0), "a sad lad falls");
        assert_eq!(catalog.lesson(9).difficulty, Difficulty::Expert);
        assert!(catalog.iter().all(|l| l.validate().is_ok()));
    }

    #[test]
    fn test_out_of_range_lesson_falls_back_to_first() {
        let catalog = Catalog::embedded().unwrap();

        assert_eq!(catalog.lesson(99).title, catalog.lesson(0).title);
    }

    #[test]
    fn test_out_of_range_phrase_falls_back_to_first() {
        let l = lesson("two", &["first", "second"]);

        assert_eq!(l.phrase(1), "second");
        assert_eq!(l.phrase(7), "first");
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert_matches!(Catalog::from_lessons(vec![]), Err(TutorError::EmptyCatalog));
    }

    #[test]
    fn test_lesson_without_phrases_rejected() {
        let result = Catalog::from_lessons(vec![lesson("bare", &[])]);

        assert_matches!(result, Err(TutorError::EmptyLesson(title)) if title == "bare");
    }

    #[test]
    fn test_empty_phrase_rejected() {
        let result = Catalog::from_lessons(vec![lesson("gap", &["ok", ""])]);

        assert_matches!(result, Err(TutorError::EmptyPhrase { index: 1, .. }));
    }

    #[test]
    fn test_lesson_deserialization_without_fun_fact() {
        let json = r#"
        {
            "lessons": [
                {
                    "title": "Tiny",
                    "description": "just one",
                    "difficulty": "advanced",
                    "estimated_time": "2 min",
                    "phrases": ["abc"]
                }
            ]
        }
        "#;

        let catalog = Catalog::from_json(json).unwrap();
        let l = catalog.lesson(0);

        assert_eq!(l.difficulty, Difficulty::Advanced);
        assert_eq!(l.difficulty.to_string(), "Advanced");
        assert_eq!(l.fun_fact, None);
        assert_eq!(l.phrase_count(), 1);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert_matches!(Catalog::from_json("{ nope"), Err(TutorError::Json(_)));
    }

    #[test]
    fn test_lesson_status() {
        let catalog = Catalog::embedded().unwrap();

        assert_eq!(catalog.status(0, 2), LessonStatus::Completed);
        assert_eq!(catalog.status(2, 2), LessonStatus::Available);
        assert_eq!(catalog.status(3, 2), LessonStatus::Locked);
    }

    #[test]
    fn test_standalone_lesson() {
        let l = Lesson::standalone(SAMPLE_TEXT);

        assert_eq!(l.phrase_count(), 1);
        assert_eq!(l.phrase(0), SAMPLE_TEXT);
        assert!(l.validate().is_ok());
    }
}
