pub mod attempt_repository;
pub mod curriculum_repository;
pub mod profile_repository;

pub use attempt_repository::{HistoryRepository, InMemoryAttemptRepository, MongoAttemptRepository};
pub use curriculum_repository::{class_for_age, CurriculumLibrary, InMemoryCurriculum};
pub use profile_repository::{InMemoryProfileRepository, MongoProfileRepository, ProfileRepository};
