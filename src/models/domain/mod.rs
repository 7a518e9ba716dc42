pub mod attempt;
pub mod difficulty;
pub mod question;
pub mod user_profile;
pub use attempt::{Attempt, MasteredQuestionSet, ResponseRecord};
pub use difficulty::DifficultyLevel;
pub use question::{CandidateQuestion, HasQuestionText, Question, QuestionSource};
pub use user_profile::UserProfile;
