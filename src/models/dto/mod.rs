pub mod request;
pub mod response;

pub use request::{QuizRequest, QuizSubmission};
pub use response::{QuestionFeedback, QuizResponse, SubmissionOutcome};
