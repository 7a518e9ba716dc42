pub mod adaptive_service;
pub mod difficulty_policy;
pub mod generation;
pub mod mastery_filter;

pub use adaptive_service::AdaptiveQuizService;
