use thiserror::Error;

/// Failures while editing a quiz draft. These never corrupt the draft: the
/// operation is refused and the caller re-prompts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("the quiz needs a title")]
    MissingTitle,
    #[error("the question needs some text")]
    MissingQuestionText,
    #[error("pick the correct option (A, B, C or D) first")]
    MissingCorrectOption,
    #[error("add at least one question before reviewing")]
    NoQuestions,
    #[error("there is no question #{0}")]
    NoSuchQuestion(usize),
    #[error("finish the question in progress before editing another one")]
    QuestionInProgress,
    #[error("'{0}' is not one of A, B, C or D")]
    InvalidLabel(String),
}

/// Refused transitions of the quiz-taking flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("that action is not available right now")]
    InvalidTransition,
    #[error("you have already attempted this quiz")]
    AlreadyAttempted,
    #[error("quiz not found")]
    UnknownQuiz,
    #[error("this quiz has no questions yet")]
    NoQuestions,
    #[error("the attempt is already being submitted")]
    AlreadySubmitting,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("you must be logged in to do that")]
    NotAuthenticated,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}
