pub mod client;
pub mod model;

pub use client::{
    ApiClient, Authenticate, CreateQuiz, DeleteQuiz, EditQuiz, RetrieveQuiz, RetrieveResults,
    SubmitAttempt,
};
