use std::future::Future;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::model::{
    CatalogDto, LoginRequest, PublishPatch, QuizDto, QuizPayload, ResultDto, SignupRequest,
    SubmissionPayload, UserDto,
};
use crate::{
    attempt::Submission,
    error::ApiError,
    quiz::{Id, Quiz, QuizResult, Score},
    session::Session,
};

type ApiResult<T> = Result<T, ApiError>;

pub trait Authenticate {
    fn login(&self, email: &str, password: &str) -> impl Future<Output = ApiResult<Session>> + Send;

    fn signup(&self, request: SignupRequest) -> impl Future<Output = ApiResult<()>> + Send;
}

pub trait RetrieveQuiz {
    fn retrieve_catalog(&self) -> impl Future<Output = ApiResult<Vec<Quiz>>> + Send;

    fn retrieve_quiz(&self, id: &Id) -> impl Future<Output = ApiResult<Quiz>> + Send;

    fn retrieve_owned_quizzes(&self, owner: &Id) -> impl Future<Output = ApiResult<Vec<Quiz>>> + Send;
}

pub trait CreateQuiz {
    fn create_quiz(&self, payload: &QuizPayload) -> impl Future<Output = ApiResult<Quiz>> + Send;
}

pub trait EditQuiz {
    fn update_quiz(&self, id: &Id, payload: &QuizPayload) -> impl Future<Output = ApiResult<Quiz>> + Send;

    fn set_published(&self, id: &Id, published: bool) -> impl Future<Output = ApiResult<Quiz>> + Send;
}

pub trait DeleteQuiz {
    fn delete_quiz(&self, id: &Id) -> impl Future<Output = ApiResult<()>> + Send;
}

pub trait SubmitAttempt {
    fn submit_attempt(&self, user: &Id, submission: &Submission) -> impl Future<Output = ApiResult<Score>> + Send;
}

pub trait RetrieveResults {
    fn retrieve_user_results(&self, user: &Id) -> impl Future<Output = ApiResult<Vec<QuizResult>>> + Send;

    fn retrieve_quiz_results(&self, quiz: &Id) -> impl Future<Output = ApiResult<Vec<QuizResult>>> + Send;
}

/// HTTP client of the quiz API. Requests are never retried and carry no
/// timeout of their own.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            http: Client::new(),
            base,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base.join(path)?)
    }

    /// Like [`ApiClient::endpoint`], but every segment is percent-encoded so
    /// server-issued ids cannot change the route.
    fn resource(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            log::warn!("API responded with {}: {}", status, message);
            Err(ApiError::Status { status, message })
        }
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl Authenticate for ApiClient {
    #[instrument(level = "debug", skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let url = self.endpoint("api/users/login")?;
        let user: UserDto = self
            .json(self.http.post(url).json(&LoginRequest {
                email: email.to_owned(),
                password: password.to_owned(),
            }))
            .await?;
        user.into_session().ok_or(ApiError::NotAuthenticated)
    }

    #[instrument(level = "debug", skip(self, request), fields(username = %request.username))]
    async fn signup(&self, request: SignupRequest) -> ApiResult<()> {
        let url = self.endpoint("api/users/signup")?;
        let user: UserDto = self.json(self.http.post(url).json(&request)).await?;
        match user.id {
            Some(_) => Ok(()),
            None => Err(ApiError::Decode("signup response carries no user id".into())),
        }
    }
}

impl RetrieveQuiz for ApiClient {
    #[instrument(level = "debug", skip(self))]
    async fn retrieve_catalog(&self) -> ApiResult<Vec<Quiz>> {
        let url = self.endpoint("api/quizzes")?;
        let catalog: CatalogDto = self.json(self.http.get(url)).await?;
        Ok(catalog.into_quizzes())
    }

    #[instrument(level = "debug", skip(self))]
    async fn retrieve_quiz(&self, id: &Id) -> ApiResult<Quiz> {
        let url = self.resource(&["api", "quizzes", id.as_str()])?;
        let quiz: QuizDto = self.json(self.http.get(url)).await?;
        Ok(quiz.into())
    }

    #[instrument(level = "debug", skip(self))]
    async fn retrieve_owned_quizzes(&self, owner: &Id) -> ApiResult<Vec<Quiz>> {
        let url = self.resource(&["api", "quizzes", "myquizzes", owner.as_str()])?;
        let quizzes: Vec<QuizDto> = self.json(self.http.get(url)).await?;
        Ok(quizzes.into_iter().map(Quiz::from).collect())
    }
}

impl CreateQuiz for ApiClient {
    #[instrument(level = "debug", skip(self, payload), fields(title = %payload.title))]
    async fn create_quiz(&self, payload: &QuizPayload) -> ApiResult<Quiz> {
        let url = self.endpoint("api/quizzes")?;
        log::debug!("Creating quiz with {} questions", payload.questions.len());
        let quiz: QuizDto = self.json(self.http.post(url).json(payload)).await?;
        Ok(quiz.into())
    }
}

impl EditQuiz for ApiClient {
    #[instrument(level = "debug", skip(self, payload))]
    async fn update_quiz(&self, id: &Id, payload: &QuizPayload) -> ApiResult<Quiz> {
        let url = self.resource(&["api", "quizzes", id.as_str()])?;
        let quiz: QuizDto = self.json(self.http.put(url).json(payload)).await?;
        Ok(quiz.into())
    }

    #[instrument(level = "debug", skip(self))]
    async fn set_published(&self, id: &Id, published: bool) -> ApiResult<Quiz> {
        let url = self.resource(&["api", "quizzes", id.as_str()])?;
        let patch = PublishPatch {
            is_published: published,
        };
        let quiz: QuizDto = self.json(self.http.put(url).json(&patch)).await?;
        Ok(quiz.into())
    }
}

impl DeleteQuiz for ApiClient {
    #[instrument(level = "debug", skip(self))]
    async fn delete_quiz(&self, id: &Id) -> ApiResult<()> {
        let url = self.resource(&["api", "quizzes", id.as_str()])?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

impl SubmitAttempt for ApiClient {
    #[instrument(level = "debug", skip(self, submission), fields(quiz = %submission.quiz_id))]
    async fn submit_attempt(&self, user: &Id, submission: &Submission) -> ApiResult<Score> {
        let url = self.resource(&["api", "quizzes", submission.quiz_id.as_str(), "submit"])?;
        let payload = SubmissionPayload {
            user_id: user.clone(),
            answers: submission.answers.clone(),
        };
        self.json(self.http.post(url).json(&payload)).await
    }
}

impl RetrieveResults for ApiClient {
    #[instrument(level = "debug", skip(self))]
    async fn retrieve_user_results(&self, user: &Id) -> ApiResult<Vec<QuizResult>> {
        let url = self.resource(&["api", "quizzes", "quiz-results", "users", user.as_str()])?;
        let results: Vec<ResultDto> = self.json(self.http.get(url)).await?;
        Ok(results.into_iter().map(QuizResult::from).collect())
    }

    #[instrument(level = "debug", skip(self))]
    async fn retrieve_quiz_results(&self, quiz: &Id) -> ApiResult<Vec<QuizResult>> {
        let url = self.resource(&["api", "quizzes", "quiz-results", quiz.as_str()])?;
        let results: Vec<ResultDto> = self.json(self.http.get(url)).await?;
        Ok(results.into_iter().map(QuizResult::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_its_path_prefix() {
        let client = ApiClient::new("http://localhost:9096/backend".parse().unwrap());
        assert_eq!(
            client.endpoint("api/quizzes").unwrap().as_str(),
            "http://localhost:9096/backend/api/quizzes"
        );

        let client = ApiClient::new("http://localhost:9096".parse().unwrap());
        assert_eq!(
            client.resource(&["api", "quizzes", "7", "submit"]).unwrap().as_str(),
            "http://localhost:9096/api/quizzes/7/submit"
        );
    }

    #[test]
    fn ids_stay_inside_their_path_segment() {
        let client = ApiClient::new("http://localhost:9096/backend".parse().unwrap());
        let url = client.resource(&["api", "quizzes", "7/../users?x#y"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9096/backend/api/quizzes/7%2F..%2Fusers%3Fx%23y"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }
}
