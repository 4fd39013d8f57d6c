//! JSON bodies exchanged with the quiz API and their conversion to the
//! domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    draft::QuizDraft,
    quiz::{Id, OptionLabel, Question, Quiz, QuizResult, Score},
    session::{Role, Session},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    #[serde(default, alias = "_id")]
    pub id: Option<Id>,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub option_a: Option<String>,
    #[serde(default)]
    pub option_b: Option<String>,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    #[serde(default)]
    pub correct_option: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDto {
    #[serde(alias = "_id")]
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Option<Vec<QuestionDto>>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub created_by: Option<Id>,
    #[serde(default)]
    pub time_limit: Option<u32>,
}

/// The catalog endpoint answers either a bare array or `{"quizzes": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogDto {
    List(Vec<QuizDto>),
    Wrapped { quizzes: Vec<QuizDto> },
}

impl CatalogDto {
    pub fn into_quizzes(self) -> Vec<Quiz> {
        let dtos = match self {
            CatalogDto::List(dtos) => dtos,
            CatalogDto::Wrapped { quizzes } => quizzes,
        };
        dtos.into_iter().map(Quiz::from).collect()
    }
}

impl From<QuizDto> for Quiz {
    fn from(dto: QuizDto) -> Self {
        let questions = dto
            .questions
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(position, question)| question.into_question(position))
            .collect();

        Quiz::new(
            dto.id,
            dto.title,
            dto.description.unwrap_or_default(),
            questions,
            dto.is_published.unwrap_or(false),
            dto.created_by,
        )
        .with_time_limit(dto.time_limit)
    }
}

impl QuestionDto {
    fn into_question(self, position: usize) -> Question {
        let id = self.id.unwrap_or_else(|| {
            log::warn!("Question '{}' has no id, keying it by position", self.question_text);
            Id::from((position + 1).to_string())
        });
        let correct = self
            .correct_option
            .as_deref()
            .and_then(|label| label.parse::<OptionLabel>().ok());

        Question::new(
            id,
            self.question_text,
            [
                self.option_a.unwrap_or_default(),
                self.option_b.unwrap_or_default(),
                self.option_c.unwrap_or_default(),
                self.option_d.unwrap_or_default(),
            ],
            correct,
            self.explanation.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: String,
    pub explanation: String,
}

/// Body of quiz creation, and of a full update when editing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizPayload {
    pub title: String,
    pub description: String,
    pub created_by: Id,
    pub questions: Vec<QuestionPayload>,
}

impl QuizPayload {
    pub fn from_draft(draft: &QuizDraft, owner: &Id) -> Self {
        let questions = draft
            .questions
            .iter()
            .map(|question| {
                let [a, b, c, d] = question.options.clone();
                QuestionPayload {
                    question_text: question.text.clone(),
                    option_a: a,
                    option_b: b,
                    option_c: c,
                    option_d: d,
                    correct_option: question
                        .answer
                        .map(|label| label.as_str().to_owned())
                        .unwrap_or_default(),
                    explanation: question.explanation.clone(),
                }
            })
            .collect();

        Self {
            title: draft.title.clone(),
            description: draft.description.clone(),
            created_by: owner.clone(),
            questions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPatch {
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub user_id: Id,
    pub answers: BTreeMap<Id, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub role: Role,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    #[serde(default, alias = "_id")]
    pub id: Option<Id>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserDto {
    /// A login response without an id is a failed login.
    pub fn into_session(self) -> Option<Session> {
        let user_id = self.id?;
        let role = self
            .role
            .as_deref()
            .and_then(|role| role.parse().ok())
            .unwrap_or(Role::Participant);
        Some(Session {
            user_id,
            username: self.username,
            email: self.email,
            role,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDto {
    #[serde(default, alias = "_id")]
    pub id: Option<Id>,
    pub quiz_id: Id,
    #[serde(default)]
    pub quiz_title: Option<String>,
    #[serde(default)]
    pub quiz_domain: Option<String>,
    #[serde(default)]
    pub user_id: Option<Id>,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

impl From<ResultDto> for QuizResult {
    fn from(dto: ResultDto) -> Self {
        QuizResult {
            id: dto.id,
            quiz_id: dto.quiz_id,
            quiz_title: dto.quiz_title,
            quiz_domain: dto.quiz_domain,
            user_id: dto.user_id,
            score: Score {
                score: dto.score,
                total: dto.total,
            },
            submitted_at: dto.submitted_at.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Accepts RFC 3339 timestamps as well as zone-less ISO local date-times.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(with_zone) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_zone.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::QuestionDraft;

    #[test]
    fn quiz_decodes_with_mongo_style_ids_and_missing_fields() {
        let dto: QuizDto = serde_json::from_str(
            r#"{
                "_id": "65f0",
                "title": "Capitals",
                "questions": [
                    {"_id": "q1", "questionText": "France?", "optionA": "Paris",
                     "optionB": "London", "optionC": "Berlin", "optionD": "Madrid",
                     "correctOption": "a"},
                    {"questionText": "Spain?"}
                ]
            }"#,
        )
        .unwrap();
        let quiz = Quiz::from(dto);

        assert_eq!(quiz.id(), &Id::from("65f0"));
        assert_eq!(quiz.description(), "");
        assert!(!quiz.is_published());
        assert_eq!(quiz.questions()[0].correct(), Some(OptionLabel::A));
        assert_eq!(quiz.questions()[0].option(OptionLabel::D), "Madrid");
        assert_eq!(quiz.questions()[1].id(), &Id::from("2"));
        assert_eq!(quiz.questions()[1].correct(), None);
    }

    #[test]
    fn catalog_accepts_both_shapes() {
        let bare: CatalogDto = serde_json::from_str(r#"[{"id": 1, "title": "a"}]"#).unwrap();
        let wrapped: CatalogDto =
            serde_json::from_str(r#"{"quizzes": [{"id": 1, "title": "a"}, {"id": 2, "title": "b"}]}"#)
                .unwrap();
        assert_eq!(bare.into_quizzes().len(), 1);
        assert_eq!(wrapped.into_quizzes().len(), 2);
    }

    #[test]
    fn payload_uses_blank_strings_for_missing_values() {
        let draft = QuizDraft {
            title: "Capitals".into(),
            description: String::new(),
            questions: vec![QuestionDraft {
                text: "France?".into(),
                options: ["Paris".into(), "London".into(), String::new(), String::new()],
                answer: Some(OptionLabel::A),
                ..QuestionDraft::default()
            }],
            pending: QuestionDraft::default(),
        };

        let json = serde_json::to_value(QuizPayload::from_draft(&draft, &Id::from("7"))).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "title": "Capitals",
                "description": "",
                "createdBy": "7",
                "questions": [{
                    "questionText": "France?",
                    "optionA": "Paris",
                    "optionB": "London",
                    "optionC": "",
                    "optionD": "",
                    "correctOption": "A",
                    "explanation": ""
                }]
            })
        );
    }

    #[test]
    fn login_without_id_is_no_session() {
        let user: UserDto = serde_json::from_str(r#"{"username": "ann"}"#).unwrap();
        assert!(user.into_session().is_none());

        let user: UserDto =
            serde_json::from_str(r#"{"id": 3, "username": "ann", "email": "a@b.c", "role": "creator"}"#)
                .unwrap();
        let session = user.into_session().unwrap();
        assert_eq!(session.user_id, Id::from("3"));
        assert!(session.is_creator());
    }

    #[test]
    fn timestamps_with_and_without_zone() {
        assert!(parse_timestamp("2024-05-01T10:20:30Z").is_some());
        assert!(parse_timestamp("2024-05-01T10:20:30.123").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn results_decode() {
        let dto: ResultDto = serde_json::from_str(
            r#"{"id": 9, "quizId": 1, "quizTitle": "Capitals", "userId": 3, "score": 2, "total": 3,
                "submittedAt": "2024-05-01T10:20:30"}"#,
        )
        .unwrap();
        let result = QuizResult::from(dto);
        assert_eq!(result.quiz_id, Id::from("1"));
        assert_eq!(result.score, Score { score: 2, total: 3 });
        assert!(result.submitted_at.is_some());
    }
}
