use crate::attempt::TakingFlow;
use crate::authoring::AuthoringSession;
use crate::quiz::Quiz;
use crate::session::{Role, Session};

#[derive(Debug, Clone, Default)]
pub enum QuizState {
    #[default]
    Start,
    // PART FOR --- LOGIN / SIGNUP ---
    ReceiveEmail,
    ReceivePassword {
        email: String,
    },
    ReceiveUsername,
    ReceiveRole {
        username: String,
    },
    ReceiveSignupEmail {
        username: String,
        role: Role,
    },
    ReceiveSignupPassword {
        username: String,
        role: Role,
        email: String,
    },
    Menu {
        session: Session,
    },

    // PART FOR --- TAKING QUIZ ---
    Taking {
        session: Session,
        flow: TakingFlow,
    },

    // PART FOR --- AUTHORING ---
    Authoring {
        session: Session,
        authoring: AuthoringSession,
    },

    // PART FOR --- CREATOR DASHBOARD ---
    MyQuizzes {
        session: Session,
        quizzes: Vec<Quiz>,
    },
    HandleQuiz {
        session: Session,
        quiz: Quiz,
    },
    ConfirmDelete {
        session: Session,
        quiz: Quiz,
    },
}

impl QuizState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            QuizState::Menu { session }
            | QuizState::Taking { session, .. }
            | QuizState::Authoring { session, .. }
            | QuizState::MyQuizzes { session, .. }
            | QuizState::HandleQuiz { session, .. }
            | QuizState::ConfirmDelete { session, .. } => Some(session),
            QuizState::Start
            | QuizState::ReceiveEmail
            | QuizState::ReceivePassword { .. }
            | QuizState::ReceiveUsername
            | QuizState::ReceiveRole { .. }
            | QuizState::ReceiveSignupEmail { .. }
            | QuizState::ReceiveSignupPassword { .. } => None,
        }
    }
}
