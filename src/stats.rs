//! Aggregates shown on the participant and creator dashboards.

use std::collections::HashSet;

use crate::quiz::{Id, Quiz, QuizResult, Score};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub attempts: usize,
    pub total_score: u32,
    pub total_possible: u32,
    pub average_percent: f64,
    pub best: Option<Score>,
}

/// Sums a list of results. The average is the mean of per-attempt
/// percentages, so short quizzes weigh as much as long ones.
pub fn summarize(results: &[QuizResult]) -> Summary {
    if results.is_empty() {
        return Summary::default();
    }

    let total_score = results.iter().map(|r| r.score.score).sum();
    let total_possible = results.iter().map(|r| r.score.total).sum();
    let average_percent =
        results.iter().map(|r| r.score.percent()).sum::<f64>() / results.len() as f64;
    let best = results
        .iter()
        .map(|r| r.score)
        .max_by(|a, b| a.percent().total_cmp(&b.percent()));

    Summary {
        attempts: results.len(),
        total_score,
        total_possible,
        average_percent,
        best,
    }
}

pub fn participants(results: &[QuizResult]) -> usize {
    results
        .iter()
        .filter_map(|r| r.user_id.as_ref())
        .collect::<HashSet<&Id>>()
        .len()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreatorOverview {
    pub total_quizzes: usize,
    pub published_quizzes: usize,
    pub total_participants: usize,
    pub total_attempts: usize,
    /// Title and average percentage of the best-scoring quiz with attempts.
    pub top_quiz: Option<(String, f64)>,
}

/// `results` pairs each of the creator's quizzes with its results.
pub fn creator_overview(results: &[(Quiz, Vec<QuizResult>)]) -> CreatorOverview {
    let everyone: HashSet<&Id> = results
        .iter()
        .flat_map(|(_, rs)| rs.iter().filter_map(|r| r.user_id.as_ref()))
        .collect();

    let top_quiz = results
        .iter()
        .filter(|(_, rs)| !rs.is_empty())
        .map(|(quiz, rs)| (quiz.title().to_owned(), summarize(rs).average_percent))
        .max_by(|a, b| a.1.total_cmp(&b.1));

    CreatorOverview {
        total_quizzes: results.len(),
        published_quizzes: results.iter().filter(|(q, _)| q.is_published()).count(),
        total_participants: everyone.len(),
        total_attempts: results.iter().map(|(_, rs)| rs.len()).sum(),
        top_quiz,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(user: &str, score: u32, total: u32) -> QuizResult {
        QuizResult {
            id: None,
            quiz_id: Id::from("1"),
            quiz_title: None,
            quiz_domain: None,
            user_id: Some(Id::from(user)),
            score: Score { score, total },
            submitted_at: None,
        }
    }

    fn quiz(id: &str, title: &str) -> Quiz {
        Quiz::new(Id::from(id), title.into(), String::new(), vec![], id == "1", None)
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        assert_eq!(summarize(&[]), Summary::default());
    }

    #[test]
    fn summary_averages_percentages() {
        let summary = summarize(&[result("u1", 1, 2), result("u1", 4, 4)]);
        assert_eq!(summary.attempts, 2);
        assert_eq!(summary.total_score, 5);
        assert_eq!(summary.total_possible, 6);
        assert_eq!(summary.average_percent, 75.0);
        assert_eq!(summary.best, Some(Score { score: 4, total: 4 }));
    }

    #[test]
    fn overview_counts_distinct_participants_and_picks_top_quiz() {
        let overview = creator_overview(&[
            (quiz("1", "Capitals"), vec![result("u1", 1, 4), result("u2", 2, 4)]),
            (quiz("2", "Rivers"), vec![result("u1", 3, 3)]),
            (quiz("3", "Empty"), vec![]),
        ]);

        assert_eq!(overview.total_quizzes, 3);
        assert_eq!(overview.published_quizzes, 1);
        assert_eq!(overview.total_participants, 2);
        assert_eq!(overview.total_attempts, 3);
        assert_eq!(overview.top_quiz, Some(("Rivers".to_owned(), 100.0)));
        assert_eq!(participants(&[result("u1", 0, 1), result("u1", 1, 1)]), 1);
    }
}
