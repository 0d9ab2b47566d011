use crate::machine::{AppStatus, QuizMachine, StatusKind};
use crate::models::{Outcome, Score, Topic};
use crate::session::QuizSession;
use serde::Serialize;

/// What the client renders for the current status.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub status: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub question_number: usize,
    pub total: usize,
    pub progress_pct: f64,
    pub score: Score,
    pub question: QuestionView,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub text: String,
    pub options: Vec<OptionView>,
    /// Present only while the hint is revealed and the question is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerView>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OptionView {
    pub label: char,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub outcome: Outcome,
    pub selected_option: usize,
    pub correct_option: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub total: usize,
    pub correct: u32,
    pub wrong: u32,
    pub correct_pct: f64,
}

fn option_label(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

impl SessionView {
    pub fn from_session(session: &QuizSession) -> Self {
        let question = session.current_question();
        let answer = session.selected_option().map(|selected| AnswerView {
            outcome: Outcome::from_correct(question.is_correct(selected)),
            selected_option: selected,
            correct_option: question.correct_answer_index,
            explanation: question.explanation.clone(),
        });
        let hint = (session.hint_revealed() && !session.is_answered()).then(|| question.hint.clone());
        let number = session.current_index() + 1;

        Self {
            question_number: number,
            total: session.count(),
            progress_pct: number as f64 * 100.0 / session.count() as f64,
            score: session.score(),
            question: QuestionView {
                text: question.question.clone(),
                options: question
                    .options
                    .iter()
                    .enumerate()
                    .map(|(i, text)| OptionView {
                        label: option_label(i),
                        text: text.clone(),
                    })
                    .collect(),
                hint,
                answer,
            },
        }
    }
}

impl SummaryView {
    pub fn from_session(session: &QuizSession) -> Self {
        let score = session.score();
        Self {
            total: session.count(),
            correct: score.correct,
            wrong: score.wrong,
            correct_pct: score.correct_pct(),
        }
    }
}

impl QuizView {
    pub fn from_machine(machine: &QuizMachine) -> Self {
        let mut view = Self {
            status: machine.kind(),
            topic: None,
            error: None,
            requested_count: None,
            session: None,
            summary: None,
        };
        match machine.status() {
            AppStatus::Idle => {}
            AppStatus::Setup { topic, error } => {
                view.topic = Some(topic.clone());
                view.error = error.clone();
            }
            AppStatus::Loading { topic, count, .. } => {
                view.topic = Some(topic.clone());
                view.requested_count = Some(*count);
            }
            AppStatus::Active(session) => {
                view.topic = Some(session.topic().clone());
                view.session = Some(SessionView::from_session(session));
            }
            AppStatus::Finished(session) => {
                view.topic = Some(session.topic().clone());
                view.summary = Some(SummaryView::from_session(session));
            }
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::FetchTicket;
    use crate::models::sample_question;
    use crate::session::sample_topic;

    fn loading_machine(count: usize) -> (QuizMachine, FetchTicket) {
        let mut m = QuizMachine::new();
        m.select_topic(sample_topic()).unwrap();
        let ticket = m.start_session(count).unwrap();
        (m, ticket)
    }

    #[test]
    fn idle_view_is_bare() {
        let json = serde_json::to_value(QuizView::from_machine(&QuizMachine::new())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "idle"}));
    }

    #[test]
    fn loading_view_shows_request() {
        let (m, _) = loading_machine(40);
        let view = QuizView::from_machine(&m);
        assert_eq!(view.status, StatusKind::Loading);
        assert_eq!(view.requested_count, Some(40));
        assert!(view.session.is_none());
    }

    #[test]
    fn open_question_hides_answer_until_selected() {
        let (mut m, ticket) = loading_machine(4);
        m.complete_fetch(ticket.attempt, Ok((0..4).map(sample_question).collect()));

        let view = QuizView::from_machine(&m).session.unwrap();
        assert_eq!(view.question_number, 1);
        assert_eq!(view.progress_pct, 25.0);
        assert!(view.question.answer.is_none());
        assert!(view.question.hint.is_none());
        let labels: String = view.question.options.iter().map(|o| o.label).collect();
        assert_eq!(labels, "ABCD");

        m.toggle_hint().unwrap();
        let view = QuizView::from_machine(&m).session.unwrap();
        assert_eq!(view.question.hint.as_deref(), Some("Look at the subject."));

        m.select_option(3).unwrap();
        let view = QuizView::from_machine(&m).session.unwrap();
        let answer = view.question.answer.unwrap();
        assert_eq!(answer.outcome, Outcome::Incorrect);
        assert_eq!(answer.correct_option, 0);
        assert!(view.question.hint.is_none());
    }

    #[test]
    fn finished_view_has_summary() {
        let (mut m, ticket) = loading_machine(2);
        m.complete_fetch(ticket.attempt, Ok((0..2).map(sample_question).collect()));
        m.select_option(0).unwrap();
        m.advance().unwrap();
        m.select_option(0).unwrap();
        m.advance().unwrap();

        let summary = QuizView::from_machine(&m).summary.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.wrong, 1);
        assert_eq!(summary.correct_pct, 50.0);
    }
}
