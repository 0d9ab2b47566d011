use crate::models::{Outcome, Question, Score, Topic};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session needs at least one question")]
    Empty,
    #[error("expected {expected} questions, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("option {option} does not exist (question has {available} options)")]
    OptionOutOfRange { option: usize, available: usize },
    #[error("current question has not been answered yet")]
    NotAnswered,
    #[error("hints are only available before answering")]
    HintAfterAnswer,
}

/// Signal produced for every scored answer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub outcome: Outcome,
    pub question_index: usize,
    pub selected_option: usize,
    pub correct_option: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Next,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    topic: Topic,
    count: usize,
    questions: Vec<Question>,
    current_question_index: usize,
    correct_count: u32,
    wrong_count: u32,
    is_answered: bool,
    selected_option: Option<usize>,
    hint_revealed: bool,
}

impl QuizSession {
    pub fn new(topic: Topic, count: usize, questions: Vec<Question>) -> Result<Self, SessionError> {
        if count == 0 {
            return Err(SessionError::Empty);
        }
        if questions.len() != count {
            return Err(SessionError::CountMismatch {
                expected: count,
                actual: questions.len(),
            });
        }
        Ok(Self {
            topic,
            count,
            questions,
            current_question_index: 0,
            correct_count: 0,
            wrong_count: 0,
            is_answered: false,
            selected_option: None,
            hint_revealed: false,
        })
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_question_index]
    }

    pub fn is_answered(&self) -> bool {
        self.is_answered
    }

    pub fn selected_option(&self) -> Option<usize> {
        if self.is_answered {
            self.selected_option
        } else {
            None
        }
    }

    pub fn hint_revealed(&self) -> bool {
        self.hint_revealed
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 >= self.count
    }

    pub fn score(&self) -> Score {
        Score {
            correct: self.correct_count,
            wrong: self.wrong_count,
        }
    }

    /// Scores `option` for the current question.
    ///
    /// Returns `Ok(None)` when the question was already answered; tallies
    /// change at most once per question.
    pub fn select_option(&mut self, option: usize) -> Result<Option<AnswerFeedback>, SessionError> {
        if self.is_answered {
            return Ok(None);
        }
        let question = &self.questions[self.current_question_index];
        if option >= question.options.len() {
            return Err(SessionError::OptionOutOfRange {
                option,
                available: question.options.len(),
            });
        }

        let correct = question.is_correct(option);
        let feedback = AnswerFeedback {
            outcome: Outcome::from_correct(correct),
            question_index: self.current_question_index,
            selected_option: option,
            correct_option: question.correct_answer_index,
            explanation: question.explanation.clone(),
        };

        self.is_answered = true;
        self.selected_option = Some(option);
        if correct {
            self.correct_count += 1;
        } else {
            self.wrong_count += 1;
        }
        self.check_tallies();
        Ok(Some(feedback))
    }

    pub fn toggle_hint(&mut self) -> Result<bool, SessionError> {
        if self.is_answered {
            return Err(SessionError::HintAfterAnswer);
        }
        self.hint_revealed = !self.hint_revealed;
        Ok(self.hint_revealed)
    }

    /// Moves to the next question, or reports completion on the last one.
    ///
    /// Completion leaves the session untouched so the final question stays
    /// visible in the summary.
    pub fn advance(&mut self) -> Result<Progress, SessionError> {
        if !self.is_answered {
            return Err(SessionError::NotAnswered);
        }
        if self.is_last_question() {
            debug_assert_eq!(self.score().answered() as usize, self.count);
            return Ok(Progress::Completed);
        }
        self.current_question_index += 1;
        self.is_answered = false;
        self.selected_option = None;
        self.hint_revealed = false;
        self.check_tallies();
        Ok(Progress::Next)
    }

    fn check_tallies(&self) {
        debug_assert!(
            (self.correct_count + self.wrong_count) as usize <= self.current_question_index + 1
        );
    }
}

#[cfg(test)]
pub(crate) fn sample_topic() -> Topic {
    Topic {
        id: "modals".into(),
        name: "Modal Verbs".into(),
        description: "Can, could, might.".into(),
        icon: "M".into(),
    }
}

#[cfg(test)]
pub(crate) fn sample_session(count: usize) -> QuizSession {
    let questions = (0..count).map(crate::models::sample_question).collect();
    QuizSession::new(sample_topic(), count, questions).unwrap()
}
