//! Test doubles shared by this crate's tests and its dependents.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::contract::Console;

/// A [`Console`] that records every line shown and answers questions from a
/// script. Once the script runs out it keeps giving the default answer.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    lines: Mutex<Vec<String>>,
    questions: Mutex<Vec<String>>,
    answers: Mutex<VecDeque<bool>>,
    default_answer: bool,
}

impl RecordingConsole {
    /// A console that answers every question with `answer`.
    pub fn answering(answer: bool) -> Self {
        RecordingConsole {
            default_answer: answer,
            ..Default::default()
        }
    }

    /// A console that gives `answers` in order, then `default_answer`.
    pub fn scripted(answers: impl IntoIterator<Item = bool>, default_answer: bool) -> Self {
        RecordingConsole {
            answers: Mutex::new(answers.into_iter().collect()),
            default_answer,
            ..Default::default()
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl Console for RecordingConsole {
    fn show(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    /// Recorded without the time prefix so tests stay deterministic.
    fn show_timed(&self, line: &str) {
        self.show(line);
    }

    fn yes_or_no(&self, question: &str) -> bool {
        self.questions.lock().unwrap().push(question.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_answer)
    }
}
