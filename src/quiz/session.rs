use thiserror::Error;

use crate::quiz::{order, Corpus, ANSWERS_PER_QUESTION};

/// The one subject shipped today. The selector still goes through the
/// keyboard so more subjects are a matter of adding corpus files.
pub const DEFAULT_SUBJECT: &str = "GEOGRAFIA";

/// Raised when an interaction points at a topic/question/answer that does
/// not exist. The UI only ever emits indices taken from the corpus, so this
/// is an invariant violation and is propagated, never clamped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("topic {0} is out of range")]
    Topic(usize),
    #[error("question {1} is out of range for topic {0}")]
    Question(usize, usize),
    #[error("answer {2} is out of range for topic {0}, question {1}")]
    Answer(usize, usize, usize),
    #[error("malformed callback data {0:?}")]
    Callback(String),
}

/// Per-question session state: which display order the answers got and which
/// answer the user currently has selected, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuestionResponse {
    pub order: usize,
    pub selected: Option<usize>,
}

/// One chat's quiz state. Lives inside the dialogue storage, so everything
/// here has to serialize.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionState {
    pub subject: String,
    pub topic: usize,
    pub responses: Vec<Vec<QuestionResponse>>,
    /// At most one question's info panel is open, across all topics.
    pub detail: Option<(usize, usize)>,
    /// Telegram message ids of the rendered cards, parallel to `responses`.
    /// Pure delivery bookkeeping so an event can edit the right message.
    pub cards: Vec<Vec<Option<i32>>>,
}

impl SessionState {
    pub fn new(subject: &str, corpus: &Corpus) -> Self {
        let mut state = Self {
            subject: subject.to_string(),
            ..Self::default()
        };
        state.ensure_responses(corpus);
        return state;
    }

    /// Seeds one response per question, once. Calling this again is a no-op:
    /// display orders and selections must survive re-renders and corpus
    /// cache refreshes.
    pub fn ensure_responses(&mut self, corpus: &Corpus) {
        if !self.responses.is_empty() {
            return;
        }
        for chunk in &corpus.chunks {
            self.responses.push(
                chunk
                    .questions
                    .iter()
                    .map(|_| QuestionResponse {
                        order: order::random_seed(),
                        selected: None,
                    })
                    .collect(),
            );
            self.cards.push(vec![None; chunk.questions.len()]);
        }
    }

    pub fn select_topic(&mut self, topic: usize) -> Result<(), SelectionError> {
        if topic >= self.responses.len() {
            return Err(SelectionError::Topic(topic));
        }
        self.topic = topic;
        Ok(())
    }

    pub fn response(&self, topic: usize, question: usize) -> Result<&QuestionResponse, SelectionError> {
        self.check(topic, question)?;
        Ok(&self.responses[topic][question])
    }

    fn check(&self, topic: usize, question: usize) -> Result<(), SelectionError> {
        let questions = self
            .responses
            .get(topic)
            .ok_or(SelectionError::Topic(topic))?;
        if question >= questions.len() {
            return Err(SelectionError::Question(topic, question));
        }
        Ok(())
    }

    /// Select `answer`, or deselect it if it already was selected. Any open
    /// info panel closes either way. Returns the cards whose rendering
    /// changed.
    pub fn toggle_answer(
        &mut self,
        topic: usize,
        question: usize,
        answer: usize,
    ) -> Result<Vec<(usize, usize)>, SelectionError> {
        self.check(topic, question)?;
        if answer >= ANSWERS_PER_QUESTION {
            return Err(SelectionError::Answer(topic, question, answer));
        }

        let mut dirty = vec![(topic, question)];
        if let Some(open) = self.detail.take() {
            if open != (topic, question) {
                dirty.push(open);
            }
        }

        let response = &mut self.responses[topic][question];
        if response.selected == Some(answer) {
            response.selected = None;
        } else {
            response.selected = Some(answer);
        }
        return Ok(dirty);
    }

    /// Open the info panel for a question, or close it if it already was
    /// open there. Opening it anywhere closes it everywhere else.
    pub fn toggle_detail(
        &mut self,
        topic: usize,
        question: usize,
    ) -> Result<Vec<(usize, usize)>, SelectionError> {
        self.check(topic, question)?;

        let mut dirty = vec![(topic, question)];
        if self.detail == Some((topic, question)) {
            self.detail = None;
        } else if let Some(open) = self.detail.replace((topic, question)) {
            dirty.push(open);
        }
        return Ok(dirty);
    }

    /// Single entry point for interaction events coming off the wire.
    pub fn apply(&mut self, event: UiEvent) -> Result<Vec<(usize, usize)>, SelectionError> {
        match event {
            UiEvent::ToggleAnswer {
                topic,
                question,
                answer,
            } => self.toggle_answer(topic, question, answer),
            UiEvent::ToggleDetail { topic, question } => self.toggle_detail(topic, question),
        }
    }

    pub fn record_card(&mut self, topic: usize, question: usize, message_id: i32) {
        if let Some(cards) = self.cards.get_mut(topic) {
            if let Some(card) = cards.get_mut(question) {
                *card = Some(message_id);
            }
        }
    }

    pub fn card(&self, topic: usize, question: usize) -> Option<i32> {
        *self.cards.get(topic)?.get(question)?
    }
}

/// Interaction events, carried as Telegram callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    ToggleAnswer {
        topic: usize,
        question: usize,
        answer: usize,
    },
    ToggleDetail {
        topic: usize,
        question: usize,
    },
}

impl UiEvent {
    pub fn encode(&self) -> String {
        match self {
            UiEvent::ToggleAnswer {
                topic,
                question,
                answer,
            } => format!("ans:{}:{}:{}", topic, question, answer),
            UiEvent::ToggleDetail { topic, question } => format!("more:{}:{}", topic, question),
        }
    }

    pub fn decode(data: &str) -> Result<Self, SelectionError> {
        let bad = || SelectionError::Callback(data.to_string());
        let mut parts = data.split(':');
        let kind = parts.next().ok_or_else(bad)?;
        let mut index = || -> Result<usize, SelectionError> {
            parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())
        };
        let event = match kind {
            "ans" => UiEvent::ToggleAnswer {
                topic: index()?,
                question: index()?,
                answer: index()?,
            },
            "more" => UiEvent::ToggleDetail {
                topic: index()?,
                question: index()?,
            },
            _ => return Err(bad()),
        };
        if parts.next().is_some() {
            return Err(bad());
        }
        return Ok(event);
    }
}
