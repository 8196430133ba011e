use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::quiz::order;
use crate::quiz::session::{SelectionError, SessionState, UiEvent};
use crate::quiz::Corpus;

/// Everything one question message shows, decided purely from corpus and
/// session state. The Telegram mapping below is a dumb translation of this.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub topic: usize,
    pub question: usize,
    pub prompt: String,
    pub buttons: Vec<AnswerButton>,
    pub feedback: Option<Feedback>,
    pub detail: Option<Detail>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerButton {
    /// "(1) Nile" -- position is 1-based in display order.
    pub label: String,
    /// Index into the question's answer list.
    pub answer: usize,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    /// Whether the selected answer is a correct one.
    pub positive: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    /// Collapsed: show the "more info" button.
    Button,
    /// Expanded: show the question's fact and the topic's lesson text.
    Panel { fact: String, lesson: String },
}

pub fn render_card(
    corpus: &Corpus,
    session: &SessionState,
    topic: usize,
    question: usize,
) -> Result<Card, SelectionError> {
    let chunk = corpus
        .chunks
        .get(topic)
        .ok_or(SelectionError::Topic(topic))?;
    let q = chunk
        .questions
        .get(question)
        .ok_or(SelectionError::Question(topic, question))?;
    let response = session.response(topic, question)?;

    let buttons = order::order_for(response.order)
        .iter()
        .enumerate()
        .map(|(pos, &an)| AnswerButton {
            label: format!("({}) {}", pos + 1, q.answers[an].text),
            answer: an,
            selected: response.selected == Some(an),
        })
        .collect();

    // Feedback and the info section only exist while an answer is selected.
    let (feedback, detail) = match response.selected {
        Some(an) => {
            let answer = q
                .answers
                .get(an)
                .ok_or(SelectionError::Answer(topic, question, an))?;
            let feedback = Feedback {
                positive: answer.is_correct,
                explanation: answer.explanation.clone(),
            };
            let detail = if session.detail == Some((topic, question)) {
                Detail::Panel {
                    fact: q.fact.clone(),
                    lesson: chunk.content.clone(),
                }
            } else {
                Detail::Button
            };
            (Some(feedback), Some(detail))
        }
        None => (None, None),
    };

    Ok(Card {
        topic,
        question,
        prompt: q.prompt.clone(),
        buttons,
        feedback,
        detail,
    })
}

/// Topic selector labels, "index. title".
pub fn topic_labels(corpus: &Corpus) -> Vec<String> {
    corpus
        .chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("{}. {}", i, chunk.title))
        .collect()
}

pub fn card_text(card: &Card) -> String {
    let mut text = format!("Pregunta {}\n{}", card.question + 1, card.prompt);
    if let Some(feedback) = &card.feedback {
        let mark = if feedback.positive { "✅" } else { "❌" };
        text.push_str(&format!("\n\n{} {}", mark, feedback.explanation));
    }
    if let Some(Detail::Panel { fact, lesson }) = &card.detail {
        text.push_str(&format!("\n\nDato: {}\n\nLección: {}", fact, lesson));
    }
    return text;
}

pub fn card_keyboard(card: &Card) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for button in &card.buttons {
        let label = if button.selected {
            format!("▪ {}", button.label)
        } else {
            button.label.clone()
        };
        let event = UiEvent::ToggleAnswer {
            topic: card.topic,
            question: card.question,
            answer: button.answer,
        };
        rows.push(vec![InlineKeyboardButton::callback(label, event.encode())]);
    }
    if let Some(Detail::Button) = &card.detail {
        let event = UiEvent::ToggleDetail {
            topic: card.topic,
            question: card.question,
        };
        rows.push(vec![InlineKeyboardButton::callback(
            "Ver más info".to_string(),
            event.encode(),
        )]);
    }
    return InlineKeyboardMarkup::new(rows);
}
