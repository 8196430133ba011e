pub mod order;
pub mod session;
pub mod store;
pub mod view;

/// Every question carries exactly this many answers.
pub const ANSWERS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Corpus {
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
    pub title: String,
    pub content: String,
    pub questions: Vec<Question>,
}
impl Chunk {
    pub fn new(title: String, content: String, questions: Vec<Question>) -> Self {
        Self {
            title,
            content,
            questions,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub prompt: String,
    pub fact: String,
    pub answers: Vec<Answer>,
}
impl Question {
    pub fn new(prompt: String, fact: String, answers: Vec<Answer>) -> Self {
        Self {
            prompt,
            fact,
            answers,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Answer {
    pub text: String,
    pub explanation: String,
    pub is_correct: bool,
}
impl Answer {
    pub fn new(text: String, explanation: String, is_correct: bool) -> Self {
        Self {
            text,
            explanation,
            is_correct,
        }
    }
}

impl Corpus {
    /// Structural check, done once when a corpus file is loaded.
    /// A corpus that fails here is rejected whole, it never reaches rendering.
    pub fn validate(&self) -> Result<(), String> {
        for (cn, chunk) in self.chunks.iter().enumerate() {
            for (qn, question) in chunk.questions.iter().enumerate() {
                if question.answers.len() != ANSWERS_PER_QUESTION {
                    return Err(format!(
                        "chunk {}, question {}: expected {} answers, got {}",
                        cn,
                        qn,
                        ANSWERS_PER_QUESTION,
                        question.answers.len()
                    ));
                }
                if question.prompt.is_empty() {
                    return Err(format!("chunk {}, question {}: empty prompt", cn, qn));
                }
                for (an, answer) in question.answers.iter().enumerate() {
                    if answer.text.is_empty() {
                        return Err(format!(
                            "chunk {}, question {}, answer {}: empty text",
                            cn, qn, an
                        ));
                    }
                    if answer.explanation.is_empty() {
                        return Err(format!(
                            "chunk {}, question {}, answer {}: empty explanation",
                            cn, qn, an
                        ));
                    }
                }
            }
        }
        return Ok(());
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn well_formed_corpus_passes_validation() {
        let corpus = rivers_corpus();
        assert!(corpus.validate().is_ok());
        for chunk in &corpus.chunks {
            for question in &chunk.questions {
                assert_eq!(question.answers.len(), ANSWERS_PER_QUESTION);
            }
        }
    }

    #[test]
    fn wrong_answer_count_fails_validation() {
        let mut corpus = rivers_corpus();
        corpus.chunks[0].questions[0].answers.pop();
        let err = corpus.validate().unwrap_err();
        assert!(err.contains("expected 4 answers, got 3"), "{}", err);

        let mut corpus = rivers_corpus();
        corpus.chunks[0].questions[0]
            .answers
            .push(answer("Danube", "Not even close.", false));
        assert!(corpus.validate().is_err());
    }

    #[test]
    fn empty_required_strings_fail_validation() {
        let mut corpus = rivers_corpus();
        corpus.chunks[0].questions[0].prompt = String::new();
        assert!(corpus.validate().unwrap_err().contains("empty prompt"));

        let mut corpus = rivers_corpus();
        corpus.chunks[0].questions[0].answers[2].text = String::new();
        assert!(corpus.validate().unwrap_err().contains("empty text"));

        let mut corpus = rivers_corpus();
        corpus.chunks[0].questions[0].answers[3].explanation = String::new();
        assert!(corpus.validate().unwrap_err().contains("empty explanation"));
    }

    #[test]
    fn empty_corpus_is_valid() {
        // No chunks means nothing to violate.
        assert!(Corpus::default().validate().is_ok());
    }
}
