//! Closing prompts sent to the summarizer.

use crate::collection::{Answer, CollectionKind};

/// Build the summarizer prompt for a collection being closed. Answers are
/// listed in submission order.
pub fn build_prompt(kind: CollectionKind, title: &str, answers: &[Answer]) -> String {
  let answers = answers
    .iter()
    .map(|a| a.text.as_str())
    .collect::<Vec<_>>()
    .join(", ");

  match kind {
    CollectionKind::Contest => format!(
      "a question: {title}. Analyze these answers and give the best answer: \
       {answers}. This is a competition and I want to announce the best \
       answer and respond with the answer only"
    ),
    CollectionKind::Topic => format!(
      "a question: {title}. Analyze this question and analyze the answers. \
       Briefly give your opinion on this topic without going into details. \
       Give only one answer without going into details, don't answer with \
       questions, I just want one short answer from you: {answers}"
    ),
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn answers(texts: &[&str]) -> Vec<Answer> {
    texts
      .iter()
      .map(|t| Answer {
        answer_id:    Uuid::new_v4(),
        text:         (*t).into(),
        author_id:    Uuid::new_v4(),
        submitted_at: Utc::now(),
      })
      .collect()
  }

  #[test]
  fn contest_prompt_lists_answers_in_order() {
    let prompt = build_prompt(
      CollectionKind::Contest,
      "Best color?",
      &answers(&["blue", "bleu"]),
    );
    assert!(prompt.starts_with("a question: Best color?."));
    assert!(prompt.contains("give the best answer: blue, bleu."));
    assert!(prompt.ends_with("respond with the answer only"));
  }

  #[test]
  fn topic_prompt_asks_for_one_short_answer() {
    let prompt = build_prompt(
      CollectionKind::Topic,
      "Tabs or spaces?",
      &answers(&["tabs", "spaces"]),
    );
    assert_eq!(
      prompt,
      "a question: Tabs or spaces?. Analyze this question and analyze the \
       answers. Briefly give your opinion on this topic without going into \
       details. Give only one answer without going into details, don't \
       answer with questions, I just want one short answer from you: tabs, \
       spaces"
    );
  }

  #[test]
  fn prompt_without_answers_still_names_the_question() {
    let prompt = build_prompt(CollectionKind::Contest, "Empty?", &[]);
    assert!(prompt.contains("Empty?"));
    assert!(prompt.contains("best answer: ."));
  }
}
