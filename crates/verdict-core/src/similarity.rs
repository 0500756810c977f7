//! Similar-text scoring.
//!
//! The score of two strings is the total length of their common substrings,
//! found by repeatedly taking the longest common run and splitting the
//! remaining text around it, divided by the length of the longer string.
//!
//! Which run counts as "longest" matters when several have the same length:
//! the first one found scanning positions of the first string, then of the
//! second, wins. That choice changes how the rest is partitioned, so it is
//! observable in which answer is reported as most similar.

use serde::{Deserialize, Serialize};

use crate::collection::Answer;

/// The answer that best matches a reference text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
  pub answer: Answer,
  /// In `[0, 1]`.
  pub score:  f64,
}

/// Case-insensitive similarity of `a` and `b`, in `[0, 1]`.
///
/// Not symmetric in general: the tie-break scans `a` first.
pub fn score(a: &str, b: &str) -> f64 {
  let a = a.to_lowercase();
  let b = b.to_lowercase();
  let longest = a.chars().count().max(b.chars().count());
  if longest == 0 {
    return 0.0;
  }
  similar_text(&a, &b) as f64 / longest as f64
}

/// Total length, in chars, of the common runs of `first` and `second`.
/// Case sensitive.
pub fn similar_text(first: &str, second: &str) -> usize {
  let a: Vec<char> = first.chars().collect();
  let b: Vec<char> = second.chars().collect();

  // (a_start, a_end, b_start, b_end) windows still to be matched. The sum is
  // order independent, so a stack stands in for the recursion.
  let mut work = vec![(0, a.len(), 0, b.len())];
  let mut total = 0;

  while let Some((a_lo, a_hi, b_lo, b_hi)) = work.pop() {
    let Some(run) = longest_common_run(&a[a_lo..a_hi], &b[b_lo..b_hi]) else {
      continue;
    };
    total += run.len;

    if run.a_start > 0 && run.b_start > 0 {
      work.push((a_lo, a_lo + run.a_start, b_lo, b_lo + run.b_start));
    }

    let a_rest = a_lo + run.a_start + run.len;
    let b_rest = b_lo + run.b_start + run.len;
    if a_rest < a_hi && b_rest < b_hi {
      work.push((a_rest, a_hi, b_rest, b_hi));
    }
  }

  total
}

/// Pick the answer scoring highest against `reference`.
///
/// The first answer reaching the maximum wins. An answer scoring zero shares
/// nothing with the reference and is never reported.
pub fn best_match(reference: &str, answers: &[Answer]) -> Option<SimilarityResult> {
  let mut best: Option<SimilarityResult> = None;
  for answer in answers {
    let s = score(reference, &answer.text);
    let current = best.as_ref().map_or(0.0, |b| b.score);
    if s > current {
      best = Some(SimilarityResult { answer: answer.clone(), score: s });
    }
  }
  best
}

struct Run {
  a_start: usize,
  b_start: usize,
  len:     usize,
}

fn longest_common_run(a: &[char], b: &[char]) -> Option<Run> {
  let mut best = Run { a_start: 0, b_start: 0, len: 0 };
  for p in 0..a.len() {
    for q in 0..b.len() {
      let len = a[p..]
        .iter()
        .zip(&b[q..])
        .take_while(|(x, y)| x == y)
        .count();
      if len > best.len {
        best = Run { a_start: p, b_start: q, len };
      }
    }
  }
  (best.len > 0).then_some(best)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn answer(text: &str) -> Answer {
    Answer {
      answer_id:    Uuid::new_v4(),
      text:         text.into(),
      author_id:    Uuid::new_v4(),
      submitted_at: Utc::now(),
    }
  }

  fn approx(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

  #[test]
  fn identical_strings_score_one() {
    assert_eq!(score("abc", "abc"), 1.0);
    assert_eq!(score("the quick brown fox", "the quick brown fox"), 1.0);
  }

  #[test]
  fn disjoint_strings_score_zero() {
    assert_eq!(score("abc", "xyz"), 0.0);
  }

  #[test]
  fn empty_input_scores_zero() {
    assert_eq!(score("abc", ""), 0.0);
    assert_eq!(score("", "abc"), 0.0);
    assert_eq!(score("", ""), 0.0);
  }

  #[test]
  fn prefix_scores_by_longer_length() {
    assert!(approx(score("hello world", "hello"), 5.0 / 11.0));
  }

  #[test]
  fn comparison_ignores_case() {
    assert_eq!(score("ABC", "abc"), 1.0);
    assert_eq!(score("Ünïcode", "ünïCODE"), 1.0);
  }

  #[test]
  fn matches_both_sides_of_the_longest_run() {
    // "Wor" first, then "d" from the remaining suffixes.
    assert_eq!(similar_text("World", "Word"), 4);
    // "ab" then "d" to the right; nothing is left on the left.
    assert_eq!(similar_text("abcd", "abxd"), 3);
    // "acd" in the middle, then "z" on the left and "f" on the right.
    assert_eq!(similar_text("zacdf", "zxacdyf"), 5);
  }

  #[test]
  fn first_longest_run_wins_ties() {
    // "ba" (a[0], b[2]) is found before "aa" (a[1], b[0]) and leaves nothing
    // matchable on either side.
    assert_eq!(similar_text("baaa", "aaba"), 2);
    // Swapped, "aa" at a[0] comes first and the suffixes still share an "a".
    assert_eq!(similar_text("aaba", "baaa"), 3);
    assert_eq!(similar_text("baba", "abba"), 2);

    assert!(approx(score("baaa", "aaba"), 0.5));
    assert!(approx(score("aaba", "baaa"), 0.75));
    assert_ne!(score("baaa", "aaba"), score("aaba", "baaa"));
  }

  #[test]
  fn counts_chars_not_bytes() {
    assert_eq!(similar_text("héllo", "héllo"), 5);
    assert!(approx(score("é", "éa"), 0.5));
  }

  #[test]
  fn best_match_prefers_closest_answer() {
    let answers = vec![answer("bleu"), answer("blue"), answer("red")];
    let result = best_match("blue is the best", &answers).unwrap();
    assert_eq!(result.answer.text, "blue");
    assert!(approx(result.score, 4.0 / 16.0));
  }

  #[test]
  fn best_match_tie_goes_to_first_answer() {
    let answers = vec![answer("a"), answer("b")];
    let result = best_match("ab", &answers).unwrap();
    assert_eq!(result.answer.text, "a");
    assert!(approx(result.score, 0.5));
  }

  #[test]
  fn best_match_ignores_unrelated_answers() {
    assert!(best_match("blue", &[]).is_none());
    assert!(best_match("blue", &[answer("xyz")]).is_none());
  }
}
