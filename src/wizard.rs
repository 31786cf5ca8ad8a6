//! The question wizard as a pure state machine.
//!
//! Flow:
//! 1) Restore `{idx, answers}` from the progress store.
//! 2) One question at a time; answer mutations re-validate completeness.
//! 3) `advance` moves forward only while the current slot is complete;
//!    from the last question it reports ready-to-submit instead.
//! 4) A boolean guard keeps rapid repeated submits from firing twice.
//!
//! No I/O and no presentation here: callers persist `record()` after every
//! mutation and render whatever views they need from the accessors.

use crate::domain::{AnswerSet, ProgressRecord};

/// Current position in the flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardPhase {
  Question(usize),
  Submitted,
}

/// Outcome of a forward navigation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
  /// Moved to the next question (new index).
  Moved(usize),
  /// Already on the last question and it is complete; submit instead.
  ReadyToSubmit,
  /// Current slot incomplete (or flow already finished); nothing happened.
  Blocked,
}

pub struct Wizard {
  questions: Vec<String>,
  idx: usize,
  answers: AnswerSet,
  submitted: bool,
  submitting: bool,   // duplicate-submission guard
}

impl Wizard {
  pub fn new(questions: Vec<String>) -> Self {
    let answers = AnswerSet::new(questions.len());
    Self { questions, idx: 0, answers, submitted: false, submitting: false }
  }

  /// Restore from a persisted record. The record is normalized against the
  /// current question list, so a malformed or stale snapshot can never put
  /// the wizard out of range.
  pub fn resume(questions: Vec<String>, record: ProgressRecord) -> Self {
    let record = record.normalized(questions.len());
    Self {
      questions,
      idx: record.idx,
      answers: record.answers,
      submitted: false,
      submitting: false,
    }
  }

  pub fn idx(&self) -> usize { self.idx }
  pub fn total(&self) -> usize { self.questions.len() }
  pub fn answers(&self) -> &AnswerSet { &self.answers }

  pub fn phase(&self) -> WizardPhase {
    if self.submitted { WizardPhase::Submitted } else { WizardPhase::Question(self.idx) }
  }

  pub fn question(&self) -> &str {
    self.questions.get(self.idx).map(String::as_str).unwrap_or_default()
  }

  pub fn is_last(&self) -> bool {
    self.total() > 0 && self.idx == self.total() - 1
  }

  pub fn can_go_back(&self) -> bool {
    !self.submitted && self.idx > 0
  }

  /// Forward controls are enabled iff the current slot is complete.
  pub fn can_advance(&self) -> bool {
    !self.submitted && self.answers.is_complete(self.idx)
  }

  /// `"3 / 7"` style indicator.
  pub fn progress_label(&self) -> String {
    format!("{} / {}", self.idx + 1, self.total())
  }

  /// Progress fill fraction, proportional to `(idx + 1) / total`.
  pub fn progress_percent(&self) -> f32 {
    if self.total() == 0 {
      0.0
    } else {
      ((self.idx + 1) as f32 / self.total() as f32) * 100.0
    }
  }

  /// Snapshot for the progress store.
  pub fn record(&self) -> ProgressRecord {
    ProgressRecord { idx: self.idx, answers: self.answers.clone() }
  }

  // --- Answer mutations (all at the current index) ---

  pub fn answer_yes(&mut self) {
    if !self.submitted {
      self.answers.set_yes(self.idx);
    }
  }

  /// "No" selected: slot becomes declined-without-text, which keeps forward
  /// controls disabled until free text arrives.
  pub fn answer_no(&mut self) {
    if !self.submitted {
      self.answers.decline(self.idx);
    }
  }

  /// Free text for a declined slot. Clearing the text (whitespace-only)
  /// re-disables forward controls.
  pub fn answer_text(&mut self, text: &str) {
    if !self.submitted {
      self.answers.set_text(self.idx, text);
    }
  }

  // --- Navigation ---

  /// `Question(i) --back--> Question(i-1)`, only when `i > 0`.
  pub fn back(&mut self) -> bool {
    if self.can_go_back() {
      self.idx -= 1;
      true
    } else {
      false
    }
  }

  /// `Question(i) --advance--> Question(i+1)` gated on completeness;
  /// from the last question the caller must submit instead.
  pub fn advance(&mut self) -> Advance {
    if !self.can_advance() {
      return Advance::Blocked;
    }
    if self.is_last() {
      return Advance::ReadyToSubmit;
    }
    self.idx += 1;
    Advance::Moved(self.idx)
  }

  // --- Submission guard ---

  /// Arm the submission. Returns false when the last answer is incomplete,
  /// a submission is already in flight, or the flow already finished.
  pub fn begin_submit(&mut self) -> bool {
    if self.submitted || self.submitting || !self.is_last() || !self.can_advance() {
      return false;
    }
    self.submitting = true;
    true
  }

  /// Submission failed: re-arm so the user may retry.
  pub fn submit_failed(&mut self) {
    self.submitting = false;
  }

  /// Confirmed success: terminal state.
  pub fn complete(&mut self) {
    self.submitting = false;
    self.submitted = true;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn three_questions() -> Vec<String> {
    vec!["q1".into(), "q2".into(), "q3".into()]
  }

  #[test]
  fn fresh_wizard_starts_at_zero_with_all_slots_empty() {
    let w = Wizard::new(three_questions());
    assert_eq!(w.phase(), WizardPhase::Question(0));
    assert_eq!(w.answers().len(), 3);
    assert!(!w.can_advance());
    assert!(!w.can_go_back());
    assert_eq!(w.progress_label(), "1 / 3");
  }

  #[test]
  fn yes_enables_forward_no_alone_does_not() {
    let mut w = Wizard::new(three_questions());
    w.answer_no();
    assert!(!w.can_advance(), "declined without text must stay blocked");
    w.answer_yes();
    assert!(w.can_advance(), "affirmative satisfies completeness directly");
  }

  #[test]
  fn clearing_free_text_re_disables_forward() {
    let mut w = Wizard::new(three_questions());
    w.answer_no();
    w.answer_text("my own words");
    assert!(w.can_advance());
    w.answer_text("   ");
    assert!(!w.can_advance(), "whitespace-only text reverts to incomplete");
  }

  #[test]
  fn advance_walks_forward_and_reports_submit_on_last() {
    let mut w = Wizard::new(three_questions());
    assert_eq!(w.advance(), Advance::Blocked);

    w.answer_yes();
    assert_eq!(w.advance(), Advance::Moved(1));
    w.answer_no();
    w.answer_text("custom");
    assert_eq!(w.advance(), Advance::Moved(2));
    w.answer_yes();
    assert!(w.is_last());
    assert_eq!(w.advance(), Advance::ReadyToSubmit);
    assert_eq!(w.idx(), 2, "ready-to-submit must not move the index");
  }

  #[test]
  fn back_only_from_later_questions() {
    let mut w = Wizard::new(three_questions());
    assert!(!w.back());
    w.answer_yes();
    w.advance();
    assert!(w.back());
    assert_eq!(w.idx(), 0);
  }

  #[test]
  fn resume_clamps_stale_records() {
    let record = ProgressRecord { idx: 9, answers: AnswerSet::new(1) };
    let w = Wizard::resume(three_questions(), record);
    assert_eq!(w.idx(), 2, "index clamps into range");
    assert_eq!(w.answers().len(), 3, "answers resize to the question count");
  }

  #[test]
  fn submission_guard_blocks_rapid_double_fire() {
    let mut w = Wizard::new(vec!["only".into()]);
    assert!(!w.begin_submit(), "incomplete answer cannot submit");
    w.answer_yes();
    assert!(w.begin_submit());
    assert!(!w.begin_submit(), "second submit while in flight is suppressed");

    w.submit_failed();
    assert!(w.begin_submit(), "failure re-arms the guard");

    w.complete();
    assert_eq!(w.phase(), WizardPhase::Submitted);
    assert!(!w.begin_submit(), "terminal state never resubmits");
    assert!(!w.back());
  }

  #[test]
  fn answers_keep_question_count_after_every_mutation() {
    let mut w = Wizard::new(three_questions());
    w.answer_yes();
    w.advance();
    w.answer_no();
    w.answer_text("words");
    w.back();
    w.answer_text("rewrite");
    assert_eq!(w.answers().len(), 3);
    assert_eq!(w.record().answers.len(), 3);
  }
}
