//! Reconciles a sandbox status snapshot against the evaluation that produced
//! it, yielding the user-facing verdict for one poll.
//!
//! The sandbox packs every test case's stdout into one string, separated by
//! a fixed delimiter. That delimiter is a wire contract with the sandbox's
//! multi-test-case packing scheme and must be preserved exactly.

use poll_api::evaluation::{ExecutionFlag, PendingEvaluation};
use poll_api::verdict::Verdict;
use sandbox_client::{SandboxStatus, StatusField};
use strum::Display;

/// Separator between per-test-case outputs in the sandbox's combined stdout.
pub const OUTPUT_SEPARATOR: &str = "$$$";

/// In `run` mode only the sample cases are shown to the user, so at most
/// this many results are reported.
pub const RUN_CASE_LIMIT: usize = 3;

/// Status labels the sandbox uses while a job has not finished.
const IN_PROGRESS_LABELS: [&str; 2] = ["Processing", "In Queue"];

/// Terminal classification of a finished sandbox job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Classification {
    #[strum(serialize = "Accepted")]
    Accepted,
    #[strum(serialize = "Wrong Answer")]
    WrongAnswer,
    #[strum(serialize = "Compilation Error")]
    CompilationError,
    #[strum(serialize = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[strum(serialize = "Runtime Error (NZEC)")]
    RuntimeError,
    /// Any (code, label) pair not matching a known combination, including a
    /// known code paired with a different label. Reports the raw sandbox
    /// fields and performs no test-case comparison.
    Unknown,
}

/// Result of one reconciliation pass.
#[derive(Debug)]
pub enum Outcome {
    /// The job has not finished; the caller should poll again later.
    Pending,
    Terminal(Verdict),
}

/// Whether the snapshot says the job is still being worked on.
pub fn is_in_progress(snapshot: &SandboxStatus) -> bool {
    IN_PROGRESS_LABELS.contains(&snapshot.status.description.as_str())
}

/// Maps the sandbox's (code, label) pair to a terminal classification. Both
/// sides must match a known combination.
pub fn classify(status: &StatusField) -> Classification {
    match (status.id, status.description.as_str()) {
        (3, "Accepted") => Classification::Accepted,
        (4, "Wrong Answer") => Classification::WrongAnswer,
        (5, "Time Limit Exceeded") => Classification::TimeLimitExceeded,
        (6, "Compilation Error") => Classification::CompilationError,
        (11, "Runtime Error (NZEC)") => Classification::RuntimeError,
        _ => Classification::Unknown,
    }
}

/// Splits the combined stdout into ordered per-test-case outputs. A trailing
/// element left over from a trailing separator is discarded.
pub fn segment_stdout(stdout: &str) -> Vec<String> {
    let mut parts: Vec<String> = stdout.split(OUTPUT_SEPARATOR).map(str::to_string).collect();
    if let Some(last) = parts.last() {
        if last.is_empty() || last == "\n" {
            parts.pop();
        }
    }
    parts
}

fn case_count(flag: ExecutionFlag, segments: usize) -> usize {
    match flag {
        ExecutionFlag::Run => segments.min(RUN_CASE_LIMIT),
        ExecutionFlag::Submit => segments,
    }
}

/// Compares segmented outputs against expected outputs by trimmed exact
/// equality. A case with no expected output to compare against is never
/// confirmed passing.
fn compare(outputs: &[String], expected: Option<&[String]>, count: usize) -> Vec<bool> {
    let mut results = vec![true; count];
    for (index, result) in results.iter_mut().enumerate() {
        let matched = expected
            .and_then(|exp| exp.get(index))
            .map(|exp| exp.trim() == outputs[index].trim())
            .unwrap_or(false);
        if !matched {
            *result = false;
        }
    }
    results
}

/// The core algorithm: in-progress check, terminal classification, output
/// segmentation and per-test-case comparison.
pub fn reconcile(
    snapshot: &SandboxStatus,
    eval: &PendingEvaluation,
    expected: Option<&[String]>,
) -> Outcome {
    if is_in_progress(snapshot) {
        return Outcome::Pending;
    }

    let class = classify(&snapshot.status);
    tracing::debug!(class = %class, "classified sandbox status");
    let stdout = snapshot.stdout.clone().unwrap_or_default();
    let mut verdict = Verdict {
        status: snapshot.status.description.clone(),
        error: class != Classification::Accepted,
        time: snapshot.time.clone().unwrap_or_default(),
        memory: snapshot.memory.unwrap_or(0.0),
        stdout: stdout.clone(),
        compile_output: snapshot.compile_output.clone().unwrap_or_default(),
        test_case_result: Vec::new(),
    };

    match class {
        Classification::Accepted => {
            // all cases passed by construction, no per-case diffing
            let count = case_count(eval.flag, segment_stdout(&stdout).len());
            verdict.test_case_result = vec![true; count];
        }
        Classification::WrongAnswer => {
            let outputs = segment_stdout(&stdout);
            let count = case_count(eval.flag, outputs.len());
            verdict.test_case_result = compare(&outputs, expected, count);
        }
        // no meaningful output to compare
        Classification::CompilationError
        | Classification::TimeLimitExceeded
        | Classification::RuntimeError
        | Classification::Unknown => {}
    }

    Outcome::Terminal(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: i64, description: &str, stdout: Option<&str>) -> SandboxStatus {
        SandboxStatus {
            status: StatusField {
                id,
                description: description.to_string(),
            },
            stdout: stdout.map(str::to_string),
            compile_output: None,
            time: Some("0.002".to_string()),
            memory: Some(2048.0),
        }
    }

    fn eval(flag: ExecutionFlag) -> PendingEvaluation {
        PendingEvaluation {
            problem_id: "p1".to_string(),
            user_id: "u1".to_string(),
            code: "print(1)".to_string(),
            language: "python".to_string(),
            problem_title: "two-sum".to_string(),
            flag,
            token: "tok".to_string(),
        }
    }

    fn expected(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn terminal(outcome: Outcome) -> Verdict {
        match outcome {
            Outcome::Terminal(verdict) => verdict,
            Outcome::Pending => panic!("expected a terminal verdict"),
        }
    }

    #[test]
    fn in_progress_labels_yield_pending() {
        for label in &["Processing", "In Queue"] {
            let outcome = reconcile(&snapshot(2, label, None), &eval(ExecutionFlag::Submit), None);
            assert!(matches!(outcome, Outcome::Pending), "label {}", label);
        }
    }

    #[test]
    fn wrong_answer_compares_trimmed_outputs_per_case() {
        let snap = snapshot(4, "Wrong Answer", Some("a\n$$$b\n$$$c\n$$$"));
        let exp = expected(&["a", "b", "d"]);
        let verdict = terminal(reconcile(&snap, &eval(ExecutionFlag::Submit), Some(&exp)));
        assert_eq!(verdict.test_case_result, vec![true, true, false]);
        assert!(verdict.error);
        assert_eq!(verdict.status, "Wrong Answer");
    }

    #[test]
    fn run_flag_caps_results_at_three_cases() {
        let snap = snapshot(4, "Wrong Answer", Some("1$$$2$$$3$$$4$$$5$$$"));
        let exp = expected(&["1", "2", "3", "4", "5"]);
        let verdict = terminal(reconcile(&snap, &eval(ExecutionFlag::Run), Some(&exp)));
        assert_eq!(verdict.test_case_result.len(), 3);
        assert_eq!(verdict.test_case_result, vec![true, true, true]);
    }

    #[test]
    fn run_flag_with_fewer_segments_reports_what_exists() {
        let snap = snapshot(4, "Wrong Answer", Some("1$$$"));
        let exp = expected(&["2"]);
        let verdict = terminal(reconcile(&snap, &eval(ExecutionFlag::Run), Some(&exp)));
        assert_eq!(verdict.test_case_result, vec![false]);
    }

    #[test]
    fn accepted_skips_diffing_and_reports_all_true() {
        let snap = snapshot(3, "Accepted", Some("x\n$$$y\n$$$z\n$$$"));
        // expected outputs deliberately disagree: accepted must not diff
        let exp = expected(&["no", "no", "no"]);
        let verdict = terminal(reconcile(&snap, &eval(ExecutionFlag::Submit), Some(&exp)));
        assert_eq!(verdict.test_case_result, vec![true, true, true]);
        assert!(!verdict.error);
    }

    #[test]
    fn failure_classes_carry_no_result_vector() {
        for (id, label) in &[
            (6, "Compilation Error"),
            (5, "Time Limit Exceeded"),
            (11, "Runtime Error (NZEC)"),
        ] {
            let verdict = terminal(reconcile(
                &snapshot(*id, label, Some("partial$$$")),
                &eval(ExecutionFlag::Submit),
                None,
            ));
            assert!(verdict.test_case_result.is_empty(), "label {}", label);
            assert!(verdict.error, "label {}", label);
            assert_eq!(&verdict.status, label);
        }
    }

    #[test]
    fn mismatched_code_and_label_degrade_to_unknown() {
        // code says accepted, label says otherwise
        assert_eq!(
            classify(&StatusField {
                id: 3,
                description: "Wrong Answer".to_string()
            }),
            Classification::Unknown
        );
        assert_eq!(
            classify(&StatusField {
                id: 99,
                description: "Exec Format Error".to_string()
            }),
            Classification::Unknown
        );
    }

    #[test]
    fn unknown_pairs_report_raw_fields_without_comparison() {
        let snap = snapshot(13, "Internal Error", Some("garbage$$$"));
        let verdict = terminal(reconcile(&snap, &eval(ExecutionFlag::Submit), None));
        assert_eq!(verdict.status, "Internal Error");
        assert_eq!(verdict.stdout, "garbage$$$");
        assert!(verdict.test_case_result.is_empty());
    }

    #[test]
    fn missing_expected_outputs_confirm_nothing() {
        let snap = snapshot(4, "Wrong Answer", Some("a$$$b$$$"));
        let verdict = terminal(reconcile(&snap, &eval(ExecutionFlag::Submit), None));
        assert_eq!(verdict.test_case_result, vec![false, false]);
    }

    #[test]
    fn short_expected_outputs_fail_the_tail_cases() {
        let snap = snapshot(4, "Wrong Answer", Some("a$$$b$$$c$$$"));
        let exp = expected(&["a", "b"]);
        let verdict = terminal(reconcile(&snap, &eval(ExecutionFlag::Submit), Some(&exp)));
        assert_eq!(verdict.test_case_result, vec![true, true, false]);
    }

    #[test]
    fn segmentation_drops_only_a_trailing_empty_element() {
        assert_eq!(segment_stdout("a$$$b$$$"), vec!["a", "b"]);
        assert_eq!(segment_stdout("a$$$b"), vec!["a", "b"]);
        assert_eq!(segment_stdout("a$$$\n"), vec!["a"]);
        assert_eq!(segment_stdout("a$$$$$$b"), vec!["a", "", "b"]);
        assert!(segment_stdout("").is_empty());
    }

    #[test]
    fn reconciliation_is_deterministic_for_a_fixed_snapshot() {
        let snap = snapshot(4, "Wrong Answer", Some("a\n$$$b\n$$$"));
        let exp = expected(&["a", "x"]);
        let first = terminal(reconcile(&snap, &eval(ExecutionFlag::Submit), Some(&exp)));
        let second = terminal(reconcile(&snap, &eval(ExecutionFlag::Submit), Some(&exp)));
        assert_eq!(first, second);
    }
}
