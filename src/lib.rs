//! Submission-judging orchestrator: polls the execution sandbox for
//! in-flight evaluations, reconciles verdicts against expected outputs and
//! records finalized submissions.

pub mod rest;
