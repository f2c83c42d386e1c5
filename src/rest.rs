//! Polling REST api

use anyhow::Context;
use eval_cache::EvalCache;
use futures::future::FutureExt;
use ledger::{Ledger, LedgerError, SubmissionRecord};
use poll_api::evaluation::{ExecutionFlag, PendingEvaluation};
use poll_api::rest::{
    CreateEvaluationRequest, CreateEvaluationResponse, PollRequest, PollResponse,
};
use poll_api::verdict::Verdict;
use sandbox_client::SandboxError;
use std::{convert::Infallible, sync::Arc, time::Duration};
use uuid::Uuid;
use warp::Filter;

pub struct RestConfig {
    pub port: u16,
}

/// Shared collaborators of the polling endpoint. The cache is the only
/// mutable resource on the hot path; no lock is held across the sandbox
/// round trip.
pub struct State {
    pub cache: EvalCache,
    pub sandbox: sandbox_client::Client,
    pub outputs: output_store::Store,
    pub ledger: Ledger,
}

/// One poll cycle for a single evaluation. Every failure mode maps into the
/// response envelope; nothing propagates past this boundary.
#[tracing::instrument(skip(state, req), fields(unique_id = %req.unique_id))]
pub async fn poll(state: Arc<State>, req: PollRequest) -> PollResponse {
    // absent, expired and undecodable entries are all the same to the client
    let eval = match state.cache.get(&req.unique_id).await {
        Some(eval) => eval,
        None => return PollResponse::failure(400, "Invalid uniqueId"),
    };

    let snapshot = match state.sandbox.fetch_status(&eval.token).await {
        Ok(snapshot) => snapshot,
        Err(err @ SandboxError::Unavailable(_)) => {
            tracing::warn!(err = %format_args!("{:#}", anyhow::Error::new(err)), "sandbox poll failed");
            return PollResponse::failure(502, "Sandbox unavailable, retry later");
        }
        Err(err @ SandboxError::Malformed(_)) => {
            tracing::warn!(err = %format_args!("{:#}", anyhow::Error::new(err)), "sandbox poll failed");
            return PollResponse::failure(502, "Sandbox returned an unexpected response, retry later");
        }
    };

    if reconciler::is_in_progress(&snapshot) {
        return PollResponse::verdict("Successfully polled the evaluation", Verdict::pending());
    }

    let expected = state.outputs.expected(&eval.problem_title).await;
    let verdict = match reconciler::reconcile(&snapshot, &eval, expected.as_deref()) {
        reconciler::Outcome::Pending => {
            return PollResponse::verdict("Successfully polled the evaluation", Verdict::pending());
        }
        reconciler::Outcome::Terminal(verdict) => verdict,
    };

    let mut message = "Successfully fetched the evaluation result";
    if eval.flag == ExecutionFlag::Submit && state.cache.mark_finalized(&req.unique_id).await {
        if let Err(err) = persist(&state, &eval, &verdict).await {
            // the verdict stands; losing a history row is tolerated
            tracing::error!(err = %format_args!("{:#}", anyhow::Error::new(err)), "ledger write failed");
            message = "Verdict computed, but recording the submission failed";
        }
    }

    PollResponse::verdict(message, verdict)
}

async fn persist(
    state: &State,
    eval: &PendingEvaluation,
    verdict: &Verdict,
) -> Result<(), LedgerError> {
    let record = SubmissionRecord {
        id: Uuid::new_v4().to_hyphenated().to_string(),
        problem_id: eval.problem_id.clone(),
        user_id: eval.user_id.clone(),
        code: eval.code.clone(),
        language: eval.language.clone(),
        problem_title: eval.problem_title.clone(),
        status: verdict.status.clone(),
        time: verdict.time.clone(),
        memory: verdict.memory,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state.ledger.record(&record).await
}

/// Creates an evaluation: submits the code to the sandbox and caches the
/// pending state under a fresh unique id.
#[tracing::instrument(skip(state, req), fields(problem = %req.problem_title))]
pub async fn create_evaluation(
    state: Arc<State>,
    req: CreateEvaluationRequest,
) -> CreateEvaluationResponse {
    let code = match String::from_utf8(req.code.0) {
        Ok(code) => code,
        Err(_) => return creation_failure(400, "code must be valid UTF-8"),
    };

    let token = match state.sandbox.submit(&code, req.language_id).await {
        Ok(token) => token,
        Err(err) => {
            tracing::warn!(err = %format_args!("{:#}", anyhow::Error::new(err)), "sandbox submit failed");
            return creation_failure(502, "Sandbox unavailable, retry later");
        }
    };

    let eval = PendingEvaluation {
        problem_id: req.problem_id,
        user_id: req.user_id,
        code,
        language: req.language,
        problem_title: req.problem_title,
        flag: req.flag,
        token,
    };
    let unique_id = Uuid::new_v4().to_hyphenated().to_string();
    if let Err(err) = state.cache.put(&unique_id, &eval).await {
        tracing::error!(%err, "failed to cache evaluation");
        return creation_failure(500, "Failed to store evaluation state");
    }

    CreateEvaluationResponse {
        success: true,
        message: "Evaluation created".to_string(),
        status: 200,
        unique_id: Some(unique_id),
    }
}

fn creation_failure(status: u16, message: &str) -> CreateEvaluationResponse {
    CreateEvaluationResponse {
        success: false,
        message: message.to_string(),
        status,
        unique_id: None,
    }
}

async fn submissions_for_user(state: Arc<State>, user_id: String) -> warp::reply::Json {
    match state.ledger.for_user(&user_id).await {
        Ok(records) => warp::reply::json(&records),
        Err(err) => {
            tracing::error!(err = %format_args!("{:#}", anyhow::Error::new(err)), "ledger read failed");
            warp::reply::json(&serde_json::json!({
                "success": false,
                "message": "Failed to read submissions",
                "status": 500,
            }))
        }
    }
}

/// Serves api
#[tracing::instrument(skip(cfg, state))]
pub async fn serve(cfg: RestConfig, state: Arc<State>) -> anyhow::Result<()> {
    let sweeper_state = state.clone();
    tokio::task::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            sweeper_state.cache.sweep().await;
        }
    });

    let state2 = state.clone();
    let route_poll = warp::post()
        .and(warp::path("poll"))
        .and(warp::path::end())
        .and(warp::filters::body::json())
        .and_then(move |req| poll(state2.clone(), req).map(Result::<_, Infallible>::Ok))
        .map(|resp| warp::reply::json(&resp))
        .boxed();

    let state2 = state.clone();
    let route_create = warp::post()
        .and(warp::path("evaluations"))
        .and(warp::path::end())
        .and(warp::filters::body::json())
        .and_then(move |req| create_evaluation(state2.clone(), req).map(Result::<_, Infallible>::Ok))
        .map(|resp| warp::reply::json(&resp))
        .boxed();

    let route_submissions = warp::get()
        .and(warp::path("submissions"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and_then(move |user_id| {
            submissions_for_user(state.clone(), user_id).map(Result::<_, Infallible>::Ok)
        })
        .boxed();

    let routes = route_poll.or(route_create).or(route_submissions);

    let server = warp::serve(routes.with(warp::filters::trace::request()));

    let srv = server
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], cfg.port), futures::future::pending())
        .context("failed to bind")?
        .1;
    srv.await;
    Ok(())
}
