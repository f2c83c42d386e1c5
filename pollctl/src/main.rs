use anyhow::Context;
use clap::Parser;
use poll_api::evaluation::ExecutionFlag;
use poll_api::rest::{
    ByteString, CreateEvaluationRequest, CreateEvaluationResponse, PollRequest, PollResponse,
};
use std::{path::PathBuf, time::Duration};

/// Command-line client for the arbiter polling API
#[derive(Parser)]
struct Args {
    /// Problem id
    #[clap(long, short = 'p')]
    problem: String,
    /// User id to attribute the submission to
    #[clap(long, short = 'u')]
    user: String,
    /// Problem title, used to look up expected outputs
    #[clap(long)]
    title: String,
    /// Language name, e.g. python
    #[clap(long, short = 'l')]
    language: String,
    /// Language id understood by the sandbox
    #[clap(long)]
    language_id: u32,
    /// Path to the source file
    #[clap(long, short = 's')]
    source: PathBuf,
    /// Submit for grading instead of running sample cases
    #[clap(long)]
    submit: bool,
    /// Arbiter API endpoint, e.g. http://localhost:1789
    #[clap(long, short = 'a')]
    api: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    let source = tokio::fs::read(&args.source)
        .await
        .context("failed to read source file")?;
    let req = CreateEvaluationRequest {
        problem_id: args.problem.clone(),
        user_id: args.user.clone(),
        code: ByteString(source),
        language: args.language.clone(),
        language_id: args.language_id,
        problem_title: args.title.clone(),
        flag: if args.submit {
            ExecutionFlag::Submit
        } else {
            ExecutionFlag::Run
        },
    };
    let client = reqwest::Client::new();
    let created: CreateEvaluationResponse = client
        .post(format!("{}/evaluations", args.api))
        .json(&req)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    if !created.success {
        anyhow::bail!("evaluation was not created: {}", created.message);
    }
    let unique_id = created.unique_id.context("response carried no uniqueId")?;
    println!("Created, unique id: {}", unique_id);

    loop {
        tokio::time::sleep(Duration::from_secs(3)).await;
        let resp: PollResponse = client
            .post(format!("{}/poll", args.api))
            .json(&PollRequest {
                unique_id: unique_id.clone(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !resp.success {
            anyhow::bail!("poll failed: {}", resp.message);
        }
        let verdict = match resp.data {
            Some(verdict) => verdict,
            None => continue,
        };
        if verdict.is_pending() {
            println!("Still running");
            continue;
        }
        println!("Verdict: {}", verdict.status);
        if !verdict.time.is_empty() {
            println!("Time: {}s, memory: {} KB", verdict.time, verdict.memory);
        }
        for (index, passed) in verdict.test_case_result.iter().enumerate() {
            println!(
                "Test case {}: {}",
                index + 1,
                if *passed { "passed" } else { "failed" }
            );
        }
        if !verdict.compile_output.is_empty() {
            println!("Compiler output:\n{}", verdict.compile_output);
        }
        break;
    }
    Ok(())
}
