//! `mentor` command line entry point

mod cli;
mod logging;
mod sources;

use anyhow::Context as _;
use clap::ArgMatches;
use mentor_catalog::MentorCatalog;
use mentor_core::{
    build_generator, AdviceCommand, BatchKind, BatchOrchestrator, BatchRunResult, FeedbackCommand,
    GenerationOutcome, GenerationPipeline, GoalCommand, MentorConfig, UserId,
};
use sources::{JsonFileUserSource, JsonLinesSink};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    logging::init(matches.get_flag("log-json"));

    match run(&matches).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every requested result succeeded
async fn run(matches: &ArgMatches) -> anyhow::Result<bool> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => MentorConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MentorConfig::default(),
    };
    let json = matches.get_flag("json");

    let generator = build_generator(&config.generator)?;
    let pipeline = Arc::new(GenerationPipeline::new(generator, config.pipeline.clone()));

    match matches.subcommand() {
        Some(("mentors", _)) => {
            list_mentors(json)?;
            Ok(true)
        }
        Some(("advice", args)) => {
            let command = AdviceCommand {
                user_id: user_id(args),
                mentor: string(args, "mentor"),
                intimacy: string(args, "intimacy"),
                recent_todos: strings(args, "todo"),
                retrospects: strings(args, "retrospect"),
            };
            print_outcome(&pipeline.generate_advice(command).await, json)
        }
        Some(("goal", args)) => {
            let command = GoalCommand {
                user_id: user_id(args),
                mentor: string(args, "mentor"),
                intimacy: string(args, "intimacy"),
                past_todos: strings(args, "todo"),
                past_retrospects: strings(args, "retrospect"),
                overall_goal: args.get_one::<String>("overall-goal").cloned(),
            };
            print_outcome(&pipeline.generate_goal(command).await, json)
        }
        Some(("feedback", args)) => {
            let command = FeedbackCommand {
                user_id: user_id(args),
                mentor: string(args, "mentor"),
                intimacy: string(args, "intimacy"),
                retrospect: string(args, "text"),
            };
            print_outcome(&pipeline.generate_feedback(command).await, json)
        }
        Some(("batch", args)) => {
            let mut batch_config = config.batch.clone();
            if let Some(kind) = args.get_one::<String>("kind") {
                batch_config.kind = match kind.as_str() {
                    "goal" => BatchKind::Goal,
                    _ => BatchKind::Advice,
                };
            }
            if let Some(max) = args.get_one::<usize>("concurrency") {
                anyhow::ensure!(*max > 0, "--concurrency must be at least 1");
                batch_config.max_concurrency = *max;
            }

            let users_path = args
                .get_one::<PathBuf>("users")
                .context("--users is required")?;
            let mut orchestrator = BatchOrchestrator::new(
                pipeline,
                Arc::new(JsonFileUserSource::new(users_path)),
                batch_config,
            );
            if let Some(output) = args.get_one::<PathBuf>("output") {
                let sink = JsonLinesSink::create(output)
                    .with_context(|| format!("opening {}", output.display()))?;
                orchestrator = orchestrator.with_sink(Arc::new(sink));
            }

            let result = orchestrator.run_for_active_users().await;
            print_batch(&result, json)?;
            Ok(result.failure_count == 0)
        }
        _ => anyhow::bail!("no subcommand given"),
    }
}

fn user_id(args: &ArgMatches) -> UserId {
    UserId::new(string(args, "user"))
}

fn string(args: &ArgMatches, id: &str) -> String {
    args.get_one::<String>(id).cloned().unwrap_or_default()
}

fn strings(args: &ArgMatches, id: &str) -> Vec<String> {
    args.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn list_mentors(json: bool) -> anyhow::Result<()> {
    if json {
        let profiles: Vec<_> = MentorCatalog::all().collect();
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }
    for profile in MentorCatalog::all() {
        println!(
            "{:<8} {:<12} {}",
            profile.id.as_str(),
            profile.display_name,
            profile.description
        );
    }
    Ok(())
}

fn print_outcome(outcome: &GenerationOutcome, json: bool) -> anyhow::Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", outcome.text);
        if let Some(error) = &outcome.error {
            eprintln!("(fallback after {} attempts: {error})", outcome.attempts);
        }
    }
    Ok(outcome.success)
}

fn print_batch(result: &BatchRunResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("Batch Report ({})", result.kind.content_kind());
    println!("  Users: {}", result.total_users);
    println!("  Succeeded: {}", result.success_count);
    println!("  Failed: {}", result.failure_count);
    println!("  Total Time: {}ms", result.total_execution_time_ms);
    println!("  Average Time: {:.1}ms", result.average_execution_time_ms);

    let mut failed: Vec<_> = result
        .results
        .iter()
        .filter(|(_, outcome)| !outcome.success())
        .collect();
    failed.sort_by(|a, b| a.0.cmp(b.0));
    for (user_id, outcome) in failed {
        println!(
            "  ! {user_id}: {}",
            outcome.outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
