//! Command line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn mentor_arg() -> Arg {
    Arg::new("mentor")
        .long("mentor")
        .default_value("sage")
        .help("Mentor persona: sage, coach or friend")
}

fn intimacy_arg() -> Arg {
    Arg::new("intimacy")
        .long("intimacy")
        .default_value("low")
        .help("Intimacy level: low, medium or high")
}

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .default_value("cli")
        .help("User id attached to the request")
}

fn todo_arg() -> Arg {
    Arg::new("todo")
        .long("todo")
        .action(ArgAction::Append)
        .help("Recent todo (repeatable)")
}

fn retrospect_arg() -> Arg {
    Arg::new("retrospect")
        .long("retrospect")
        .action(ArgAction::Append)
        .help("Recent retrospect (repeatable)")
}

pub(crate) fn command() -> Command {
    Command::new("mentor")
        .version(mentor_core::VERSION)
        .about("Persona-driven advice, goals and retrospect feedback")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(Command::new("mentors").about("List available mentors"))
        .subcommand(
            Command::new("advice")
                .about("Generate daily advice")
                .arg(user_arg())
                .arg(mentor_arg())
                .arg(intimacy_arg())
                .arg(todo_arg())
                .arg(retrospect_arg()),
        )
        .subcommand(
            Command::new("goal")
                .about("Generate a weekly goal")
                .arg(user_arg())
                .arg(mentor_arg())
                .arg(intimacy_arg())
                .arg(todo_arg())
                .arg(retrospect_arg())
                .arg(
                    Arg::new("overall-goal")
                        .long("overall-goal")
                        .help("Long-term goal to steer toward"),
                ),
        )
        .subcommand(
            Command::new("feedback")
                .about("Generate KEEP / PROBLEM / TRY feedback on a retrospect")
                .arg(user_arg())
                .arg(mentor_arg())
                .arg(intimacy_arg())
                .arg(
                    Arg::new("text")
                        .long("text")
                        .required(true)
                        .help("Retrospect to review"),
                ),
        )
        .subcommand(
            Command::new("batch")
                .about("Run generation for every user in a file")
                .arg(
                    Arg::new("users")
                        .long("users")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of user records"),
                )
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .value_parser(["advice", "goal"])
                        .help("Content to generate (overrides config)"),
                )
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .value_parser(value_parser!(usize))
                        .help("Maximum concurrent users (overrides config)"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Append saved results as JSON lines to this file"),
                ),
        )
}
