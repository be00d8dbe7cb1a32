use std::{env, fmt, process::ExitCode};

use chrono::Utc;
use colored::Colorize;
use rl_budget_core::{
    client::compose_api,
    config::{Config, ConfigManager, ServiceMode},
    core::{services::SuggestionService, DashboardSession},
    currency::CurrencyFormatter,
    errors::{BudgetError, Result},
    ledger::{Category, Decision, ModelType, TransactionQuery},
    utils::formatters::{
        capitalize, format_date, format_percent, format_short_month, format_signed_points,
        relative_time,
    },
};

const USAGE: &str = "\
usage: rl_budget_cli [--fixture] <command>

commands:
  summary                   spend and savings for the current period
  suggest [dqn|q_learning]  request an allocation suggestion
  accept                    accept the active suggestion
  reject                    reject the active suggestion
  transactions [category]   list transactions, optionally for one category
  history                   past periods and their savings rates";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Summary,
    Suggest(Option<ModelType>),
    Decide(Decision),
    Transactions(Option<Category>),
    History,
}

struct Invocation {
    fixture: bool,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut fixture = false;
    let mut rest = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--fixture" => fixture = true,
            _ => rest.push(arg.as_str()),
        }
    }

    let command = match rest.as_slice() {
        ["summary"] => Command::Summary,
        ["suggest"] => Command::Suggest(None),
        ["suggest", model] => Command::Suggest(Some(parse_model(model)?)),
        ["accept"] => Command::Decide(Decision::Accepted),
        ["reject"] => Command::Decide(Decision::Rejected),
        ["transactions"] => Command::Transactions(None),
        ["transactions", category] => Command::Transactions(Some(category.parse()?)),
        ["history"] => Command::History,
        _ => return Err(BudgetError::InvalidInput(USAGE.to_string())),
    };
    Ok(Invocation { fixture, command })
}

fn parse_model(raw: &str) -> Result<ModelType> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "dqn" => Ok(ModelType::Dqn),
        "q_learning" | "q-learning" | "qlearning" => Ok(ModelType::QLearning),
        other => Err(BudgetError::InvalidInput(format!("unknown model `{}`", other))),
    }
}

fn header(title: impl fmt::Display) {
    println!("\n{}", format!("=== {} ===", title).bold());
}

fn detail(label: &str, value: impl fmt::Display) {
    println!("  {:<18} {}", label.dimmed(), value);
}

fn success(message: impl fmt::Display) {
    println!("{}", format!("[✓] {}", message).green());
}

fn load_config(fixture: bool) -> Result<Config> {
    let mut config = ConfigManager::from_env()?.resolve()?;
    if fixture {
        config.service_mode = ServiceMode::Fixture;
    }
    Ok(config)
}

async fn run(invocation: Invocation) -> Result<()> {
    let config = load_config(invocation.fixture)?;
    let money = config.currency_formatter();
    let api = compose_api(&config)?;
    let session = DashboardSession::from_config(api, &config);
    session.bootstrap().await?;

    match invocation.command {
        Command::Summary => print_summary(&session, &money),
        Command::Suggest(model) => {
            let model = model.unwrap_or(config.default_model_type);
            session.request_suggestion(model).await?;
            print_suggestion(&session, &money);
        }
        Command::Decide(decision) => {
            let event = session.decide(decision).await?;
            success(format!("suggestion {} {}", event.suggestion_id, event.decision));
            if decision == Decision::Accepted {
                print_summary(&session, &money);
            }
        }
        Command::Transactions(category) => {
            let query = match category {
                Some(category) => TransactionQuery::category(category),
                None => TransactionQuery::default(),
            };
            let listing = session.refresh_transactions(query).await?.unwrap_or_default();
            header(format!("Transactions ({})", listing.len()));
            let now = Utc::now();
            for txn in &listing {
                println!(
                    "  {:<12} {:<15} {:>12}  {}  {}",
                    format_date(txn.occurred_at),
                    txn.category.label(),
                    money.format(txn.amount).red(),
                    txn.description,
                    format!("(added {})", relative_time(txn.created_at, now)).dimmed()
                );
            }
        }
        Command::History => {
            let state = session.snapshot();
            header("History");
            for entry in state.history.entries() {
                println!(
                    "  {:<10} income {:>10}  savings {:>7}  {:?}",
                    format_short_month(entry.period_start),
                    money.format(entry.income),
                    format_percent(entry.savings_rate, 1),
                    entry.source
                );
            }
            if let Some(average) = state.history.average_savings_rate() {
                detail("average savings", format_percent(average, 1));
            }
        }
    }
    session.flush_feedback().await;
    Ok(())
}

fn print_summary(session: &DashboardSession, money: &CurrencyFormatter) {
    let state = session.snapshot();
    let summary = &state.summary;
    header(format!(
        "{} to {} ({} data)",
        format_date(summary.period.start),
        format_date(summary.period.end),
        capitalize(&state.origin.to_string())
    ));
    detail("income", money.format(summary.income));
    detail("spent", money.format(summary.total_spent));
    detail("remaining", money.format(summary.remaining_income()));
    let rate = format_percent(summary.display_savings_rate(), 1);
    if summary.savings_rate < 0.0 {
        detail("savings rate", rate.red());
    } else {
        detail("savings rate", rate.green());
    }
    for category in Category::spending() {
        let spend = summary.category(category);
        let line = format!("{} of {}", money.format(spend.spent), money.format(spend.budget));
        if spend.is_over_budget() {
            detail(category.label(), line.red());
        } else {
            detail(category.label(), line);
        }
    }
}

fn print_suggestion(session: &DashboardSession, money: &CurrencyFormatter) {
    let state = session.snapshot();
    let Some(suggestion) = &state.suggestion else {
        println!("{}", "[!] no suggestion available".yellow());
        return;
    };
    header(format!("Suggestion ({})", suggestion.model_type.label()));
    for (category, delta) in suggestion.delta_allocation.iter() {
        let current = suggestion.current_allocation[category];
        let suggested = suggestion.suggested_allocation[category];
        let change = format_signed_points(delta, 1);
        let change = if delta > 0.0 {
            change.green()
        } else if delta < 0.0 {
            change.red()
        } else {
            change.normal()
        };
        detail(
            category.label(),
            format!("{:>5.1}% -> {:>5.1}%  {}", current, suggested, change),
        );
    }
    let metrics = SuggestionService::metrics(suggestion, state.income);
    detail("confidence", format_percent(suggestion.confidence, 0));
    detail("projected gain", money.format(metrics.projected_savings_gain));
    println!("\n  {}", suggestion.reasoning.italic());
}

fn main() -> ExitCode {
    rl_budget_core::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("{}", err.to_string().red());
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("{}", format!("failed to start runtime: {}", err).red());
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(run(invocation)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format!("[x] {}", err).red());
            ExitCode::FAILURE
        }
    }
}
