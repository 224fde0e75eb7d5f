use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use scriptcs_runner_lib::executor::ConsoleSink;
use scriptcs_runner_lib::{
    check_name, logging, Context, Executor, ExitCode, GlobalSettings, RunContext, StepConfig,
    DISPLAY_NAME,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scriptcs-runner")]
#[command(about = "ScriptCS Runner: runs a ScriptCS script as a CI build step")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the global settings file
    #[arg(long, global = true, env = "SCRIPTCS_RUNNER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors on stderr
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one build step
    Run {
        /// Path to the script file to run
        #[arg(long)]
        script_file: Option<String>,

        /// Argument string passed to the script after `--`
        #[arg(long, allow_hyphen_values = true)]
        arguments: Option<String>,

        /// Inline script body; takes precedence over --script-file
        #[arg(long)]
        custom_script: Option<String>,

        /// Job file holding the step configuration (TOML)
        #[arg(long)]
        job: Option<PathBuf>,

        /// Module root to run in (defaults to the current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Show what would be executed without running
        #[arg(long)]
        dry_run: bool,
    },

    /// Save the path to the ScriptCS executable
    Configure {
        /// Path to the ScriptCS executable
        #[arg(long)]
        exe: String,
    },

    /// Show the global settings in effect
    Settings,

    /// Check a name field the way the settings form does
    CheckName {
        value: String,
    },

    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code.into()),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(ExitCode::InternalError.into());
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(logging::level_for(cli.verbose, cli.quiet));

    match cli.command {
        Commands::Run {
            script_file,
            arguments,
            custom_script,
            job,
            cwd,
            dry_run,
        } => {
            let context = Context::new(cli.settings)?;
            let step = step_config(job, script_file, arguments, custom_script)?;
            handle_run(&context, &step, cwd, dry_run).await
        }
        Commands::Configure { exe } => {
            let mut context = Context::new(cli.settings)?;
            handle_configure(&mut context, &exe)
        }
        Commands::Settings => {
            let context = Context::new(cli.settings)?;
            handle_settings(&context)
        }
        Commands::CheckName { value } => handle_check_name(&value),
        Commands::Completions { shell } => handle_completions(shell),
    }
}

/// Job file first, then any flags given on the command line.
fn step_config(
    job: Option<PathBuf>,
    script_file: Option<String>,
    arguments: Option<String>,
    custom_script: Option<String>,
) -> Result<StepConfig> {
    let mut step = match job {
        Some(path) => StepConfig::load_from_file(&path)?,
        None => StepConfig::default(),
    };

    if let Some(script_file) = script_file {
        step.script_file = script_file;
    }
    if let Some(arguments) = arguments {
        step.arguments = arguments;
    }
    if let Some(custom_script) = custom_script {
        step.custom_script = custom_script;
    }

    Ok(step)
}

async fn handle_run(
    context: &Context,
    step: &StepConfig,
    cwd: Option<PathBuf>,
    dry_run: bool,
) -> Result<ExitCode> {
    let settings = context.settings.get();
    if settings.executable().is_none() {
        eprintln!(
            "No ScriptCS executable configured. Run 'scriptcs-runner configure --exe <path>' \
             or set SCRIPTCS_EXE."
        );
        return Ok(ExitCode::ConfigError);
    }

    let mut ctx = RunContext::from_env(Arc::new(ConsoleSink))
        .context("failed to read the current directory")?;
    if let Some(cwd) = cwd {
        ctx = ctx.with_working_dir(cwd);
    }

    tracing::info!(step = DISPLAY_NAME, cwd = %ctx.working_dir().display(), "running build step");

    let executor = Executor::default().dry_run(dry_run);
    let passed = executor.execute(step, &settings, &ctx).await;

    Ok(ExitCode::from_outcome(passed))
}

fn handle_configure(context: &mut Context, exe: &str) -> Result<ExitCode> {
    context.settings.save(GlobalSettings::new(exe))?;
    println!("Saved ScriptCS executable: {exe}");
    println!("Settings file: {}", context.settings.path().display());
    Ok(ExitCode::Success)
}

fn handle_settings(context: &Context) -> Result<ExitCode> {
    let settings = context.settings.get();
    println!("Settings file: {}", context.settings.path().display());
    println!(
        "ScriptCS executable: {}",
        settings.executable().unwrap_or("(not configured)")
    );
    Ok(ExitCode::Success)
}

fn handle_check_name(value: &str) -> Result<ExitCode> {
    let outcome = check_name(value);
    println!("{outcome}");
    if outcome.is_error() {
        Ok(ExitCode::CliUsageError)
    } else {
        Ok(ExitCode::Success)
    }
}

fn handle_completions(shell: Shell) -> Result<ExitCode> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(ExitCode::Success)
}
