mod logic;
mod scenario;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use checklist_core::{ChecklistFixture, DisplayMode};
use logic::{ChecklistSnapshot, ChecklistView, LogicTester, ScenarioResult, take_snapshot};
use scenario::{expand_scenarios, get_scenario, list_scenarios};
use util::{load_fixture, split_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayArg {
    /// Experiments available right now
    Current,
    /// Experiments the active vessel can perform anywhere
    Vessel,
    /// Every unlocked experiment
    Unlocked,
    /// Everything the reference data allows
    All,
}

impl From<DisplayArg> for DisplayMode {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Current => Self::CurrentSituation,
            DisplayArg::Vessel => Self::ActiveVessel,
            DisplayArg::Unlocked => Self::Unlocked,
            DisplayArg::All => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "checklist-tester", version)]
#[command(about = "Science checklist QA - consistency scenarios and checklist reports")]
struct Args {
    /// Fixture JSON (catalog, progress, vessel); defaults to the bundled stock system
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Which experiments to list
    #[arg(long, value_enum, default_value_t = DisplayArg::Unlocked)]
    display: DisplayArg,

    /// Search text: space-separated terms, `|` alternatives, `-` negation
    #[arg(long, default_value = "")]
    query: String,

    /// Leave complete experiments out of the list
    #[arg(long)]
    hide_complete: bool,

    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let start_time = Instant::now();
    let fixture = load_fixture(args.fixture.as_deref())?;
    let view = ChecklistView {
        display_mode: args.display.into(),
        query: args.query.clone(),
        hide_complete: args.hide_complete,
    };
    let snapshot = take_snapshot(&fixture, &view)?;
    let results = run_scenarios(&args, &fixture);

    write_reports(&args, &snapshot, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🔭 Science Checklist Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn run_scenarios(args: &Args, fixture: &ChecklistFixture) -> Vec<ScenarioResult> {
    let tester = LogicTester::new(fixture, args.verbose);
    let mut results = Vec::new();
    for name in expand_scenarios(split_csv(&args.scenarios)) {
        match get_scenario(&name) {
            Some(scenario) => results.push(tester.run_scenario(&scenario)),
            None => eprintln!("⚠️  Unknown scenario: {}", name.yellow()),
        }
    }
    results
}

fn write_reports(
    args: &Args,
    snapshot: &ChecklistSnapshot,
    results: &[ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(&mut output_target, snapshot, results)?;
        }
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, snapshot, results)?;
        }
        ReportFormat::Console => {
            logic::reports::generate_console_report(
                &mut output_target,
                snapshot,
                results,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
