use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tapestry_dom::{Document, inner_html, set_inner_html};
use tapestry_editor_core::{EditArea, EditorConfig, NullHost, sanitize};
use tracing_subscriber::EnvFilter;

mod script;

use script::Script;

#[derive(Parser)]
#[command(version, about = "Tapestry - HTML editing engine harness", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor settings (.toml or .json)
    #[arg(long, global = true, env = "TAPESTRY_CONFIG")]
    config: Option<PathBuf>,

    /// More log output; repeat for more. RUST_LOG overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load HTML into an editor and print the text field form
    Format {
        /// HTML file, or - for stdin
        input: PathBuf,
    },
    /// Strip everything outside the paste allow-list
    Sanitize {
        /// HTML file, or - for stdin
        input: PathBuf,
    },
    /// Replay a command script against an editor and print the result
    Run {
        /// HTML file, or - for stdin
        input: PathBuf,

        /// Script with one action per line
        script: PathBuf,

        /// Print the text field form instead of the live markup
        #[arg(long)]
        source: bool,
    },
}

fn main() -> Result<()> {
    init_miette()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Format { input } => {
            let html = read_input(&input)?;
            let mut area = EditArea::with_host(&html, NullHost, config);
            area.before_submit();
            println!("{}", area.text_area_value().trim_end());
        }
        Commands::Sanitize { input } => {
            let html = read_input(&input)?;
            let mut doc = Document::new();
            let root = doc.root();
            set_inner_html(&mut doc, root, &html);
            sanitize(&mut doc, root);
            println!("{}", inner_html(&doc, root));
        }
        Commands::Run {
            input,
            script,
            source,
        } => {
            let html = read_input(&input)?;
            let text = std::fs::read_to_string(&script)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading script {}", script.display()))?;
            let script = Script::parse(&script.display().to_string(), text)?;
            let mut area = EditArea::with_host(&html, NullHost, config);
            script.run(&mut area)?;
            if source {
                area.before_submit();
                println!("{}", area.text_area_value().trim_end());
            } else {
                println!("{}", area.html());
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut html = String::new();
        std::io::stdin()
            .read_to_string(&mut html)
            .into_diagnostic()
            .wrap_err("reading stdin")?;
        return Ok(html);
    }
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(2)
                .tab_width(2)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}
