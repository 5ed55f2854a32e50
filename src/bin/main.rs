use clap::{Parser, Subcommand};
use financial_research_agent::{
    agent::GroqAgent,
    config::Config,
    research::{run_research, ResearchOptions},
    tables::{render_collection, ExtractOptions, TableExtractor, TableView},
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tables", about = "Extract markdown tables from financial research answers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract tables from a markdown file (stdin when omitted)
    Extract {
        file: Option<PathBuf>,
        /// Keep a table that runs to the end of the document
        #[arg(long)]
        flush_trailing: bool,
        /// Write one CSV per table into this directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Print the extracted tables as JSON instead of grids
        #[arg(long)]
        json: bool,
    },
    /// Ask the research agent team and print its answer and tables
    Ask {
        query: String,
        /// Print the raw agent response before the tables
        #[arg(long)]
        raw: bool,
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Extract {
            file,
            flush_trailing,
            out_dir,
            json,
        } => {
            let markdown = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let options = ExtractOptions {
                flush_trailing_region: flush_trailing || config.flush_trailing_tables,
            };
            let extraction = TableExtractor::new(options).extract(&markdown);

            for warning in &extraction.warnings {
                warn!("line {}: {}", warning.line, warning.message);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&extraction)?);
                return Ok(());
            }

            match render_collection(&extraction.tables)? {
                Some(view) => print_view(&view, out_dir.as_deref())?,
                None => println!("No tables found."),
            }
        }

        Commands::Ask { query, raw, out_dir } => {
            let agent = GroqAgent::new(&config)?;
            let options = ResearchOptions {
                show_raw_response: raw,
                extract: ExtractOptions {
                    flush_trailing_region: config.flush_trailing_tables,
                },
                ..ResearchOptions::default()
            };

            let report =
                run_research(&agent, config.groq_api_key.as_deref(), &query, &options).await?;

            if let Some(raw) = &report.raw_response {
                println!("=== RAW RESPONSE ===\n{}\n", raw);
            }
            println!("=== ANALYSIS RESULTS ===\n{}", report.content);

            if let Some(view) = &report.tables {
                println!("\n=== DATA TABLES ===");
                print_view(view, out_dir.as_deref())?;
            }
        }
    }

    Ok(())
}

fn print_view(view: &TableView, out_dir: Option<&Path>) -> std::io::Result<()> {
    print!("{}", view);

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)?;
        for section in &view.sections {
            let path = dir.join(&section.export.file_name);
            std::fs::write(&path, &section.export.bytes)?;
            info!("Wrote {}", path.display());
        }
    }
    Ok(())
}
