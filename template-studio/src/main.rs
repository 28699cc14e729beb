//! # Template Studio CLI
//!
//! Headless front end for the template studio: export documents, fill them
//! with report data and manage templates in the remote store.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use template_core::LayoutPreset;
use template_renderer::ExportFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use template_studio::{NoticeLevel, StudioConfig, TemplateStudio};

#[derive(Parser)]
#[command(name = "template-studio")]
#[command(author, version, about = "Design, fill and export report templates", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: StudioConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a document to PDF, PNG or SVG
    Export {
        /// Document JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (default: template.<format>)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format; inferred from the output extension when omitted
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<ExportFormat>,

        /// Page to render for PNG and SVG (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Fill every page with report data before exporting
        #[arg(long)]
        mock: bool,
    },

    /// Fill a document with report data
    Autofill {
        /// Document JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Where to write the filled document
        #[arg(value_name = "FILE")]
        output: PathBuf,
    },

    /// Create a new document with a header and text block in every cell
    New {
        /// Where to write the document
        #[arg(value_name = "FILE")]
        output: PathBuf,

        /// Layout JSON, e.g. '{"cells":[["A","A"],["B","C"]]}'
        #[arg(long, value_name = "JSON")]
        layout: Option<String>,

        /// Built-in layout, e.g. two-columns, grid-2x2, sidebar-left
        #[arg(long, value_name = "PRESET", conflicts_with = "layout")]
        preset: Option<LayoutPreset>,

        /// Number of pages
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Manage templates in the remote store
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },
}

#[derive(Subcommand)]
enum RemoteCommands {
    /// List stored templates
    List,
    /// Download a template
    Get {
        /// Template id
        id: String,
        /// Where to write the document
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Upload a document under a name
    Save {
        /// Template name
        name: String,
        /// Document JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Delete a stored template
    Delete {
        /// Template id
        id: String,
    },
    /// Check that the store is reachable
    Check,
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: warn,template_studio=info).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,template_studio=info,template_renderer=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn read_document(studio: &mut TemplateStudio, path: &Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    studio
        .import_document(&json)
        .with_context(|| format!("Failed to import {}", path.display()))
}

fn write_document(studio: &mut TemplateStudio, path: &Path) -> anyhow::Result<()> {
    let json = studio.export_document_json()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn print_notices(studio: &mut TemplateStudio) {
    for notice in studio.drain_notices() {
        match notice.level {
            NoticeLevel::Info => println!("{}: {}", notice.title, notice.message),
            NoticeLevel::Warning | NoticeLevel::Error => {
                eprintln!("{}: {}", notice.title, notice.message);
            }
        }
    }
}

async fn run(studio: &mut TemplateStudio, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Export {
            input,
            output,
            format,
            page,
            mock,
        } => {
            read_document(studio, &input)?;
            if mock {
                studio.apply_mock_report_data();
            }
            studio.goto_page(page.saturating_sub(1));

            let output_name = output.as_ref().map(|p| p.to_string_lossy().into_owned());
            let file = match format {
                Some(format) => studio.export_as(format, output_name.as_deref()).await?,
                None => studio.export_current_document(output_name.as_deref()).await?,
            };
            let path = output.unwrap_or_else(|| PathBuf::from(&file.filename));
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Commands::Autofill { input, output } => {
            read_document(studio, &input)?;
            studio.apply_mock_report_data();
            write_document(studio, &output)?;
        }
        Commands::New {
            output,
            layout,
            preset,
            pages,
        } => {
            studio.new_document();
            for index in 0..pages.max(1) {
                if index > 0 {
                    studio.add_page();
                }
                if let Some(layout) = &layout {
                    studio.change_layout_json(layout)?;
                } else if let Some(preset) = preset {
                    studio.apply_preset(preset)?;
                }
                studio.scaffold_page();
            }
            write_document(studio, &output)?;
        }
        Commands::Remote { command } => match command {
            RemoteCommands::List => {
                for record in studio.list_templates().await? {
                    let updated = record
                        .updated_at
                        .or(record.created_at)
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!("{:<24} {:<32} {}", record.id, record.display_name(), updated);
                }
            }
            RemoteCommands::Get { id, output } => {
                studio.load_from_server(&id).await?;
                write_document(studio, &output)?;
            }
            RemoteCommands::Save { name, input } => {
                read_document(studio, &input)?;
                studio.save_to_server(&name).await?;
            }
            RemoteCommands::Delete { id } => studio.delete_template(&id).await?,
            RemoteCommands::Check => {
                studio.check_server().await?;
                println!("Template server is reachable");
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    tracing::debug!(api_url = %cli.config.api_url, "Starting template studio");

    let mut studio = TemplateStudio::new(&cli.config);
    let result = run(&mut studio, cli.command).await;
    print_notices(&mut studio);
    result
}
