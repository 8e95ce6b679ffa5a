mod config;
mod enex;
mod error;
mod links;
mod logging;
mod run;
mod sources;
mod template;
mod writer;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::config::{RunOptions, UserOptions};

#[derive(Parser)]
#[command(name = "enex2md", about = "Convert Evernote .enex exports to Markdown notes")]
struct Cli {
    /// Config file (JSON, TOML or YAML); ENEX2MD_* env vars override it
    #[arg(short, long, global = true)]
    config_file: Option<PathBuf>,
    /// Log file, cleared at the start of every conversion
    #[arg(long, global = true, default_value = "conversion.log")]
    log_file: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every export source to Markdown
    Convert {
        /// Export files or directories (default: enex_sources from config)
        sources: Vec<PathBuf>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        #[arg(short, long)]
        template_file: Option<PathBuf>,
        /// Do not convert notes clipped from the web
        #[arg(long)]
        skip_web_clips: bool,
    },
    /// List the export sources that would be converted
    List {
        sources: Vec<PathBuf>,
    },
    /// Show which optional fields a template renders
    CheckTemplate {
        #[arg(short, long)]
        template_file: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_file, matches!(cli.command, Commands::Convert { .. }))?;

    let t0 = Instant::now();
    let mut user = config::load(cli.config_file.as_deref())?;

    match cli.command {
        Commands::Convert {
            sources: inputs,
            output_dir,
            template_file,
            skip_web_clips,
        } => {
            apply_sources(&mut user, inputs);
            if let Some(dir) = output_dir {
                user.output_dir = dir;
            }
            if template_file.is_some() {
                user.template_file = template_file;
            }
            user.skip_web_clips |= skip_web_clips;

            let report = run::convert(user).await?;
            for r in &report.sources {
                match &r.error {
                    Some(e) => println!("{}: {} (failed: {})", r.source.path.display(), r.summary, e),
                    None => println!("{}: {}", r.source.path.display(), r.summary),
                }
            }
            println!(
                "\nConverted {} notebooks: {}",
                report.output_folders.len(),
                report.totals()
            );
            if let Some(e) = &report.link_error {
                println!("Internal links were not rewritten: {}", e);
            }
        }
        Commands::List { sources: inputs } => {
            apply_sources(&mut user, inputs);
            let found = sources::enumerate_all(&user.enex_sources)?;
            println!("{:<40} | {}", "Notebook", "Stack");
            println!("{}", "-".repeat(60));
            for s in &found {
                println!("{:<40} | {}", truncate(&s.notebook_name(), 40), s.notebook_stack_name);
            }
            println!("\n{} export sources", found.len());
        }
        Commands::CheckTemplate { template_file } => {
            if template_file.is_some() {
                user.template_file = template_file;
            }
            let options = RunOptions::resolve(user)?;
            let c = options.capabilities;
            println!("created-at:       {}", !c.skip_creation_time);
            println!("updated-at:       {}", !c.skip_update_time);
            println!("source-url:       {}", !c.skip_source_url);
            println!("tags:             {}", !c.skip_tags);
            println!("location:         {}", !c.skip_location);
            println!("notebook:         {}", c.is_notebook_name_needed);
            println!("link-to-original: {}", c.keep_original_html);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn apply_sources(user: &mut UserOptions, inputs: Vec<PathBuf>) {
    if !inputs.is_empty() {
        user.enex_sources = inputs;
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
