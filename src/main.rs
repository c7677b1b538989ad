use clap::{Parser, Subcommand};

mod diagnostics;
mod model;
mod plan;
mod render;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "explain-timeline")]
#[command(about = "PostgreSQL EXPLAIN ANALYZE timeline visualizer", long_about = None)]
struct Cli {
    /// Log parsing decisions to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the plan as an HTML timeline.
    Report {
        /// File containing EXPLAIN ANALYZE text output.
        #[arg(long)]
        file: String,

        #[arg(short = 'o', long, default_value = "explain_plan.html")]
        out: String,

        #[arg(long, default_value = model::DEFAULT_TITLE)]
        title: String,

        /// Characters per line for operation labels.
        #[arg(long, default_value_t = model::DEFAULT_WRAP_WIDTH)]
        wrap_width: usize,
    },

    /// Print the parsed plan.
    Summary {
        /// File containing EXPLAIN ANALYZE text output.
        #[arg(long)]
        file: String,

        /// Print the summary as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    diagnostics::init_logging(cli.verbose);

    match cli.cmd {
        Commands::Report {
            file,
            out,
            title,
            wrap_width,
        } => {
            // 1) Parse the report (bottom-up scan, see plan::timeline).
            let summary = plan::parse_plan_file(&file)?;

            // 2) Derive everything the chart draws.
            let options = model::RenderOptions { title, wrap_width };
            let data = model::build_timeline_report(&summary, &options);

            // 3) Render HTML.
            let html = render::render_html_report(&data)?;
            std::fs::write(&out, html)?;
            println!("Wrote {}", out);
        }
        Commands::Summary { file, json } => {
            let summary = plan::parse_plan_file(&file)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary.describe());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_defaults() {
        let cli = Cli::try_parse_from(["explain-timeline", "report", "--file", "plan.txt"])
            .expect("parse args");
        match cli.cmd {
            Commands::Report {
                file,
                out,
                title,
                wrap_width,
            } => {
                assert_eq!(file, "plan.txt");
                assert_eq!(out, "explain_plan.html");
                assert_eq!(title, model::DEFAULT_TITLE);
                assert_eq!(wrap_width, model::DEFAULT_WRAP_WIDTH);
            }
            Commands::Summary { .. } => panic!("expected report"),
        }
    }

    #[test]
    fn file_flag_is_required() {
        assert!(Cli::try_parse_from(["explain-timeline", "summary"]).is_err());
    }
}
