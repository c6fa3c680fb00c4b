// src/main.rs

mod cli;
mod loader;
mod renderer;

use clap::Parser;
use cli::Args;
use git_lanes::VisibleGraph;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let start_time = Instant::now();

    let history = match loader::load(&args.repo, args.max_commits) {
        Ok(history) => history,
        Err(e) => {
            eprintln!("Error loading repository: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut graph = match VisibleGraph::from_commits(history.commits, &args.graph_options()) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error building commit graph: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.collapse {
        graph.action_controller().set_linear_branches_collapsed(true);
    }
    info!(
        rows = graph.visible_row_count(),
        columns = graph.column_count(),
        elapsed = ?start_time.elapsed(),
        "graph ready"
    );

    match &args.output {
        Some(path) => {
            if let Err(e) = renderer::render_png(&graph, &args, path) {
                eprintln!("Error writing {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
            println!("Wrote {} rows to {} in {:.2?}.", graph.visible_row_count(), path.display(), start_time.elapsed());
        }
        None => renderer::print_rows(&graph, &history.meta),
    }
    ExitCode::SUCCESS
}
