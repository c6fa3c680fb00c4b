// src/cli.rs

use clap::Parser;
use git_lanes::{GraphOptions, HeadPolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to read
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// Maximum number of commits to load; older parents show up as arrows
    #[arg(short = 'n', long, default_value_t = 500)]
    pub max_commits: usize,

    /// Collapse every linear run of commits into a single edge
    #[arg(long)]
    pub collapse: bool,

    /// Draw long edges through the rows they cross instead of as arrows
    #[arg(long)]
    pub long_edges: bool,

    /// Which branch head labels a commit reachable from several heads
    #[arg(long, value_enum, default_value_t = HeadMode::Topmost)]
    pub head_policy: HeadMode,

    /// Write the graph to this PNG file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Width of one lane in the PNG, in pixels
    #[arg(long, default_value_t = 16)]
    pub lane_width: u32,

    /// Height of one row in the PNG, in pixels
    #[arg(long, default_value_t = 20)]
    pub row_height: u32,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum HeadMode {
    /// The head that comes first in topological order
    Topmost,
    /// Follow first-parent children before falling back to the topmost head
    FirstParent,
}

impl Args {
    pub fn graph_options(&self) -> GraphOptions {
        let head_policy = match self.head_policy {
            HeadMode::Topmost => HeadPolicy::Topmost,
            HeadMode::FirstParent => HeadPolicy::FirstParent,
        };
        GraphOptions::default().with_head_policy(head_policy).long_edges(self.long_edges)
    }
}
