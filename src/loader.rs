// src/loader.rs

use git2::{Oid, Repository, Sort};
use git_lanes::GraphCommit;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// What the text view shows next to each commit
#[derive(Debug, Clone)]
pub struct CommitMeta {
    pub summary: String,
    pub time: i64,
}

/// Commits in topological order, heads first
#[derive(Debug)]
pub struct LoadedHistory {
    pub commits: Vec<GraphCommit<Oid>>,
    pub meta: HashMap<Oid, CommitMeta>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error("no commits reachable from any local branch")]
    Empty,
}

pub fn load(repo_path: &Path, max_commits: usize) -> Result<LoadedHistory, LoadError> {
    let repo = Repository::open(repo_path)?;
    info!(path = %repo_path.display(), max_commits, "reading repository");

    let mut revwalk = repo.revwalk()?;
    revwalk.push_glob("refs/heads/*")?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    let bar = ProgressBar::new(max_commits as u64);
    bar.set_message("Loading commits");

    let mut commits = Vec::new();
    let mut meta = HashMap::new();
    for oid in revwalk.take(max_commits) {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        commits.push(GraphCommit::new(oid, commit.parent_ids().collect()));
        meta.insert(
            oid,
            CommitMeta {
                summary: commit.summary().unwrap_or("").to_string(),
                time: commit.time().seconds(),
            },
        );
        bar.inc(1);
    }
    bar.finish_with_message("History loaded");

    if commits.is_empty() {
        return Err(LoadError::Empty);
    }
    info!(commits = commits.len(), "loaded history");
    Ok(LoadedHistory { commits, meta })
}
