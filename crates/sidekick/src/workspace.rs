//! Workspace file enumeration — the corpus collaborator for search.
//!
//! Walks the configured root, applies include/exclude glob filters, and
//! returns files sorted by relative path. The retrieval pipeline treats
//! that order as enumeration order (the corpus cap keeps the first N),
//! so the sort keeps search results stable across runs.
//!
//! Enumeration and reading are split: the walk collects relative paths
//! only, and file content is read for at most `cap` files after the
//! sort. Files beyond the cap never touch the disk again.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use sidekick_core::models::SourceFile;

use crate::config::WorkspaceConfig;

/// Enumerate matching file paths (relative to the root), sorted.
pub fn enumerate_paths(config: &WorkspaceConfig) -> Result<Vec<String>> {
    let root = &config.root;
    if !root.exists() {
        bail!("Workspace root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut paths = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        paths.push(rel_str);
    }

    // Sort for deterministic enumeration order
    paths.sort();

    Ok(paths)
}

/// Enumerate the workspace and read content for the first `cap` files.
///
/// Only the retained prefix is ever opened; on a large tree the cost of
/// a search is bounded by the corpus cap, not the workspace size.
pub fn scan_workspace(config: &WorkspaceConfig, cap: usize) -> Result<Vec<SourceFile>> {
    let mut paths = enumerate_paths(config)?;
    paths.truncate(cap);

    let mut files = Vec::with_capacity(paths.len());
    for rel_str in paths {
        // Binary or unreadable files contribute an empty excerpt rather
        // than failing the whole scan.
        let content = std::fs::read_to_string(config.root.join(&rel_str)).unwrap_or_default();
        files.push(SourceFile {
            path: rel_str,
            content,
        });
    }

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
