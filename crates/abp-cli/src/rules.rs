use std::fs;
use std::io;
use std::path::Path;

use abp_compiler::{load_filter_list, ErrorPolicy, ListStats};
use abp_core::matcher::Matcher;

/// Counts for one loaded list file.
#[derive(Debug)]
pub struct LoadedList {
    pub path: String,
    pub stats: ListStats,
}

/// Load every list in order into `matcher`.
pub fn load_lists(paths: &[String], matcher: &mut Matcher, policy: ErrorPolicy) -> Result<Vec<LoadedList>, String> {
    if paths.is_empty() {
        return Err("No rule lists specified".to_string());
    }

    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?;

        let stats = load_filter_list(matcher, &content, policy)
            .map_err(|e| format!("{}: {}", path, e))?;

        log::debug!(
            "{}: {} lines, {} rules, {} errors",
            display_name(path),
            stats.lines,
            stats.rules,
            stats.errors.len()
        );

        loaded.push(LoadedList { path: path.clone(), stats });
    }

    Ok(loaded)
}

/// Collect URIs from the command line, or one per line from a file
/// (`-` reads stdin). Blank lines are dropped.
pub fn read_uris(file: Option<&str>, args: Vec<String>) -> Result<Vec<String>, String> {
    let Some(file) = file else {
        return Ok(args);
    };

    let content = if file == "-" {
        io::read_to_string(io::stdin()).map_err(|e| format!("Failed to read stdin: {}", e))?
    } else {
        fs::read_to_string(file).map_err(|e| format!("Failed to read '{}': {}", file, e))?
    };

    let mut uris: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    uris.extend(args);
    Ok(uris)
}

pub fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
