use crate::error::{AppError, AppResult, FileError};
use crate::models::query::CauseListQuery;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Load one query from a TOML file, validating it on the way in
pub async fn load_query_file(toml_file_path: &Path) -> AppResult<CauseListQuery> {
    let display = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;

    let query: CauseListQuery = toml::from_str(&content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: display.clone(),
            source: e,
        })
    })?;

    Ok(query)
}

/// Load every `*.toml` query in a folder, sorted by file name
///
/// Files that fail to load are logged and skipped.
pub async fn load_all_query_files(folder_path: &str) -> AppResult<Vec<(PathBuf, CauseListQuery)>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(AppError::File(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }));
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut queries = Vec::new();
    for path in paths {
        tracing::info!(
            "Loading query file: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_query_file(&path).await {
            Ok(query) => {
                tracing::debug!("Loaded query {}", query.label());
                queries.push((path, query));
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
            }
        }
    }

    Ok(queries)
}
