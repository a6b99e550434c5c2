// src/extract/mod.rs

use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::FolderMap;

/// Folder key for files found directly in the top-level archive.
pub const MAIN_FOLDER: &str = "main";

fn base_name(entry_name: &str) -> String {
    Path::new(entry_name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| entry_name.to_string())
}

fn file_stem(entry_name: &str) -> String {
    Path::new(entry_name)
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| entry_name.to_string())
}

fn is_zip(name: &str) -> bool {
    name.to_lowercase().ends_with(".zip")
}

/// Open a container archive held in memory and flatten it into a folder map:
/// top-level files land under `"main"`, each nested archive becomes one
/// folder named after its file stem. Archives nested deeper than one level
/// are skipped with a warning. Content is decoded lossily; callers get text.
#[tracing::instrument(level = "info", skip(bytes), fields(bytes = bytes.len()))]
pub fn folder_map_from_zip(bytes: &[u8]) -> Result<FolderMap> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("failed to read container archive")?;

    let mut folders = FolderMap::new();
    folders.insert(MAIN_FOLDER.to_string(), IndexMap::new());

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("failed to access archive entry #{}", i))?;
        if !entry.is_file() {
            continue;
        }
        let name = entry.name().to_string();

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("failed to read {} into memory", name))?;

        if is_zip(&name) {
            let folder = file_stem(&name);
            match nested_files(&buf) {
                Ok(files) => {
                    info!(archive = %name, files = files.len(), "extracted nested archive");
                    folders.entry(folder).or_default().extend(files);
                }
                Err(e) => {
                    warn!(archive = %name, error = %e, "unreadable nested archive, skipping");
                }
            }
        } else {
            folders
                .entry(MAIN_FOLDER.to_string())
                .or_default()
                .insert(base_name(&name), String::from_utf8_lossy(&buf).to_string());
        }
    }

    Ok(folders)
}

fn nested_files(bytes: &[u8]) -> Result<IndexMap<String, String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut files = IndexMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.is_file() {
            continue;
        }
        let name = entry.name().to_string();
        if is_zip(&name) {
            warn!(entry = %name, "archive nested deeper than one level, skipping");
            continue;
        }
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        files.insert(base_name(&name), String::from_utf8_lossy(&buf).to_string());
    }
    Ok(files)
}
