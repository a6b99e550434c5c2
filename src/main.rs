use anyhow::{bail, Context, Result};
use ascmerge::{extract, merge, workbook};
use std::{env, fs, path::PathBuf, time::Instant};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ascmerge=info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    // ─── 2) parse args ───────────────────────────────────────────────
    let mut args = env::args().skip(1);
    let input = match args.next() {
        Some(p) => PathBuf::from(p),
        None => bail!("usage: ascmerge <input.zip> [out_dir]"),
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    // ─── 3) read container archive ───────────────────────────────────
    let start = Instant::now();
    let bytes =
        fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    info!(input = %input.display(), bytes = bytes.len(), "loaded container archive");

    let folders = extract::folder_map_from_zip(&bytes)?;
    let file_count: usize = folders.values().map(|f| f.len()).sum();
    info!(folders = folders.len(), files = file_count, "extracted");

    // ─── 4) aggregate sections ───────────────────────────────────────
    let sections = match merge::aggregate(&folders) {
        Ok(sections) => sections,
        Err(merge::MergeError::NoData) => {
            error!("no valid data found in {}", input.display());
            bail!("no valid section data found; nothing to consolidate");
        }
    };
    info!(sections = sections.len(), "aggregated");

    // ─── 5) serialize workbook ───────────────────────────────────────
    let blob = workbook::build_workbook(&sections);
    let out_path = out_dir.join(format!("{}.xlsx", workbook::suggested_name()));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    fs::write(&out_path, &blob)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    info!(out = %out_path.display(), elapsed = ?start.elapsed(), "done");
    Ok(())
}
