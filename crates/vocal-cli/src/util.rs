use anyhow::Result;
use std::path::{Path, PathBuf};

/// Check that `path` names an existing `.tsv` or `.csv` file.
pub fn validate_tsv_or_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    if !dir.is_dir() {
        anyhow::bail!("Output path is not a directory: {}", dir.display());
    }
    Ok(())
}
