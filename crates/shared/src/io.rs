use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The three files that make up the installable briefing page
#[derive(Debug)]
pub struct SiteFiles {
    pub index_html: String,
    pub manifest_json: String,
    pub service_worker_js: String,
}

/// Write the site into `output_dir`, creating it if needed
pub fn write_site(output_dir: &Path, site: &SiteFiles) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let files = [
        ("index.html", &site.index_html),
        ("manifest.json", &site.manifest_json),
        ("sw.js", &site.service_worker_js),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let filepath = output_dir.join(name);
        fs::write(&filepath, content)
            .with_context(|| format!("Failed to write {}", filepath.display()))?;
        written.push(filepath);
    }

    Ok(written)
}
