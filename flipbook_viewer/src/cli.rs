use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Annotatable 3D flip book viewer", version)]
pub struct Args {
    /// Directory holding `<page>.png` base images; missing pages use a blank sheet
    #[arg(long)]
    pub pages_dir: Option<PathBuf>,

    /// Initial window width in physical pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in physical pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Skip creating a winit window/event loop; useful for headless automation
    #[arg(long)]
    pub headless: bool,

    /// Headless only: scrub to this position and print every visited page
    #[arg(long)]
    pub seek: Option<usize>,

    /// Headless only: write the simulated flip trace as JSON
    #[arg(long)]
    pub report_json: Option<PathBuf>,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "window size must be non-zero (got {}x{})",
            self.width,
            self.height
        );
        ensure!(
            self.headless || (self.seek.is_none() && self.report_json.is_none()),
            "--seek and --report-json require --headless"
        );
        ensure!(
            self.report_json.is_none() || self.seek.is_some(),
            "--report-json requires --seek"
        );
        if let Some(dir) = self.pages_dir.as_ref() {
            ensure!(
                dir.is_dir(),
                "--pages-dir {} is not a directory",
                dir.display()
            );
        }
        Ok(())
    }
}
