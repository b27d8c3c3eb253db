use anyhow::{Context, Result};
use image::RgbaImage;
use relic_data::KnowledgeBase;
use relic_vision::TesseractEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::ScanSettings;
use crate::pipeline::ScanPipeline;

pub async fn run(
    image: PathBuf,
    card: Option<PathBuf>,
    data: Option<PathBuf>,
    settings: Option<PathBuf>,
) -> Result<()> {
    let settings = ScanSettings::load(settings.as_deref())?;
    let data_dir = data.unwrap_or_else(resolve_data_dir);
    info!("Data directory: {}", data_dir.display());

    // Table loading and the engine probe both block
    let init = tokio::task::spawn_blocking(move || -> Result<(KnowledgeBase, TesseractEngine)> {
        let kb = KnowledgeBase::load(&data_dir)?;
        Ok((kb, TesseractEngine::new()))
    })
    .await??;
    let (kb, engine) = init;
    let pipeline = ScanPipeline::new(&kb, Arc::new(engine), settings);

    let frame = Arc::new(open_image(&image)?);
    let result = match card {
        Some(card) => {
            let card = Arc::new(open_image(&card)?);
            pipeline.scan(frame, card).await?
        }
        None => pipeline.scan_frame(frame).await?,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn open_image(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(img.to_rgba8())
}

/// `./data` if present, else `data` next to the project root of the executable
fn resolve_data_dir() -> PathBuf {
    let local = PathBuf::from("data");
    if local.exists() {
        return local;
    }
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));
    if let Some(dir) = exe_dir {
        // target/<profile>/relic-scanner -> project root
        let project_root = dir.parent().and_then(|p| p.parent());
        if let Some(root) = project_root {
            let data = root.join("data");
            if data.exists() {
                return data;
            }
        }
    }
    local
}
