//! Loading of external assets: the matcap texture and the font.
//!
//! Both loads are asynchronous and independent; the application offers
//! their results to a two-resource join and populates the scene once both
//! have arrived, in whichever order they complete. A failed load is logged
//! and otherwise dropped on the floor: the scene simply stays empty.

use anyhow::{Context as _, anyhow};

pub mod text;

/// Assets are resolved relative to `./assets` in the working directory.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = std::path::Path::new("./").join("assets").join(file_name);
    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(data)
}

/// Load and decode the matcap lighting image.
pub async fn load_matcap(file_name: &str) -> anyhow::Result<image::RgbaImage> {
    let data = load_binary(file_name).await?;
    let img = image::load_from_memory(&data)
        .with_context(|| format!("decoding matcap image {file_name}"))?;
    Ok(img.to_rgba8())
}

/// Load the font file and verify it parses; the raw bytes are kept because
/// the text mesher re-parses them with glyph access.
pub async fn load_font(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let data = load_binary(file_name).await?;
    ttf_parser::Face::parse(&data, 0).map_err(|e| anyhow!("parsing font {file_name}: {e}"))?;
    Ok(data)
}
