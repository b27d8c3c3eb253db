use anyhow::{anyhow, Result};
use relic_data::{ColorCategory, QualityTier};
use relic_vision::get_relic_name;

pub fn run(color: &str, deep_night: bool, effect_count: usize, quality: Option<&str>) -> Result<()> {
    println!("{}", relic_name(color, deep_night, effect_count, quality)?);
    Ok(())
}

/// Synthesized name, or "--" when the color is unknown
fn relic_name(
    color: &str,
    deep_night: bool,
    effect_count: usize,
    quality: Option<&str>,
) -> Result<String> {
    let color = match color.trim() {
        c if c.eq_ignore_ascii_case("unknown") || c == "-" => None,
        c => Some(ColorCategory::parse(c).ok_or_else(|| anyhow!("Unknown color: {}", c))?),
    };
    let quality = quality
        .map(|q| QualityTier::parse(q).ok_or_else(|| anyhow!("Unknown quality: {}", q)))
        .transpose()?;

    Ok(get_relic_name(color, deep_night, effect_count, quality).unwrap_or_else(|| "--".to_string()))
}
