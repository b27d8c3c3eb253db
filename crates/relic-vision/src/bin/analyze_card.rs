//! CLI tool to run a saved relic card photo through each vision stage.
//! Usage: cargo run -p relic-vision --features cli --bin analyze_card -- <photo.png> [data_dir] [output_dir]

use std::path::PathBuf;

use relic_data::KnowledgeBase;
use relic_vision::{
    crop_frame, detect_color, preprocess, AttributeInferencer, CropRegion, EffectMatcher,
    OcrEngine, PageSegMode, PreprocessConfig, TesseractEngine,
};

fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <photo.png> [data_dir] [output_dir]", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let data_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("data"));
    let output_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("./debug_output"));
    let _ = std::fs::create_dir_all(&output_dir);

    println!("Loading image: {}", input_path.display());
    let img = image::open(&input_path)?.to_rgba8();
    println!("Image size: {}x{}", img.width(), img.height());

    println!("\n=== Color Sampling ===");
    match detect_color(&img)? {
        Some(color) => println!("Border color: {}", color),
        None => println!("Border color: UNKNOWN"),
    }

    println!("\n=== Crop ===");
    let card = crop_frame(&img, &CropRegion::CARD)?;
    let crop_path = output_dir.join("crop.png");
    card.save(&crop_path)?;
    println!("Card {}x{} -> {}", card.width(), card.height(), crop_path.display());

    println!("\n=== Preprocessing ===");
    let processed = preprocess::process(&card, &PreprocessConfig::CARD)?;
    let processed_path = output_dir.join("preprocessed.png");
    processed.save(&processed_path)?;
    println!(
        "Preprocessed {}x{} -> {}",
        processed.width(),
        processed.height(),
        processed_path.display()
    );

    println!("\n=== OCR ===");
    let engine = TesseractEngine::new();
    if !engine.is_available() {
        println!("Tesseract not available! Install with: brew install tesseract");
        return Ok(());
    }
    let ocr = engine.recognize(&processed, PageSegMode::SINGLE_BLOCK)?;
    println!("Confidence: {:.0}", ocr.confidence);
    for line in ocr.text.lines() {
        println!("  | {}", line);
    }

    println!("\n=== Matching ===");
    let kb = KnowledgeBase::load(&data_dir)?;
    let matcher = EffectMatcher::new(&kb);
    let matches = matcher.match_effects(&ocr.text, 0.35);
    for m in &matches {
        println!(
            "  [{}] {} ({:.2}) <- line {}: {:?}",
            m.id, m.name, m.score, m.source_line_index, m.line
        );
    }

    let inferencer = AttributeInferencer::new(&kb);
    let attrs = inferencer.detect_from_text(&ocr.text, &matches);
    println!("\n=== Attributes ===");
    println!("Color: {:?}", attrs.color);
    println!("Deep night: {:?}", attrs.is_deep_night);
    println!("Quality: {:?}", attrs.quality);
    println!("Name: {:?} ({:?})", attrs.relic_name, attrs.name_source);

    println!("\nDebug images saved to: {}", output_dir.display());
    Ok(())
}
