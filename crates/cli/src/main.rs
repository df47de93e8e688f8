use std::path::PathBuf;
use std::process;

use clap::Parser;

use subtitle_ocr_core::pipeline::extract_subtitles_use_case::{
    ExtractSubtitlesUseCase, ProgressCallback,
};
use subtitle_ocr_core::pipeline::extraction_config::{parse_languages, ExtractionConfig};
use subtitle_ocr_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use subtitle_ocr_core::recognition::domain::cue_text_binder::RecognitionFailurePolicy;
use subtitle_ocr_core::recognition::domain::text_recognizer::TextRecognizer;
use subtitle_ocr_core::recognition::infrastructure::command_recognizer::CommandRecognizer;
use subtitle_ocr_core::recognition::infrastructure::tessdata_resolver;
use subtitle_ocr_core::recognition::infrastructure::tesseract_recognizer::{
    TesseractConfig, TesseractRecognizer,
};
use subtitle_ocr_core::shared::constants::TESSDATA_URL_TEMPLATE;
use subtitle_ocr_core::subtitles::domain::subtitle_entry::render_listing;
use subtitle_ocr_core::subtitles::domain::subtitle_writer::SubtitleWriter;
use subtitle_ocr_core::subtitles::infrastructure::srt_file_writer::SrtFileWriter;
use subtitle_ocr_core::video::domain::video_reader::VideoReader;
use subtitle_ocr_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use subtitle_ocr_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Extracts burned-in subtitles from a video with OCR.
#[derive(Parser)]
#[command(name = "subtitle-ocr")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Write a SubRip (.srt) file instead of printing to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Start time, H:M:S or M:S (default: beginning of video).
    #[arg(long)]
    start: Option<String>,

    /// End time, H:M:S or M:S (default: end of video).
    #[arg(long)]
    end: Option<String>,

    /// Top of the subtitle band as a fraction of frame height.
    #[arg(long)]
    region_top: Option<f64>,

    /// Bottom of the subtitle band as a fraction of frame height.
    #[arg(long)]
    region_bottom: Option<f64>,

    /// Mean squared difference below which consecutive frames share a cue.
    #[arg(long)]
    threshold: Option<f64>,

    /// Recognition languages joined with '+', e.g. chi_sim+eng.
    #[arg(long)]
    languages: Option<String>,

    /// Directory holding Tesseract .traineddata files.
    #[arg(long)]
    tessdata_dir: Option<PathBuf>,

    /// Download missing language data before running.
    #[arg(long)]
    download_languages: bool,

    /// OCR engine: tesseract or command.
    #[arg(long, default_value = "tesseract")]
    engine: String,

    /// Program run by the command engine; receives the band image path last
    /// and must print the text to stdout.
    #[arg(long)]
    ocr_command: Option<PathBuf>,

    /// Extra argument passed to --ocr-command before the image path (repeatable).
    #[arg(long = "ocr-arg", allow_hyphen_values = true)]
    ocr_args: Vec<String>,

    /// Abort on the first recognition failure instead of skipping the cue.
    #[arg(long)]
    strict: bool,

    /// Save each cue's subtitle band as a PNG to this directory.
    #[arg(long)]
    keyframes: Option<PathBuf>,

    /// JSON file with extraction settings; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let recognizer = build_recognizer(&cli, &config)?;

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(&cli.input)?;
    log::info!(
        "Opened {}: {}x{} at {:.3} fps, {} frames ({:.1}s)",
        cli.input.display(),
        metadata.width,
        metadata.height,
        metadata.fps,
        metadata.total_frames,
        metadata.duration_secs()
    );

    let progress: ProgressCallback = Box::new(|current, total| {
        eprint!("\rReading frame {current}/{total}");
        true
    });

    let mut use_case = ExtractSubtitlesUseCase::new(
        reader,
        recognizer,
        config,
        Box::new(StdoutPipelineLogger::default()),
        Some(progress),
        None,
    );
    if let Some(dir) = cli.keyframes {
        use_case = use_case.with_keyframe_dump(Box::new(ImageFileWriter::new()), dir);
    }

    let entries = use_case.execute(&metadata)?;
    eprintln!();

    match cli.output {
        Some(path) => {
            SrtFileWriter::new().write(&path, &entries)?;
            log::info!("Wrote {} subtitles to {}", entries.len(), path.display());
        }
        None => print!("{}", render_listing(&entries)),
    }

    Ok(())
}

/// Loads the config file if given, then applies command-line overrides.
fn build_config(cli: &Cli) -> Result<ExtractionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ExtractionConfig::load(path)?,
        None => ExtractionConfig::default(),
    };

    if let Some(start) = &cli.start {
        config.start_time = Some(start.clone());
    }
    if let Some(end) = &cli.end {
        config.end_time = Some(end.clone());
    }
    if let Some(top) = cli.region_top {
        config.region_top_frac = top;
    }
    if let Some(bottom) = cli.region_bottom {
        config.region_bottom_frac = bottom;
    }
    if let Some(threshold) = cli.threshold {
        config.similarity_threshold = threshold;
    }
    if let Some(languages) = &cli.languages {
        config.languages = parse_languages(languages);
    }
    if cli.strict {
        config.recognition_failure_policy = RecognitionFailurePolicy::Abort;
    }

    config.validate()?;
    Ok(config)
}

fn build_recognizer(
    cli: &Cli,
    config: &ExtractionConfig,
) -> Result<Box<dyn TextRecognizer>, Box<dyn std::error::Error>> {
    if cli.engine == "command" {
        let program = cli
            .ocr_command
            .clone()
            .ok_or("--ocr-command is required with --engine command")?;
        log::info!("Using OCR command {}", program.display());
        return Ok(Box::new(CommandRecognizer::new(
            program,
            cli.ocr_args.clone(),
        )));
    }

    let tessdata_dir = if cli.download_languages {
        let dir = match &cli.tessdata_dir {
            Some(dir) => {
                tessdata_resolver::resolve_into(
                    dir,
                    &config.languages,
                    TESSDATA_URL_TEMPLATE,
                    Some(Box::new(download_progress)),
                )?;
                dir.clone()
            }
            None => tessdata_resolver::resolve(
                &config.languages,
                Some(Box::new(download_progress)),
            )?,
        };
        eprintln!();
        Some(dir)
    } else {
        cli.tessdata_dir.clone()
    };

    let tesseract = TesseractConfig {
        tessdata_dir,
        ..TesseractConfig::new(config.languages.clone())
    };
    Ok(Box::new(TesseractRecognizer::new(tesseract)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.engine != "tesseract" && cli.engine != "command" {
        return Err(format!(
            "Engine must be 'tesseract' or 'command', got '{}'",
            cli.engine
        )
        .into());
    }
    if cli.engine == "command" && cli.ocr_command.is_none() {
        return Err("--ocr-command is required with --engine command".into());
    }
    if let Some(dir) = &cli.tessdata_dir {
        if !cli.download_languages && !dir.is_dir() {
            return Err(format!("Tessdata directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn download_progress(language: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading language data '{language}'... {pct}%");
    } else {
        eprint!("\rDownloading language data '{language}'... {downloaded} bytes");
    }
}
