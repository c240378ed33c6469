use clap::{Parser, Subcommand};
use log::info;
use rayon::prelude::*;
use renditions::attachment::{FocalPoint, ImageAttachment, RenditionAttachment};
use renditions::config::{self, RenditionConfig};
use renditions::filter::{ImageFilter, parse_spec};
use renditions::identity::fingerprint;
use renditions::imaging::RustBackend;
use std::path::{Path, PathBuf};

/// Shared focal point flag.
#[derive(clap::Args, Clone)]
struct FocalArgs {
    /// Focal point as X,Y,WIDTH,HEIGHT in source pixels
    #[arg(long, value_parser = parse_focal)]
    focal: Option<FocalPoint>,
}

#[derive(Parser)]
#[command(name = "renditions")]
#[command(about = "Generate image renditions from filter specs")]
#[command(long_about = "\
Generate image renditions from filter specs

Each spec is one pipeline stage, applied in order:

  original                 leave the image as it is
  width-N / height-N       shrink so that axis is at most N
  max-WxH                  shrink to fit inside WxH
  min-WxH                  scale to cover WxH
  fill-WxH[-cN]            crop to the aspect ratio, then shrink to WxH;
                           cN (0-100) zooms towards the focal point
  crop-LxTxWxH             cut out a region
  crop                     cut to the focal point
  scale-P                  scale both axes by P percent
  format-jpeg|png          choose the output format (last one wins)

Run 'renditions gen-config' to generate a documented renditions.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "renditions.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one rendition of an image
    Render {
        /// Source image
        source: PathBuf,
        /// Filter spec; repeat for each stage
        #[arg(short, long = "spec", required = true)]
        specs: Vec<String>,
        #[command(flatten)]
        focal: FocalArgs,
        /// Where to write the encoded rendition
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Render several renditions of one image in parallel
    Batch {
        /// Source image
        source: PathBuf,
        /// Directory for the generated files
        #[arg(long)]
        output_dir: PathBuf,
        /// Content type of the source; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
        #[command(flatten)]
        focal: FocalArgs,
        /// Whitespace-separated spec list per rendition, e.g. "fill-100x100 format-png"
        #[arg(required = true)]
        renditions: Vec<String>,
    },
    /// Print the rendition fingerprint of a source image
    Fingerprint {
        source: PathBuf,
        #[command(flatten)]
        focal: FocalArgs,
    },
    /// Validate filter specs without rendering
    Check {
        #[arg(required = true)]
        specs: Vec<String>,
    },
    /// Print a stock renditions.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            source,
            specs,
            focal,
            output,
        } => {
            let config = config::load_config(&cli.config)?;
            let filter = ImageFilter::parse(&specs)?;
            let bytes = std::fs::read(&source)?;
            let focal_point = focal.focal.map(FocalPoint::to_rect);

            let rendered = filter.run(
                &RustBackend::with_filter(config.resize.filter),
                &bytes,
                focal_point.as_ref(),
                &config.encode_params(),
            )?;
            std::fs::write(&output, &rendered.bytes)?;
            println!(
                "{}x{} {} {}",
                rendered.width,
                rendered.height,
                rendered.content_type(),
                rendered.bytes.len()
            );
        }
        Command::Batch {
            source,
            output_dir,
            content_type,
            focal,
            renditions,
        } => {
            let config = config::load_config(&cli.config)?;
            let filters = renditions
                .iter()
                .map(|list| ImageFilter::parse_str(list))
                .collect::<Result<Vec<_>, _>>()?;

            let backend = RustBackend::with_filter(config.resize.filter);
            let bytes = std::fs::read(&source)?;
            let content_type = content_type.or_else(|| content_type_for(&source));
            let mut attachment = ImageAttachment::from_bytes(
                &backend,
                &file_name(&source),
                content_type.as_deref(),
                &bytes,
                &config.policy(),
            )?;
            if let Some(fp) = focal.focal {
                attachment = attachment.with_focal_point(fp.x, fp.y, fp.width, fp.height)?;
            }

            let records = render_batch(
                &config,
                &backend,
                &attachment,
                &bytes,
                &filters,
                &output_dir,
            )?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Fingerprint { source, focal } => {
            let file_size = std::fs::metadata(&source)?.len();
            let focal_point = focal.focal.map(FocalPoint::to_rect);
            println!("{}", fingerprint(file_size, focal_point.as_ref()));
        }
        Command::Check { specs } => {
            for spec in &specs {
                let operation = parse_spec(spec)?;
                println!("{spec:<24} → {operation}");
            }
            println!("==> {} spec(s) valid", specs.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Render every filter on the rayon pool, then write the files in order.
fn render_batch(
    config: &RenditionConfig,
    backend: &RustBackend,
    attachment: &ImageAttachment,
    bytes: &[u8],
    filters: &[ImageFilter],
    output_dir: &Path,
) -> Result<Vec<RenditionAttachment>, Box<dyn std::error::Error>> {
    init_thread_pool(&config.processing);
    let params = config.encode_params();

    let rendered = filters
        .par_iter()
        .map(|filter| RenditionAttachment::create(backend, attachment, bytes, filter, &params))
        .collect::<Result<Vec<_>, _>>()?;

    std::fs::create_dir_all(output_dir)?;
    let stem = Path::new(&attachment.file.original_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rendition".to_string());

    let mut records = Vec::with_capacity(rendered.len());
    for (n, (record, data)) in rendered.into_iter().enumerate() {
        let extension = record.file.extension.as_deref().unwrap_or("");
        let path = output_dir.join(format!("{stem}-{}-{n}{extension}", record.cache_key));
        std::fs::write(&path, &data)?;
        info!("wrote {} ({})", path.display(), record.filter_spec);
        records.push(record);
    }
    Ok(records)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn parse_focal(value: &str) -> Result<FocalPoint, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("'{value}': {e}"))?;
    match parts[..] {
        [x, y, width, height] => Ok(FocalPoint {
            x,
            y,
            width,
            height,
        }),
        _ => Err(format!("'{value}': expected X,Y,WIDTH,HEIGHT")),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn content_type_for(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(content_type.to_string())
}
