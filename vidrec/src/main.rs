use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, prelude::*};

use vidrec::{DiagnosticLayer, EncoderSession, PixelFormat, RasterFrame};

mod cli;
mod source;

use cli::Args;
use source::FrameSource;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vidrec=info,ffmpeg=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(DiagnosticLayer)
        .init();

    ffmpeg_next::init().context("could not initialize ffmpeg")?;
    ffmpeg_next::util::log::set_level(args.ffmpeg_log_level()?);

    let config = args.encoder_config()?;
    let mut source = FrameSource::new(args.input_dir.as_deref(), config.width, config.height)?;
    let frames = args.frames.unwrap_or_else(|| source.default_frames());

    let mut session = EncoderSession::new();
    session
        .open(&config, &args.output)
        .with_context(|| format!("could not open {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        frames,
        width = config.width,
        height = config.height,
        "encoding"
    );

    let mut failed = 0u64;
    for index in 0..frames {
        let pixels = source.frame(index)?;
        let frame = RasterFrame::packed(pixels, config.width, config.height, PixelFormat::Rgb32)?;
        if session.encode_with_pts(&frame, index * args.pts_step) < 0 {
            warn!(index, "frame was not encoded");
            failed += 1;
        }
    }

    let closed = session.finish();
    if args.dump_log {
        print!("{}", session.log_text());
    }
    let stats = closed.context("could not finalize output")?;

    println!(
        "{}: {} frames, {} packets, {} key frames, {} bytes",
        args.output.display(),
        stats.frames,
        stats.packets,
        stats.key_frames,
        stats.bytes
    );
    if failed > 0 {
        println!("{} frames failed to encode", failed);
    }

    Ok(())
}
