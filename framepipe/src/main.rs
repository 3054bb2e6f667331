use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use framepipe_decode::{DecodeSession, RunOptions};
use framepipe_encode::{EncodeSession, EncoderConfig};
use framepipe_source::MediaContainer;
use framepipe_transform::{Inspect, PersistStage};
use framepipe_types::{Rational, TransformStage};

mod args;

use args::{Args, Command, DecodeArgs, FilterArgs};

const FALLBACK_FRAME_RATE: Rational = Rational::new(30, 1);

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Info { input } => {
            let container = open(&input)?;
            println!("{}", container.info());
        }
        Command::Frames { input, decode } => {
            let mut container = open(&input)?;
            let mut session = decode_session(&mut container, &decode)?;
            let mut inspect = Inspect::new();
            let frames = session.run(&mut inspect, run_options(&decode))?;
            println!("Decoded {frames} frames");
        }
        Command::Extract {
            input,
            output,
            interval,
            format,
            decode,
            filter,
        } => {
            let mut container = open(&input)?;
            let mut session = decode_session(&mut container, &decode)?;
            let mut persist = PersistStage::new(&output, interval, format.into())
                .with_context(|| format!("could not prepare {}", output.display()))?;

            let frames = run_chain(&mut session, &mut persist, &filter, run_options(&decode))?;
            println!(
                "Decoded {frames} frames, saved {} to {}",
                persist.saved_count(),
                output.display()
            );
        }
        Command::Transcode {
            input,
            output,
            codec,
            fps,
            bit_rate,
            decode,
            filter,
        } => {
            let mut container = open(&input)?;
            let mut session = decode_session(&mut container, &decode)?;

            let frame_rate = match fps {
                Some(fps) => Rational::approximate(fps)
                    .with_context(|| format!("invalid frame rate {fps}"))?,
                None if session.frame_rate().is_positive() => session.frame_rate(),
                None => FALLBACK_FRAME_RATE,
            };

            let mut config = EncoderConfig::new(&output, session.width(), session.height())
                .with_codec(codec)
                .with_frame_rate(frame_rate);
            if let Some(bit_rate) = bit_rate {
                config = config.with_bit_rate(bit_rate);
            }

            let mut encoder = EncodeSession::new();
            encoder
                .open(config)
                .with_context(|| format!("could not open {}", output.display()))?;

            let result = {
                let mut sink = encoder.stage();
                run_chain(&mut session, &mut sink, &filter, run_options(&decode))
            };
            encoder.finalize().context("could not finalize output")?;
            let frames = result?;

            println!(
                "Transcoded {frames} frames into {} ({} written)",
                output.display(),
                encoder.frames_written()
            );
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn open(path: &Path) -> Result<MediaContainer> {
    MediaContainer::open(path).with_context(|| format!("could not open {}", path.display()))
}

fn decode_session<'a>(
    container: &'a mut MediaContainer,
    decode: &DecodeArgs,
) -> Result<DecodeSession<'a>> {
    let stream_index = match decode.stream {
        Some(index) => index,
        None => match container.best_video_stream() {
            Some(index) => index,
            None => bail!("{} has no video stream", container.path().display()),
        },
    };

    DecodeSession::initialize(container, stream_index)
        .with_context(|| format!("could not decode stream {stream_index}"))
}

fn run_options(decode: &DecodeArgs) -> RunOptions {
    RunOptions {
        max_frames: decode.max_frames,
    }
}

/**
    Run `session` through `inspect -> [filter] -> tail`.
*/
fn run_chain<'a>(
    session: &mut DecodeSession<'_>,
    tail: &'a mut dyn TransformStage,
    filter: &FilterArgs,
    options: RunOptions,
) -> Result<usize> {
    let frames = match filter.stage() {
        Some(mut stage) => {
            info!(filter = stage.description(), "filtering frames");
            stage.set_next(Some(tail));
            let mut head = Inspect::with_next(&mut stage);
            session.run(&mut head, options)?
        }
        None => {
            let mut head = Inspect::with_next(tail);
            session.run(&mut head, options)?
        }
    };

    Ok(frames)
}
