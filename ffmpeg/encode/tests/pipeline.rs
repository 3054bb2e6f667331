use std::fs;
use std::path::{Path, PathBuf};

use framepipe_decode::{DecodeSession, RunOptions};
use framepipe_encode::{EncodeSession, EncoderConfig};
use framepipe_source::{MediaContainer, MediaKind};
use framepipe_transform::{FilterStage, ImageKind, PersistStage};
use framepipe_types::{Frame, Rational, from_fn};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const RED: [u8; 3] = [200, 40, 40];

fn close(a: [u8; 3], b: [u8; 3], tolerance: u8) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= tolerance)
}

fn mpeg4(path: &Path) -> EncoderConfig {
    EncoderConfig::new(path, WIDTH, HEIGHT)
        .with_codec("mpeg4")
        .with_frame_rate(Rational::new(30, 1))
        .with_bit_rate(1_000_000)
}

fn write_clip(dir: &Path, name: &str, frames: usize, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    let mut session = EncodeSession::new();
    session.open(mpeg4(&path)).unwrap();
    let frame = Frame::solid_rgb(WIDTH, HEIGHT, rgb);
    for _ in 0..frames {
        session.write(&frame).unwrap();
    }
    session.finalize().unwrap();
    assert_eq!(session.frames_written(), frames as u64);
    path
}

fn open_video(path: &Path) -> (MediaContainer, usize) {
    let container = MediaContainer::open(path).unwrap();
    let index = container.best_video_stream().unwrap();
    (container, index)
}

#[test]
fn solid_colour_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_clip(tmp.path(), "red.mp4", 10, RED);

    let (mut container, index) = open_video(&path);
    let stream = container.stream(index).unwrap().clone();
    assert_eq!(stream.kind, MediaKind::Video);
    assert_eq!(stream.codec_name, "mpeg4");

    let mut session = DecodeSession::initialize(&mut container, index).unwrap();
    assert_eq!((session.width(), session.height()), (WIDTH, HEIGHT));

    let mut seen = Vec::new();
    let mut chain = from_fn(|frame: &Frame, n| {
        seen.push((n, frame.width(), frame.height(), frame.dominant_rgb()));
        Ok(())
    });
    let count = session.run(&mut chain, RunOptions::unbounded()).unwrap();
    drop(chain);

    assert_eq!(count, 10);
    assert_eq!(seen.len(), 10);
    for (i, (n, width, height, colour)) in seen.into_iter().enumerate() {
        assert_eq!(n, i as u64);
        assert_eq!((width, height), (WIDTH, HEIGHT));
        let colour = colour.unwrap();
        assert!(close(colour, RED, 12), "frame {n}: {colour:?}");
    }
}

#[test]
fn max_frames_limits_delivery() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_clip(tmp.path(), "clip.mp4", 12, [10, 120, 200]);

    let (mut container, index) = open_video(&path);
    let mut session = DecodeSession::initialize(&mut container, index).unwrap();

    let mut numbers = Vec::new();
    let mut chain = from_fn(|_: &Frame, n| {
        numbers.push(n);
        Ok(())
    });
    let count = session
        .run(&mut chain, RunOptions::with_max_frames(5))
        .unwrap();
    drop(chain);

    assert_eq!(count, 5);
    assert_eq!(numbers, vec![0, 1, 2, 3, 4]);
}

#[test]
fn second_run_decodes_from_the_start() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_clip(tmp.path(), "clip.mp4", 6, [0, 0, 0]);

    let (mut container, index) = open_video(&path);
    let mut session = DecodeSession::initialize(&mut container, index).unwrap();

    let mut sink = from_fn(|_: &Frame, _| Ok(()));
    assert_eq!(session.run(&mut sink, RunOptions::unbounded()).unwrap(), 6);
    assert_eq!(session.run(&mut sink, RunOptions::unbounded()).unwrap(), 6);
}

#[test]
fn write_after_finalize_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("short.mp4");

    let mut session = EncodeSession::new();
    session.open(mpeg4(&path)).unwrap();
    assert!(session.is_open());
    session.write(&Frame::solid_rgb(WIDTH, HEIGHT, RED)).unwrap();
    session.finalize().unwrap();
    assert!(session.is_finalized());

    let finished = fs::read(&path).unwrap();
    let err = session
        .write(&Frame::solid_rgb(WIDTH, HEIGHT, RED))
        .unwrap_err();
    assert!(err.is_state());
    assert_eq!(fs::read(&path).unwrap(), finished);

    session.finalize().unwrap();
    assert!(session.is_finalized());
    assert_eq!(session.frames_written(), 1);
    assert_eq!(fs::read(&path).unwrap(), finished);

    let err = session.open(mpeg4(&path)).unwrap_err();
    assert!(err.is_state());
    assert_eq!(fs::read(&path).unwrap(), finished);
}

#[test]
fn open_twice_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = EncodeSession::new();
    session.open(mpeg4(&tmp.path().join("a.mp4"))).unwrap();
    let err = session.open(mpeg4(&tmp.path().join("b.mp4"))).unwrap_err();
    assert!(err.is_state());
    session.finalize().unwrap();
}

#[test]
fn frames_are_scaled_to_the_configured_size() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("scaled.mp4");

    let mut session = EncodeSession::new();
    session.open(mpeg4(&path)).unwrap();
    for _ in 0..3 {
        session.write(&Frame::solid_rgb(128, 96, RED)).unwrap();
    }
    session.finalize().unwrap();

    let (mut container, index) = open_video(&path);
    let mut decoder = DecodeSession::initialize(&mut container, index).unwrap();
    let mut sizes = Vec::new();
    let mut chain = from_fn(|frame: &Frame, _| {
        sizes.push((frame.width(), frame.height()));
        Ok(())
    });
    decoder.run(&mut chain, RunOptions::unbounded()).unwrap();
    drop(chain);

    assert_eq!(sizes, vec![(WIDTH, HEIGHT); 3]);
}

#[test]
fn grayscale_then_persist_every_second_frame() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_clip(tmp.path(), "colour.mp4", 10, [220, 60, 30]);
    let out_dir = tmp.path().join("frames");

    let (mut container, index) = open_video(&path);
    let mut session = DecodeSession::initialize(&mut container, index).unwrap();

    let mut persist = PersistStage::new(&out_dir, 2, ImageKind::Ppm).unwrap();
    let mut filter = FilterStage::grayscale(Some(&mut persist));
    let count = session
        .run(&mut filter, RunOptions::unbounded())
        .unwrap();
    drop(filter);

    assert_eq!(count, 10);
    assert_eq!(persist.saved_count(), 5);

    let mut names: Vec<_> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "frame_00000.ppm",
            "frame_00002.ppm",
            "frame_00004.ppm",
            "frame_00006.ppm",
            "frame_00008.ppm"
        ]
    );

    let pixels = (WIDTH * HEIGHT * 3) as usize;
    for name in names {
        let bytes = fs::read(out_dir.join(&name)).unwrap();
        assert!(bytes.starts_with(b"P6"));
        let body = &bytes[bytes.len() - pixels..];
        assert!(
            body.chunks_exact(3).all(|p| p[0] == p[1] && p[1] == p[2]),
            "{name} is not gray"
        );
    }
}

#[test]
fn transcode_through_encode_stage() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_clip(tmp.path(), "in.mp4", 8, RED);
    let target = tmp.path().join("out.mkv");

    let mut encoder = EncodeSession::new();
    encoder.open(mpeg4(&target)).unwrap();
    {
        let (mut container, index) = open_video(&source);
        let mut session = DecodeSession::initialize(&mut container, index).unwrap();
        let mut sink = encoder.stage();
        let mut filter = FilterStage::new("hflip", Some(&mut sink));
        assert_eq!(
            session.run(&mut filter, RunOptions::unbounded()).unwrap(),
            8
        );
    }
    assert!(encoder.is_open());
    encoder.finalize().unwrap();
    assert_eq!(encoder.frames_written(), 8);

    let (mut container, index) = open_video(&target);
    let mut session = DecodeSession::initialize(&mut container, index).unwrap();
    let mut sink = from_fn(|_: &Frame, _| Ok(()));
    assert_eq!(session.run(&mut sink, RunOptions::unbounded()).unwrap(), 8);
}

#[test]
fn missing_stream_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_clip(tmp.path(), "clip.mp4", 2, RED);

    let mut container = MediaContainer::open(&path).unwrap();
    let missing = container.streams().len();
    let err = DecodeSession::initialize(&mut container, missing).unwrap_err();
    assert!(matches!(err, framepipe_types::Error::Codec { .. }), "{err}");
}
