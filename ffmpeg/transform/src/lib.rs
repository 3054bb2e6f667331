/*!
    Pixel conversion and frame processing stages for the framepipe pipeline.

    This crate holds everything that sits between the decoder and the
    encoder:
    - **Conversion**: moving frames between pipeline [`Frame`]s and FFmpeg
      frames, and converting pixel formats with libswscale
    - **Stages**: concrete [`TransformStage`] implementations that inspect,
      filter or persist frames

    # Building a Chain

    Stages are linked by borrowing their successor. The caller owns every
    stage and builds the chain from the tail towards the head:

    ```ignore
    use framepipe_transform::{FilterStage, ImageKind, Inspect, PersistStage};

    let mut persist = PersistStage::new("frames", 10, ImageKind::Png)?;
    let mut filter = FilterStage::grayscale(Some(&mut persist));
    let mut head = Inspect::with_next(&mut filter);

    session.run(&mut head, RunOptions::unbounded())?;
    drop(head);
    println!("saved {} frames", persist.saved_count());
    ```

    # Lazy Initialization

    Both the converter and the filter stage build their FFmpeg contexts on
    the first frame they see. The converter rebuilds its scaler whenever the
    input geometry changes; the filter graph is fixed to the geometry of the
    first frame for the lifetime of the stage.
*/

pub use framepipe_types::{Error, Frame, PixelFormat, Result, TransformStage};

mod bridge;
mod convert;
mod filter;
mod inspect;
mod persist;

pub use bridge::{copy_from_ffmpeg, copy_to_ffmpeg, pixel_from_ffmpeg, pixel_to_ffmpeg};
pub use convert::VideoConverter;
pub use filter::FilterStage;
pub use inspect::Inspect;
pub use persist::{ImageKind, PersistStage};
