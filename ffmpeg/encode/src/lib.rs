/*!
    Video encoding and container output for the framepipe pipeline.

    This crate is the output side of the pipeline. It encodes raw frames
    with an FFmpeg encoder and muxes the packets into a container file.

    # Basic Usage

    ```ignore
    use framepipe_encode::{EncodeSession, EncoderConfig};

    let mut session = EncodeSession::new();
    session.open(EncoderConfig::new("output.mp4", 1280, 720).with_codec("libx264"))?;

    for frame in frames {
        session.write(&frame)?;
    }

    // Flush the encoder and write the trailer (critical!)
    session.finalize()?;
    ```

    # Chaining

    [`EncodeSession::stage`] returns a [`TransformStage`] that can end a
    transform chain. The stage only borrows the session:

    ```ignore
    let mut encoder = EncodeSession::new();
    encoder.open(config)?;
    {
        let mut sink = encoder.stage();
        let mut filter = FilterStage::grayscale(Some(&mut sink));
        decode_session.run(&mut filter, RunOptions::unbounded())?;
    }
    encoder.finalize()?;
    ```

    # Finalization

    Without [`EncodeSession::finalize`], buffered frames are lost and the
    container has no trailer; many players refuse such files. Finalizing
    twice, or finalizing a session that was never opened, is harmless.
*/

pub use framepipe_types::{Error, Frame, Rational, Result, TransformStage};

mod config;
mod session;
mod stage;

pub use config::{DEFAULT_CODEC, EncoderConfig};
pub use session::EncodeSession;
pub use stage::EncodeStage;
