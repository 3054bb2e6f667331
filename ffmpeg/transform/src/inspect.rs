/*!
    Pass-through stage that logs every frame.
*/

use tracing::debug;

use framepipe_types::{Frame, Result, TransformStage};

/**
    Logs each frame it sees and forwards it unchanged.

    Without a successor this is a terminal stage that only counts frames.
*/
#[derive(Default)]
pub struct Inspect<'a> {
    next: Option<&'a mut dyn TransformStage>,
    frames_seen: u64,
}

impl<'a> Inspect<'a> {
    /**
        Create a terminal inspect stage.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Create an inspect stage that forwards to `next`.
    */
    pub fn with_next(next: &'a mut dyn TransformStage) -> Self {
        Self {
            next: Some(next),
            frames_seen: 0,
        }
    }

    /**
        Number of frames this stage has processed.
    */
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl TransformStage for Inspect<'_> {
    fn process(&mut self, frame: &Frame, frame_number: u64) -> Result<()> {
        debug!(
            frame_number,
            width = frame.width(),
            height = frame.height(),
            format = %frame.format(),
            "processing frame"
        );
        self.frames_seen += 1;

        match self.next.as_mut() {
            Some(next) => next.process(frame, frame_number),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Inspect<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspect")
            .field("has_next", &self.next.is_some())
            .field("frames_seen", &self.frames_seen)
            .finish()
    }
}
