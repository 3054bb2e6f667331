/*!
    Decode run configuration.
*/

/**
    Options for a single [`DecodeSession::run`](crate::DecodeSession::run).
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after this many frames have been delivered to the chain.
    /// `None` and `Some(0)` both mean "decode everything".
    pub max_frames: Option<usize>,
}

impl RunOptions {
    /**
        Decode the whole stream.
    */
    pub fn unbounded() -> Self {
        Self::default()
    }

    /**
        Stop after `max_frames` frames. Zero means unbounded.
    */
    pub fn with_max_frames(max_frames: usize) -> Self {
        Self {
            max_frames: Some(max_frames),
        }
    }

    /**
        The effective frame budget, if any.
    */
    pub fn budget(self) -> Option<usize> {
        self.max_frames.filter(|&max| max > 0)
    }
}
