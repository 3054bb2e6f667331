/*!
    Adapter that lets an encode session terminate a transform chain.
*/

use framepipe_types::{Frame, Result, TransformStage};

use crate::EncodeSession;

/**
    Terminal stage writing every frame to an [`EncodeSession`].

    The stage only borrows the session and never finalizes it; the caller
    finalizes the session once the run is over.
*/
pub struct EncodeStage<'a> {
    session: &'a mut EncodeSession,
}

impl<'a> EncodeStage<'a> {
    /**
        Wrap a session. Equivalent to [`EncodeSession::stage`].
    */
    pub fn new(session: &'a mut EncodeSession) -> Self {
        Self { session }
    }
}

impl TransformStage for EncodeStage<'_> {
    fn process(&mut self, frame: &Frame, _frame_number: u64) -> Result<()> {
        self.session.write(frame)
    }
}

impl std::fmt::Debug for EncodeStage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodeStage")
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_session_rejects_frames() {
        let mut session = EncodeSession::new();
        let mut stage = session.stage();
        let err = stage
            .process(&Frame::solid_rgb(2, 2, [1, 1, 1]), 0)
            .unwrap_err();
        assert!(err.is_state());
        drop(stage);
        assert_eq!(session.frames_written(), 0);
    }
}
