/*!
    The transform chain abstraction.
*/

use crate::{Frame, Result};

/**
    One link in a frame processing chain.

    A stage receives every frame delivered to it together with its
    `frame_number`. It may inspect or consume the frame, or forward a
    (possibly replaced) frame to exactly one successor before returning.

    Returning `Ok(())` without forwarding is legal, for example while a
    filter is still buffering input. Returning an error aborts the whole run.

    Chains are built from borrows: a stage holds `&mut dyn TransformStage`
    to its successor and never owns it, so the caller decides how long every
    stage lives and can inspect or finalize stages after the run.

    The `frame` reference is only valid for the duration of the call; the
    producer reuses the underlying buffer for the next frame.
*/
pub trait TransformStage {
    fn process(&mut self, frame: &Frame, frame_number: u64) -> Result<()>;
}

impl<T: TransformStage + ?Sized> TransformStage for &mut T {
    fn process(&mut self, frame: &Frame, frame_number: u64) -> Result<()> {
        (**self).process(frame, frame_number)
    }
}

impl<T: TransformStage + ?Sized> TransformStage for Box<T> {
    fn process(&mut self, frame: &Frame, frame_number: u64) -> Result<()> {
        (**self).process(frame, frame_number)
    }
}

/**
    A stage backed by a closure. Created with [`from_fn`].
*/
pub struct FnStage<F> {
    f: F,
}

/**
    Create a stage that calls `f` for every frame.

    ```
    use framepipe_types::{Frame, PixelFormat, TransformStage, from_fn};

    let mut seen = Vec::new();
    let mut stage = from_fn(|_frame: &Frame, n| {
        seen.push(n);
        Ok(())
    });
    stage.process(&Frame::new(2, 2, PixelFormat::Rgb24), 7).unwrap();
    drop(stage);
    assert_eq!(seen, vec![7]);
    ```
*/
pub fn from_fn<F>(f: F) -> FnStage<F>
where
    F: FnMut(&Frame, u64) -> Result<()>,
{
    FnStage { f }
}

impl<F> TransformStage for FnStage<F>
where
    F: FnMut(&Frame, u64) -> Result<()>,
{
    fn process(&mut self, frame: &Frame, frame_number: u64) -> Result<()> {
        (self.f)(frame, frame_number)
    }
}

impl<F> std::fmt::Debug for FnStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, PixelFormat};

    struct Doubler<'a> {
        next: &'a mut dyn TransformStage,
    }

    impl TransformStage for Doubler<'_> {
        fn process(&mut self, frame: &Frame, frame_number: u64) -> Result<()> {
            self.next.process(frame, frame_number * 2)
        }
    }

    #[test]
    fn closures_see_every_frame() {
        let frame = Frame::new(1, 1, PixelFormat::Rgb24);
        let mut numbers = Vec::new();
        let mut stage = from_fn(|_: &Frame, n| {
            numbers.push(n);
            Ok(())
        });
        for n in 0..3 {
            stage.process(&frame, n).unwrap();
        }
        drop(stage);
        assert_eq!(numbers, vec![0, 1, 2]);
    }

    #[test]
    fn borrowed_successor_outlives_chain() {
        let frame = Frame::new(1, 1, PixelFormat::Rgb24);
        let mut numbers = Vec::new();
        let mut sink = from_fn(|_: &Frame, n| {
            numbers.push(n);
            Ok(())
        });
        {
            let mut head = Doubler { next: &mut sink };
            head.process(&frame, 3).unwrap();
        }
        sink.process(&frame, 1).unwrap();
        drop(sink);
        assert_eq!(numbers, vec![6, 1]);
    }

    #[test]
    fn errors_propagate_through_boxes() {
        let frame = Frame::new(1, 1, PixelFormat::Rgb24);
        let mut stage: Box<dyn TransformStage> =
            Box::new(from_fn(|_: &Frame, _| Err(Error::state("rejected"))));
        assert!(stage.process(&frame, 0).unwrap_err().is_state());
    }
}
