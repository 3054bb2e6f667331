/*!
    The decode loop.
*/

use std::ops::ControlFlow;

use tracing::{debug, info};

use framepipe_source::MediaContainer;
use framepipe_types::{
    Error, Frame, FrameDecoder, PacketSource, PixelFormat, Pull, Rational, Result, TransformStage,
    VideoParams,
};

use crate::{RunOptions, VideoDecoder};

/**
    Decodes one video stream and feeds every frame into a transform chain.

    The session borrows its packet source for its whole lifetime and owns
    the decoder and the frame buffer handed to the chain. That buffer is
    rewritten for every frame; stages only see it for the duration of their
    `process` call.
*/
pub struct DecodeSession<
    'a,
    S: PacketSource + ?Sized = MediaContainer,
    D: FrameDecoder = VideoDecoder,
> {
    source: &'a mut S,
    decoder: D,
    stream_index: usize,
    params: VideoParams,
    frame: Frame,
}

impl<'a> DecodeSession<'a> {
    /**
        Set up decoding of `stream_index` in `container`.

        Fails with a codec error if the stream does not exist, is not a
        video stream, or has no usable decoder.
    */
    pub fn initialize(container: &'a mut MediaContainer, stream_index: usize) -> Result<Self> {
        let descriptor = container
            .stream(stream_index)
            .ok_or_else(|| Error::codec(format!("stream {stream_index} does not exist")))?;

        let params = match descriptor.video {
            Some(params) if descriptor.is_video() => params,
            _ => {
                return Err(Error::codec(format!(
                    "stream {stream_index} is {}, not video",
                    descriptor.kind
                )));
            }
        };

        let decoder = VideoDecoder::new(container.codec_config(stream_index)?)?;

        info!(
            path = %container.path().display(),
            stream_index,
            width = params.width,
            height = params.height,
            frame_rate = %params.frame_rate,
            "decode session ready"
        );

        Ok(Self::with_decoder(container, stream_index, decoder).with_video_params(params))
    }
}

impl<'a, S: PacketSource + ?Sized, D: FrameDecoder> DecodeSession<'a, S, D> {
    /**
        Create a session from any packet source and decoder.
    */
    pub fn with_decoder(source: &'a mut S, stream_index: usize, decoder: D) -> Self {
        Self {
            source,
            decoder,
            stream_index,
            params: VideoParams {
                width: 0,
                height: 0,
                frame_rate: Rational::new(0, 1),
            },
            frame: Frame::new(0, 0, PixelFormat::CANONICAL_DECODE),
        }
    }

    /**
        Set the stream geometry reported by the accessors.
    */
    pub fn with_video_params(mut self, params: VideoParams) -> Self {
        self.params = params;
        self
    }

    /**
        Index of the stream being decoded.
    */
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /**
        Width of the stream, as reported by the container.
    */
    pub fn width(&self) -> u32 {
        self.params.width
    }

    /**
        Height of the stream, as reported by the container.
    */
    pub fn height(&self) -> u32 {
        self.params.height
    }

    /**
        Frame rate of the stream (0/1 when unknown).
    */
    pub fn frame_rate(&self) -> Rational {
        self.params.frame_rate
    }

    /**
        Decode the stream from the start, delivering every frame to `chain`.

        Frames are numbered from 0 in delivery order, including frames that
        only come out when the decoder is flushed at end of input. The run
        stops as soon as the frame budget in `options` is reached, even in
        the middle of a packet, and the decoder is not flushed in that case.

        Returns the number of frames delivered. Any decoder or chain error
        aborts the run.
    */
    pub fn run(&mut self, chain: &mut dyn TransformStage, options: RunOptions) -> Result<usize> {
        self.source.seek_to_start(self.stream_index)?;
        self.decoder.reset();

        let budget = options.budget();
        let mut delivered = 0;

        while let Some(packet) = self.source.read_packet()? {
            if packet.stream_index != self.stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;
            if self.drain(chain, &mut delivered, budget)?.is_break() {
                info!(frames = delivered, "frame limit reached");
                return Ok(delivered);
            }
        }

        self.decoder.send_eof()?;
        self.drain(chain, &mut delivered, budget)?;

        info!(frames = delivered, "decoding finished");
        Ok(delivered)
    }

    fn drain(
        &mut self,
        chain: &mut dyn TransformStage,
        delivered: &mut usize,
        budget: Option<usize>,
    ) -> Result<ControlFlow<()>> {
        loop {
            match self.decoder.receive_frame(&mut self.frame)? {
                Pull::Frame => {}
                Pull::NotReady | Pull::EndOfStream => return Ok(ControlFlow::Continue(())),
            }

            let frame_number = *delivered as u64;
            debug!(
                frame_number,
                width = self.frame.width(),
                height = self.frame.height(),
                "decoded frame"
            );
            chain.process(&self.frame, frame_number)?;
            *delivered += 1;

            if budget.is_some_and(|max| *delivered >= max) {
                return Ok(ControlFlow::Break(()));
            }
        }
    }
}

impl<S: PacketSource + ?Sized, D: FrameDecoder> std::fmt::Debug for DecodeSession<'_, S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSession")
            .field("stream_index", &self.stream_index)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
