/*!
    Stage backed by an FFmpeg filter graph.
*/

use ffmpeg_next::{
    self as ffmpeg, ffi, filter, util::error::EAGAIN, util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::{debug, info};

use framepipe_types::{Error, Frame, PixelFormat, Pull, Result, TransformStage};

use crate::bridge::{copy_from_ffmpeg, copy_to_ffmpeg, pixel_to_ffmpeg};

const GRAYSCALE: &str = "format=gray,format=rgb24";
const OUTPUT_FORMAT: &str = "format=rgb24";

/**
    Runs every frame through an FFmpeg filter graph.

    The graph is `buffer -> description -> format=rgb24 -> buffersink`. It
    is built on the first frame, using that frame's size and pixel format,
    and is never rebuilt: every later frame must have the same geometry.

    Each call pushes one frame and pulls at most one. When the graph holds
    the frame back (or has finished) nothing is forwarded, so frame numbers
    seen by the successor can have gaps for buffering filters. Forwarded
    frames keep the number of the frame that was pushed.
*/
pub struct FilterStage<'a> {
    description: String,
    graph: Option<filter::Graph>,
    next: Option<&'a mut dyn TransformStage>,
    filtered: VideoFrameFFmpeg,
    output: Frame,
}

impl<'a> FilterStage<'a> {
    /**
        Create a stage running the given filter description.
    */
    pub fn new(description: impl Into<String>, next: Option<&'a mut dyn TransformStage>) -> Self {
        Self {
            description: description.into(),
            graph: None,
            next,
            filtered: VideoFrameFFmpeg::empty(),
            output: Frame::new(0, 0, PixelFormat::Rgb24),
        }
    }

    /**
        Grayscale preset (output stays RGB24, with R = G = B).
    */
    pub fn grayscale(next: Option<&'a mut dyn TransformStage>) -> Self {
        Self::new(GRAYSCALE, next)
    }

    /**
        Brightness/contrast preset built on the `eq` filter.

        `brightness` is offset by one and `contrast` scaled by 100 before
        being handed to `eq`.
    */
    pub fn brightness_contrast(
        brightness: f64,
        contrast: f64,
        next: Option<&'a mut dyn TransformStage>,
    ) -> Self {
        Self::new(brightness_contrast_description(brightness, contrast), next)
    }

    /**
        The filter description this stage runs.
    */
    pub fn description(&self) -> &str {
        &self.description
    }

    /**
        Returns true once the graph has been built.
    */
    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    /**
        Replace the successor stage.
    */
    pub fn set_next(&mut self, next: Option<&'a mut dyn TransformStage>) {
        self.next = next;
    }

    fn build_graph(&self, frame: &Frame) -> Result<filter::Graph> {
        ffmpeg::init().map_err(|e| Error::filter_graph(e.to_string()))?;

        let mut graph = filter::Graph::new();
        let pixel = ffi::AVPixelFormat::from(pixel_to_ffmpeg(frame.format()));
        let args = format!(
            "video_size={}x{}:pix_fmt={}:time_base=1/1:pixel_aspect=1/1",
            frame.width(),
            frame.height(),
            pixel as i32
        );

        let buffer =
            filter::find("buffer").ok_or_else(|| Error::filter_graph("buffer filter missing"))?;
        let buffersink = filter::find("buffersink")
            .ok_or_else(|| Error::filter_graph("buffersink filter missing"))?;

        graph
            .add(&buffer, "in", &args)
            .map_err(|e| Error::filter_graph(format!("buffer source: {e}")))?;
        graph
            .add(&buffersink, "out", "")
            .map_err(|e| Error::filter_graph(format!("buffer sink: {e}")))?;

        let spec = full_description(&self.description);
        graph
            .output("in", 0)
            .and_then(|parser| parser.input("out", 0))
            .and_then(|parser| parser.parse(&spec))
            .map_err(|e| Error::filter_graph(format!("parse '{spec}': {e}")))?;
        graph
            .validate()
            .map_err(|e| Error::filter_graph(format!("configure '{spec}': {e}")))?;

        info!(
            filter = %spec,
            width = frame.width(),
            height = frame.height(),
            format = %frame.format(),
            "filter graph ready"
        );

        Ok(graph)
    }

    fn push(graph: &mut filter::Graph, frame: &Frame, frame_number: u64) -> Result<()> {
        // The buffer source takes ownership of the frame's buffers
        let mut input = VideoFrameFFmpeg::new(
            pixel_to_ffmpeg(frame.format()),
            frame.width(),
            frame.height(),
        );
        copy_to_ffmpeg(frame, &mut input)?;
        input.set_pts(Some(frame_number as i64));

        graph
            .get("in")
            .ok_or_else(|| Error::filter_graph("buffer source missing"))?
            .source()
            .add(&input)
            .map_err(|e| Error::filter_graph(format!("push frame: {e}")))
    }

    fn pull(graph: &mut filter::Graph, output: &mut VideoFrameFFmpeg) -> Result<Pull> {
        let mut sink = graph
            .get("out")
            .ok_or_else(|| Error::filter_graph("buffer sink missing"))?;
        match sink.sink().frame(output) {
            Ok(()) => Ok(Pull::Frame),
            Err(ffmpeg::Error::Other { errno }) if errno == EAGAIN => Ok(Pull::NotReady),
            Err(ffmpeg::Error::Eof) => Ok(Pull::EndOfStream),
            Err(e) => Err(Error::filter_graph(format!("pull frame: {e}"))),
        }
    }
}

impl TransformStage for FilterStage<'_> {
    fn process(&mut self, frame: &Frame, frame_number: u64) -> Result<()> {
        if self.graph.is_none() {
            self.graph = Some(self.build_graph(frame)?);
        }
        let Some(graph) = self.graph.as_mut() else {
            return Err(Error::filter_graph("filter graph not built"));
        };

        Self::push(graph, frame, frame_number)?;

        self.filtered = VideoFrameFFmpeg::empty();
        match Self::pull(graph, &mut self.filtered)? {
            Pull::Frame => {}
            pull => {
                debug!(frame_number, ?pull, "filter produced no frame");
                return Ok(());
            }
        }

        copy_from_ffmpeg(&self.filtered, &mut self.output)?;

        match self.next.as_mut() {
            Some(next) => next.process(&self.output, frame_number),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for FilterStage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStage")
            .field("description", &self.description)
            .field("initialized", &self.graph.is_some())
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

fn brightness_contrast_description(brightness: f64, contrast: f64) -> String {
    format!(
        "eq=brightness={}:contrast={}",
        brightness + 1.0,
        contrast * 100.0
    )
}

fn full_description(description: &str) -> String {
    if description.ends_with(OUTPUT_FORMAT) {
        description.to_string()
    } else {
        format!("{description},{OUTPUT_FORMAT}")
    }
}
