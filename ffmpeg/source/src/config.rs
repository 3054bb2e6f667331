/*!
    Codec configuration handed from a container to a decoder.
*/

use ffmpeg_next::codec::Parameters;

use framepipe_types::{MediaKind, Rational};

/**
    Everything a decoder needs to know about one stream.

    Wraps the stream's FFmpeg codec parameters together with the stream
    index, kind and time base so the decoder does not need access to the
    container itself.
*/
pub struct CodecConfig {
    parameters: Parameters,
    stream_index: usize,
    kind: MediaKind,
    time_base: Rational,
}

impl CodecConfig {
    pub(crate) fn new(
        parameters: Parameters,
        stream_index: usize,
        kind: MediaKind,
        time_base: Rational,
    ) -> Self {
        Self {
            parameters,
            stream_index,
            kind,
            time_base,
        }
    }

    /**
        Index of the stream these parameters describe.
    */
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /**
        Media kind of the stream.
    */
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /**
        Time base of the stream's packet timestamps.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Borrow the raw FFmpeg codec parameters.
    */
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /**
        Consume the config, returning the raw FFmpeg codec parameters.
    */
    pub fn into_parameters(self) -> Parameters {
        self.parameters
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("stream_index", &self.stream_index)
            .field("kind", &self.kind)
            .field("codec", &self.parameters.id())
            .field("time_base", &self.time_base)
            .finish()
    }
}
