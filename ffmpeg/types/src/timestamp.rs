/*!
    Timestamp types for media timing.
*/

/**
    Presentation timestamp in time_base units.

    This is the raw timestamp value from the media stream, or a frame
    counter when encoding.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Returns the PTS that follows this one in a counter-style timeline.
    */
    #[inline]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<i64> for Pts {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Pts> for i64 {
    fn from(pts: Pts) -> Self {
        pts.0
    }
}
