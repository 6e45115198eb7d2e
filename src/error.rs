//! Crate-level error types.

use std::fmt;

/// Errors from the pure frame-layout computation.
///
/// These are configuration errors: the requested geometry can never
/// become valid by retrying, and a failed setup leaves the previous
/// configuration in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// The dimensions cannot produce a layout: zero, too small for the
    /// format's sub-sampled planes, or so large the frame's byte extent
    /// overflows.
    InvalidDimensions {
        /// Requested frame width in pixels.
        width: u32,
        /// Requested frame height in pixels.
        height: u32,
    },
    /// The row stride cannot hold one row of the frame, is not a whole
    /// number of texels, or pads past `u32::MAX` for GPU copies.
    InvalidStride {
        /// The rejected stride in bytes.
        stride: u32,
        /// Minimum stride in bytes for the requested width and format.
        min: u64,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid frame dimensions {width}x{height}")
            }
            Self::InvalidStride { stride, min } => {
                write!(
                    f,
                    "invalid row stride {stride} (minimum {min} bytes, \
                     whole texels, padded row within u32)"
                )
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Errors produced by the framestream crate.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamError {
    /// Frame geometry rejected at setup.
    Layout(LayoutError),
    /// `update` or `bind` called before the first successful `setup`.
    NotConfigured,
    /// The previous frame has not been flushed by `bind` yet.
    FrameNotConsumed,
    /// The transfer slot scheduled for this frame is still owned by the
    /// GPU (its re-map has not completed).
    SlotBusy,
    /// The frame byte length does not match the configured layout.
    FrameSizeMismatch {
        /// Bytes required by the configured layout.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
    /// Re-mapping a transfer slot failed; the instance must be set up
    /// again before streaming can resume.
    MapFailed,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(e) => write!(f, "layout error: {e}"),
            Self::NotConfigured => {
                write!(f, "texture has not been configured")
            }
            Self::FrameNotConsumed => {
                write!(f, "previous frame was not consumed")
            }
            Self::SlotBusy => {
                write!(f, "transfer slot is still in flight")
            }
            Self::FrameSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "frame is {actual} bytes, configured layout \
                     requires {expected}"
                )
            }
            Self::MapFailed => {
                write!(f, "failed to re-map a transfer slot")
            }
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LayoutError> for StreamError {
    fn from(e: LayoutError) -> Self {
        Self::Layout(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_condition() {
        let e = StreamError::FrameNotConsumed;
        assert_eq!(e.to_string(), "previous frame was not consumed");

        let e = StreamError::FrameSizeMismatch {
            expected: 64,
            actual: 32,
        };
        assert_eq!(
            e.to_string(),
            "frame is 32 bytes, configured layout requires 64"
        );

        let e = LayoutError::InvalidStride {
            stride: 100,
            min: 128,
        };
        assert!(e.to_string().contains("100"));
        assert!(e.to_string().contains("128"));
    }

    #[test]
    fn test_layout_error_converts() {
        let layout = LayoutError::InvalidDimensions {
            width: 0,
            height: 4,
        };
        let stream: StreamError = layout.into();
        assert_eq!(stream, StreamError::Layout(layout));
    }
}
