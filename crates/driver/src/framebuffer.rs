use crate::error::FrameBufferError;

/// Read-only description of where the picture lives in core memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub base_offset: usize,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl FrameBuffer {
    pub const WIDTH: usize = 256;
    pub const HEIGHT: usize = 240;
    pub const CHANNELS: usize = 3;

    pub fn new(base_offset: usize) -> Self {
        Self {
            base_offset,
            width: Self::WIDTH,
            height: Self::HEIGHT,
            channels: Self::CHANNELS,
        }
    }

    pub fn source_len(&self) -> usize {
        self.width * self.height * self.channels
    }

    pub fn display_len(&self) -> usize {
        self.width * self.height * 4
    }

    fn window<'a>(&self, memory: &'a [u8]) -> Result<&'a [u8], FrameBufferError> {
        let start = self.base_offset;
        let end = start.checked_add(self.source_len());
        end.and_then(|end| memory.get(start..end))
            .ok_or(FrameBufferError::OutOfBounds {
                start,
                end: end.unwrap_or(usize::MAX),
                len: memory.len(),
            })
    }

    pub fn to_display_buffer(&self, memory: &[u8]) -> Result<Vec<u8>, FrameBufferError> {
        let mut out = vec![0xff; self.display_len()];
        self.write_display_buffer(memory, &mut out)?;
        Ok(out)
    }

    /// Expand the RGB window into `out` as RGBA with opaque alpha.
    pub fn write_display_buffer(
        &self,
        memory: &[u8],
        out: &mut [u8],
    ) -> Result<(), FrameBufferError> {
        if out.len() != self.display_len() {
            return Err(FrameBufferError::OutputSize {
                expected: self.display_len(),
                actual: out.len(),
            });
        }
        let src = self.window(memory)?;

        for row in 0..self.height {
            for col in 0..self.width {
                let s = row * self.width * self.channels + col * self.channels;
                let d = row * self.width * 4 + col * 4;
                out[d] = src[s];
                out[d + 1] = src[s + 1];
                out[d + 2] = src[s + 2];
                out[d + 3] = 0xff;
            }
        }

        Ok(())
    }
}
