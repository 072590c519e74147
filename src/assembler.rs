use crate::error::{Error, Result};

/// Reassembles arbitrary-length PCM chunks into fixed-size analysis frames.
///
/// Incoming bytes are decoded as little-endian signed 16-bit mono PCM,
/// normalized into `[-1.0, 1.0)` by dividing by 32768.0, and appended to an
/// internal buffer. Complete frames are sliced off the front; whatever
/// remains (always fewer than `frame_size` samples between calls) is carried
/// into the next chunk. Sample order is preserved exactly as received, across
/// any number of chunk boundaries.
pub struct FrameAssembler {
    frame_size: usize,
    buffer: Vec<f32>,
}

impl FrameAssembler {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            buffer: Vec::new(),
        }
    }

    /// Decode one raw chunk and append its samples to the buffer.
    ///
    /// Fails with [`Error::EmptyInput`] on a zero-length chunk and
    /// [`Error::UnalignedChunk`] on an odd byte count. Neither failure
    /// touches the buffer.
    pub fn feed(&mut self, raw: &[u8]) -> Result<()> {
        if raw.is_empty() {
            return Err(Error::EmptyInput);
        }

        if raw.len() % 2 != 0 {
            return Err(Error::UnalignedChunk(raw.len()));
        }

        self.buffer.reserve(raw.len() / 2);
        for pair in raw.chunks_exact(2) {
            let pcm = i16::from_le_bytes([pair[0], pair[1]]);
            self.buffer.push(pcm as f32 / 32768.0);
        }

        Ok(())
    }

    /// Slice the next complete frame off the front of the buffer.
    ///
    /// Returns `None` once fewer than `frame_size` samples remain; the
    /// remainder stays buffered for the next chunk. The consumed prefix is
    /// removed, not copied and kept.
    pub fn next_frame(&mut self) -> Option<Vec<f32>> {
        if self.buffer.len() < self.frame_size {
            return None;
        }

        Some(self.buffer.drain(..self.frame_size).collect())
    }

    /// Number of samples currently carried over.
    pub fn pending_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any carried samples.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub(crate) fn snapshot(&self) -> Vec<f32> {
        self.buffer.clone()
    }

    pub(crate) fn restore(&mut self, buffer: Vec<f32>) {
        self.buffer = buffer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn feed_rejects_empty_chunk() {
        let mut assembler = FrameAssembler::new(4);
        assert!(matches!(assembler.feed(&[]), Err(Error::EmptyInput)));
        assert_eq!(assembler.pending_samples(), 0);
    }

    #[test]
    fn feed_rejects_odd_byte_count_without_touching_buffer() {
        let mut assembler = FrameAssembler::new(4);
        assembler.feed(&pcm_bytes(&[100])).unwrap();

        let err = assembler.feed(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::UnalignedChunk(3)));
        assert_eq!(assembler.pending_samples(), 1);
    }

    #[test]
    fn normalizes_pcm_into_unit_range() {
        let mut assembler = FrameAssembler::new(4);
        assembler
            .feed(&pcm_bytes(&[0, 16_384, i16::MIN, i16::MAX]))
            .unwrap();

        let frame = assembler.next_frame().expect("expected one full frame");
        assert_eq!(frame[0], 0.0);
        assert_eq!(frame[1], 0.5);
        assert_eq!(frame[2], -1.0);
        assert_eq!(frame[3], 32_767.0 / 32_768.0);
    }

    #[test]
    fn carries_remainder_across_chunks_in_order() {
        let mut assembler = FrameAssembler::new(4);

        assembler.feed(&pcm_bytes(&[1, 2, 3])).unwrap();
        assert!(assembler.next_frame().is_none());
        assert_eq!(assembler.pending_samples(), 3);

        assembler.feed(&pcm_bytes(&[4, 5, 6])).unwrap();
        let frame = assembler.next_frame().expect("expected one full frame");
        let as_pcm: Vec<i16> = frame.iter().map(|s| (s * 32_768.0) as i16).collect();
        assert_eq!(as_pcm, vec![1, 2, 3, 4]);
        assert_eq!(assembler.pending_samples(), 2);
    }

    #[test]
    fn drains_multiple_frames_from_one_chunk() {
        let mut assembler = FrameAssembler::new(2);
        assembler.feed(&pcm_bytes(&[1, 2, 3, 4, 5])).unwrap();

        assert!(assembler.next_frame().is_some());
        assert!(assembler.next_frame().is_some());
        assert!(assembler.next_frame().is_none());
        assert_eq!(assembler.pending_samples(), 1);
    }

    #[test]
    fn clear_drops_carryover() {
        let mut assembler = FrameAssembler::new(4);
        assembler.feed(&pcm_bytes(&[1, 2, 3])).unwrap();
        assembler.clear();
        assert_eq!(assembler.pending_samples(), 0);
    }
}
