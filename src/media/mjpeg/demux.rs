// SPDX-License-Identifier: GPL-3.0-only

//! Incremental splitter for a stream of concatenated JPEG images
//!
//! Walks the JPEG marker structure (SOI, length-prefixed segments, entropy
//! coded scan data, EOI) so that `0xFFD9` bytes inside segment payloads are
//! never mistaken for the end of an image. Bytes between images, such as
//! multipart boundaries and part headers, are skipped.

use crate::constants::jpeg;
use crate::errors::{CameraError, CameraResult};
use std::io::Read;
use std::ops::Range;
use tracing::{debug, warn};

enum Step {
    NeedMore,
    Frame(Range<usize>),
    Corrupt(usize),
}

/// Pulls complete JPEG images out of a byte stream
#[derive(Debug)]
pub struct MjpegDemuxer<R> {
    reader: R,
    buf: Vec<u8>,
    /// Start of the image being assembled
    frame_start: Option<usize>,
    cursor: usize,
    in_scan: bool,
    eof: bool,
    frames: u64,
}

impl<R: Read> MjpegDemuxer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            frame_start: None,
            cursor: 0,
            in_scan: false,
            eof: false,
            frames: 0,
        }
    }

    /// Number of images returned so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Block until the next complete image is available
    ///
    /// Returns [`CameraError::EndOfStream`] once the source is exhausted; a
    /// trailing partial image is discarded. A malformed segment yields a
    /// [`CameraError::Decode`] and the demuxer resynchronizes on the next
    /// start-of-image marker.
    pub fn next_frame(&mut self) -> CameraResult<Vec<u8>> {
        loop {
            match self.parse() {
                Step::Frame(range) => {
                    let frame = self.buf[range.clone()].to_vec();
                    self.buf.drain(..range.end);
                    self.reset();
                    self.frames += 1;
                    debug!(frame = self.frames, bytes = frame.len(), "MJPEG frame boundary");
                    return Ok(frame);
                }
                Step::Corrupt(start) => {
                    self.buf.drain(..start + 2);
                    self.reset();
                    warn!("Corrupt JPEG segment in MJPEG stream, resynchronizing");
                    return Err(CameraError::Decode("corrupt JPEG segment".into()));
                }
                Step::NeedMore => {
                    if self.eof || !self.fill()? {
                        if self.frame_start.is_some() {
                            debug!(bytes = self.buf.len(), "Discarding truncated JPEG at end of stream");
                        }
                        return Err(CameraError::EndOfStream);
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        self.frame_start = None;
        self.cursor = 0;
        self.in_scan = false;
    }

    /// Read one chunk; false at end of stream
    fn fill(&mut self) -> CameraResult<bool> {
        let mut chunk = vec![0u8; jpeg::READ_CHUNK];
        let n = loop {
            match self.reader.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CameraError::backend("read MJPEG stream", e)),
            }
        };
        if n == 0 {
            self.eof = true;
            return Ok(false);
        }
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(true)
    }

    fn parse(&mut self) -> Step {
        let buf = &self.buf;
        let len = buf.len();

        let start = match self.frame_start {
            Some(start) => start,
            None => match find_soi(buf) {
                Some(start) => {
                    self.frame_start = Some(start);
                    self.cursor = start + 2;
                    start
                }
                None => {
                    // Keep a trailing marker prefix; it may start the next SOI.
                    let keep = usize::from(buf.last() == Some(&jpeg::MARKER));
                    self.buf.drain(..len - keep);
                    return Step::NeedMore;
                }
            },
        };

        let mut cursor = self.cursor;
        let mut frame_start = start;
        let step = loop {
            if self.in_scan {
                // Entropy-coded data runs until a marker that is not a
                // stuffed zero or a restart marker.
                loop {
                    if cursor + 1 >= len {
                        break;
                    }
                    if buf[cursor] != jpeg::MARKER {
                        cursor += 1;
                        continue;
                    }
                    match buf[cursor + 1] {
                        0x00 | jpeg::RST0..=jpeg::RST7 => cursor += 2,
                        jpeg::MARKER => cursor += 1,
                        _ => {
                            self.in_scan = false;
                            break;
                        }
                    }
                }
                if self.in_scan {
                    break Step::NeedMore;
                }
            }

            if cursor + 1 >= len {
                break Step::NeedMore;
            }
            if buf[cursor] != jpeg::MARKER {
                break Step::Corrupt(frame_start);
            }
            match buf[cursor + 1] {
                jpeg::MARKER => cursor += 1,
                jpeg::EOI => break Step::Frame(frame_start..cursor + 2),
                jpeg::SOI => {
                    // A new image started before the previous one ended.
                    frame_start = cursor;
                    cursor += 2;
                }
                jpeg::TEM | jpeg::RST0..=jpeg::RST7 => cursor += 2,
                marker => {
                    if cursor + 4 > len {
                        break Step::NeedMore;
                    }
                    let seg_len = u16::from_be_bytes([buf[cursor + 2], buf[cursor + 3]]) as usize;
                    if seg_len < 2 {
                        break Step::Corrupt(frame_start);
                    }
                    cursor += 2 + seg_len;
                    if marker == jpeg::SOS {
                        self.in_scan = true;
                    }
                }
            }
        };

        self.cursor = cursor;
        self.frame_start = Some(frame_start);
        step
    }
}

fn find_soi(buf: &[u8]) -> Option<usize> {
    buf.windows(2)
        .position(|w| w[0] == jpeg::MARKER && w[1] == jpeg::SOI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Minimal marker skeleton: SOI, APP0 with an embedded FFD9, SOS, scan, EOI
    fn skeleton(scan: &[u8]) -> Vec<u8> {
        let mut v = vec![0xFF, 0xD8];
        v.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x06, 0xFF, 0xD9, 0x00, 0x00]);
        v.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        v.extend_from_slice(scan);
        v.extend_from_slice(&[0xFF, 0xD9]);
        v
    }

    #[test]
    fn test_splits_concatenated_images() {
        let a = skeleton(&[1, 2, 0xFF, 0x00, 3]);
        let b = skeleton(&[4, 0xFF, 0xD3, 5]);
        let mut stream = b"--boundary\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        stream.extend_from_slice(&a);
        stream.extend_from_slice(b"\r\n--boundary\r\n\r\n");
        stream.extend_from_slice(&b);

        let mut demux = MjpegDemuxer::new(Cursor::new(stream));
        assert_eq!(demux.next_frame().unwrap(), a);
        assert_eq!(demux.next_frame().unwrap(), b);
        assert!(matches!(demux.next_frame(), Err(CameraError::EndOfStream)));
        assert_eq!(demux.frames(), 2);
    }

    #[test]
    fn test_truncated_tail_is_end_of_stream() {
        let mut a = skeleton(&[1, 2, 3]);
        a.truncate(a.len() - 1);
        let mut demux = MjpegDemuxer::new(Cursor::new(a));
        assert!(matches!(demux.next_frame(), Err(CameraError::EndOfStream)));
    }

    #[test]
    fn test_corrupt_segment_resyncs() {
        let mut stream = vec![0xFF, 0xD8, 0x12, 0x34];
        let good = skeleton(&[9]);
        stream.extend_from_slice(&good);
        let mut demux = MjpegDemuxer::new(Cursor::new(stream));
        assert!(matches!(demux.next_frame(), Err(CameraError::Decode(_))));
        assert_eq!(demux.next_frame().unwrap(), good);
    }
}
