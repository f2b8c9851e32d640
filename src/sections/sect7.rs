use std::fmt;
use std::io::{self, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{GribError, Result};
use crate::read_as;
use crate::reader::source::ReadAt;
use crate::sections::SECT_HEADER_SIZE;

const FILL_CHUNK_SIZE: usize = 64 * 1024;

/// Section 7: Data. The packed payload is loaded on demand into an internal
/// buffer shared by every reader of the section, so it can be consumed more
/// than once even when the backing source cannot seek.
///
/// All methods are safe to call from multiple threads. Fills are serialized
/// behind the state mutex; the first load error sticks and is reported to
/// every subsequent reader.
pub struct DataSection {
    length: u32,
    data_size: u32,
    state: Mutex<LazyState>,
}

struct LazyState {
    buffer: Vec<u8>,
    source: Option<PayloadSource>,
    fully_read: bool,
    read_err: Option<Arc<io::Error>>,
}

enum PayloadSource {
    Stream(Arc<Mutex<dyn Read + Send>>),
    Positioned { reader: Arc<dyn ReadAt>, offset: u64 },
}

impl DataSection {
    /// Decode an entire in-memory section slice (header and payload).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < SECT_HEADER_SIZE {
            return Err(GribError::Truncated {
                section: 7,
                expected: SECT_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let length = read_as!(u32, data, 0);
        if data[4] != 7 {
            return Err(GribError::SectionNumberMismatch {
                expected: 7,
                actual: data[4],
            });
        }
        if (length as usize) < SECT_HEADER_SIZE || data.len() < length as usize {
            return Err(GribError::Truncated {
                section: 7,
                expected: length as usize,
                actual: data.len().min(length as usize),
            });
        }

        Ok(Self {
            length,
            data_size: length - SECT_HEADER_SIZE as u32,
            state: Mutex::new(LazyState {
                buffer: data[SECT_HEADER_SIZE..length as usize].to_vec(),
                source: None,
                fully_read: true,
                read_err: None,
            }),
        })
    }

    /// Lazy handle over a shared forward-only stream positioned at the first
    /// payload byte. The handle never reads past the payload.
    pub fn from_stream(length: u32, reader: Arc<Mutex<dyn Read + Send>>) -> Self {
        Self::lazy(length, PayloadSource::Stream(reader))
    }

    /// Lazy handle over a positioned source; `offset` addresses the first
    /// payload byte.
    pub fn from_read_at(length: u32, reader: Arc<dyn ReadAt>, offset: u64) -> Self {
        Self::lazy(length, PayloadSource::Positioned { reader, offset })
    }

    fn lazy(length: u32, source: PayloadSource) -> Self {
        Self {
            length,
            data_size: length.saturating_sub(SECT_HEADER_SIZE as u32),
            state: Mutex::new(LazyState {
                buffer: Vec::new(),
                source: Some(source),
                fully_read: false,
                read_err: None,
            }),
        }
    }

    /// Length of the section in octets, header included.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Size of the payload in bytes (section length minus the 5-byte header).
    pub fn data_size(&self) -> u32 {
        self.data_size
    }

    /// Last error hit while loading the payload, if any.
    pub fn load_error(&self) -> Option<Arc<io::Error>> {
        self.lock().read_err.clone()
    }

    /// Load the whole payload and return a copy of it. Idempotent.
    pub fn data(&self) -> Result<Vec<u8>> {
        self.fill_to(self.data_size);

        let state = self.lock();
        if let Some(err) = &state.read_err {
            return Err(GribError::Io(clone_io(err)));
        }
        Ok(state.buffer.clone())
    }

    /// Streaming reader over the payload. Bytes are buffered as the cursor
    /// advances, so several readers can run against one section.
    pub fn data_reader(&self) -> DataReader<'_> {
        DataReader {
            section: self,
            offset: 0,
        }
    }

    /// Pull the rest of the payload out of the backing source.
    pub(crate) fn force_load(&self) -> Result<()> {
        self.fill_to(self.data_size);
        match &self.lock().read_err {
            Some(err) => Err(GribError::Io(clone_io(err))),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LazyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Grow the buffer until it holds `min_bytes` of payload, the source is
    /// exhausted, or a read fails. Terminal states make this a no-op.
    fn fill_to(&self, min_bytes: u32) {
        let mut state = self.lock();
        if state.fully_read || state.read_err.is_some() {
            return;
        }

        let target = min_bytes.min(self.data_size) as usize;
        while state.buffer.len() < target {
            let want = (target - state.buffer.len()).min(FILL_CHUNK_SIZE);
            let buffered = state.buffer.len();
            let mut chunk = vec![0u8; want];

            let result = match &state.source {
                Some(PayloadSource::Stream(reader)) => reader
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .read(&mut chunk),
                Some(PayloadSource::Positioned { reader, offset }) => {
                    reader.read_at(&mut chunk, offset + buffered as u64)
                }
                None => Ok(0),
            };

            match result {
                Ok(0) => {
                    state.fully_read = true;
                    state.source = None;
                    break;
                }
                Ok(n) => state.buffer.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    state.read_err = Some(Arc::new(err));
                    break;
                }
            }
        }

        if state.buffer.len() >= self.data_size as usize {
            state.fully_read = true;
            state.source = None;
        }
    }
}

impl fmt::Debug for DataSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("DataSection")
            .field("length", &self.length)
            .field("data_size", &self.data_size)
            .field("buffered", &state.buffer.len())
            .field("fully_read", &state.fully_read)
            .finish()
    }
}

fn clone_io(err: &Arc<io::Error>) -> io::Error {
    io::Error::new(err.kind(), err.to_string())
}

/// Cursor over a [`DataSection`] payload.
pub struct DataReader<'a> {
    section: &'a DataSection,
    offset: usize,
}

impl Read for DataReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let needed = (self.offset + buf.len()).min(self.section.data_size as usize);
        self.section.fill_to(needed as u32);

        let state = self.section.lock();
        if let Some(err) = &state.read_err {
            return Err(clone_io(err));
        }

        let available = state.buffer.len().saturating_sub(self.offset);
        if available == 0 {
            return Ok(0);
        }

        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&state.buffer[self.offset..self.offset + n]);
        self.offset += n;

        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sect7_bytes(payload: &[u8]) -> Vec<u8> {
        let length = (SECT_HEADER_SIZE + payload.len()) as u32;
        let mut data = vec![0u8; SECT_HEADER_SIZE];
        data[0..4].copy_from_slice(&length.to_be_bytes());
        data[4] = 7;
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn eager_from_bytes() {
        let payload: Vec<u8> = (0..100).collect();
        let sect = DataSection::from_bytes(&sect7_bytes(&payload)).unwrap();
        assert_eq!(sect.data_size(), 100);
        assert_eq!(sect.data().unwrap(), payload);
        assert!(sect.load_error().is_none());
    }

    #[test]
    fn stream_fill_is_capped_at_payload() {
        let payload: Vec<u8> = (0..100).collect();
        let mut stream = payload.clone();
        stream.extend_from_slice(b"7777"); // next section must stay unread

        let reader: Arc<Mutex<dyn Read + Send>> =
            Arc::new(Mutex::new(std::io::Cursor::new(stream)));
        let sect = DataSection::from_stream(105, reader.clone());

        assert_eq!(sect.data().unwrap(), payload);

        let mut rest = Vec::new();
        reader
            .lock()
            .unwrap()
            .read_to_end(&mut rest)
            .unwrap();
        assert_eq!(rest, b"7777");
    }

    #[test]
    fn data_reader_matches_data() {
        let payload: Vec<u8> = (0..200_000u32).map(|v| v as u8).collect();
        let source: Arc<dyn ReadAt> = Arc::new(sect7_bytes(&payload));
        let sect = DataSection::from_read_at(
            (SECT_HEADER_SIZE + payload.len()) as u32,
            source,
            SECT_HEADER_SIZE as u64,
        );

        let mut streamed = Vec::new();
        sect.data_reader().read_to_end(&mut streamed).unwrap();
        assert_eq!(streamed, payload);
        assert_eq!(sect.data().unwrap(), payload);
    }

    #[test]
    fn short_stream_marks_fully_read() {
        let reader: Arc<Mutex<dyn Read + Send>> =
            Arc::new(Mutex::new(std::io::Cursor::new(vec![1u8, 2, 3])));
        let sect = DataSection::from_stream(15, reader);

        assert_eq!(sect.data().unwrap(), vec![1, 2, 3]);
        assert!(sect.load_error().is_none());
    }

    #[test]
    fn partial_then_full_reads() {
        let payload: Vec<u8> = (0..50).collect();
        let reader: Arc<Mutex<dyn Read + Send>> =
            Arc::new(Mutex::new(std::io::Cursor::new(payload.clone())));
        let sect = DataSection::from_stream(55, reader);

        let mut cursor = sect.data_reader();
        let mut head = [0u8; 10];
        cursor.read_exact(&mut head).unwrap();
        assert_eq!(&head[..], &payload[..10]);

        // A second reader starts over and still sees everything.
        let mut all = Vec::new();
        sect.data_reader().read_to_end(&mut all).unwrap();
        assert_eq!(all, payload);
    }
}
