use std::io::{self, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::error::{GribError, Result};
use crate::sections::sect7::DataSection;
use crate::sections::{
    Indicator, Section, SECT0_IS_MAGIC, SECT0_IS_SIZE, SECT8_ES_MAGIC, SECT8_ES_SIZE,
    SECT_HEADER_SIZE,
};
use crate::skip;

pub mod assemble;
pub mod http;
pub mod message;
mod reader_at;
pub mod source;

pub use reader_at::GribReaderAt;

use assemble::Assembler;
use message::{FlatMessage, MessageInfo, SectionInfo};

/// Sequential GRIB2 scanner over a forward-only byte stream.
///
/// The stream is shared with the Section 7 handles this reader produces;
/// before the next section is read, the pending handle is drained so the
/// stream stays aligned with the section framing.
pub struct GribReader<R: Read + Send + 'static> {
    reader: Arc<Mutex<R>>,
    offset: u64,
    pending_data: Option<Arc<DataSection>>,
}

impl<R: Read + Send + 'static> GribReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
            offset: 0,
            pending_data: None,
        }
    }

    /// Offset of the next unread section.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Read the next section. `Ok(None)` signals a clean end of stream at a
    /// section boundary.
    pub fn read_section(&mut self) -> Result<Option<Section>> {
        if let Some(pending) = self.pending_data.take() {
            pending.force_load()?;
        }

        let mut first4 = [0u8; 4];
        if !self.read_exact_or_eof(&mut first4)? {
            return Ok(None);
        }

        if first4 == *SECT0_IS_MAGIC {
            let mut data = [0u8; SECT0_IS_SIZE];
            data[..4].copy_from_slice(&first4);
            self.read_body(&mut data[4..])?;
            let indicator = Indicator::from_bytes(&data)?;
            debug!("read section 0 : {}", SECT0_IS_SIZE);
            self.offset += SECT0_IS_SIZE as u64;
            return Ok(Some(Section::Section0(indicator)));
        }

        if first4 == *SECT8_ES_MAGIC {
            debug!("read section 8 : {}", SECT8_ES_SIZE);
            self.offset += SECT8_ES_SIZE as u64;
            return Ok(Some(Section::Section8));
        }

        let length = u32::from_be_bytes(first4);
        if length < SECT_HEADER_SIZE as u32 {
            return Err(GribError::InvalidLength {
                offset: self.offset,
                length,
            });
        }

        let mut number = [0u8; 1];
        self.read_body(&mut number)?;
        let number = number[0];
        if !(1..=7).contains(&number) {
            return Err(GribError::InvalidSectionNumber {
                offset: self.offset,
                number,
            });
        }

        debug!("read section {} : {}", number, length);

        let section = if number == 7 {
            let handle = Arc::new(DataSection::from_stream(
                length,
                self.reader.clone() as Arc<Mutex<dyn Read + Send>>,
            ));
            self.pending_data = Some(handle.clone());
            Section::Section7(handle)
        } else {
            let mut data = vec![0u8; length as usize];
            data[..4].copy_from_slice(&first4);
            data[4] = number;
            self.read_body(&mut data[SECT_HEADER_SIZE..])?;
            Section::from_bytes(number, &data)?
        };

        self.offset += length as u64;
        Ok(Some(section))
    }

    /// Iterate message envelopes in file order. The callback returns `true`
    /// to keep scanning.
    pub fn each_message(&mut self, mut f: impl FnMut(usize, MessageInfo) -> bool) -> Result<()> {
        let mut index = 0;
        while let Some((info, _)) = self.next_message(index)? {
            if !f(index, info) {
                break;
            }
            index += 1;
        }
        Ok(())
    }

    /// Iterate data fields in file order, one [`FlatMessage`] per field.
    pub fn each_flat_message(
        &mut self,
        mut f: impl FnMut(usize, FlatMessage) -> bool,
    ) -> Result<()> {
        let mut index = 0;
        let mut flat_index = 0;
        'messages: while let Some((info, sections)) = self.next_message(index)? {
            let mut assembler = Assembler::new();
            for section in sections {
                assembler.push(section);
            }
            for warning in assembler.warnings() {
                warn!("message {} : {}", index, warning);
            }

            let message = assembler.into_message(info)?;
            for mut flat in message.flatten() {
                flat.index = flat_index;
                if !f(flat_index, flat) {
                    break 'messages;
                }
                flat_index += 1;
            }
            index += 1;
        }
        Ok(())
    }

    /// Read every section of the next message, framing it against the total
    /// length declared in Section 0.
    fn next_message(&mut self, index: usize) -> Result<Option<(MessageInfo, Vec<Section>)>> {
        let msg_offset = self.offset;
        let Some(indicator) = self.read_indicator()? else {
            return Ok(None);
        };

        let total_length = indicator.total_length;
        let discipline = indicator.discipline;
        let edition = indicator.edition;

        let mut sections = vec![SectionInfo {
            number: 0,
            offset: msg_offset,
            length: SECT0_IS_SIZE as u32,
        }];
        let mut decoded = vec![Section::Section0(indicator)];
        let mut consumed = SECT0_IS_SIZE as u64;
        let mut terminated = false;

        while consumed < total_length {
            let sec_offset = self.offset;
            let Some(section) = self.read_section()? else {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended inside a message",
                )
                .into());
            };

            let length = section.length();
            consumed += length as u64;
            if consumed > total_length {
                return Err(GribError::OverlongSection(index));
            }

            sections.push(SectionInfo {
                number: section.number(),
                offset: sec_offset,
                length,
            });
            let is_end = matches!(section, Section::Section8);
            decoded.push(section);
            if is_end {
                terminated = consumed == total_length;
                break;
            }
        }

        if !terminated {
            warn!(
                "{}",
                GribError::UnterminatedMessage(index)
            );
        }
        if consumed < total_length {
            // Stay aligned with the next message despite the early end marker.
            let extra = (total_length - consumed) as usize;
            let mut reader = self.lock_reader();
            skip!(reader, extra);
            drop(reader);
            self.offset += extra as u64;
        }

        Ok(Some((
            MessageInfo {
                index,
                offset: msg_offset,
                length: total_length,
                discipline,
                edition,
                sections,
            },
            decoded,
        )))
    }

    /// Read the Section 0 expected at a message boundary. Anything other
    /// than the `GRIB` magic here is fatal; no resynchronisation is tried.
    fn read_indicator(&mut self) -> Result<Option<Indicator>> {
        if let Some(pending) = self.pending_data.take() {
            pending.force_load()?;
        }

        let mut data = [0u8; SECT0_IS_SIZE];
        if !self.read_exact_or_eof(&mut data[..4])? {
            return Ok(None);
        }
        if data[..4] != *SECT0_IS_MAGIC {
            return Err(GribError::InvalidMagic(self.offset));
        }
        self.read_body(&mut data[4..])?;

        let indicator = Indicator::from_bytes(&data)?;
        debug!("read section 0 : {}", SECT0_IS_SIZE);
        self.offset += SECT0_IS_SIZE as u64;
        Ok(Some(indicator))
    }

    fn lock_reader(&self) -> MutexGuard<'_, R> {
        self.reader.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_body(&mut self, buf: &mut [u8]) -> Result<()> {
        self.lock_reader().read_exact(buf)?;
        Ok(())
    }

    fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> Result<bool> {
        let mut reader = self.lock_reader();
        let mut read = 0usize;
        while read < buf.len() {
            match reader.read(&mut buf[read..]) {
                Ok(0) if read == 0 => return Ok(false),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "unexpected end of stream",
                    )
                    .into())
                }
                Ok(n) => read += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    }
}
