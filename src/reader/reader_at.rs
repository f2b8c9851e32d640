use std::io;
use std::sync::Arc;

use log::warn;

use crate::error::{GribError, Result};
use crate::reader::assemble::Assembler;
use crate::reader::message::{FlatMessage, Message, MessageInfo, SectionInfo};
use crate::reader::source::{read_exact_at, try_read_exact_at, ReadAt};
use crate::sections::sect7::DataSection;
use crate::sections::{
    Indicator, Section, SectionHeader, SECT0_IS_MAGIC, SECT0_IS_SIZE, SECT8_ES_MAGIC,
    SECT8_ES_SIZE, SECT_HEADER_SIZE,
};

/// Random-access GRIB2 scanner over a positioned byte source.
///
/// Scanning discovers message and section boundaries from headers alone;
/// section bodies are only fetched when they are decoded, and Section 7
/// payloads only when a consumer asks for the bytes. This keeps the cost of
/// indexing a remote multi-hundred-megabyte file down to a handful of small
/// range reads.
pub struct GribReaderAt<R: ReadAt + 'static> {
    reader: Arc<R>,
}

impl<R: ReadAt + 'static> GribReaderAt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(reader),
        }
    }

    /// Determine `(number, length)` of the section starting at `offset`
    /// without touching its body. `Ok(None)` signals a clean end of source.
    fn frame_section_at(&self, offset: u64) -> Result<Option<SectionHeader>> {
        let mut first4 = [0u8; 4];
        if !try_read_exact_at(&*self.reader, &mut first4, offset)? {
            return Ok(None);
        }

        if first4 == *SECT0_IS_MAGIC {
            return Ok(Some(SectionHeader {
                size: SECT0_IS_SIZE,
                number: 0,
            }));
        }
        if first4 == *SECT8_ES_MAGIC {
            return Ok(Some(SectionHeader {
                size: SECT8_ES_SIZE,
                number: 8,
            }));
        }

        let length = u32::from_be_bytes(first4);
        if length < SECT_HEADER_SIZE as u32 {
            return Err(GribError::InvalidLength { offset, length });
        }

        let mut number = [0u8; 1];
        read_exact_at(&*self.reader, &mut number, offset + 4)?;
        if !(1..=7).contains(&number[0]) {
            return Err(GribError::InvalidSectionNumber {
                offset,
                number: number[0],
            });
        }

        Ok(Some(SectionHeader {
            size: length as usize,
            number: number[0],
        }))
    }

    /// Decode the section starting at `offset`. Section 7 payloads stay
    /// unread; the returned handle fetches them on demand.
    pub fn read_section_at(&self, offset: u64) -> Result<Section> {
        let header = self.frame_section_at(offset)?.ok_or_else(|| {
            GribError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no section at offset",
            ))
        })?;

        if header.number == 7 {
            let handle = DataSection::from_read_at(
                header.size as u32,
                self.reader.clone() as Arc<dyn ReadAt>,
                offset + SECT_HEADER_SIZE as u64,
            );
            return Ok(Section::Section7(Arc::new(handle)));
        }

        let mut data = vec![0u8; header.size];
        read_exact_at(&*self.reader, &mut data, offset)?;
        Section::from_bytes(header.number, &data)
    }

    /// Iterate message envelopes in file order. The callback returns `true`
    /// to keep scanning; returning `false` stops cleanly at the next message
    /// boundary.
    pub fn each_message(&self, mut f: impl FnMut(usize, MessageInfo) -> bool) -> Result<()> {
        let mut offset = 0u64;
        let mut index = 0usize;

        loop {
            let mut first4 = [0u8; 4];
            if !try_read_exact_at(&*self.reader, &mut first4, offset)? {
                break;
            }
            if first4 != *SECT0_IS_MAGIC {
                return Err(GribError::InvalidMagic(offset));
            }

            let mut header = [0u8; SECT0_IS_SIZE];
            read_exact_at(&*self.reader, &mut header, offset)?;
            let indicator = Indicator::from_bytes(&header)?;

            let (sections, terminated) =
                self.scan_sections(offset, offset + indicator.total_length, index)?;
            if !terminated {
                warn!("{}", GribError::UnterminatedMessage(index));
            }

            let info = MessageInfo {
                index,
                offset,
                length: indicator.total_length,
                discipline: indicator.discipline,
                edition: indicator.edition,
                sections,
            };
            if !f(index, info) {
                break;
            }

            offset += indicator.total_length;
            index += 1;
        }

        Ok(())
    }

    /// Iterate data fields in file order, one [`FlatMessage`] per field with
    /// a running index across the whole stream.
    pub fn each_flat_message(&self, mut f: impl FnMut(usize, FlatMessage) -> bool) -> Result<()> {
        let mut flat_index = 0usize;
        let mut failure = None;

        self.each_message(|_, info| {
            let message = match self.read_message(&info) {
                Ok(message) => message,
                Err(err) => {
                    failure = Some(err);
                    return false;
                }
            };

            for mut flat in message.flatten() {
                flat.index = flat_index;
                if !f(flat_index, flat) {
                    return false;
                }
                flat_index += 1;
            }
            true
        })?;

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Decode every section named by `info` and assemble the nested message.
    pub fn read_message(&self, info: &MessageInfo) -> Result<Message> {
        let mut assembler = Assembler::new();
        for sec_info in &info.sections {
            assembler.push(self.read_section_at(sec_info.offset)?);
        }
        for warning in assembler.warnings() {
            warn!("message {} : {}", info.index, warning);
        }
        assembler.into_message(info.clone())
    }

    /// Frame the sections of one message without decoding any body, walking
    /// `[start, end)` until the end marker.
    fn scan_sections(
        &self,
        start: u64,
        end: u64,
        index: usize,
    ) -> Result<(Vec<SectionInfo>, bool)> {
        let mut sections = Vec::new();
        let mut offset = start;
        let mut terminated = false;

        while offset < end {
            let Some(header) = self.frame_section_at(offset)? else {
                break;
            };
            if offset + header.size as u64 > end {
                return Err(GribError::OverlongSection(index));
            }

            sections.push(SectionInfo {
                number: header.number,
                offset,
                length: header.size as u32,
            });
            offset += header.size as u64;

            if header.number == 8 {
                terminated = offset == end;
                break;
            }
        }

        Ok((sections, terminated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(bytes: Vec<u8>) -> GribReaderAt<Vec<u8>> {
        GribReaderAt::new(bytes)
    }

    #[test]
    fn frames_magic_sections() {
        let reader = framed(b"GRIB".to_vec());
        let header = reader.frame_section_at(0).unwrap().unwrap();
        assert_eq!((header.number, header.size), (0, 16));

        let reader = framed(b"7777".to_vec());
        let header = reader.frame_section_at(0).unwrap().unwrap();
        assert_eq!((header.number, header.size), (8, 4));
    }

    #[test]
    fn frames_body_sections_from_length_and_number() {
        let mut bytes = 21u32.to_be_bytes().to_vec();
        bytes.push(1);
        let header = framed(bytes).frame_section_at(0).unwrap().unwrap();
        assert_eq!((header.number, header.size), (1, 21));
    }

    #[test]
    fn rejects_undersized_length() {
        let mut bytes = 4u32.to_be_bytes().to_vec();
        bytes.push(1);
        assert!(matches!(
            framed(bytes).frame_section_at(0),
            Err(GribError::InvalidLength { offset: 0, length: 4 })
        ));
    }

    #[test]
    fn rejects_invalid_section_number() {
        let mut bytes = 12u32.to_be_bytes().to_vec();
        bytes.push(9);
        assert!(matches!(
            framed(bytes).frame_section_at(0),
            Err(GribError::InvalidSectionNumber { offset: 0, number: 9 })
        ));
    }

    #[test]
    fn end_of_source_is_clean() {
        assert!(framed(Vec::new()).frame_section_at(0).unwrap().is_none());
    }
}
