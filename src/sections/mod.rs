use std::sync::Arc;

use crate::error::{GribError, Result};
use crate::read_as;
use crate::sections::sect1::Identification;
use crate::sections::sect2::LocalUse;
use crate::sections::sect3::GridDefinition;
use crate::sections::sect4::ProductDefinition;
use crate::sections::sect5::DataRepresentationDefinition;
use crate::sections::sect6::BitMap;
use crate::sections::sect7::DataSection;

pub mod sect1;
pub mod sect2;
pub mod sect3;
pub mod sect4;
pub mod sect5;
pub mod sect6;
pub mod sect7;

pub(crate) const SECT0_IS_MAGIC: &[u8; 4] = b"GRIB";
pub(crate) const SECT0_IS_SIZE: usize = 16;
pub(crate) const SECT_HEADER_SIZE: usize = 5;
pub(crate) const SECT8_ES_MAGIC: &[u8; 4] = b"7777";
pub(crate) const SECT8_ES_SIZE: usize = 4;

/// Section 0: Indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// Discipline - GRIB Master Table Number (see Code Table 0.0)
    pub discipline: u8,
    /// GRIB edition number, always 2
    pub edition: u8,
    /// Total length of GRIB message in octets (including Section 0)
    pub total_length: u64,
    pub reserved: [u8; 2],
}

impl Indicator {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < SECT0_IS_SIZE {
            return Err(GribError::Truncated {
                section: 0,
                expected: SECT0_IS_SIZE,
                actual: data.len(),
            });
        }

        if &data[0..4] != SECT0_IS_MAGIC {
            return Err(GribError::NotGrib());
        }

        let edition = data[7];
        if edition != 2 {
            return Err(GribError::GRIBVersionMismatch(edition));
        }

        Ok(Indicator {
            discipline: data[6],
            edition,
            total_length: read_as!(u64, data, 8),
            reserved: [data[4], data[5]],
        })
    }
}

/// Section 8: End. Zero-sized marker; the `7777` magic is checked when the
/// section is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndSection;

impl EndSection {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < SECT8_ES_SIZE {
            return Err(GribError::Truncated {
                section: 8,
                expected: SECT8_ES_SIZE,
                actual: data.len(),
            });
        }
        if &data[0..4] != SECT8_ES_MAGIC {
            return Err(GribError::EndSectionMismatch());
        }
        Ok(EndSection)
    }
}

/// Section boundary discovered from the first 4-5 bytes, body untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Length : Length of the section in octets
    pub size: usize,
    /// Number : Number of the section
    pub number: u8,
}

/// One decoded GRIB2 section.
#[derive(Debug, Clone)]
pub enum Section {
    Section0(Indicator),
    Section1(Identification),
    Section2(LocalUse),
    Section3(GridDefinition),
    Section4(ProductDefinition),
    Section5(DataRepresentationDefinition),
    Section6(BitMap),
    Section7(Arc<DataSection>),
    Section8,
}

impl Section {
    pub fn number(&self) -> u8 {
        match self {
            Section::Section0(_) => 0,
            Section::Section1(_) => 1,
            Section::Section2(_) => 2,
            Section::Section3(_) => 3,
            Section::Section4(_) => 4,
            Section::Section5(_) => 5,
            Section::Section6(_) => 6,
            Section::Section7(_) => 7,
            Section::Section8 => 8,
        }
    }

    pub fn length(&self) -> u32 {
        match self {
            Section::Section0(_) => SECT0_IS_SIZE as u32,
            Section::Section1(sect) => sect.length,
            Section::Section2(sect) => sect.length,
            Section::Section3(sect) => sect.length,
            Section::Section4(sect) => sect.length,
            Section::Section5(sect) => sect.length,
            Section::Section6(sect) => sect.length,
            Section::Section7(sect) => sect.length(),
            Section::Section8 => SECT8_ES_SIZE as u32,
        }
    }

    /// Decode one full section slice into its typed value. Section 7
    /// payloads are buffered eagerly here; the scanners build lazy handles
    /// instead.
    pub fn from_bytes(number: u8, data: &[u8]) -> Result<Section> {
        match number {
            0 => Ok(Section::Section0(Indicator::from_bytes(data)?)),
            1 => Ok(Section::Section1(Identification::from_bytes(data, false)?)),
            2 => Ok(Section::Section2(LocalUse::from_bytes(data)?)),
            3 => Ok(Section::Section3(GridDefinition::from_bytes(data)?)),
            4 => Ok(Section::Section4(ProductDefinition::from_bytes(data)?)),
            5 => Ok(Section::Section5(DataRepresentationDefinition::from_bytes(
                data,
            )?)),
            6 => Ok(Section::Section6(BitMap::from_bytes(data)?)),
            7 => Ok(Section::Section7(Arc::new(DataSection::from_bytes(data)?))),
            8 => {
                EndSection::from_bytes(data)?;
                Ok(Section::Section8)
            }
            n => Err(GribError::UnknownSection(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sect0_bytes(discipline: u8, edition: u8, total_length: u64) -> [u8; 16] {
        let mut data = [0u8; 16];
        data[0..4].copy_from_slice(b"GRIB");
        data[6] = discipline;
        data[7] = edition;
        data[8..16].copy_from_slice(&total_length.to_be_bytes());
        data
    }

    #[test]
    fn indicator_decodes() {
        let indicator = Indicator::from_bytes(&sect0_bytes(0, 2, 0x29)).unwrap();
        assert_eq!(indicator.discipline, 0);
        assert_eq!(indicator.edition, 2);
        assert_eq!(indicator.total_length, 41);
    }

    #[test]
    fn indicator_rejects_bad_magic() {
        let mut data = sect0_bytes(0, 2, 16);
        data[0] = b'X';
        assert!(matches!(
            Indicator::from_bytes(&data),
            Err(GribError::NotGrib())
        ));
    }

    #[test]
    fn indicator_rejects_edition_1() {
        assert!(matches!(
            Indicator::from_bytes(&sect0_bytes(0, 1, 16)),
            Err(GribError::GRIBVersionMismatch(1))
        ));
    }

    #[test]
    fn end_section_checks_magic() {
        assert!(EndSection::from_bytes(b"7777").is_ok());
        assert!(matches!(
            EndSection::from_bytes(b"7778"),
            Err(GribError::EndSectionMismatch())
        ));
    }

    #[test]
    fn unknown_section_number() {
        assert!(matches!(
            Section::from_bytes(9, &[0u8; 16]),
            Err(GribError::UnknownSection(9))
        ));
    }
}
