use chrono::{DateTime, TimeZone, Utc};

use crate::error::{GribError, Result};
use crate::read_as;

const SECT1_MIN_SIZE: usize = 21;

/// Section 1: Identification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    /// Length of the section in octets
    pub length: u32,
    /// Identification of originating/generating centre (see Common Code Table C-1)
    pub centre_id: u16,
    /// Identification of originating/generating sub-centre (allocated by originating/ generating centre)
    pub subcentre_id: u16,
    /// GRIB Master Tables Version Number (see Code Table 1.0)
    pub master_table_version: u8,
    /// GRIB Local Tables Version Number (see Code Table 1.1)
    pub local_table_version: u8,
    /// Significance of Reference Time (see Code Table 1.2)
    pub ref_time_significance: u8,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Production status of processed data in this GRIB message
    /// (see Code Table 1.3)
    pub prod_status: u8,
    /// Type of processed data in this GRIB message (see Code Table 1.4)
    pub data_type: u8,
    /// Trailing reserved octets; empty unless kept at decode time
    pub reserved: Box<[u8]>,
}

impl Identification {
    pub fn from_bytes(data: &[u8], keep_reserved: bool) -> Result<Self> {
        if data.len() < SECT1_MIN_SIZE {
            return Err(GribError::Truncated {
                section: 1,
                expected: SECT1_MIN_SIZE,
                actual: data.len(),
            });
        }

        let length = read_as!(u32, data, 0);
        if data[4] != 1 {
            return Err(GribError::SectionNumberMismatch {
                expected: 1,
                actual: data[4],
            });
        }
        if (length as usize) < SECT1_MIN_SIZE || data.len() < length as usize {
            return Err(GribError::Truncated {
                section: 1,
                expected: length as usize,
                actual: data.len().min(length as usize),
            });
        }

        let reserved = if keep_reserved {
            data[SECT1_MIN_SIZE..length as usize].to_vec().into_boxed_slice()
        } else {
            Vec::new().into_boxed_slice()
        };

        Ok(Identification {
            length,
            centre_id: read_as!(u16, data, 5),
            subcentre_id: read_as!(u16, data, 7),
            master_table_version: data[9],
            local_table_version: data[10],
            ref_time_significance: data[11],
            year: read_as!(u16, data, 12),
            month: data[14],
            day: data[15],
            hour: data[16],
            minute: data[17],
            second: data[18],
            prod_status: data[19],
            data_type: data[20],
            reserved,
        })
    }

    /// Reference time of the data, when the encoded date parts form a valid
    /// calendar instant.
    pub fn ref_time(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(
            self.year.into(),
            self.month.into(),
            self.day.into(),
            self.hour.into(),
            self.minute.into(),
            self.second.into(),
        )
        .single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sect1_bytes(length: u32) -> Vec<u8> {
        let mut data = vec![0u8; length as usize];
        data[0..4].copy_from_slice(&length.to_be_bytes());
        data[4] = 1;
        data[5..7].copy_from_slice(&7u16.to_be_bytes()); // NCEP
        data[7..9].copy_from_slice(&0u16.to_be_bytes());
        data[9] = 2;
        data[12..14].copy_from_slice(&2024u16.to_be_bytes());
        data[14] = 3;
        data[15] = 15;
        data[16] = 12;
        data
    }

    #[test]
    fn decodes_identification() {
        let sect = Identification::from_bytes(&sect1_bytes(21), false).unwrap();
        assert_eq!(sect.length, 21);
        assert_eq!(sect.centre_id, 7);
        assert_eq!(sect.master_table_version, 2);
        assert_eq!((sect.year, sect.month, sect.day, sect.hour), (2024, 3, 15, 12));
        assert_eq!(
            sect.ref_time(),
            Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).single()
        );
    }

    #[test]
    fn reserved_bytes_are_opt_in() {
        let mut data = sect1_bytes(25);
        data[21..25].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let discarded = Identification::from_bytes(&data, false).unwrap();
        assert!(discarded.reserved.is_empty());

        let kept = Identification::from_bytes(&data, true).unwrap();
        assert_eq!(&kept.reserved[..], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn rejects_short_slice() {
        assert!(matches!(
            Identification::from_bytes(&[0u8; 12], false),
            Err(GribError::Truncated { section: 1, .. })
        ));
    }

    #[test]
    fn rejects_wrong_section_number() {
        let mut data = sect1_bytes(21);
        data[4] = 2;
        assert!(matches!(
            Identification::from_bytes(&data, false),
            Err(GribError::SectionNumberMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn invalid_date_has_no_ref_time() {
        let mut data = sect1_bytes(21);
        data[14] = 13; // month
        let sect = Identification::from_bytes(&data, false).unwrap();
        assert_eq!(sect.ref_time(), None);
    }
}
