use crate::error::{GribError, Result};
use crate::read_as;
use crate::utils::{Buffer, GribInt};

const SECT5_MIN_SIZE: usize = 11;

/// Section 5: Data Representation
#[derive(Debug, Clone, PartialEq)]
pub struct DataRepresentationDefinition {
    /// Length of the section in octets
    pub length: u32,
    /// Number of data points to which the template applies
    pub num_points: usize,
    /// Data Representation Template Number
    pub template_number: u16,
    pub data: Data,
}

impl DataRepresentationDefinition {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < SECT5_MIN_SIZE {
            return Err(GribError::Truncated {
                section: 5,
                expected: SECT5_MIN_SIZE,
                actual: data.len(),
            });
        }

        let length = read_as!(u32, data, 0) as usize;
        if data[4] != 5 {
            return Err(GribError::SectionNumberMismatch {
                expected: 5,
                actual: data[4],
            });
        }
        if length < SECT5_MIN_SIZE || data.len() < length {
            return Err(GribError::Truncated {
                section: 5,
                expected: length,
                actual: data.len().min(length),
            });
        }

        let template_number = read_as!(u16, data, 9);

        Ok(DataRepresentationDefinition {
            length: length as u32,
            num_points: read_as!(u32, data, 5) as usize,
            template_number,
            data: Data::from_template(template_number, &data[SECT5_MIN_SIZE..length])?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Data0(Data0),
    Data2(Data2),
    Data3(Data3),
    Unknown(Vec<u8>),
}

impl Data {
    pub(crate) fn from_template(template_number: u16, bytes: &[u8]) -> Result<Self> {
        let mut buf = Buffer::new(bytes);

        match template_number {
            0 => {
                if bytes.len() < 10 {
                    return Err(GribError::TemplateUnderrun(5));
                }

                Ok(Data::Data0(Data0 {
                    reference_value: buf.read(),
                    binary_scale_factor: buf.read::<u16>().as_grib_int(),
                    decimal_scale_factor: buf.read::<u16>().as_grib_int(),
                    num_bits: buf.read::<u8>() as usize,
                    values_type: buf.read(),
                }))
            }
            2 => {
                if bytes.len() < 36 {
                    return Err(GribError::TemplateUnderrun(5));
                }

                Ok(Data::Data2(Data2 {
                    reference_value: buf.read(),
                    binary_scale_factor: buf.read::<u16>().as_grib_int(),
                    decimal_scale_factor: buf.read::<u16>().as_grib_int(),
                    num_bits: buf.read::<u8>() as usize,
                    values_type: buf.read(),
                    group_method: buf.read(),
                    missing_value: buf.read(),
                    missing_substitute_primary: buf.read(),
                    missing_substitute_secondary: buf.read(),
                    group_definition: GroupDefinition {
                        num_groups: buf.read::<u32>() as usize,
                        group_widths_reference: buf.read(),
                        group_widths_num_bits: buf.read::<u8>() as usize,
                        group_lengths_reference: buf.read(),
                        group_lengths_increment: buf.read(),
                        group_lengths_last: buf.read(),
                        group_scaled_lengths_num_bits: buf.read::<u8>() as usize,
                    },
                }))
            }
            3 => {
                if bytes.len() < 38 {
                    return Err(GribError::TemplateUnderrun(5));
                }

                Ok(Data::Data3(Data3 {
                    reference_value: buf.read(),
                    binary_scale_factor: buf.read::<u16>().as_grib_int(),
                    decimal_scale_factor: buf.read::<u16>().as_grib_int(),
                    num_bits: buf.read::<u8>() as usize,
                    values_type: buf.read(),
                    group_method: buf.read(),
                    missing_value: buf.read(),
                    missing_substitute_primary: buf.read(),
                    missing_substitute_secondary: buf.read(),
                    group_definition: GroupDefinition {
                        num_groups: buf.read::<u32>() as usize,
                        group_widths_reference: buf.read(),
                        group_widths_num_bits: buf.read::<u8>() as usize,
                        group_lengths_reference: buf.read(),
                        group_lengths_increment: buf.read(),
                        group_lengths_last: buf.read(),
                        group_scaled_lengths_num_bits: buf.read::<u8>() as usize,
                    },
                    spacial_difference_order: buf.read(),
                    spacial_difference_size: buf.read(),
                }))
            }
            _ => Ok(Data::Unknown(bytes.to_vec())),
        }
    }

    /// Fields shared by the grid-point packing templates, when known.
    pub fn packing(&self) -> Option<(f32, i16, i16, usize)> {
        match self {
            Data::Data0(d) => Some((
                d.reference_value,
                d.binary_scale_factor,
                d.decimal_scale_factor,
                d.num_bits,
            )),
            Data::Data2(d) => Some((
                d.reference_value,
                d.binary_scale_factor,
                d.decimal_scale_factor,
                d.num_bits,
            )),
            Data::Data3(d) => Some((
                d.reference_value,
                d.binary_scale_factor,
                d.decimal_scale_factor,
                d.num_bits,
            )),
            Data::Unknown(_) => None,
        }
    }
}

///Data0 Representation Template 5.0: Grid point data - simple packing
#[derive(Debug, Clone, PartialEq)]
pub struct Data0 {
    /// Reference value (IEEE 754 32-bit)
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub num_bits: usize,
    /// Type of original field values (see Code Table 5.1)
    pub values_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefinition {
    pub num_groups: usize,
    pub group_widths_reference: u8,
    pub group_widths_num_bits: usize,
    pub group_lengths_reference: u32,
    pub group_lengths_increment: u8,
    pub group_lengths_last: u32,
    pub group_scaled_lengths_num_bits: usize,
}

///Data2 Representation Template 5.2: Grid point data - complex packing
#[derive(Debug, Clone, PartialEq)]
pub struct Data2 {
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub num_bits: usize,
    pub values_type: u8,
    /// Group splitting method used (see Code Table 5.4)
    pub group_method: u8,
    /// Missing value management used (see Code Table 5.5)
    pub missing_value: u8,
    pub missing_substitute_primary: u32,
    pub missing_substitute_secondary: u32,
    pub group_definition: GroupDefinition,
}

///Data3 Representation Template 5.3: Grid point data - complex packing and spatial differencing
#[derive(Debug, Clone, PartialEq)]
pub struct Data3 {
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub num_bits: usize,
    pub values_type: u8,
    pub group_method: u8,
    pub missing_value: u8,
    pub missing_substitute_primary: u32,
    pub missing_substitute_secondary: u32,
    pub group_definition: GroupDefinition,
    pub spacial_difference_order: u8,
    pub spacial_difference_size: u8,
}
