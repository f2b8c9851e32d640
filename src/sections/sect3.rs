use crate::error::{GribError, Result};
use crate::read_as;
use crate::utils::GribInt;

const SECT3_MIN_SIZE: usize = 14;

/// Section 3: Grid Definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDefinition {
    /// Length of the section in octets
    pub length: u32,
    /// Source of grid definition (see Code Table 3.0)
    pub source: u8,
    /// Number of data points
    pub num_points: usize,
    pub optional_num_list_size: usize,
    pub optional_num_list_interpretation: u8,
    /// Grid Definition Template Number
    pub template_number: u16,
    pub grid: Grid,
    /// Optional list of numbers defining number of points (see Code Table 3.11)
    pub optional_list: Vec<u32>,
}

impl GridDefinition {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < SECT3_MIN_SIZE {
            return Err(GribError::Truncated {
                section: 3,
                expected: SECT3_MIN_SIZE,
                actual: data.len(),
            });
        }

        let length = read_as!(u32, data, 0) as usize;
        if data[4] != 3 {
            return Err(GribError::SectionNumberMismatch {
                expected: 3,
                actual: data[4],
            });
        }
        if length < SECT3_MIN_SIZE || data.len() < length {
            return Err(GribError::Truncated {
                section: 3,
                expected: length,
                actual: data.len().min(length),
            });
        }

        let optional_num_list_size = data[10] as usize;
        if SECT3_MIN_SIZE + optional_num_list_size > length {
            return Err(GribError::TemplateUnderrun(3));
        }

        let template_number = read_as!(u16, data, 12);
        let grid = Grid::from_template(
            template_number,
            &data[SECT3_MIN_SIZE..length - optional_num_list_size],
        )?;

        let list_bytes = &data[length - optional_num_list_size..length];
        let mut optional_list = Vec::with_capacity(optional_num_list_size / 4);
        for i in 0..optional_num_list_size / 4 {
            optional_list.push(read_as!(u32, list_bytes, i * 4));
        }

        Ok(GridDefinition {
            length: length as u32,
            source: data[5],
            num_points: read_as!(u32, data, 6) as usize,
            optional_num_list_size,
            optional_num_list_interpretation: data[11],
            template_number,
            grid,
            optional_list,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grid {
    Grid0(Grid0),
    Unknown(Vec<u8>),
}

impl Grid {
    pub(crate) fn from_template(template_number: u16, buf: &[u8]) -> Result<Self> {
        match template_number {
            0 => {
                if buf.len() < 58 {
                    return Err(GribError::TemplateUnderrun(3));
                }

                Ok(Grid::Grid0(Grid0 {
                    header: GridHeader {
                        earth_shape: buf[0],
                        spherical_radius: ScaledValue {
                            scale: buf[1],
                            value: read_as!(u32, buf, 2),
                        },
                        major_axis: ScaledValue {
                            scale: buf[6],
                            value: read_as!(u32, buf, 7),
                        },
                        minor_axis: ScaledValue {
                            scale: buf[11],
                            value: read_as!(u32, buf, 12),
                        },
                    },
                    n_i: read_as!(u32, buf, 16),
                    n_j: read_as!(u32, buf, 20),
                    initial_prod_basic_angle: BasicAngle {
                        basic_angle: read_as!(u32, buf, 24),
                        basic_angle_sub: read_as!(u32, buf, 28),
                    },
                    la1: read_as!(u32, buf, 32).as_grib_int(),
                    lo1: read_as!(u32, buf, 36),
                    resolution_and_component_flags: buf[40],
                    la2: read_as!(u32, buf, 41).as_grib_int(),
                    lo2: read_as!(u32, buf, 45),
                    d_i: read_as!(u32, buf, 49),
                    d_j: read_as!(u32, buf, 53),
                    scanning_mode: buf[57],
                }))
            }
            _ => Ok(Grid::Unknown(buf.to_vec())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScaledValue {
    pub scale: u8,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicAngle {
    pub basic_angle: u32,
    pub basic_angle_sub: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridHeader {
    pub earth_shape: u8,
    pub spherical_radius: ScaledValue,
    pub major_axis: ScaledValue,
    pub minor_axis: ScaledValue,
}

///Grid0 Definition Template 3.0: Latitude/longitude (or equidistant cylindrical, or Plate Carree)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid0 {
    pub header: GridHeader,
    pub n_i: u32,
    pub n_j: u32,
    pub initial_prod_basic_angle: BasicAngle,
    /// Latitude of first grid point in microdegrees (sign-magnitude)
    pub la1: i32,
    /// Longitude of first grid point in microdegrees
    pub lo1: u32,
    pub resolution_and_component_flags: u8,
    pub la2: i32,
    pub lo2: u32,
    pub d_i: u32,
    pub d_j: u32,
    pub scanning_mode: u8,
}
