use chrono::Duration;

use crate::error::{GribError, Result};
use crate::read_as;
use crate::utils::GribInt;

const SECT4_MIN_SIZE: usize = 9;

/// Section 4: Product Definition
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefinition {
    /// Length of the section in octets
    pub length: u32,
    /// Number of coordinate values after Template
    pub num_coordinates: u16,
    /// Product Definition Template Number
    pub template_number: u16,
    pub product: Product,
    /// Optional hybrid-coordinate values (big-endian IEEE 754)
    pub coordinates: Vec<f32>,
}

impl ProductDefinition {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < SECT4_MIN_SIZE {
            return Err(GribError::Truncated {
                section: 4,
                expected: SECT4_MIN_SIZE,
                actual: data.len(),
            });
        }

        let length = read_as!(u32, data, 0) as usize;
        if data[4] != 4 {
            return Err(GribError::SectionNumberMismatch {
                expected: 4,
                actual: data[4],
            });
        }
        if length < SECT4_MIN_SIZE || data.len() < length {
            return Err(GribError::Truncated {
                section: 4,
                expected: length,
                actual: data.len().min(length),
            });
        }

        let num_coordinates = read_as!(u16, data, 5);
        let coordinates_size = num_coordinates as usize * 4;
        if SECT4_MIN_SIZE + coordinates_size > length {
            return Err(GribError::TemplateUnderrun(4));
        }

        let template_number = read_as!(u16, data, 7);
        let product = Product::from_template(
            template_number,
            &data[SECT4_MIN_SIZE..length - coordinates_size],
        )?;

        let coordinate_bytes = &data[length - coordinates_size..length];
        let mut coordinates = Vec::with_capacity(num_coordinates as usize);
        for i in 0..num_coordinates as usize {
            coordinates.push(read_as!(f32, coordinate_bytes, i * 4));
        }

        Ok(ProductDefinition {
            length: length as u32,
            num_coordinates,
            template_number,
            product,
            coordinates,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Product {
    Product0(Product0),
    Unknown(Vec<u8>),
}

impl Product {
    pub(crate) fn from_template(template_number: u16, buf: &[u8]) -> Result<Self> {
        match template_number {
            // Templates 4.0, 4.1 and 4.8 share the same 25-octet prefix;
            // anything past it (ensemble/statistical tails) is not needed here.
            0 | 1 | 8 => {
                if buf.len() < 25 {
                    return Err(GribError::TemplateUnderrun(4));
                }

                Ok(Product::Product0(Product0 {
                    parameter_category: buf[0],
                    parameter_number: buf[1],
                    process_type: buf[2],
                    background_process: buf[3],
                    analysis_process: buf[4],
                    hours: read_as!(u16, buf, 5),
                    minutes: buf[7],
                    time_unit: buf[8],
                    forecast_time: read_as!(u32, buf, 9),
                    first_surface: Surface {
                        surface_type: buf[13],
                        scale_factor: buf[14].as_grib_int(),
                        scaled_value: read_as!(u32, buf, 15),
                    },
                    second_surface: Surface {
                        surface_type: buf[19],
                        scale_factor: buf[20].as_grib_int(),
                        scaled_value: read_as!(u32, buf, 21),
                    },
                }))
            }
            _ => Ok(Product::Unknown(buf.to_vec())),
        }
    }
}

///Product0 Definition Template 4.0: Analysis or forecast at a horizontal level or in a horizontal layer at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Product0 {
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub process_type: u8,
    pub background_process: u8,
    pub analysis_process: u8,
    /// Hours after reference time of data cutoff
    pub hours: u16,
    /// Minutes after reference time of data cutoff
    pub minutes: u8,
    /// Indicator of unit of time range (see Code Table 4.4)
    pub time_unit: u8,
    /// Forecast time in units of `time_unit`
    pub forecast_time: u32,
    pub first_surface: Surface,
    pub second_surface: Surface,
}

impl Product0 {
    /// Forecast time resolved through Code Table 4.4.
    pub fn forecast_duration(&self) -> Result<Duration> {
        let n = self.forecast_time as i64;
        Ok(match self.time_unit {
            0 => Duration::minutes(n),
            1 => Duration::hours(n),
            2 => Duration::days(n),
            3 => Duration::days(30 * n),
            4 => Duration::days(365 * n),
            5 => Duration::days(10 * 365 * n),
            6 => Duration::days(30 * 365 * n),
            7 => Duration::days(100 * 365 * n),
            10 => Duration::hours(3 * n),
            11 => Duration::hours(6 * n),
            12 => Duration::hours(12 * n),
            13 => Duration::seconds(n),
            u => {
                return Err(GribError::ParseError(format!(
                    "Forecast Time Unit `{}` does not exist.",
                    u
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Surface {
    pub surface_type: u8,
    /// Scale factor (sign-magnitude)
    pub scale_factor: i8,
    pub scaled_value: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sect4_template0(category: u8, parameter: u8, coordinates: &[f32]) -> Vec<u8> {
        let length = (SECT4_MIN_SIZE + 25 + coordinates.len() * 4) as u32;
        let mut data = vec![0u8; (SECT4_MIN_SIZE + 25) as usize];
        data[0..4].copy_from_slice(&length.to_be_bytes());
        data[4] = 4;
        data[5..7].copy_from_slice(&(coordinates.len() as u16).to_be_bytes());
        data[7..9].copy_from_slice(&0u16.to_be_bytes()); // template 4.0

        let t = SECT4_MIN_SIZE;
        data[t] = category;
        data[t + 1] = parameter;
        data[t + 8] = 1; // hours
        data[t + 9..t + 13].copy_from_slice(&6u32.to_be_bytes());
        data[t + 13] = 103; // m above ground
        data[t + 14] = 0x82; // scale factor -2
        data[t + 15..t + 19].copy_from_slice(&200u32.to_be_bytes());
        for value in coordinates {
            data.extend_from_slice(&value.to_be_bytes());
        }
        data
    }

    #[test]
    fn decodes_template_4_0() {
        let data = sect4_template0(0, 0, &[]);
        let sect = ProductDefinition::from_bytes(&data).unwrap();
        assert_eq!(sect.template_number, 0);
        assert_eq!(sect.num_coordinates, 0);

        let Product::Product0(product) = &sect.product else {
            panic!("expected template 4.0");
        };
        assert_eq!(product.parameter_category, 0);
        assert_eq!(product.time_unit, 1);
        assert_eq!(product.forecast_time, 6);
        assert_eq!(product.first_surface.surface_type, 103);
        assert_eq!(product.first_surface.scale_factor, -2);
        assert_eq!(product.first_surface.scaled_value, 200);
        assert_eq!(product.forecast_duration().unwrap(), Duration::hours(6));
    }

    #[test]
    fn decodes_coordinate_values() {
        let data = sect4_template0(3, 5, &[0.5, -1.25]);
        let sect = ProductDefinition::from_bytes(&data).unwrap();
        assert_eq!(sect.num_coordinates, 2);
        assert_eq!(sect.coordinates, vec![0.5, -1.25]);
        assert!(matches!(&sect.product, Product::Product0(p) if p.parameter_number == 5));
    }

    #[test]
    fn coordinate_count_cannot_exceed_section() {
        let mut data = sect4_template0(0, 0, &[]);
        data[5..7].copy_from_slice(&100u16.to_be_bytes());
        assert!(matches!(
            ProductDefinition::from_bytes(&data),
            Err(GribError::TemplateUnderrun(4))
        ));
    }

    #[test]
    fn unknown_forecast_unit_is_an_error() {
        let mut data = sect4_template0(0, 0, &[]);
        data[SECT4_MIN_SIZE + 8] = 9;
        let sect = ProductDefinition::from_bytes(&data).unwrap();
        let Product::Product0(product) = &sect.product else {
            panic!("expected template 4.0");
        };
        assert!(matches!(
            product.forecast_duration(),
            Err(GribError::ParseError(_))
        ));
    }
}
