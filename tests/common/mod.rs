//! Builders for synthetic GRIB2 files. Sections come out fully framed
//! (length + section number + body) so tests can splice them freely.
#![allow(dead_code)]

/// Route crate logs to the test harness when `RUST_LOG` is set.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Section 1 for NCEP (centre 7), reference time 2024-03-15T12:00:00Z.
pub fn sect1() -> Vec<u8> {
    let mut data = vec![0u8; 21];
    data[0..4].copy_from_slice(&21u32.to_be_bytes());
    data[4] = 1;
    data[5..7].copy_from_slice(&7u16.to_be_bytes());
    data[9] = 2; // master tables version
    data[12..14].copy_from_slice(&2024u16.to_be_bytes());
    data[14] = 3;
    data[15] = 15;
    data[16] = 12;
    data
}

pub fn sect2(payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(5 + payload.len());
    data.extend_from_slice(&((5 + payload.len()) as u32).to_be_bytes());
    data.push(2);
    data.extend_from_slice(payload);
    data
}

/// Grid definition template 3.0, one degree increments starting at 45N 230E.
pub fn sect3_latlon(n_i: u32, n_j: u32, num_points: u32) -> Vec<u8> {
    let mut data = vec![0u8; 72];
    data[0..4].copy_from_slice(&72u32.to_be_bytes());
    data[4] = 3;
    data[6..10].copy_from_slice(&num_points.to_be_bytes());
    // template number 0 already zeroed at bytes 12..14

    let t = 14;
    data[t + 16..t + 20].copy_from_slice(&n_i.to_be_bytes());
    data[t + 20..t + 24].copy_from_slice(&n_j.to_be_bytes());
    data[t + 32..t + 36].copy_from_slice(&45_000_000u32.to_be_bytes());
    data[t + 36..t + 40].copy_from_slice(&230_000_000u32.to_be_bytes());
    data[t + 41..t + 45].copy_from_slice(&35_000_000u32.to_be_bytes());
    data[t + 45..t + 49].copy_from_slice(&240_000_000u32.to_be_bytes());
    data[t + 49..t + 53].copy_from_slice(&1_000_000u32.to_be_bytes());
    data[t + 53..t + 57].copy_from_slice(&1_000_000u32.to_be_bytes());
    data[t + 57] = 0b0100_0000;
    data
}

/// Product definition template 4.0.
pub fn sect4_template0(category: u8, parameter: u8) -> Vec<u8> {
    let mut data = vec![0u8; 34];
    data[0..4].copy_from_slice(&34u32.to_be_bytes());
    data[4] = 4;
    // template number 0 already zeroed at bytes 7..9

    let t = 9;
    data[t] = category;
    data[t + 1] = parameter;
    data[t + 8] = 1; // forecast time unit: hours
    data[t + 9..t + 13].copy_from_slice(&6u32.to_be_bytes());
    data[t + 13] = 103; // metres above ground
    data[t + 15..t + 19].copy_from_slice(&2u32.to_be_bytes());
    data
}

/// Data representation template 5.0, simple packing.
pub fn sect5_template0(num_points: u32, reference: f32, bits: u8) -> Vec<u8> {
    let mut data = vec![0u8; 21];
    data[0..4].copy_from_slice(&21u32.to_be_bytes());
    data[4] = 5;
    data[5..9].copy_from_slice(&num_points.to_be_bytes());
    // template number 0 already zeroed at bytes 9..11

    let t = 11;
    data[t..t + 4].copy_from_slice(&reference.to_be_bytes());
    data[t + 8] = bits;
    data
}

/// Section 6 declaring that no bit-map applies.
pub fn sect6_missing() -> Vec<u8> {
    let mut data = vec![0u8; 6];
    data[0..4].copy_from_slice(&6u32.to_be_bytes());
    data[4] = 6;
    data[5] = 0xFF;
    data
}

pub fn sect7(payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(5 + payload.len());
    data.extend_from_slice(&((5 + payload.len()) as u32).to_be_bytes());
    data.push(7);
    data.extend_from_slice(payload);
    data
}

/// Wrap body sections into a full message: Section 0 with the computed total
/// length in front, the `7777` end marker behind.
pub fn build_message(discipline: u8, body: &[&[u8]]) -> Vec<u8> {
    let total = 16 + body.iter().map(|s| s.len()).sum::<usize>() + 4;

    let mut file = Vec::with_capacity(total);
    file.extend_from_slice(b"GRIB");
    file.extend_from_slice(&[0, 0]);
    file.push(discipline);
    file.push(2);
    file.extend_from_slice(&(total as u64).to_be_bytes());
    for section in body {
        file.extend_from_slice(section);
    }
    file.extend_from_slice(b"7777");
    file
}

/// One message carrying a single lat/lon data field whose Section 7 holds
/// `payload`.
pub fn single_field_message(payload: &[u8]) -> Vec<u8> {
    let num_points = payload.len() as u32;
    build_message(
        0,
        &[
            &sect1(),
            &sect3_latlon(100, 100, num_points),
            &sect4_template0(0, 0),
            &sect5_template0(num_points, 52.0, 8),
            &sect6_missing(),
            &sect7(payload),
        ],
    )
}
