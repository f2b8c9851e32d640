use std::io::{self, Read};
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::StatusCode;

use crate::error::{GribError, Result};
use crate::reader::source::ReadAt;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Positioned byte source over an HTTP endpoint that honours `Range`
/// requests. The size is resolved once with a `HEAD` request; every
/// `read_at` becomes one ranged `GET`, so scanning a message index touches
/// only a few kilobytes of a remote file.
pub struct HttpRangeReader {
    url: String,
    client: Client,
    size: u64,
}

impl HttpRangeReader {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let response = client.head(url).send()?;
        if response.status() != StatusCode::OK {
            return Err(GribError::ParseError(format!(
                "HEAD {} failed: {}",
                url,
                response.status()
            )));
        }

        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| {
                GribError::ParseError(format!("HEAD {}: missing Content-Length", url))
            })?;

        debug!("http source {} : {} bytes", url, size);

        Ok(Self {
            url: url.to_string(),
            client,
            size,
        })
    }
}

impl ReadAt for HttpRangeReader {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64).min(self.size) - 1;
        let n = (end - offset + 1) as usize;

        let response = self
            .client
            .get(&self.url)
            .header(RANGE, format!("bytes={}-{}", offset, end))
            .send()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

        match response.status() {
            StatusCode::PARTIAL_CONTENT | StatusCode::OK => {}
            status => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("range request failed: {}", status),
                ));
            }
        }

        let mut body = response.take(n as u64);
        let mut read = 0usize;
        while read < n {
            match body.read(&mut buf[read..n]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "range response body shorter than requested",
                    ))
                }
                Ok(m) => read += m,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(n)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.size)
    }
}
