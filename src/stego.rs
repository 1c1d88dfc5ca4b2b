//! Least-significant-bit channel over an 8-bit pixel grid.
//!
//! Bit `k` of the stream lands in channel `k % channels` of the `k / channels`-th
//! pixel visited in the chosen [`Direction`]. Only bit 0 of a sample is ever
//! written. A frame is the payload preceded by its length as a big-endian `u32`,
//! which occupies the first 32 bit positions.

use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use tracing::debug;
use zeroize::Zeroizing;

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::mnemonic::Mnemonic;
use crate::payload;

pub const LENGTH_PREFIX_BITS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
    ReverseHorizontal,
    ReverseVertical,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::ReverseHorizontal,
        Direction::ReverseVertical,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Direction::Horizontal => "horizontal",
            Direction::Vertical => "vertical",
            Direction::ReverseHorizontal => "reverse-horizontal",
            Direction::ReverseVertical => "reverse-vertical",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Direction::Horizontal => "left to right, starting from top",
            Direction::Vertical => "top to bottom, starting from left",
            Direction::ReverseHorizontal => "right to left, starting from bottom",
            Direction::ReverseVertical => "bottom to top, starting from right",
        }
    }

    /// Row-major index of the `ordinal`-th pixel visited.
    fn pixel_index(self, ordinal: usize, width: usize, height: usize) -> usize {
        let last = width * height - 1;
        let column_major = |o: usize| (o % height) * width + o / height;

        match self {
            Direction::Horizontal => ordinal,
            Direction::Vertical => column_major(ordinal),
            Direction::ReverseHorizontal => last - ordinal,
            Direction::ReverseVertical => column_major(last - ordinal),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace('_', "-");
        Direction::ALL
            .into_iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| format!("unknown direction \"{}\"", s))
    }
}

/// Interleaved 8-bit samples of an image, `channels` per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

impl Carrier {
    pub fn new(width: u32, height: u32, channels: u8, samples: Vec<u8>) -> Result<Self> {
        if !(1..=4).contains(&channels) {
            return Err(Error::InvalidCarrier("channel count must be between 1 and 4"));
        }
        if width == 0 || height == 0 {
            return Err(Error::InvalidCarrier("image has no pixels"));
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels as usize))
            .ok_or(Error::InvalidCarrier("image is too large"))?;
        if samples.len() != expected {
            return Err(Error::InvalidCarrier("sample buffer does not match dimensions"));
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Grayscale stays grayscale, alpha is kept when present, everything is
    /// reduced to 8 bits per channel.
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let color = image.color();
        let (channels, samples) = match (color.has_color(), color.has_alpha()) {
            (false, false) => (1, image.to_luma8().into_raw()),
            (false, true) => (2, image.to_luma_alpha8().into_raw()),
            (true, false) => (3, image.to_rgb8().into_raw()),
            (true, true) => (4, image.to_rgba8().into_raw()),
        };
        Self::new(image.width(), image.height(), channels, samples)
    }

    pub fn into_image(self) -> Result<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let image = match self.channels {
            1 => GrayImage::from_raw(w, h, self.samples).map(DynamicImage::ImageLuma8),
            2 => GrayAlphaImage::from_raw(w, h, self.samples).map(DynamicImage::ImageLumaA8),
            3 => RgbImage::from_raw(w, h, self.samples).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(w, h, self.samples).map(DynamicImage::ImageRgba8),
            _ => None,
        };
        image.ok_or(Error::InvalidCarrier("sample buffer does not match dimensions"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    fn sample_index(&self, bit: usize, direction: Direction) -> usize {
        let channels = self.channels as usize;
        let pixel = direction.pixel_index(
            bit / channels,
            self.width as usize,
            self.height as usize,
        );
        pixel * channels + bit % channels
    }
}

pub fn capacity(carrier: &Carrier) -> usize {
    carrier.samples.len()
}

fn ensure_capacity(carrier: &Carrier, required: usize) -> Result<()> {
    let available = capacity(carrier);
    if required > available {
        debug!(required, available, "carrier too small");
        return Err(Error::InsufficientCapacity {
            required,
            available,
        });
    }
    Ok(())
}

/// Writes `bytes` starting at bit position 0. Nothing is touched on error.
pub fn embed(carrier: &mut Carrier, bytes: &[u8], direction: Direction) -> Result<()> {
    ensure_capacity(carrier, bytes.len() * 8)?;

    let mut reader = BitReader::new(bytes);
    let mut position = 0;
    while let Some(bit) = reader.read_bit() {
        let index = carrier.sample_index(position, direction);
        carrier.samples[index] = (carrier.samples[index] & !1) | bit as u8;
        position += 1;
    }
    Ok(())
}

/// Reads `bit_len` bits starting at bit position 0. A trailing partial byte is
/// zero-padded.
pub fn extract(carrier: &Carrier, bit_len: usize, direction: Direction) -> Result<Vec<u8>> {
    ensure_capacity(carrier, bit_len)?;

    let mut writer = BitWriter::with_capacity(bit_len);
    for position in 0..bit_len {
        let index = carrier.sample_index(position, direction);
        writer.write_bit(carrier.samples[index] & 1 == 1);
    }
    Ok(writer.into_bytes())
}

pub fn frame_bits(payload_len: usize) -> usize {
    LENGTH_PREFIX_BITS + payload_len * 8
}

/// Returns the number of bit positions used.
pub fn embed_frame(carrier: &mut Carrier, payload: &[u8], direction: Direction) -> Result<usize> {
    let required = frame_bits(payload.len());
    let len = u32::try_from(payload.len()).map_err(|_| Error::InsufficientCapacity {
        required,
        available: capacity(carrier),
    })?;

    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);

    embed(carrier, &frame, direction)?;
    debug!(bits = required, %direction, "embedded frame");
    Ok(required)
}

pub fn extract_frame(carrier: &Carrier, direction: Direction) -> Result<Vec<u8>> {
    let header = extract(carrier, LENGTH_PREFIX_BITS, direction)?;
    let declared = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;

    let required = frame_bits(declared);
    if required > capacity(carrier) {
        debug!(declared, available = capacity(carrier), "declared length overruns carrier");
        return Err(Error::MalformedPayload("declared length exceeds carrier capacity"));
    }

    let mut frame = extract(carrier, required, direction)?;
    debug!(bits = required, %direction, "extracted frame");
    Ok(frame.split_off(4))
}

/// Hides a mnemonic, encrypted when `password` is non-empty. Returns the
/// number of bit positions used.
pub fn hide(
    carrier: &mut Carrier,
    mnemonic: &Mnemonic,
    password: Option<&str>,
    direction: Direction,
) -> Result<usize> {
    let payload = Zeroizing::new(payload::encode(&mnemonic.phrase(), password)?);
    embed_frame(carrier, &payload, direction)
}

pub fn reveal(carrier: &Carrier, password: Option<&str>, direction: Direction) -> Result<Mnemonic> {
    let payload = Zeroizing::new(extract_frame(carrier, direction)?);
    let phrase = payload::decode(&payload, password)?;
    Mnemonic::from_phrase(&phrase, false)
}
