//! Three-channel discrete color used for block tinting and light levels.
//!
//! Channels are raw `u8` values. Arithmetic saturates per channel, colors are
//! totally ordered by their packed 24-bit value, and comparisons against a
//! single scalar only hold when every channel satisfies them.
//!
//! Conversion to normalized floats goes through an explicit
//! [`BrightnessScale`] rather than a process-wide maximum, so the same color
//! always converts the same way for a given lighting context.

use std::cmp::Ordering;
use std::num::NonZeroU8;
use std::ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of channels in a [`Color`].
pub const CHANNELS: usize = 3;

/// Errors raised by checked color operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    /// Channel index outside `0..3`.
    #[error("color channel index {0} out of range (expected 0..3)")]
    ChannelIndex(usize),
    /// A brightness scale of zero would divide by zero.
    #[error("brightness scale must be non-zero")]
    ZeroBrightness,
}

/// An RGB triple of 8-bit channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Black, `(0, 0, 0)`.
    pub const BLACK: Color = Color::splat(0);
    /// Full intensity on every channel.
    pub const WHITE: Color = Color::splat(u8::MAX);

    /// Creates a color from explicit channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a color with `value` on all three channels.
    pub const fn splat(value: u8) -> Self {
        Self::new(value, value, value)
    }

    /// Channels in `[r, g, b]` order.
    pub const fn channels(&self) -> [u8; CHANNELS] {
        [self.r, self.g, self.b]
    }

    /// Packs the channels into a 24-bit integer: red high, blue low.
    pub const fn packed(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Inverse of [`Color::packed`]. Bits above the low 24 are ignored.
    pub const fn from_packed(packed: u32) -> Self {
        Self::new((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }

    /// Reads channel `index` (0 = red, 1 = green, 2 = blue).
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::ChannelIndex`] for any index above 2.
    pub fn get(&self, index: usize) -> Result<u8, ColorError> {
        match index {
            0 => Ok(self.r),
            1 => Ok(self.g),
            2 => Ok(self.b),
            _ => Err(ColorError::ChannelIndex(index)),
        }
    }

    /// Writes channel `index` (0 = red, 1 = green, 2 = blue).
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::ChannelIndex`] for any index above 2.
    pub fn set(&mut self, index: usize, value: u8) -> Result<(), ColorError> {
        *self.channel_mut(index)? = value;
        Ok(())
    }

    fn channel_mut(&mut self, index: usize) -> Result<&mut u8, ColorError> {
        match index {
            0 => Ok(&mut self.r),
            1 => Ok(&mut self.g),
            2 => Ok(&mut self.b),
            _ => Err(ColorError::ChannelIndex(index)),
        }
    }

    /// `true` if every channel is strictly below `value`.
    pub fn all_lt(&self, value: u8) -> bool {
        self.channels().iter().all(|&c| c < value)
    }

    /// `true` if every channel is at most `value`.
    pub fn all_le(&self, value: u8) -> bool {
        self.channels().iter().all(|&c| c <= value)
    }

    /// `true` if every channel is strictly above `value`.
    pub fn all_gt(&self, value: u8) -> bool {
        self.channels().iter().all(|&c| c > value)
    }

    /// `true` if every channel is at least `value`.
    pub fn all_ge(&self, value: u8) -> bool {
        self.channels().iter().all(|&c| c >= value)
    }

    /// Normalized `[r, g, b]` under the given scale, each clamped to `1.0`.
    pub fn to_f32(&self, scale: BrightnessScale) -> [f32; CHANNELS] {
        let max = f32::from(scale.max());
        self.channels().map(|c| (f32::from(c) / max).min(1.0))
    }

    fn map_channels(self, f: impl Fn(u8) -> u8) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    fn zip_channels(self, other: Self, f: impl Fn(u8, u8) -> u8) -> Self {
        Self::new(f(self.r, other.r), f(self.g, other.g), f(self.b, other.b))
    }
}

impl Ord for Color {
    fn cmp(&self, other: &Self) -> Ordering {
        self.packed().cmp(&other.packed())
    }
}

impl PartialOrd for Color {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Equal to a scalar only when every channel equals it.
impl PartialEq<u8> for Color {
    fn eq(&self, other: &u8) -> bool {
        self.channels().iter().all(|c| c == other)
    }
}

impl Index<usize> for Color {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        match index {
            0 => &self.r,
            1 => &self.g,
            2 => &self.b,
            _ => panic!("{}", ColorError::ChannelIndex(index)),
        }
    }
}

impl IndexMut<usize> for Color {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        match self.channel_mut(index) {
            Ok(channel) => channel,
            Err(e) => panic!("{e}"),
        }
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        self.zip_channels(rhs, u8::saturating_add)
    }
}

impl Add<u8> for Color {
    type Output = Color;

    fn add(self, rhs: u8) -> Color {
        self.map_channels(|c| c.saturating_add(rhs))
    }
}

impl Sub for Color {
    type Output = Color;

    fn sub(self, rhs: Color) -> Color {
        self.zip_channels(rhs, u8::saturating_sub)
    }
}

impl Sub<u8> for Color {
    type Output = Color;

    fn sub(self, rhs: u8) -> Color {
        self.map_channels(|c| c.saturating_sub(rhs))
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        *self = *self + rhs;
    }
}

impl AddAssign<u8> for Color {
    fn add_assign(&mut self, rhs: u8) {
        *self = *self + rhs;
    }
}

impl SubAssign for Color {
    fn sub_assign(&mut self, rhs: Color) {
        *self = *self - rhs;
    }
}

impl SubAssign<u8> for Color {
    fn sub_assign(&mut self, rhs: u8) {
        *self = *self - rhs;
    }
}

// Encoded as a fixed `[r, g, b]` array.
impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.channels().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [r, g, b] = <[u8; CHANNELS]>::deserialize(deserializer)?;
        Ok(Self::new(r, g, b))
    }
}

/// The channel value that maps to full intensity when converting a
/// [`Color`] to floats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BrightnessScale(NonZeroU8);

impl BrightnessScale {
    /// Full `u8` range: 255 maps to `1.0`.
    pub const FULL: BrightnessScale = BrightnessScale(NonZeroU8::MAX);

    /// Creates a scale where `max` maps to `1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::ZeroBrightness`] if `max` is zero.
    pub fn new(max: u8) -> Result<Self, ColorError> {
        NonZeroU8::new(max)
            .map(Self)
            .ok_or(ColorError::ZeroBrightness)
    }

    /// The channel value treated as full brightness.
    pub fn max(&self) -> u8 {
        self.0.get()
    }
}

impl Default for BrightnessScale {
    fn default() -> Self {
        Self::FULL
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
