//! Structure-of-arrays image layout.
//!
//! [`ImageSoA`] stores the R, G, B and A channels of an HDR image as four
//! separate `f32` arrays so that vector code can load `LANES` consecutive
//! values of one channel with a single read.
//!
//! # Memory Layout
//!
//! One allocation holds all four channels. Each channel is rounded up to a
//! whole number of 64-byte blocks, so every channel starts on a 64-byte
//! boundary and can be over-read up to the next block without leaving the
//! buffer. The padding is zero.
//!
//! ```text
//! [R R R ... R 0 0][G G G ... G 0 0][B ...][A ...]
//!  ^ 64-aligned     ^ 64-aligned
//! ```

use crate::error::{try_alloc, Error, Result};
use crate::image::{Image, ScanlineOrder};
use crate::pixel::Rgba32F;
use bytemuck::{Pod, Zeroable};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Channel padding granularity in bytes.
pub const CHANNEL_PADDING: usize = 64;

const FLOATS_PER_BLOCK: usize = CHANNEL_PADDING / std::mem::size_of::<f32>();

const COPY_CHUNK: usize = 16 * 1024;

#[repr(C, align(64))]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Block([f32; FLOATS_PER_BLOCK]);

/// Channel selector for [`ImageSoA`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Red
    R = 0,
    /// Green
    G = 1,
    /// Blue
    B = 2,
    /// Alpha
    A = 3,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];
}

/// HDR image stored as four padded channel arrays.
#[derive(Clone)]
pub struct ImageSoA {
    blocks: Vec<Block>,
    blocks_per_channel: usize,
    width: u32,
    height: u32,
    order: ScanlineOrder,
}

impl ImageSoA {
    /// Allocates a zeroed SoA image.
    pub fn new(width: u32, height: u32, order: ScanlineOrder) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "pixel count overflows usize"))?;
        let blocks_per_channel = len.div_ceil(FLOATS_PER_BLOCK);
        let total = blocks_per_channel
            .checked_mul(4)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "channel storage overflows usize"))?;
        Ok(Self {
            blocks: try_alloc(total, Block::zeroed())?,
            blocks_per_channel,
            width,
            height,
            order,
        })
    }

    /// Converts an AoS image, keeping its scanline order.
    pub fn from_image(src: &Image<Rgba32F>) -> Result<Self> {
        let mut soa = Self::new(src.width(), src.height(), src.order())?;
        let len = soa.pixel_count();
        let padded = soa.padded_len();
        let pixels = src.as_slice();
        if len == 0 {
            return Ok(soa);
        }

        let flat: &mut [f32] = bytemuck::cast_slice_mut(&mut soa.blocks);

        #[cfg(feature = "parallel")]
        flat.par_chunks_mut(padded).enumerate().for_each(|(c, chan)| {
            chan[..len]
                .par_chunks_mut(COPY_CHUNK)
                .zip(pixels.par_chunks(COPY_CHUNK))
                .for_each(|(out, px)| gather(c, out, px));
        });

        #[cfg(not(feature = "parallel"))]
        for (c, chan) in flat.chunks_mut(padded).enumerate() {
            gather(c, &mut chan[..len], pixels);
        }

        Ok(soa)
    }

    /// Converts back to an AoS image with the same order.
    pub fn to_image(&self) -> Result<Image<Rgba32F>> {
        let mut img = Image::new(self.width, self.height, self.order)?;
        let channels = self.channels();

        #[cfg(feature = "parallel")]
        img.as_mut_slice()
            .par_chunks_mut(COPY_CHUNK)
            .enumerate()
            .for_each(|(ci, out)| scatter(ci * COPY_CHUNK, out, &channels));

        #[cfg(not(feature = "parallel"))]
        scatter(0, img.as_mut_slice(), &channels);

        Ok(img)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Storage order of the rows.
    #[inline]
    pub fn order(&self) -> ScanlineOrder {
        self.order
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// `true` if the image holds no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// Channel length including the zero padding.
    #[inline]
    pub fn padded_len(&self) -> usize {
        self.blocks_per_channel * FLOATS_PER_BLOCK
    }

    /// Values of one channel, `pixel_count()` long.
    #[inline]
    pub fn channel(&self, c: Channel) -> &[f32] {
        &self.channel_padded(c)[..self.pixel_count()]
    }

    /// Values of one channel including the trailing zero padding.
    #[inline]
    pub fn channel_padded(&self, c: Channel) -> &[f32] {
        let start = c as usize * self.blocks_per_channel;
        bytemuck::cast_slice(&self.blocks[start..start + self.blocks_per_channel])
    }

    /// Mutable channel values, `pixel_count()` long.
    pub fn channel_mut(&mut self, c: Channel) -> &mut [f32] {
        let len = self.pixel_count();
        let start = c as usize * self.blocks_per_channel;
        let blocks = &mut self.blocks[start..start + self.blocks_per_channel];
        &mut bytemuck::cast_slice_mut(blocks)[..len]
    }

    /// The four channels `[r, g, b, a]`, each `pixel_count()` long.
    pub fn channels(&self) -> [&[f32]; 4] {
        Channel::ALL.map(|c| self.channel(c))
    }

    /// Linear index of `(x, y)` where `y` is counted in `mode`.
    #[inline]
    pub fn index_of(&self, x: u32, y: u32, mode: ScanlineOrder) -> usize {
        let row = mode.remap_row(y, self.height, self.order);
        row as usize * self.width as usize + x as usize
    }

    /// Gathers the pixel at linear storage index `i`.
    #[inline]
    pub fn pixel(&self, i: usize) -> Rgba32F {
        let [r, g, b, a] = self.channels();
        Rgba32F::new(r[i], g[i], b[i], a[i])
    }

    /// Gathers the pixel at `(x, y)` with `y` counted in `mode`.
    #[inline]
    pub fn pixel_at(&self, x: u32, y: u32, mode: ScanlineOrder) -> Rgba32F {
        self.pixel(self.index_of(x, y, mode))
    }
}

impl std::fmt::Debug for ImageSoA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSoA")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("order", &self.order)
            .field("padded_len", &self.padded_len())
            .finish()
    }
}

/// Copies channel `c` of `px` into `out`.
#[inline]
fn gather(c: usize, out: &mut [f32], px: &[Rgba32F]) {
    for (o, p) in out.iter_mut().zip(px) {
        *o = p.to_array()[c];
    }
}

/// Interleaves the channel planes starting at pixel `base` into `out`.
#[inline]
fn scatter(base: usize, out: &mut [Rgba32F], [r, g, b, a]: &[&[f32]; 4]) {
    for (k, p) in out.iter_mut().enumerate() {
        let i = base + k;
        *p = Rgba32F::new(r[i], g[i], b[i], a[i]);
    }
}
