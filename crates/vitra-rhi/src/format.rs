// Copyright 2025 vitra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The pixel/texel format registry.
//!
//! Every [`PixelFormat`] has exactly one immutable [`FormatInfo`] descriptor.
//! For uncompressed formats, `info().size` is the byte size of one texel; for
//! block-compressed formats it is the byte size of one block and region sizes
//! must go through [`texture_size`] / [`surface_size`], which know the block
//! arithmetic of each family.

use crate::vitra_bitflags;
use log::error;

vitra_bitflags! {
    /// Property flags of a pixel format.
    pub struct FormatFlags: u8 {
        /// The format stores floating-point data.
        const FLOAT = 1 << 0;
        /// The format carries an alpha channel.
        const ALPHA = 1 << 1;
        /// The format carries a depth component.
        const DEPTH = 1 << 2;
        /// The format carries a stencil component.
        const STENCIL = 1 << 3;
        /// The format is block-compressed.
        const COMPRESSED = 1 << 4;
    }
}

/// The closed set of pixel/texel formats understood by the RHI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    // 8-bit single/dual channel
    /// One 8-bit alpha component.
    A8Unorm,
    /// One 8-bit luminance component.
    L8Unorm,
    /// 8-bit luminance + 8-bit alpha.
    La8Unorm,

    // Packed 16-bit color
    /// 5-6-5 packed RGB in 16 bits.
    R5G6B5Unorm,
    /// 5-5-5-1 packed RGBA in 16 bits.
    Rgb5A1Unorm,
    /// 4-4-4-4 packed RGBA in 16 bits.
    Rgba4Unorm,

    // 8-bit-per-channel color
    /// Three 8-bit unsigned normalized components.
    Rgb8Unorm,
    /// Four 8-bit unsigned normalized components.
    Rgba8Unorm,
    /// Three 8-bit components in the sRGB color space.
    Rgb8UnormSrgb,
    /// Four 8-bit components in the sRGB color space.
    Rgba8UnormSrgb,

    // Float color
    /// One 16-bit float component.
    R16Float,
    /// Two 16-bit float components.
    Rg16Float,
    /// Three 16-bit float components.
    Rgb16Float,
    /// Four 16-bit float components.
    Rgba16Float,
    /// One 32-bit float component.
    R32Float,
    /// Two 32-bit float components.
    Rg32Float,
    /// Three 32-bit float components.
    Rgb32Float,
    /// Four 32-bit float components.
    Rgba32Float,
    /// Packed 11-11-10 float RGB in 32 bits.
    Rg11B10Float,

    // Depth/stencil
    /// 16-bit unsigned normalized depth.
    Depth16Unorm,
    /// 24-bit unsigned normalized depth.
    Depth24Unorm,
    /// 24-bit depth with 8-bit stencil.
    Depth24UnormStencil8,
    /// 32-bit float depth.
    Depth32Float,
    /// 32-bit float depth with 8-bit stencil.
    Depth32FloatStencil8,

    // BC (S3TC/BPTC) block compression, 4x4 blocks
    /// BC1 RGB, 8-byte blocks.
    Bc1RgbUnorm,
    /// BC1 RGBA (1-bit alpha), 8-byte blocks.
    Bc1RgbaUnorm,
    /// BC1 RGB, sRGB.
    Bc1RgbSrgb,
    /// BC1 RGBA, sRGB.
    Bc1RgbaSrgb,
    /// BC2 RGBA (explicit alpha).
    Bc2RgbaUnorm,
    /// BC2 RGBA, sRGB.
    Bc2RgbaSrgb,
    /// BC3 RGBA (interpolated alpha).
    Bc3RgbaUnorm,
    /// BC3 RGBA, sRGB.
    Bc3RgbaSrgb,
    /// BC4 single channel, unsigned.
    Bc4RUnorm,
    /// BC4 single channel, signed.
    Bc4RSnorm,
    /// BC5 dual channel, unsigned.
    Bc5RgUnorm,
    /// BC5 dual channel, signed.
    Bc5RgSnorm,
    /// BC6H HDR RGB, signed float.
    Bc6hRgbSfloat,
    /// BC6H HDR RGB, unsigned float.
    Bc6hRgbUfloat,
    /// BC7 RGBA.
    Bc7RgbaUnorm,
    /// BC7 RGBA, sRGB.
    Bc7RgbaSrgb,

    // ETC/ETC2/EAC block compression, 4x4 blocks
    /// ETC1 RGB.
    EtcRgb8Unorm,
    /// ETC2 RGB.
    Etc2Rgb8Unorm,
    /// ETC2 RGB, sRGB.
    Etc2Rgb8Srgb,
    /// ETC2 RGB with punch-through 1-bit alpha.
    Etc2Rgb8A1Unorm,
    /// ETC2 RGB with punch-through alpha, sRGB.
    Etc2Rgb8A1Srgb,
    /// ETC2 RGBA (ETC2 + EAC alpha).
    Etc2Rgba8Unorm,
    /// ETC2 RGBA, sRGB.
    Etc2Rgba8Srgb,
    /// EAC single channel, unsigned.
    EacR11Unorm,
    /// EAC single channel, signed.
    EacR11Snorm,
    /// EAC dual channel, unsigned.
    EacRg11Unorm,
    /// EAC dual channel, signed.
    EacRg11Snorm,

    // PVRTC, bits-per-pixel based
    /// PVRTC RGB at 2 bits per pixel.
    PvrtcRgb2bpp,
    /// PVRTC RGBA at 2 bits per pixel.
    PvrtcRgba2bpp,
    /// PVRTC RGB at 4 bits per pixel.
    PvrtcRgb4bpp,
    /// PVRTC RGBA at 4 bits per pixel.
    PvrtcRgba4bpp,
}

/// The immutable descriptor attached to every [`PixelFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Human-readable format name.
    pub name: &'static str,
    /// Byte size of one texel, or of one block for compressed formats.
    /// Zero for formats whose size is purely bits-per-pixel based (PVRTC);
    /// those are only sizeable through [`texture_size`].
    pub size: u32,
    /// Number of color/data channels.
    pub channel_count: u8,
    /// Property flags.
    pub flags: FormatFlags,
}

impl FormatInfo {
    const fn new(name: &'static str, size: u32, channel_count: u8, flags: FormatFlags) -> Self {
        Self { name, size, channel_count, flags }
    }
}

impl PixelFormat {
    /// Returns the immutable [`FormatInfo`] descriptor for this format.
    pub const fn info(self) -> FormatInfo {
        use FormatFlags as F;
        const NONE: FormatFlags = FormatFlags::EMPTY;
        const AL: FormatFlags = F::ALPHA;
        const FL: FormatFlags = F::FLOAT;
        const FA: FormatFlags = F::FLOAT.with(F::ALPHA);
        const DP: FormatFlags = F::DEPTH;
        const DS: FormatFlags = F::DEPTH.with(F::STENCIL);
        const CM: FormatFlags = F::COMPRESSED;
        const CA: FormatFlags = F::COMPRESSED.with(F::ALPHA);
        const CF: FormatFlags = F::COMPRESSED.with(F::FLOAT);

        match self {
            PixelFormat::A8Unorm => FormatInfo::new("A8", 1, 1, AL),
            PixelFormat::L8Unorm => FormatInfo::new("L8", 1, 1, NONE),
            PixelFormat::La8Unorm => FormatInfo::new("LA8", 2, 2, AL),

            PixelFormat::R5G6B5Unorm => FormatInfo::new("R5G6B5", 2, 3, NONE),
            PixelFormat::Rgb5A1Unorm => FormatInfo::new("RGB5A1", 2, 4, AL),
            PixelFormat::Rgba4Unorm => FormatInfo::new("RGBA4", 2, 4, AL),

            PixelFormat::Rgb8Unorm => FormatInfo::new("RGB8", 3, 3, NONE),
            PixelFormat::Rgba8Unorm => FormatInfo::new("RGBA8", 4, 4, AL),
            PixelFormat::Rgb8UnormSrgb => FormatInfo::new("SRGB8", 3, 3, NONE),
            PixelFormat::Rgba8UnormSrgb => FormatInfo::new("SRGB8_A8", 4, 4, AL),

            PixelFormat::R16Float => FormatInfo::new("R16F", 2, 1, FL),
            PixelFormat::Rg16Float => FormatInfo::new("RG16F", 4, 2, FL),
            PixelFormat::Rgb16Float => FormatInfo::new("RGB16F", 6, 3, FL),
            PixelFormat::Rgba16Float => FormatInfo::new("RGBA16F", 8, 4, FA),
            PixelFormat::R32Float => FormatInfo::new("R32F", 4, 1, FL),
            PixelFormat::Rg32Float => FormatInfo::new("RG32F", 8, 2, FL),
            PixelFormat::Rgb32Float => FormatInfo::new("RGB32F", 12, 3, FL),
            PixelFormat::Rgba32Float => FormatInfo::new("RGBA32F", 16, 4, FA),
            PixelFormat::Rg11B10Float => FormatInfo::new("R11G11B10F", 4, 3, FL),

            PixelFormat::Depth16Unorm => FormatInfo::new("D16", 2, 1, DP),
            PixelFormat::Depth24Unorm => FormatInfo::new("D24", 3, 1, DP),
            PixelFormat::Depth24UnormStencil8 => FormatInfo::new("D24S8", 4, 2, DS),
            PixelFormat::Depth32Float => FormatInfo::new("D32F", 4, 1, DP.with(F::FLOAT)),
            PixelFormat::Depth32FloatStencil8 => FormatInfo::new("D32FS8", 5, 2, DS.with(F::FLOAT)),

            PixelFormat::Bc1RgbUnorm => FormatInfo::new("BC1", 8, 3, CM),
            PixelFormat::Bc1RgbaUnorm => FormatInfo::new("BC1_ALPHA", 8, 4, CA),
            PixelFormat::Bc1RgbSrgb => FormatInfo::new("BC1_SRGB", 8, 3, CM),
            PixelFormat::Bc1RgbaSrgb => FormatInfo::new("BC1_SRGB_ALPHA", 8, 4, CA),
            PixelFormat::Bc2RgbaUnorm => FormatInfo::new("BC2", 16, 4, CA),
            PixelFormat::Bc2RgbaSrgb => FormatInfo::new("BC2_SRGB", 16, 4, CA),
            PixelFormat::Bc3RgbaUnorm => FormatInfo::new("BC3", 16, 4, CA),
            PixelFormat::Bc3RgbaSrgb => FormatInfo::new("BC3_SRGB", 16, 4, CA),
            PixelFormat::Bc4RUnorm => FormatInfo::new("BC4", 16, 1, CM),
            PixelFormat::Bc4RSnorm => FormatInfo::new("BC4_SNORM", 16, 1, CM),
            PixelFormat::Bc5RgUnorm => FormatInfo::new("BC5", 32, 2, CM),
            PixelFormat::Bc5RgSnorm => FormatInfo::new("BC5_SNORM", 32, 2, CM),
            PixelFormat::Bc6hRgbSfloat => FormatInfo::new("BC6H_SF16", 16, 3, CF),
            PixelFormat::Bc6hRgbUfloat => FormatInfo::new("BC6H_UF16", 16, 3, CF),
            PixelFormat::Bc7RgbaUnorm => FormatInfo::new("BC7", 16, 4, CA),
            PixelFormat::Bc7RgbaSrgb => FormatInfo::new("BC7_SRGB", 16, 4, CA),

            PixelFormat::EtcRgb8Unorm => FormatInfo::new("ETC_RGB8", 8, 3, CM),
            PixelFormat::Etc2Rgb8Unorm => FormatInfo::new("ETC2_RGB8", 8, 3, CM),
            PixelFormat::Etc2Rgb8Srgb => FormatInfo::new("ETC2_SRGB8", 8, 3, CM),
            PixelFormat::Etc2Rgb8A1Unorm => FormatInfo::new("ETC2_RGB8_A1", 8, 4, CA),
            PixelFormat::Etc2Rgb8A1Srgb => FormatInfo::new("ETC2_SRGB8_A1", 8, 4, CA),
            PixelFormat::Etc2Rgba8Unorm => FormatInfo::new("ETC2_RGBA8", 16, 4, CA),
            PixelFormat::Etc2Rgba8Srgb => FormatInfo::new("ETC2_SRGB8_A8", 16, 4, CA),
            PixelFormat::EacR11Unorm => FormatInfo::new("EAC_R11", 8, 1, CM),
            PixelFormat::EacR11Snorm => FormatInfo::new("EAC_R11SN", 8, 1, CM),
            PixelFormat::EacRg11Unorm => FormatInfo::new("EAC_RG11", 16, 2, CM),
            PixelFormat::EacRg11Snorm => FormatInfo::new("EAC_RG11SN", 16, 2, CM),

            PixelFormat::PvrtcRgb2bpp => FormatInfo::new("PVRTC_RGB2", 0, 3, CM),
            PixelFormat::PvrtcRgba2bpp => FormatInfo::new("PVRTC_RGBA2", 0, 4, CA),
            PixelFormat::PvrtcRgb4bpp => FormatInfo::new("PVRTC_RGB4", 0, 3, CM),
            PixelFormat::PvrtcRgba4bpp => FormatInfo::new("PVRTC_RGBA4", 0, 4, CA),
        }
    }

    /// `true` if the format is block-compressed.
    #[inline]
    pub fn is_compressed(self) -> bool {
        self.info().flags.contains(FormatFlags::COMPRESSED)
    }

    /// `true` if the format carries a stencil component.
    #[inline]
    pub fn has_stencil(self) -> bool {
        self.info().flags.contains(FormatFlags::STENCIL)
    }

    /// `true` if the format carries a depth component.
    #[inline]
    pub fn has_depth(self) -> bool {
        self.info().flags.contains(FormatFlags::DEPTH)
    }
}

#[inline]
fn blocks(dim: u32) -> u64 {
    dim.div_ceil(4) as u64
}

/// Returns the byte size of a `width` x `height` x `depth` region of `format`.
///
/// Uncompressed formats are `width * height * depth * bytes_per_texel`.
/// Compressed formats dispatch on the block family; a compressed format with
/// no defined block arithmetic yields 0 and logs an error.
pub fn texture_size(format: PixelFormat, width: u32, height: u32, depth: u32) -> u64 {
    let info = format.info();
    if !info.flags.contains(FormatFlags::COMPRESSED) {
        return width as u64 * height as u64 * depth as u64 * info.size as u64;
    }

    let (w, h, d) = (width as u64, height as u64, depth as u64);
    match format {
        // 8-byte 4x4 blocks
        PixelFormat::Bc1RgbUnorm
        | PixelFormat::Bc1RgbaUnorm
        | PixelFormat::Bc1RgbSrgb
        | PixelFormat::Bc1RgbaSrgb
        | PixelFormat::EtcRgb8Unorm
        | PixelFormat::Etc2Rgb8Unorm
        | PixelFormat::Etc2Rgb8Srgb
        | PixelFormat::Etc2Rgb8A1Unorm
        | PixelFormat::Etc2Rgb8A1Srgb
        | PixelFormat::EacR11Unorm
        | PixelFormat::EacR11Snorm => blocks(width) * blocks(height) * 8 * d,

        // 16-byte 4x4 blocks
        PixelFormat::Bc2RgbaUnorm
        | PixelFormat::Bc2RgbaSrgb
        | PixelFormat::Bc3RgbaUnorm
        | PixelFormat::Bc3RgbaSrgb
        | PixelFormat::Bc4RUnorm
        | PixelFormat::Bc4RSnorm
        | PixelFormat::Bc6hRgbSfloat
        | PixelFormat::Bc6hRgbUfloat
        | PixelFormat::Bc7RgbaUnorm
        | PixelFormat::Bc7RgbaSrgb
        | PixelFormat::Etc2Rgba8Unorm
        | PixelFormat::Etc2Rgba8Srgb
        | PixelFormat::EacRg11Unorm
        | PixelFormat::EacRg11Snorm => blocks(width) * blocks(height) * 16 * d,

        // 32-byte 4x4 blocks
        PixelFormat::Bc5RgUnorm | PixelFormat::Bc5RgSnorm => {
            blocks(width) * blocks(height) * 32 * d
        }

        // PVRTC sizes by bits per pixel with hardware minimum dimensions.
        PixelFormat::PvrtcRgb2bpp | PixelFormat::PvrtcRgba2bpp => {
            (w.max(16) * h.max(8)).div_ceil(4) * d
        }
        PixelFormat::PvrtcRgb4bpp | PixelFormat::PvrtcRgba4bpp => {
            (w.max(8) * h.max(8)).div_ceil(2) * d
        }

        _ => {
            error!("texture_size: no block arithmetic for compressed format {:?}", format);
            0
        }
    }
}

/// Returns the byte size of the full mip chain of a surface: the sum of
/// [`texture_size`] over `mips` levels, halving width and height (floored,
/// minimum 1) after each level. Used for allocation pre-sizing.
pub fn surface_size(format: PixelFormat, width: u32, height: u32, depth: u32, mips: u32) -> u64 {
    let mut w = width;
    let mut h = height;
    let mut total = 0u64;
    for _ in 0..mips {
        total += texture_size(format, w, h, depth);
        w = (w >> 1).max(1);
        h = (h >> 1).max(1);
    }
    total
}
