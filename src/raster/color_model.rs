// Color model module
// Native pixel layouts and their conversion to and from packed ARGB

use std::fmt;
use std::str::FromStr;

/// Channel levels of the 6x6x6 color cube in the indexed palette
const CUBE_LEVELS: [u32; 6] = [0, 51, 102, 153, 204, 255];

/// Number of gray steps appended after the color cube
const GRAY_STEPS: u32 = 40;

/// Pixel layout of a raster.
///
/// Every layout is stored as one `u32` sample per pixel. Reading a pixel
/// always goes through packed `0xAARRGGBB`, so layouts with less precision
/// than 8-bit RGB lose information on write:
///
/// - gray layouts keep the luma `(77 R + 150 G + 29 B) / 256` only;
/// - `ByteBinary` keeps black or white (luma threshold 128);
/// - `ByteIndexed` keeps the nearest entry of a fixed 256-color palette;
/// - `Ushort555Rgb` and `Ushort565Rgb` truncate the low bits of each channel;
/// - opaque layouts drop alpha and read back with alpha 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorModel {
    /// 8-bit RGB packed in an int
    #[default]
    IntRgb,
    /// 8-bit RGB packed in an int, blue in the low byte swapped with red
    IntBgr,
    /// 8-bit ARGB packed in an int
    IntArgb,
    /// 8-bit ARGB with premultiplied color channels
    IntArgbPre,
    /// 8-bit RGB stored as three bytes
    ThreeByteBgr,
    /// 8-bit ARGB stored as four bytes
    FourByteAbgr,
    /// 8-bit ARGB stored as four bytes, premultiplied
    FourByteAbgrPre,
    /// 1-bit black and white
    ByteBinary,
    /// 8-bit gray
    ByteGray,
    /// 8-bit index into a 256-color palette
    ByteIndexed,
    /// 16-bit gray
    UshortGray,
    /// 5 bits per channel
    Ushort555Rgb,
    /// 5 bits red, 6 bits green, 5 bits blue
    Ushort565Rgb,
}

impl ColorModel {
    pub const ALL: [ColorModel; 13] = [
        ColorModel::IntRgb,
        ColorModel::IntBgr,
        ColorModel::IntArgb,
        ColorModel::IntArgbPre,
        ColorModel::ThreeByteBgr,
        ColorModel::FourByteAbgr,
        ColorModel::FourByteAbgrPre,
        ColorModel::ByteBinary,
        ColorModel::ByteGray,
        ColorModel::ByteIndexed,
        ColorModel::UshortGray,
        ColorModel::Ushort555Rgb,
        ColorModel::Ushort565Rgb,
    ];

    /// Human-readable name, as shown by `Raster::describe`
    pub fn name(self) -> &'static str {
        match self {
            ColorModel::IntRgb => "RGB",
            ColorModel::IntBgr => "BGR",
            ColorModel::IntArgb => "ARGB",
            ColorModel::IntArgbPre => "ARGB premultiplied",
            ColorModel::ThreeByteBgr => "RGB 8-8-8",
            ColorModel::FourByteAbgr => "ARGB 8-8-8-8",
            ColorModel::FourByteAbgrPre => "ARGB 8-8-8-8 premultiplied",
            ColorModel::ByteBinary => "BYTE_BINARY",
            ColorModel::ByteGray => "BYTE_GRAY",
            ColorModel::ByteIndexed => "INDEXED 256",
            ColorModel::UshortGray => "GRAY 16",
            ColorModel::Ushort555Rgb => "RGB 5-5-5",
            ColorModel::Ushort565Rgb => "RGB 5-6-5",
        }
    }

    /// Short identifier accepted by `FromStr`
    pub fn id(self) -> &'static str {
        match self {
            ColorModel::IntRgb => "rgb",
            ColorModel::IntBgr => "bgr",
            ColorModel::IntArgb => "argb",
            ColorModel::IntArgbPre => "argb-pre",
            ColorModel::ThreeByteBgr => "3byte-bgr",
            ColorModel::FourByteAbgr => "4byte-abgr",
            ColorModel::FourByteAbgrPre => "4byte-abgr-pre",
            ColorModel::ByteBinary => "binary",
            ColorModel::ByteGray => "gray",
            ColorModel::ByteIndexed => "indexed",
            ColorModel::UshortGray => "gray16",
            ColorModel::Ushort555Rgb => "rgb555",
            ColorModel::Ushort565Rgb => "rgb565",
        }
    }

    pub fn bits_per_pixel(self) -> u32 {
        match self {
            ColorModel::IntRgb | ColorModel::IntBgr | ColorModel::ThreeByteBgr => 24,
            ColorModel::IntArgb
            | ColorModel::IntArgbPre
            | ColorModel::FourByteAbgr
            | ColorModel::FourByteAbgrPre => 32,
            ColorModel::ByteBinary => 1,
            ColorModel::ByteGray | ColorModel::ByteIndexed => 8,
            ColorModel::UshortGray | ColorModel::Ushort565Rgb => 16,
            ColorModel::Ushort555Rgb => 15,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            ColorModel::IntArgb
                | ColorModel::IntArgbPre
                | ColorModel::FourByteAbgr
                | ColorModel::FourByteAbgrPre
        )
    }

    pub fn is_premultiplied(self) -> bool {
        matches!(self, ColorModel::IntArgbPre | ColorModel::FourByteAbgrPre)
    }

    /// Convert packed ARGB into this model's native sample
    pub(crate) fn encode(self, argb: u32) -> u32 {
        let (a, r, g, b) = unpack(argb);
        match self {
            ColorModel::IntRgb | ColorModel::ThreeByteBgr => argb & 0x00FF_FFFF,
            ColorModel::IntBgr => (b << 16) | (g << 8) | r,
            ColorModel::IntArgb | ColorModel::FourByteAbgr => argb,
            ColorModel::IntArgbPre | ColorModel::FourByteAbgrPre => pack(
                a,
                premultiply(r, a),
                premultiply(g, a),
                premultiply(b, a),
            ),
            ColorModel::ByteBinary => u32::from(luma8(r, g, b) >= 128),
            ColorModel::ByteGray => luma8(r, g, b),
            ColorModel::ByteIndexed => nearest_palette_index(r, g, b),
            ColorModel::UshortGray => luma16(r, g, b),
            ColorModel::Ushort555Rgb => ((r >> 3) << 10) | ((g >> 3) << 5) | (b >> 3),
            ColorModel::Ushort565Rgb => ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3),
        }
    }

    /// Convert a native sample back into packed ARGB
    pub(crate) fn decode(self, sample: u32) -> u32 {
        match self {
            ColorModel::IntRgb | ColorModel::ThreeByteBgr => 0xFF00_0000 | (sample & 0x00FF_FFFF),
            ColorModel::IntBgr => {
                let (_, b, g, r) = unpack(sample);
                pack(0xFF, r, g, b)
            }
            ColorModel::IntArgb | ColorModel::FourByteAbgr => sample,
            ColorModel::IntArgbPre | ColorModel::FourByteAbgrPre => {
                let (a, r, g, b) = unpack(sample);
                pack(a, unpremultiply(r, a), unpremultiply(g, a), unpremultiply(b, a))
            }
            ColorModel::ByteBinary => {
                if sample & 1 == 1 {
                    0xFFFF_FFFF
                } else {
                    0xFF00_0000
                }
            }
            ColorModel::ByteGray => {
                let l = sample & 0xFF;
                pack(0xFF, l, l, l)
            }
            ColorModel::ByteIndexed => {
                let (r, g, b) = palette_entry(sample & 0xFF);
                pack(0xFF, r, g, b)
            }
            ColorModel::UshortGray => {
                let l = ((sample & 0xFFFF) + 128) / 257;
                pack(0xFF, l, l, l)
            }
            ColorModel::Ushort555Rgb => pack(
                0xFF,
                expand5((sample >> 10) & 0x1F),
                expand5((sample >> 5) & 0x1F),
                expand5(sample & 0x1F),
            ),
            ColorModel::Ushort565Rgb => pack(
                0xFF,
                expand5((sample >> 11) & 0x1F),
                expand6((sample >> 5) & 0x3F),
                expand5(sample & 0x1F),
            ),
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ColorModel::ALL
            .into_iter()
            .find(|model| model.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = ColorModel::ALL.iter().map(|m| m.id()).collect();
                format!("Unknown color model '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

pub(crate) fn pack(a: u32, r: u32, g: u32, b: u32) -> u32 {
    (a << 24) | (r << 16) | (g << 8) | b
}

pub(crate) fn unpack(argb: u32) -> (u32, u32, u32, u32) {
    ((argb >> 24) & 0xFF, (argb >> 16) & 0xFF, (argb >> 8) & 0xFF, argb & 0xFF)
}

fn luma8(r: u32, g: u32, b: u32) -> u32 {
    (77 * r + 150 * g + 29 * b + 128) >> 8
}

fn luma16(r: u32, g: u32, b: u32) -> u32 {
    ((77 * r + 150 * g + 29 * b) * 257 + 128) >> 8
}

fn premultiply(c: u32, a: u32) -> u32 {
    (c * a + 127) / 255
}

fn unpremultiply(c: u32, a: u32) -> u32 {
    if a == 0 {
        0
    } else {
        ((c * 255 + a / 2) / a).min(255)
    }
}

fn expand5(v: u32) -> u32 {
    (v << 3) | (v >> 2)
}

fn expand6(v: u32) -> u32 {
    (v << 2) | (v >> 4)
}

/// Palette entry: 216 cube colors followed by a gray ramp
fn palette_entry(index: u32) -> (u32, u32, u32) {
    if index < 216 {
        (
            CUBE_LEVELS[(index / 36) as usize],
            CUBE_LEVELS[((index / 6) % 6) as usize],
            CUBE_LEVELS[(index % 6) as usize],
        )
    } else {
        let step = (index - 216).min(GRAY_STEPS - 1);
        let v = (step * 255 + (GRAY_STEPS - 1) / 2) / (GRAY_STEPS - 1);
        (v, v, v)
    }
}

fn nearest_palette_index(r: u32, g: u32, b: u32) -> u32 {
    let distance = |index: u32| {
        let (pr, pg, pb) = palette_entry(index);
        let dr = pr as i32 - r as i32;
        let dg = pg as i32 - g as i32;
        let db = pb as i32 - b as i32;
        dr * dr + dg * dg + db * db
    };
    (0..216 + GRAY_STEPS).min_by_key(|&i| distance(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_rgb_models_are_exact() {
        for model in [ColorModel::IntRgb, ColorModel::IntBgr, ColorModel::ThreeByteBgr] {
            let argb = 0xFF12_3456;
            assert_eq!(model.decode(model.encode(argb)), argb, "{}", model);
            // alpha is dropped
            assert_eq!(model.decode(model.encode(0x4012_3456)), argb, "{}", model);
        }
    }

    #[test]
    fn bgr_swaps_channels_in_storage() {
        assert_eq!(ColorModel::IntBgr.encode(0xFF11_2233), 0x0033_2211);
    }

    #[test]
    fn premultiplied_models_round_trip_opaque_colors() {
        for model in [ColorModel::IntArgbPre, ColorModel::FourByteAbgrPre] {
            assert_eq!(model.decode(model.encode(0xFFAB_CDEF)), 0xFFAB_CDEF);
            assert_eq!(model.decode(model.encode(0x0012_3456)), 0);
        }
    }

    #[test]
    fn premultiplied_half_alpha_is_close() {
        let model = ColorModel::IntArgbPre;
        let (a, r, g, b) = unpack(model.decode(model.encode(0x80C8_6432)));
        assert_eq!(a, 0x80);
        assert!(r.abs_diff(0xC8) <= 1);
        assert!(g.abs_diff(0x64) <= 1);
        assert!(b.abs_diff(0x32) <= 1);
    }

    #[test]
    fn gray_models_keep_gray_inputs_exact() {
        for v in [0u32, 1, 77, 128, 200, 255] {
            let argb = pack(0xFF, v, v, v);
            assert_eq!(ColorModel::ByteGray.decode(ColorModel::ByteGray.encode(argb)), argb);
            assert_eq!(ColorModel::UshortGray.decode(ColorModel::UshortGray.encode(argb)), argb);
        }
    }

    #[test]
    fn gray_uses_luma_weights() {
        // pure red has luma 77/256 * 255
        assert_eq!(ColorModel::ByteGray.encode(0xFFFF_0000), 77);
        assert_eq!(ColorModel::UshortGray.encode(0xFFFF_FFFF), 0xFFFF);
    }

    #[test]
    fn binary_thresholds_on_luma() {
        let model = ColorModel::ByteBinary;
        assert_eq!(model.decode(model.encode(0xFF80_8080)), 0xFFFF_FFFF);
        assert_eq!(model.decode(model.encode(0xFF7F_7F7F)), 0xFF00_0000);
        assert_eq!(model.decode(model.encode(0xFFFF_0000)), 0xFF00_0000);
    }

    #[test]
    fn indexed_palette_hits_cube_colors_exactly() {
        let model = ColorModel::ByteIndexed;
        for argb in [0xFF00_0000, 0xFFFF_FFFF, 0xFF33_6699, 0xFFCC_0033] {
            assert_eq!(model.decode(model.encode(argb)), argb);
        }
        // in between values snap to a neighbour
        let (_, r, _, _) = unpack(model.decode(model.encode(0xFF3A_0000)));
        assert_eq!(r, 51);
    }

    #[test]
    fn short_rgb_models_truncate_and_expand() {
        let argb = 0xFFFF_FFFF;
        assert_eq!(ColorModel::Ushort555Rgb.decode(ColorModel::Ushort555Rgb.encode(argb)), argb);
        assert_eq!(ColorModel::Ushort565Rgb.decode(ColorModel::Ushort565Rgb.encode(argb)), argb);

        let (_, r, g, b) = unpack(ColorModel::Ushort565Rgb.decode(ColorModel::Ushort565Rgb.encode(0xFF0F_0F0F)));
        assert_eq!((r, g, b), (0x08, 0x0C, 0x08));
    }

    #[test]
    fn parses_model_ids() {
        for model in ColorModel::ALL {
            assert_eq!(model.id().parse::<ColorModel>(), Ok(model));
        }
        assert_eq!("GRAY".parse::<ColorModel>(), Ok(ColorModel::ByteGray));
        assert!("cmyk".parse::<ColorModel>().is_err());
    }
}
