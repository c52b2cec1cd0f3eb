// Raster module
// In-memory pixel grid with fixed dimensions and a selectable color model

mod color_model;

pub use color_model::ColorModel;

use crate::config::Settings;
use crate::error::{Error, Result};
use color_model::{pack, unpack};
use image::{DynamicImage, ImageBuffer, Luma, Rgb, RgbImage, RgbaImage};
use std::fmt;
use std::path::{Path, PathBuf};

/// A width x height grid of pixels.
///
/// Dimensions never change after construction. Crop and color conversion
/// produce new rasters with their own storage: a crop is a copy, so writes
/// to the source after cropping are not visible in the crop (and the other
/// way round).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    model: ColorModel,
    /// One native sample per pixel, row-major
    samples: Vec<u32>,
    display_name: String,
    source_directory: PathBuf,
}

impl Default for Raster {
    /// A single black `IntRgb` pixel
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            width: 1,
            height: 1,
            model: ColorModel::IntRgb,
            samples: vec![0],
            display_name: settings.display_name,
            source_directory: settings.directory,
        }
    }
}

impl Raster {
    /// Create a black `IntRgb` raster
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_model(width, height, ColorModel::IntRgb)
    }

    /// Create a raster in the given color model with default metadata
    pub fn with_model(width: u32, height: u32, model: ColorModel) -> Result<Self> {
        Self::with_settings(width, height, model, &Settings::default())
    }

    /// Create a zeroed raster: black for opaque models, transparent black
    /// for models with alpha.
    pub fn with_settings(
        width: u32,
        height: u32,
        model: ColorModel,
        settings: &Settings,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            model,
            samples: vec![0; width as usize * height as usize],
            display_name: settings.display_name.clone(),
            source_directory: settings.directory.clone(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_model(&self) -> ColorModel {
        self.model
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    pub fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    pub fn set_source_directory(&mut self, directory: impl Into<PathBuf>) {
        self.source_directory = directory.into();
    }

    /// Index of (x, y) in `samples`, or `OutOfBounds`
    fn index(&self, x: i32, y: i32) -> Result<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return Err(Error::pixel(x, y, self.width, self.height));
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    /// Packed `0xAARRGGBB` color of a pixel. Opaque models report alpha 255.
    pub fn get_color(&self, x: i32, y: i32) -> Result<u32> {
        let index = self.index(x, y)?;
        Ok(self.model.decode(self.samples[index]))
    }

    /// `[r, g, b]` components of a pixel, each in 0..=255
    pub fn get_pixel(&self, x: i32, y: i32) -> Result<[u8; 3]> {
        let (_, r, g, b) = unpack(self.get_color(x, y)?);
        Ok([r as u8, g as u8, b as u8])
    }

    /// Store a packed `0xAARRGGBB` color, quantized to the color model
    pub fn set_color(&mut self, x: i32, y: i32, argb: u32) -> Result<()> {
        let index = self.index(x, y)?;
        self.samples[index] = self.model.encode(argb);
        Ok(())
    }

    /// Store an opaque color
    pub fn set_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) -> Result<()> {
        self.set_color(x, y, pack(0xFF, r.into(), g.into(), b.into()))
    }

    /// Set every pixel to the same color
    pub fn fill(&mut self, argb: u32) {
        let sample = self.model.encode(argb);
        self.samples.fill(sample);
    }

    /// Copy the `w` x `h` region whose top-left corner is (x0, y0).
    ///
    /// The region must lie entirely inside the raster and be non-empty.
    /// The result keeps this raster's color model and metadata.
    pub fn crop(&self, x0: i32, y0: i32, w: u32, h: u32) -> Result<Raster> {
        let fits = x0 >= 0
            && y0 >= 0
            && w > 0
            && h > 0
            && x0 as u64 + w as u64 <= self.width as u64
            && y0 as u64 + h as u64 <= self.height as u64;
        if !fits {
            return Err(Error::OutOfBounds {
                x: x0,
                y: y0,
                extent: (w, h),
                bounds: (self.width, self.height),
            });
        }

        let mut samples = Vec::with_capacity(w as usize * h as usize);
        for row in 0..h as usize {
            let start = (y0 as usize + row) * self.width as usize + x0 as usize;
            samples.extend_from_slice(&self.samples[start..start + w as usize]);
        }

        Ok(Raster {
            width: w,
            height: h,
            model: self.model,
            samples,
            display_name: self.display_name.clone(),
            source_directory: self.source_directory.clone(),
        })
    }

    /// Draw `source` onto this raster with its top-left corner at (x, y).
    ///
    /// Source pixels that fall outside this raster are clipped. Opaque
    /// pixels overwrite, transparent ones are skipped and the rest are
    /// blended source-over.
    pub fn composite(&mut self, source: &Raster, x: i32, y: i32) {
        let (dst_w, dst_h) = (self.width as i64, self.height as i64);

        // Clip the source rectangle against the destination
        let sx_start = (-(x as i64)).max(0);
        let sy_start = (-(y as i64)).max(0);
        let sx_end = (dst_w - x as i64).min(source.width as i64);
        let sy_end = (dst_h - y as i64).min(source.height as i64);
        if sx_start >= sx_end || sy_start >= sy_end {
            return;
        }

        for sy in sy_start..sy_end {
            let dy = sy + y as i64;
            let src_row = sy as usize * source.width as usize;
            let dst_row = dy as usize * self.width as usize;
            for sx in sx_start..sx_end {
                let dx = sx + x as i64;
                let src = source.model.decode(source.samples[src_row + sx as usize]);
                let alpha = src >> 24;
                if alpha == 0 {
                    continue;
                }
                let target = dst_row + dx as usize;
                let color = if alpha == 0xFF {
                    src
                } else {
                    blend_over(src, self.model.decode(self.samples[target]))
                };
                self.samples[target] = self.model.encode(color);
            }
        }
    }

    /// Copy of this raster in another color model
    pub fn convert(&self, model: ColorModel) -> Raster {
        let samples = self
            .samples
            .iter()
            .map(|&sample| model.encode(self.model.decode(sample)))
            .collect();
        Raster {
            model,
            samples,
            ..self.clone()
        }
    }

    /// Packed ARGB at (x, y). Callers guarantee `x < width` and `y < height`.
    pub(crate) fn color_at(&self, x: u32, y: u32) -> u32 {
        self.model
            .decode(self.samples[y as usize * self.width as usize + x as usize])
    }

    /// Informational summary of the raster
    pub fn describe(&self) -> String {
        format!(
            "                 ** Info **\n\
             \nFile           : {}\
             \nDimensions     : {} x {}\
             \nMode           : {}\
             \nBits per pixel : {}\n",
            self.display_name,
            self.width,
            self.height,
            self.model.name(),
            self.model.bits_per_pixel()
        )
    }

    /// Convert to an `image` buffer suited to the color model:
    /// gray models become L8/L16, alpha models RGBA8, the rest RGB8.
    pub fn to_dynamic_image(&self) -> DynamicImage {
        match self.model {
            ColorModel::ByteGray | ColorModel::ByteBinary => {
                let buffer = ImageBuffer::from_fn(self.width, self.height, |x, y| {
                    Luma([(self.color_at(x, y) & 0xFF) as u8])
                });
                DynamicImage::ImageLuma8(buffer)
            }
            ColorModel::UshortGray => {
                let buffer = ImageBuffer::from_fn(self.width, self.height, |x, y| {
                    Luma([self.samples[y as usize * self.width as usize + x as usize] as u16])
                });
                DynamicImage::ImageLuma16(buffer)
            }
            model if model.has_alpha() => {
                let buffer = RgbaImage::from_fn(self.width, self.height, |x, y| {
                    let (a, r, g, b) = unpack(self.color_at(x, y));
                    image::Rgba([r as u8, g as u8, b as u8, a as u8])
                });
                DynamicImage::ImageRgba8(buffer)
            }
            _ => {
                let buffer = RgbImage::from_fn(self.width, self.height, |x, y| {
                    let (_, r, g, b) = unpack(self.color_at(x, y));
                    Rgb([r as u8, g as u8, b as u8])
                });
                DynamicImage::ImageRgb8(buffer)
            }
        }
    }

    /// Build a raster from a decoded image, picking the closest color model:
    /// RGB8 → `ThreeByteBgr`, RGBA8 and LA8 → `FourByteAbgr`, L8 →
    /// `ByteGray`, L16 → `UshortGray`, anything else → `IntArgb`.
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<Raster> {
        let model = match image {
            DynamicImage::ImageRgb8(_) => ColorModel::ThreeByteBgr,
            DynamicImage::ImageRgba8(_) | DynamicImage::ImageLumaA8(_) => ColorModel::FourByteAbgr,
            DynamicImage::ImageLuma8(_) => ColorModel::ByteGray,
            DynamicImage::ImageLuma16(_) => ColorModel::UshortGray,
            _ => ColorModel::IntArgb,
        };
        let mut raster = Raster::with_model(image.width(), image.height(), model)?;

        if let DynamicImage::ImageLuma16(buffer) = image {
            // keep the full 16-bit precision
            for (sample, pixel) in raster.samples.iter_mut().zip(buffer.pixels()) {
                *sample = u32::from(pixel.0[0]);
            }
            return Ok(raster);
        }

        let rgba = image.to_rgba8();
        for (sample, pixel) in raster.samples.iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = pixel.0;
            *sample = model.encode(pack(a.into(), r.into(), g.into(), b.into()));
        }
        Ok(raster)
    }
}

impl fmt::Display for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Source-over blend of two straight-alpha colors
pub(crate) fn blend_over(src: u32, dst: u32) -> u32 {
    let (sa, sr, sg, sb) = unpack(src);
    let (da, dr, dg, db) = unpack(dst);
    let sa = sa as f32 / 255.0;
    let da = da as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return 0;
    }
    let channel = |s: u32, d: u32| {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u32
    };
    pack(
        (out_a * 255.0).round() as u32,
        channel(sr, dr),
        channel(sg, dg),
        channel(sb, db),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Raster {
        let mut raster = Raster::new(width, height).unwrap();
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                raster
                    .set_pixel(x, y, (x * 20) as u8, (y * 20) as u8, ((x + y) * 7) as u8)
                    .unwrap();
            }
        }
        raster
    }

    #[test]
    fn default_is_one_black_rgb_pixel() {
        let raster = Raster::default();
        assert_eq!(raster.dimensions(), (1, 1));
        assert_eq!(raster.color_model(), ColorModel::IntRgb);
        assert_eq!(raster.get_pixel(0, 0).unwrap(), [0, 0, 0]);
        assert_eq!(raster.get_color(0, 0).unwrap(), 0xFF00_0000);
        assert_eq!(raster.display_name(), "untitled");
        assert_eq!(raster.source_directory(), Path::new("."));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            Raster::new(0, 4),
            Err(Error::InvalidDimensions { width: 0, height: 4 })
        ));
        assert!(Raster::with_model(3, 0, ColorModel::ByteGray).is_err());
    }

    #[test]
    fn set_then_get_round_trips_everywhere() {
        let mut raster = Raster::new(7, 5).unwrap();
        for y in 0..5 {
            for x in 0..7 {
                let (r, g, b) = ((x * 31) as u8, (y * 47) as u8, ((x ^ y) * 13) as u8);
                raster.set_pixel(x, y, r, g, b).unwrap();
                assert_eq!(raster.get_pixel(x, y).unwrap(), [r, g, b]);
            }
        }
    }

    #[test]
    fn set_color_packs_alpha_for_opaque_models() {
        let mut raster = Raster::new(2, 2).unwrap();
        raster.set_color(1, 1, 0x0012_3456).unwrap();
        assert_eq!(raster.get_color(1, 1).unwrap(), 0xFF12_3456);

        let mut argb = Raster::with_model(2, 2, ColorModel::IntArgb).unwrap();
        argb.set_color(1, 1, 0x4012_3456).unwrap();
        assert_eq!(argb.get_color(1, 1).unwrap(), 0x4012_3456);
        // fresh alpha rasters are transparent
        assert_eq!(argb.get_color(0, 0).unwrap(), 0);
    }

    #[test]
    fn out_of_bounds_access_fails() {
        let mut raster = Raster::new(4, 3).unwrap();
        for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 3), (i32::MAX, 1), (i32::MIN, i32::MIN)] {
            assert!(matches!(raster.get_pixel(x, y), Err(Error::OutOfBounds { .. })));
            assert!(matches!(raster.get_color(x, y), Err(Error::OutOfBounds { .. })));
            assert!(matches!(raster.set_pixel(x, y, 1, 2, 3), Err(Error::OutOfBounds { .. })));
            assert!(matches!(raster.set_color(x, y, 0), Err(Error::OutOfBounds { .. })));
        }
    }

    #[test]
    fn gray_raster_documents_lossy_mapping() {
        let mut raster = Raster::with_model(1, 1, ColorModel::ByteGray).unwrap();
        raster.set_pixel(0, 0, 90, 90, 90).unwrap();
        assert_eq!(raster.get_pixel(0, 0).unwrap(), [90, 90, 90]);
        raster.set_pixel(0, 0, 255, 0, 0).unwrap();
        assert_eq!(raster.get_pixel(0, 0).unwrap(), [77, 77, 77]);
    }

    #[test]
    fn crop_copies_the_region() {
        let source = gradient(10, 10);
        let crop = source.crop(2, 2, 4, 4).unwrap();
        assert_eq!(crop.dimensions(), (4, 4));
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(
                    crop.get_pixel(x, y).unwrap(),
                    source.get_pixel(x + 2, y + 2).unwrap()
                );
            }
        }
    }

    #[test]
    fn crop_is_independent_of_its_source() {
        let mut source = gradient(10, 10);
        let mut crop = source.crop(2, 2, 4, 4).unwrap();
        let before = crop.get_pixel(0, 0).unwrap();

        source.set_pixel(2, 2, 1, 2, 3).unwrap();
        assert_eq!(crop.get_pixel(0, 0).unwrap(), before);

        crop.set_pixel(1, 1, 9, 9, 9).unwrap();
        assert_ne!(source.get_pixel(3, 3).unwrap(), [9, 9, 9]);
    }

    #[test]
    fn crop_rejects_regions_outside_the_raster() {
        let source = gradient(10, 10);
        assert!(source.crop(0, 0, 10, 10).is_ok());
        for (x, y, w, h) in [(-1, 0, 2, 2), (0, -1, 2, 2), (8, 8, 3, 2), (0, 0, 11, 1), (3, 3, 0, 2), (3, 3, 2, 0)] {
            assert!(matches!(source.crop(x, y, w, h), Err(Error::OutOfBounds { .. })));
        }
    }

    #[test]
    fn composite_overwrites_inner_region_only() {
        let mut canvas = Raster::new(5, 5).unwrap();
        canvas.fill(0xFF10_2030);
        let mut stamp = Raster::new(3, 3).unwrap();
        stamp.fill(0xFFFF_8000);

        canvas.composite(&stamp, 1, 1);

        for y in 0..5 {
            for x in 0..5 {
                let inside = (1..4).contains(&x) && (1..4).contains(&y);
                let expected = if inside { [0xFF, 0x80, 0x00] } else { [0x10, 0x20, 0x30] };
                assert_eq!(canvas.get_pixel(x, y).unwrap(), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn composite_clips_overhanging_sources() {
        let mut canvas = Raster::new(5, 5).unwrap();
        let mut stamp = Raster::new(3, 3).unwrap();
        stamp.fill(0xFFFF_FFFF);

        canvas.composite(&stamp, 3, 3);
        assert_eq!(canvas.get_pixel(4, 4).unwrap(), [255, 255, 255]);
        assert_eq!(canvas.get_pixel(2, 2).unwrap(), [0, 0, 0]);

        canvas.composite(&stamp, -2, -2);
        assert_eq!(canvas.get_pixel(0, 0).unwrap(), [255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 1).unwrap(), [0, 0, 0]);

        // entirely outside
        let copy = canvas.clone();
        canvas.composite(&stamp, 40, -40);
        canvas.composite(&stamp, i32::MIN, i32::MAX);
        assert_eq!(canvas, copy);
    }

    #[test]
    fn composite_blends_translucent_sources() {
        let mut canvas = Raster::new(1, 1).unwrap();
        canvas.fill(0xFF00_0000);
        let mut stamp = Raster::with_model(1, 1, ColorModel::IntArgb).unwrap();
        stamp.set_color(0, 0, 0x80FF_FFFF).unwrap();

        canvas.composite(&stamp, 0, 0);
        let [r, g, b] = canvas.get_pixel(0, 0).unwrap();
        assert_eq!((r, g, b), (128, 128, 128));
        assert_eq!(canvas.get_color(0, 0).unwrap() >> 24, 0xFF);

        // fully transparent pixels leave the destination alone
        stamp.set_color(0, 0, 0x00FF_0000).unwrap();
        canvas.composite(&stamp, 0, 0);
        assert_eq!(canvas.get_pixel(0, 0).unwrap(), [128, 128, 128]);
    }

    #[test]
    fn convert_changes_model_but_not_size() {
        let source = gradient(4, 4);
        let gray = source.convert(ColorModel::ByteGray);
        assert_eq!(gray.dimensions(), (4, 4));
        assert_eq!(gray.color_model(), ColorModel::ByteGray);
        let [r, g, b] = gray.get_pixel(3, 2).unwrap();
        assert!(r == g && g == b);
    }

    #[test]
    fn describe_mentions_size_and_model() {
        let mut raster = Raster::with_model(12, 34, ColorModel::Ushort565Rgb).unwrap();
        raster.set_display_name("pic.png");
        let text = raster.describe();
        assert!(text.contains("12 x 34"));
        assert!(text.contains("RGB 5-6-5"));
        assert!(text.contains("Bits per pixel : 16"));
        assert!(text.contains("pic.png"));
        assert_eq!(raster.to_string(), text);
    }

    #[test]
    fn dynamic_image_conversion_keeps_pixels() {
        let source = gradient(6, 3);
        let image = source.to_dynamic_image();
        assert!(matches!(image, DynamicImage::ImageRgb8(_)));
        let back = Raster::from_dynamic_image(&image).unwrap();
        assert_eq!(back.color_model(), ColorModel::ThreeByteBgr);
        for y in 0..3 {
            for x in 0..6 {
                assert_eq!(back.get_color(x, y).unwrap(), source.get_color(x, y).unwrap());
            }
        }
    }

    #[test]
    fn gray16_conversion_keeps_full_precision() {
        let mut buffer = ImageBuffer::<Luma<u16>, Vec<u16>>::new(2, 1);
        buffer.put_pixel(1, 0, Luma([0x1234]));
        let image = DynamicImage::ImageLuma16(buffer);
        let raster = Raster::from_dynamic_image(&image).unwrap();
        assert_eq!(raster.color_model(), ColorModel::UshortGray);
        match raster.to_dynamic_image() {
            DynamicImage::ImageLuma16(back) => assert_eq!(back.get_pixel(1, 0).0[0], 0x1234),
            other => panic!("unexpected image kind: {:?}", other.color()),
        }
    }
}
