use std::path::Path;

use bon::Builder;
use gpk::{MipMap, Object, ObjectData, PixelFormat};
use image::{imageops, imageops::FilterType, ImageFormat, RgbaImage};
use tracing::{debug, instrument, trace};

use super::ImportTransformer;
use crate::error::{Error, Result};
use crate::source::read_source;

/// Options for texture imports
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct TextureImportOptions {
    /// Generate the whole mip chain instead of the base level only
    #[builder(default)]
    pub generate_mips: bool,
}

/// How the pixels of a mip level are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Bc1,
    Bc3,
    Bgra8,
    Luma8,
}

impl Encoding {
    fn for_format(format: PixelFormat) -> Result<Self> {
        match format {
            PixelFormat::DXT1 => Ok(Encoding::Bc1),
            PixelFormat::DXT5 => Ok(Encoding::Bc3),
            PixelFormat::A8R8G8B8 => Ok(Encoding::Bgra8),
            PixelFormat::G8 => Ok(Encoding::Luma8),
            other => Err(Error::UnsupportedPixelFormat(other)),
        }
    }

    fn encode(self, image: &RgbaImage, normal_map: bool) -> Vec<u8> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let block_format = match self {
            Encoding::Bc1 => texpresso::Format::Bc1,
            Encoding::Bc3 => texpresso::Format::Bc3,
            Encoding::Bgra8 => {
                return image
                    .pixels()
                    .flat_map(|pixel| {
                        let [r, g, b, a] = pixel.0;
                        [b, g, r, a]
                    })
                    .collect();
            }
            Encoding::Luma8 => return imageops::grayscale(image).into_raw(),
        };

        // Normal maps store vectors, every channel counts the same
        let params = texpresso::Params {
            weights: if normal_map {
                texpresso::COLOUR_WEIGHTS_UNIFORM
            } else {
                texpresso::COLOUR_WEIGHTS_PERCEPTUAL
            },
            ..Default::default()
        };
        let mut output = vec![0; block_format.compressed_size(width, height)];
        block_format.compress(image.as_raw(), width, height, params, &mut output);
        output
    }
}

fn source_format(path: &Path) -> Result<ImageFormat> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "tga" => Ok(ImageFormat::Tga),
        "png" => Ok(ImageFormat::Png),
        "dds" => Ok(ImageFormat::Dds),
        _ => Err(Error::UnsupportedFormat { extension }),
    }
}

/// Replaces the mips of `Texture2D` objects with a decoded image, re-encoded in the pixel format
/// the texture already has.
///
/// The color space, compression settings and addressing of the texture are kept.
#[derive(Debug, Default, Clone)]
pub struct TextureTransformer {
    options: TextureImportOptions,
}

impl TextureTransformer {
    pub fn new(options: TextureImportOptions) -> Self {
        Self { options }
    }

    fn mip_chain(&self, image: RgbaImage) -> Vec<RgbaImage> {
        let mut levels = vec![image];
        if !self.options.generate_mips {
            return levels;
        }

        while let Some(last) = levels.last() {
            let (width, height) = last.dimensions();
            if width == 1 && height == 1 {
                break;
            }
            let next = imageops::resize(
                last,
                (width / 2).max(1),
                (height / 2).max(1),
                FilterType::Triangle,
            );
            levels.push(next);
        }
        levels
    }
}

impl ImportTransformer for TextureTransformer {
    #[instrument(skip_all, fields(object = object.name(), source = %source.display()), err)]
    fn import(&self, object: &mut Object, source: &Path) -> Result<()> {
        let format = source_format(source)?;
        let name = object.name().to_owned();
        let Some(ObjectData::Texture(texture)) = object.data_mut() else {
            return Err(Error::UnexpectedPayload {
                object: name,
                expected: "texture",
            });
        };
        let encoding = Encoding::for_format(texture.format)?;

        let data = read_source(source)?;
        let image = image::load_from_memory_with_format(&data, format)?.to_rgba8();
        let (size_x, size_y) = image.dimensions();
        let normal_map = texture.is_normal_map();

        let mips: Vec<MipMap> = self
            .mip_chain(image)
            .iter()
            .map(|level| {
                trace!("encoding {}x{} mip", level.width(), level.height());
                MipMap {
                    size_x: level.width(),
                    size_y: level.height(),
                    data: encoding.encode(level, normal_map),
                }
            })
            .collect();

        debug!(
            "imported {size_x}x{size_y} {} texture with {} mips",
            texture.format,
            mips.len()
        );
        texture.size_x = size_x;
        texture.size_y = size_y;
        texture.mips = mips;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use gpk::{
        ObjectData, Package, PackageSummary, PixelFormat, Texture2D, TextureCompressionSettings,
    };
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::{TextureImportOptions, TextureTransformer};
    use crate::error::{Error, Result};
    use crate::transform::ImportTransformer;

    fn texture(format: PixelFormat) -> Texture2D {
        Texture2D {
            size_x: 2,
            size_y: 2,
            format,
            srgb: true,
            compression_settings: TextureCompressionSettings::Normalmap,
            ..Default::default()
        }
    }

    fn write_png(dir: &Path) -> Result<PathBuf> {
        let path = dir.join("icon.PNG");
        RgbaImage::from_pixel(8, 4, Rgba([0x10, 0x20, 0x30, 0x40]))
            .save_with_format(&path, image::ImageFormat::Png)?;
        Ok(path)
    }

    fn import(format: PixelFormat, options: TextureImportOptions, source: &Path) -> Result<Texture2D> {
        let mut package = Package::create("P", PackageSummary::default());
        package.add_object("Texture2D", "T", 0, ObjectData::Texture(texture(format)));
        TextureTransformer::new(options).import(package.resolve_mut(0)?, source)?;

        match package.resolve(0)?.data() {
            Some(ObjectData::Texture(texture)) => Ok(texture.clone()),
            _ => panic!("expected texture payload"),
        }
    }

    #[traced_test]
    #[test]
    fn import_block_compressed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = write_png(dir.path())?;

        let dxt1 = import(PixelFormat::DXT1, TextureImportOptions::default(), &source)?;
        assert_eq!((dxt1.size_x, dxt1.size_y), (8, 4));
        assert_eq!(dxt1.mips.len(), 1);
        assert_eq!(dxt1.mips[0].data.len(), 16);

        let dxt5 = import(PixelFormat::DXT5, TextureImportOptions::default(), &source)?;
        assert_eq!(dxt5.mips[0].data.len(), 32);
        assert!(dxt5.srgb);
        assert!(dxt5.is_normal_map());

        Ok(())
    }

    #[traced_test]
    #[test]
    fn import_uncompressed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = write_png(dir.path())?;

        let argb = import(PixelFormat::A8R8G8B8, TextureImportOptions::default(), &source)?;
        assert_eq!(argb.mips[0].data.len(), 8 * 4 * 4);
        assert_eq!(argb.mips[0].data[..4], [0x30, 0x20, 0x10, 0x40]);

        let options = TextureImportOptions::builder().generate_mips(true).build();
        let gray = import(PixelFormat::G8, options, &source)?;
        let sizes: Vec<_> = gray.mips.iter().map(|mip| (mip.size_x, mip.size_y)).collect();
        assert_eq!(sizes, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
        assert_eq!(gray.mips[0].data.len(), 32);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn unsupported_imports() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = write_png(dir.path())?;
        let bitmap = dir.path().join("icon.bmp");

        assert!(matches!(
            import(PixelFormat::DXT1, TextureImportOptions::default(), &bitmap),
            Err(Error::UnsupportedFormat { extension }) if extension == "bmp"
        ));
        assert!(matches!(
            import(PixelFormat::DXT3, TextureImportOptions::default(), &source),
            Err(Error::UnsupportedPixelFormat(PixelFormat::DXT3))
        ));

        Ok(())
    }
}
