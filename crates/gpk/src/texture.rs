//! Texture objects

use std::fmt;

use binrw::{binrw, BinRead, BinWrite};

use crate::string::FString;

/// Pixel formats, numbered as the engine numbers them
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[brw(repr = u32)]
pub enum PixelFormat {
    #[default]
    Unknown = 0,
    A32B32G32R32F = 1,
    A8R8G8B8 = 2,
    G8 = 3,
    G16 = 4,
    DXT1 = 5,
    DXT3 = 6,
    DXT5 = 7,
    UYVY = 8,
    FloatRGB = 9,
    FloatRGBA = 10,
    DepthStencil = 11,
    ShadowDepth = 12,
    FilteredShadowDepth = 13,
    R32F = 14,
    G16R16 = 15,
    G16R16F = 16,
    G16R16FFilter = 17,
    G32R32F = 18,
    A2B10G10R10 = 19,
    A16B16G16R16 = 20,
    D24 = 21,
    R16F = 22,
    R16FFilter = 23,
    BC5 = 24,
    V8U8 = 25,
    A1 = 26,
    FloatR11G11B10 = 27,
}

impl PixelFormat {
    /// Size in bytes of the data of a `width` x `height` image in this format, if known
    pub fn data_size(self, width: u32, height: u32) -> Option<usize> {
        let (width, height) = (width as usize, height as usize);
        let blocks = width.div_ceil(4).max(1) * height.div_ceil(4).max(1);
        match self {
            PixelFormat::DXT1 => Some(blocks * 8),
            PixelFormat::DXT3 | PixelFormat::DXT5 | PixelFormat::BC5 => Some(blocks * 16),
            PixelFormat::A8R8G8B8 => Some(width * height * 4),
            PixelFormat::G8 => Some(width * height),
            PixelFormat::G16 | PixelFormat::V8U8 => Some(width * height * 2),
            _ => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Unknown => "PF_Unknown",
            PixelFormat::A32B32G32R32F => "PF_A32B32G32R32F",
            PixelFormat::A8R8G8B8 => "PF_A8R8G8B8",
            PixelFormat::G8 => "PF_G8",
            PixelFormat::G16 => "PF_G16",
            PixelFormat::DXT1 => "PF_DXT1",
            PixelFormat::DXT3 => "PF_DXT3",
            PixelFormat::DXT5 => "PF_DXT5",
            PixelFormat::UYVY => "PF_UYVY",
            PixelFormat::FloatRGB => "PF_FloatRGB",
            PixelFormat::FloatRGBA => "PF_FloatRGBA",
            PixelFormat::DepthStencil => "PF_DepthStencil",
            PixelFormat::ShadowDepth => "PF_ShadowDepth",
            PixelFormat::FilteredShadowDepth => "PF_FilteredShadowDepth",
            PixelFormat::R32F => "PF_R32F",
            PixelFormat::G16R16 => "PF_G16R16",
            PixelFormat::G16R16F => "PF_G16R16F",
            PixelFormat::G16R16FFilter => "PF_G16R16F_FILTER",
            PixelFormat::G32R32F => "PF_G32R32F",
            PixelFormat::A2B10G10R10 => "PF_A2B10G10R10",
            PixelFormat::A16B16G16R16 => "PF_A16B16G16R16",
            PixelFormat::D24 => "PF_D24",
            PixelFormat::R16F => "PF_R16F",
            PixelFormat::R16FFilter => "PF_R16F_FILTER",
            PixelFormat::BC5 => "PF_BC5",
            PixelFormat::V8U8 => "PF_V8U8",
            PixelFormat::A1 => "PF_A1",
            PixelFormat::FloatR11G11B10 => "PF_FloatR11G11B10",
        };
        f.write_str(name)
    }
}

/// How the engine compresses a texture when cooking it
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[brw(repr = u32)]
pub enum TextureCompressionSettings {
    #[default]
    Default = 0,
    Normalmap = 1,
    Displacementmap = 2,
    NormalmapAlpha = 3,
    Grayscale = 4,
    HighDynamicRange = 5,
    OneBitAlpha = 6,
    NormalmapUncompressed = 7,
    NormalmapBC5 = 8,
    OneBitMonochrome = 9,
    SimpleLightmapModification = 10,
    VectorDisplacementmap = 11,
}

impl TextureCompressionSettings {
    pub fn is_normal_map(self) -> bool {
        matches!(
            self,
            TextureCompressionSettings::Normalmap
                | TextureCompressionSettings::NormalmapAlpha
                | TextureCompressionSettings::NormalmapUncompressed
                | TextureCompressionSettings::NormalmapBC5
        )
    }
}

/// Texture addressing mode along one axis
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[brw(repr = u32)]
pub enum TextureAddress {
    #[default]
    Wrap = 0,
    Clamp = 1,
    Mirror = 2,
}

/// A single mip level
#[binrw]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[brw(little)]
pub struct MipMap {
    pub size_x: u32,

    pub size_y: u32,

    #[br(temp)]
    #[bw(calc = data.len() as u32)]
    data_size: u32,

    #[br(count = data_size)]
    pub data: Vec<u8>,
}

/// Payload of a `Texture2D` object
#[binrw]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[brw(little)]
pub struct Texture2D {
    pub size_x: u32,

    pub size_y: u32,

    pub format: PixelFormat,

    #[br(map = |value: u32| value != 0)]
    #[bw(map = |value: &bool| u32::from(*value))]
    pub srgb: bool,

    pub compression_settings: TextureCompressionSettings,

    pub address_x: TextureAddress,

    pub address_y: TextureAddress,

    /// Name of the external cache the mips are streamed from, empty when the mips are stored inline
    pub texture_file_cache_name: FString,

    #[br(temp)]
    #[bw(calc = mips.len() as u32)]
    mip_count: u32,

    #[br(count = mip_count)]
    pub mips: Vec<MipMap>,
}

impl Texture2D {
    /// Whether the texture is sampled as a normal map
    pub fn is_normal_map(&self) -> bool {
        self.compression_settings.is_normal_map()
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::{BinRead, BinWrite};
    use pretty_assertions::assert_eq;

    use super::{MipMap, PixelFormat, Texture2D, TextureAddress, TextureCompressionSettings};

    #[test]
    fn read_write_texture() -> binrw::BinResult<()> {
        #[rustfmt::skip]
        let input = vec![
            // Size
            0x04, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            // Format, sRGB
            0x05, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            // Compression settings, address X/Y
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            // Cache name
            0x00, 0x00, 0x00, 0x00,
            // Mips
            0x01, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00,
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07,
        ];

        let texture = Texture2D::read(&mut Cursor::new(&input))?;
        assert_eq!(
            texture,
            Texture2D {
                size_x: 4,
                size_y: 4,
                format: PixelFormat::DXT1,
                srgb: true,
                compression_settings: TextureCompressionSettings::Normalmap,
                address_x: TextureAddress::Clamp,
                address_y: TextureAddress::Mirror,
                texture_file_cache_name: "".into(),
                mips: vec![MipMap {
                    size_x: 4,
                    size_y: 4,
                    data: vec![0, 1, 2, 3, 4, 5, 6, 7],
                }],
            }
        );
        assert!(texture.is_normal_map());

        let mut actual = Cursor::new(Vec::new());
        texture.write(&mut actual)?;
        assert_eq!(actual.into_inner(), input);

        Ok(())
    }

    #[test]
    fn unknown_pixel_format_fails() {
        let mut input = vec![0u8; 36];
        input[8] = 0xFF;

        assert!(Texture2D::read(&mut Cursor::new(&input)).is_err());
    }

    #[test]
    fn data_sizes() {
        assert_eq!(PixelFormat::DXT1.data_size(4, 4), Some(8));
        assert_eq!(PixelFormat::DXT5.data_size(8, 2), Some(32));
        assert_eq!(PixelFormat::A8R8G8B8.data_size(3, 3), Some(36));
        assert_eq!(PixelFormat::G8.data_size(3, 3), Some(9));
        assert_eq!(PixelFormat::R32F.data_size(3, 3), None);
        assert_eq!(PixelFormat::DXT1.to_string(), "PF_DXT1");
    }
}
