use ash::vk;

/// 资源格式
///
/// 只列出 RenderGraph 与 pass 常用的格式，可以通过 [`GfxFormat::to_vk`] 转换为 Vulkan 格式。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GfxFormat {
    #[default]
    Unknown,
    R8Unorm,
    R8G8B8A8Unorm,
    R8G8B8A8UnormSrgb,
    B8G8R8A8Unorm,
    R16Float,
    R16G16Float,
    R16G16B16A16Float,
    R11G11B10Float,
    R32Float,
    R32Uint,
    R32G32B32A32Float,
    D32Float,
    D24UnormS8Uint,
    D32FloatS8X24Uint,
}

impl GfxFormat {
    #[inline]
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::D32Float | Self::D24UnormS8Uint | Self::D32FloatS8X24Uint)
    }

    #[inline]
    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::D24UnormS8Uint | Self::D32FloatS8X24Uint)
    }

    pub fn to_vk(&self) -> vk::Format {
        match self {
            Self::Unknown => vk::Format::UNDEFINED,
            Self::R8Unorm => vk::Format::R8_UNORM,
            Self::R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
            Self::R8G8B8A8UnormSrgb => vk::Format::R8G8B8A8_SRGB,
            Self::B8G8R8A8Unorm => vk::Format::B8G8R8A8_UNORM,
            Self::R16Float => vk::Format::R16_SFLOAT,
            Self::R16G16Float => vk::Format::R16G16_SFLOAT,
            Self::R16G16B16A16Float => vk::Format::R16G16B16A16_SFLOAT,
            Self::R11G11B10Float => vk::Format::B10G11R11_UFLOAT_PACK32,
            Self::R32Float => vk::Format::R32_SFLOAT,
            Self::R32Uint => vk::Format::R32_UINT,
            Self::R32G32B32A32Float => vk::Format::R32G32B32A32_SFLOAT,
            Self::D32Float => vk::Format::D32_SFLOAT,
            Self::D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
            Self::D32FloatS8X24Uint => vk::Format::D32_SFLOAT_S8_UINT,
        }
    }

    /// 根据格式推断 barrier 使用的 aspect
    pub fn vk_aspect(&self) -> vk::ImageAspectFlags {
        match (self.is_depth(), self.has_stencil()) {
            (true, true) => vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
            (true, false) => vk::ImageAspectFlags::DEPTH,
            _ => vk::ImageAspectFlags::COLOR,
        }
    }
}
