use glam::Vec4;

use crate::flags::{GfxBindFlags, GfxMiscFlags};
use crate::format::GfxFormat;
use crate::resource_state::GfxResourceState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GfxTextureType {
    Texture1D,
    #[default]
    Texture2D,
    Texture3D,
}

/// 纹理创建时的清除值，render pass 的 `Clear` 操作会使用它
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GfxClearValue {
    #[default]
    None,
    Color(Vec4),
    DepthStencil {
        depth: f32,
        stencil: u8,
    },
}

impl GfxClearValue {
    #[inline]
    pub fn color(&self) -> Vec4 {
        match self {
            Self::Color(color) => *color,
            _ => Vec4::ZERO,
        }
    }

    #[inline]
    pub fn depth_stencil(&self) -> (f32, u8) {
        match self {
            Self::DepthStencil { depth, stencil } => (*depth, *stencil),
            _ => (1.0, 0),
        }
    }
}

/// 纹理描述
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GfxTextureDesc {
    pub texture_type: GfxTextureType,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    pub mip_levels: u32,
    pub sample_count: u32,
    pub format: GfxFormat,
    pub bind_flags: GfxBindFlags,
    pub misc_flags: GfxMiscFlags,
    /// 帧开始时资源所处的状态
    pub initial_state: GfxResourceState,
    pub clear_value: GfxClearValue,
}

impl Default for GfxTextureDesc {
    fn default() -> Self {
        Self {
            texture_type: GfxTextureType::Texture2D,
            width: 0,
            height: 0,
            depth: 1,
            array_size: 1,
            mip_levels: 1,
            sample_count: 1,
            format: GfxFormat::Unknown,
            bind_flags: GfxBindFlags::empty(),
            misc_flags: GfxMiscFlags::empty(),
            initial_state: GfxResourceState::COMMON,
            clear_value: GfxClearValue::None,
        }
    }
}

// new & builder
impl GfxTextureDesc {
    pub fn new_2d(width: u32, height: u32, format: GfxFormat) -> Self {
        Self {
            width,
            height,
            format,
            ..Default::default()
        }
    }

    pub fn with_bind_flags(mut self, bind_flags: GfxBindFlags) -> Self {
        self.bind_flags = bind_flags;
        self
    }

    pub fn with_misc_flags(mut self, misc_flags: GfxMiscFlags) -> Self {
        self.misc_flags = misc_flags;
        self
    }

    pub fn with_initial_state(mut self, initial_state: GfxResourceState) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn with_clear_value(mut self, clear_value: GfxClearValue) -> Self {
        self.clear_value = clear_value;
        self
    }

    pub fn with_mips(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }
}

impl GfxTextureDesc {
    /// 除 `initial_state` 与 `clear_value` 之外的字段全部相同，则物理资源可以复用
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.texture_type == other.texture_type
            && self.width == other.width
            && self.height == other.height
            && self.depth == other.depth
            && self.array_size == other.array_size
            && self.mip_levels == other.mip_levels
            && self.sample_count == other.sample_count
            && self.format == other.format
            && self.bind_flags == other.bind_flags
            && self.misc_flags == other.misc_flags
    }
}

/// 纹理视图覆盖的子资源范围，`u32::MAX` 表示剩余的全部 slice / mip
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GfxTextureSubresourceDesc {
    pub first_slice: u32,
    pub slice_count: u32,
    pub first_mip: u32,
    pub mip_count: u32,
}

impl Default for GfxTextureSubresourceDesc {
    fn default() -> Self {
        Self {
            first_slice: 0,
            slice_count: u32::MAX,
            first_mip: 0,
            mip_count: u32::MAX,
        }
    }
}

impl GfxTextureSubresourceDesc {
    pub fn mip(mip: u32) -> Self {
        Self {
            first_mip: mip,
            mip_count: 1,
            ..Default::default()
        }
    }

    pub fn slice(slice: u32) -> Self {
        Self {
            first_slice: slice,
            slice_count: 1,
            ..Default::default()
        }
    }
}
