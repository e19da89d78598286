//! RenderGraph 资源句柄定义
//!
//! 这些句柄是 graph 内部的虚拟引用，与设备的物理句柄分离。
//! 每个句柄记录资源、视图下标、资源版本以及获取它的 Pass：
//! 句柄只能在获取它的 Pass 的 execute 中解析。

use std::fmt;
use std::marker::PhantomData;

use slotmap::{Key, new_key_type};

new_key_type! {
    /// Graph 内部的纹理 id
    pub struct RgTextureId;
    /// Graph 内部的缓冲区 id
    pub struct RgBufferId;
}

/// Pass 在 graph 中的下标（声明顺序）
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RgPassId(pub(crate) usize);

impl RgPassId {
    pub const INVALID: Self = Self(usize::MAX);

    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for RgPassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RgPass({})", self.0)
    }
}

/// 纹理或缓冲区
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RgResourceKey {
    Texture(RgTextureId),
    Buffer(RgBufferId),
}

/// 访问方式标记
///
/// 每种访问方式对应一个零大小的类型，句柄按访问方式区分类型，
/// Context 上的解析函数只接受对应的句柄。
pub trait RgAccessKind: Clone + Copy + fmt::Debug + Default + PartialEq + Eq + std::hash::Hash + 'static {
    /// 纹理为 [`RgTextureId`]，缓冲区为 [`RgBufferId`]
    type Key: Key;

    const NAME: &'static str;
}

macro_rules! rg_access_kinds {
    ($($(#[$meta:meta])* $kind:ident => $key:ty;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
            pub struct $kind;

            impl RgAccessKind for $kind {
                type Key = $key;
                const NAME: &'static str = stringify!($kind);
            }
        )*
    };
}

rg_access_kinds! {
    /// 纹理 SRV
    RgTextureReadOnly => RgTextureId;
    /// 纹理 UAV
    RgTextureReadWrite => RgTextureId;
    RgRenderTarget => RgTextureId;
    RgDepthStencil => RgTextureId;
    RgTextureCopySrc => RgTextureId;
    RgTextureCopyDst => RgTextureId;

    /// 缓冲区 SRV
    RgBufferReadOnly => RgBufferId;
    /// 缓冲区 UAV（可能带 counter）
    RgBufferReadWrite => RgBufferId;
    RgBufferCopySrc => RgBufferId;
    RgBufferCopyDst => RgBufferId;
    RgBufferIndirectArgs => RgBufferId;
    RgBufferVertex => RgBufferId;
    RgBufferIndex => RgBufferId;
    RgBufferConstant => RgBufferId;
}

/// 带访问方式的资源句柄
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgHandle<K: RgAccessKind> {
    pub(crate) resource: K::Key,
    /// 资源视图列表中的下标，不需要视图的访问方式为 0
    pub(crate) view: u32,
    /// 获取句柄时资源的版本
    pub(crate) version: u32,
    pub(crate) pass: RgPassId,
    _kind: PhantomData<K>,
}

pub type RgTextureReadOnlyId = RgHandle<RgTextureReadOnly>;
pub type RgTextureReadWriteId = RgHandle<RgTextureReadWrite>;
pub type RgRenderTargetId = RgHandle<RgRenderTarget>;
pub type RgDepthStencilId = RgHandle<RgDepthStencil>;
pub type RgTextureCopySrcId = RgHandle<RgTextureCopySrc>;
pub type RgTextureCopyDstId = RgHandle<RgTextureCopyDst>;
pub type RgBufferReadOnlyId = RgHandle<RgBufferReadOnly>;
pub type RgBufferReadWriteId = RgHandle<RgBufferReadWrite>;
pub type RgBufferCopySrcId = RgHandle<RgBufferCopySrc>;
pub type RgBufferCopyDstId = RgHandle<RgBufferCopyDst>;
pub type RgBufferIndirectArgsId = RgHandle<RgBufferIndirectArgs>;
pub type RgBufferVertexId = RgHandle<RgBufferVertex>;
pub type RgBufferIndexId = RgHandle<RgBufferIndex>;
pub type RgBufferConstantId = RgHandle<RgBufferConstant>;

// new & init
impl<K: RgAccessKind> RgHandle<K> {
    #[inline]
    pub(crate) fn new(resource: K::Key, view: u32, version: u32, pass: RgPassId) -> Self {
        Self {
            resource,
            view,
            version,
            pass,
            _kind: PhantomData,
        }
    }

    /// 可选资源的占位句柄
    #[inline]
    pub fn invalid() -> Self {
        Self::new(K::Key::null(), u32::MAX, 0, RgPassId::INVALID)
    }

    #[inline]
    pub fn invalidate(&mut self) {
        *self = Self::invalid();
    }
}

impl<K: RgAccessKind> Default for RgHandle<K> {
    fn default() -> Self {
        Self::invalid()
    }
}

// getter
impl<K: RgAccessKind> RgHandle<K> {
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.resource.is_null()
    }

    #[inline]
    pub fn resource(&self) -> K::Key {
        self.resource
    }

    #[inline]
    pub fn view(&self) -> u32 {
        self.view
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[inline]
    pub fn pass(&self) -> RgPassId {
        self.pass
    }
}

impl<K: RgAccessKind> fmt::Debug for RgHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "{}(invalid)", K::NAME);
        }
        write!(f, "{}({:?}.view{}.v{}, {:?})", K::NAME, self.resource.data(), self.view, self.version, self.pass)
    }
}
