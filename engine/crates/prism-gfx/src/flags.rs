use bitflags::bitflags;

bitflags! {
    /// 资源可以被绑定到哪些管线位置
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct GfxBindFlags: u32 {
        const SHADER_RESOURCE = 1 << 0;
        const RENDER_TARGET = 1 << 1;
        const DEPTH_STENCIL = 1 << 2;
        const UNORDERED_ACCESS = 1 << 3;
    }
}

bitflags! {
    /// 资源的附加属性
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct GfxMiscFlags: u32 {
        const INDIRECT_ARGS = 1 << 0;
        const BUFFER_RAW = 1 << 1;
        const BUFFER_STRUCTURED = 1 << 2;
        const TEXTURE_CUBE = 1 << 3;
        const SHARED = 1 << 4;
    }
}
