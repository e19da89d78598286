use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

/// Pass 之间共享数据的黑板，每种类型最多保存一个值
///
/// 前面的 Pass 在 setup 中写入自己的输出句柄，后面的 Pass 按类型取出。
#[derive(Default)]
pub struct RgBlackboard {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl RgBlackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入数据，已经存在同类型的数据时覆盖
    pub fn add<T: 'static>(&mut self, data: T) -> &mut T {
        self.entries.insert(TypeId::of::<T>(), Box::new(data));
        self.get_mut::<T>().unwrap_or_else(|| unreachable!())
    }

    /// 创建数据，同类型的数据已经存在时 panic
    pub fn create<T: 'static>(&mut self, data: T) -> &mut T {
        assert!(
            !self.entries.contains_key(&TypeId::of::<T>()),
            "RgBlackboard already contains {}",
            type_name::<T>()
        );
        self.add(data)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries.get(&TypeId::of::<T>()).and_then(|data| data.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.entries.get_mut(&TypeId::of::<T>()).and_then(|data| data.downcast_mut::<T>())
    }

    /// 数据不存在时 panic
    pub fn get_checked<T: 'static>(&self) -> &T {
        self.get::<T>()
            .unwrap_or_else(|| panic!("RgBlackboard does not contain {}", type_name::<T>()))
    }

    #[inline]
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
