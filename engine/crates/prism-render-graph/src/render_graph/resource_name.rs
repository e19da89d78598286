//! 资源名
//!
//! 资源名是字符串的 CRC-64 哈希，比较和哈希都只看 64 位整数。
//!
//! # 调试字典
//!
//! debug 构建下每个构造出的名字都会登记到全局字典（hash -> 字符串），
//! 以便日志与 dump 输出可读的名字；同一个哈希登记了不同的字符串视为哈希冲突，直接 panic。
//! release 构建不保存字符串。
//!
//! ```
//! # use prism_render_graph::{rg_name, render_graph::RgResourceName};
//! let name = rg_name!("GBufferNormal");
//! assert_eq!(name, RgResourceName::new("GBufferNormal"));
//! ```

use std::fmt;

#[cfg(debug_assertions)]
use lazy_static::lazy_static;
#[cfg(debug_assertions)]
use std::{collections::HashMap, sync::Mutex};

#[cfg(debug_assertions)]
lazy_static! {
    static ref DICTIONARY: Mutex<HashMap<u64, String>> = Mutex::new(HashMap::new());
}

const CRC64_ALGO: crc::Crc<u64> = crc::Crc::<u64>::new(&crc::CRC_64_ECMA_182);

/// 未设置的资源名
pub const INVALID_HASH: u64 = u64::MAX;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RgResourceName {
    hash: u64,
}

impl Default for RgResourceName {
    fn default() -> Self {
        Self { hash: INVALID_HASH }
    }
}

// new & init
impl RgResourceName {
    /// 计算哈希并登记调试名
    pub fn new(name: &str) -> Self {
        let id = compute_name(name);
        insert_debug_name(id.hash, name);
        id
    }

    /// 名字族：`with_index("Bloom", 3)` 等价于 `new("Bloom3")`
    pub fn with_index(name: &str, index: usize) -> Self {
        Self::new(&format!("{name}{index}"))
    }

    #[inline]
    pub const fn from_raw(hash: u64) -> Self {
        Self { hash }
    }
}

// getter
impl RgResourceName {
    #[inline]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub const fn is_valid_name(&self) -> bool {
        self.hash != INVALID_HASH
    }

    /// 生成该名字时使用的字符串，release 构建下总是 `None`
    pub fn debug_name(&self) -> Option<String> {
        lookup_debug_name(self.hash)
    }
}

impl From<&str> for RgResourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Debug for RgResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.debug_name() {
            Some(name) => write!(f, "RgResourceName(\"{name}\")"),
            None => write!(f, "RgResourceName({:#018x})", self.hash),
        }
    }
}

impl fmt::Display for RgResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.debug_name() {
            Some(name) => f.write_str(&name),
            None => write!(f, "{:#018x}", self.hash),
        }
    }
}

/// 只计算哈希，不登记调试名，可以在 const 上下文中使用
pub const fn compute_name(name: &str) -> RgResourceName {
    RgResourceName::from_raw(CRC64_ALGO.checksum(name.as_bytes()))
}

#[cfg(debug_assertions)]
pub fn insert_debug_name(hash: u64, name: &str) {
    let mut dictionary = DICTIONARY.lock().unwrap_or_else(|e| e.into_inner());
    match dictionary.get(&hash) {
        Some(existing) => assert!(
            existing == name,
            "RgResourceName hash collision: \"{existing}\" and \"{name}\" both hash to {hash:#018x}"
        ),
        None => {
            dictionary.insert(hash, name.to_owned());
        }
    }
}

#[cfg(not(debug_assertions))]
pub fn insert_debug_name(_hash: u64, _name: &str) {}

#[cfg(debug_assertions)]
fn lookup_debug_name(hash: u64) -> Option<String> {
    DICTIONARY.lock().unwrap_or_else(|e| e.into_inner()).get(&hash).cloned()
}

#[cfg(not(debug_assertions))]
fn lookup_debug_name(_hash: u64) -> Option<String> {
    None
}

/// 编译期计算资源名哈希，并在运行时登记调试名
#[macro_export]
macro_rules! rg_name {
    ($s:expr) => {{
        const NAME: $crate::render_graph::RgResourceName = $crate::render_graph::compute_name($s);
        $crate::render_graph::insert_debug_name(NAME.hash(), $s);
        NAME
    }};
}
