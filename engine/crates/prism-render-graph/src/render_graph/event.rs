/// 跨越多个 Pass 的调试事件区间
#[derive(Clone, Debug)]
pub struct RgEvent {
    pub name: String,
    /// 区间内的第一个 Pass
    pub(crate) begin: usize,
    /// 区间结束位置（不包含），`None` 表示尚未 pop
    pub(crate) end: Option<usize>,
}

impl RgEvent {
    pub(crate) fn new(name: impl Into<String>, begin: usize) -> Self {
        Self {
            name: name.into(),
            begin,
            end: None,
        }
    }

    /// 把 `[begin, end)` 收缩到区间内未被剔除的 Pass 上，返回首尾下标
    pub(crate) fn clamp(&self, alive: &[bool]) -> Option<(usize, usize)> {
        let end = self.end.unwrap_or(alive.len()).min(alive.len());
        let first = (self.begin..end).find(|&i| alive[i])?;
        let last = (self.begin..end).rev().find(|&i| alive[i])?;
        Some((first, last))
    }
}

/// 事件栈：记录 push / pop 的位置
#[derive(Default)]
pub(crate) struct RgEventStack {
    pub events: Vec<RgEvent>,
    open: Vec<usize>,
}

impl RgEventStack {
    pub fn push(&mut self, name: impl Into<String>, pass_count: usize) {
        self.open.push(self.events.len());
        self.events.push(RgEvent::new(name, pass_count));
    }

    pub fn pop(&mut self, pass_count: usize) {
        let Some(index) = self.open.pop() else {
            panic!("RenderGraph: pop_event without matching push_event");
        };
        self.events[index].end = Some(pass_count);
    }

    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.open.is_empty()
    }
}
