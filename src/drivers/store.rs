use std::collections::VecDeque;
use crate::drivers::parser::MAX_VALUES;
use crate::drivers::XValue;
/// Number of samples kept on the x-axis and in every channel.
pub const HISTORY_CAP: usize = 100;
pub const MAX_CHANNELS: usize = MAX_VALUES;
/// Fixed channel palette (blue, orange, green, red, purple, brown, pink, gray, olive, cyan).
pub const PALETTE: [[u8; 3]; MAX_CHANNELS] = [
    [0, 0, 255],
    [255, 165, 0],
    [0, 128, 0],
    [255, 0, 0],
    [128, 0, 128],
    [165, 42, 42],
    [255, 192, 203],
    [128, 128, 128],
    [128, 128, 0],
    [0, 255, 255],
];
/// One numeric series. Its history is right-aligned with the shared x-axis:
/// entry `k` from the back belongs to x-axis entry `k` from the back.
#[derive(Clone, Debug)]
pub struct Channel {
    index: usize,
    visible: bool,
    has_data: bool,
    history: VecDeque<Option<i64>>,
}
impl Channel {
    fn new(index: usize) -> Self {
        Self {
            index,
            visible: false,
            has_data: false,
            history: VecDeque::with_capacity(HISTORY_CAP),
        }
    }
    fn push(&mut self, value: Option<i64>) {
        if value.is_some() && !self.has_data {
            self.has_data = true;
            self.visible = true;
        }
        self.history.push_back(value);
    }
    pub fn label(&self) -> String {
        (self.index + 1).to_string()
    }
    pub fn color(&self) -> [u8; 3] {
        PALETTE[self.index]
    }
    #[cfg(test)]
    pub fn visible(&self) -> bool {
        self.visible
    }
    /// `None` marks a tick where the reading was too short to reach this channel.
    #[cfg(test)]
    pub fn history(&self) -> &VecDeque<Option<i64>> {
        &self.history
    }
}
/// Owned copy of one channel, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelFrame {
    pub index: usize,
    pub label: String,
    pub color: [u8; 3],
    pub visible: bool,
    pub points: Vec<(XValue, Option<i64>)>,
}
/// Owned copy of the whole history window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryFrame {
    pub x_axis: Vec<XValue>,
    pub channels: Vec<ChannelFrame>,
}
impl HistoryFrame {
    pub fn is_empty(&self) -> bool {
        self.x_axis.is_empty()
    }
}
/// Bounded history for up to ten lazily created channels.
pub struct ChannelStore {
    x_axis: VecDeque<XValue>,
    slots: [Option<Channel>; MAX_CHANNELS],
    capacity: usize,
}
impl Default for ChannelStore {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAP)
    }
}
impl ChannelStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x_axis: VecDeque::with_capacity(capacity),
            slots: Default::default(),
            capacity: capacity.max(1),
        }
    }
    pub fn channel_count(&self) -> usize {
        self.slots.iter().take_while(|s| s.is_some()).count()
    }
    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.slots.get(index).and_then(Option::as_ref)
    }
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.slots.iter().flatten()
    }
    #[cfg(test)]
    pub fn x_axis(&self) -> &VecDeque<XValue> {
        &self.x_axis
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.x_axis.len()
    }
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.x_axis.is_empty()
    }
    /// Records one sample. Channels missing from a short reading get a gap.
    pub fn observe(&mut self, values: &[i64], x: XValue) {
        let values = &values[..values.len().min(MAX_CHANNELS)];
        for index in self.channel_count()..values.len() {
            self.slots[index] = Some(Channel::new(index));
        }
        self.x_axis.push_back(x);
        for channel in self.slots.iter_mut().flatten() {
            channel.push(values.get(channel.index).copied());
        }
        if self.x_axis.len() > self.capacity {
            let excess = self.x_axis.len() - self.capacity;
            self.x_axis.drain(..excess);
        }
        let len = self.x_axis.len();
        for channel in self.slots.iter_mut().flatten() {
            if channel.history.len() > len {
                let excess = channel.history.len() - len;
                channel.history.drain(..excess);
            }
        }
    }
    pub fn clear(&mut self) {
        self.x_axis.clear();
        self.slots = Default::default();
    }
    /// Flips a channel's visibility, returning the new state.
    pub fn toggle_visibility(&mut self, index: usize) -> Option<bool> {
        let channel = self.slots.get_mut(index)?.as_mut()?;
        channel.visible = !channel.visible;
        Some(channel.visible)
    }
    /// Pairs a channel's history with the x-axis entries it is aligned to.
    pub fn series(&self, index: usize) -> Vec<(XValue, Option<i64>)> {
        let Some(channel) = self.channel(index) else {
            return Vec::new();
        };
        let offset = self.x_axis.len() - channel.history.len();
        self.x_axis
            .iter()
            .skip(offset)
            .copied()
            .zip(channel.history.iter().copied())
            .collect()
    }
    pub fn frame(&self) -> HistoryFrame {
        HistoryFrame {
            x_axis: self.x_axis.iter().copied().collect(),
            channels: self
                .channels()
                .map(|c| ChannelFrame {
                    index: c.index,
                    label: c.label(),
                    color: c.color(),
                    visible: c.visible,
                    points: self.series(c.index),
                })
                .collect(),
        }
    }
}
