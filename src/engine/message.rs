#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

/// Control events a non-audio thread can queue for the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    SetParameter { id: u8, value: i32 },
    /// 16.16 fixed-point BPM.
    SetTempo(u32),
    TempoTick(u32),
    Reset,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<EngineMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<EngineMessage> {
    fn pop(&mut self) -> Option<EngineMessage> {
        Consumer::pop(self).ok()
    }
}

/// Single-producer single-consumer queue for handing control events to the
/// audio thread without locks.
#[cfg(feature = "rtrb")]
pub fn message_channel(capacity: usize) -> (Producer<EngineMessage>, Consumer<EngineMessage>) {
    RingBuffer::new(capacity)
}

/// Receiver over a plain slice, for hosts that batch events themselves.
impl MessageReceiver for std::slice::Iter<'_, EngineMessage> {
    fn pop(&mut self) -> Option<EngineMessage> {
        self.next().copied()
    }
}
