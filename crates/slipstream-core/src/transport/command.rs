//! Lock-free command queue into the engine owner thread
//!
//! UI transport actions, speed samples, and remote media commands all
//! funnel through one SPSC queue and are applied at tick boundaries on
//! the owner thread. That single timeline is what lets the controller
//! mutate its state without locks: nothing else ever touches it.

use crate::nowplaying::MediaCommand;
use crate::types::Mph;

use super::lane::ActiveSoundtrack;

/// Commands sent from the control side to the engine owner thread
///
/// `SetSoundtrack` carries the bound lane set produced by the loader;
/// it is boxed because an `ActiveSoundtrack` holds player handles and
/// descriptor data, keeping the enum pointer-sized for the queue.
pub enum TransportCommand {
    /// Flip Stopped <-> Playing
    Toggle,
    /// Jump the master time (and every sounding cursor) to zero
    Rewind,
    /// Swap or refresh the active soundtrack
    SetSoundtrack(Box<ActiveSoundtrack>),
    /// A speed sample arrived from the speed source
    Speed(Mph),
    /// Remote command from the media surface, state-guarded
    Media(MediaCommand),
    /// Tear down the owner thread
    Shutdown,
}

impl std::fmt::Debug for TransportCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportCommand::Toggle => write!(f, "Toggle"),
            TransportCommand::Rewind => write!(f, "Rewind"),
            TransportCommand::SetSoundtrack(active) => {
                write!(f, "SetSoundtrack({})", active.id())
            }
            TransportCommand::Speed(mph) => write!(f, "Speed({mph:.1})"),
            TransportCommand::Media(cmd) => write!(f, "Media({cmd:?})"),
            TransportCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Capacity of the command queue
///
/// Speed sources sample at a few Hz and transport taps are human-paced;
/// 256 is generous headroom for bursts around soundtrack switches.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Create a new command channel (producer/consumer pair)
///
/// The producer side belongs to the control thread, the consumer to the
/// engine owner thread. Both ends are wait-free.
pub fn command_channel() -> (
    rtrb::Producer<TransportCommand>,
    rtrb::Consumer<TransportCommand>,
) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}
