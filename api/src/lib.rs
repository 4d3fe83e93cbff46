pub mod consts;
pub mod error;
pub mod dec;
pub mod coin;
pub mod address;
pub mod upgrade;
pub mod inflation;
pub mod epoch;
pub mod staking;
pub mod event;

pub mod prelude {
    pub use crate::consts::*;
    pub use crate::error::*;
    pub use crate::dec::*;
    pub use crate::coin::*;
    pub use crate::address::*;
    pub use crate::upgrade::*;
    pub use crate::inflation::*;
    pub use crate::epoch::*;
    pub use crate::staking::*;
    pub use crate::event::*;
}
