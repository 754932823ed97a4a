//! Collaborators the EEPROM driver is built on: a chip-select output pin and
//! a blocking byte-oriented SPI bus.
//!
//! The driver never touches chip-select through the bus; SPI controllers must
//! be configured so they don't toggle a hardware chip-select on their own.

mod bus;
mod pin;

pub mod linux;

pub use self::bus::{
	SpiBus,
};

pub use self::pin::{
	Drive,
	Level,
	OutputPin,
};
