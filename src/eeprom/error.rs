use std::fmt;
use std::io;

use super::Command;

/// The part of a command sequence a transport failure happened in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Step {
	ConfigurePin,
	ChipSelect,
	Opcode(Command),
	AddressHigh,
	AddressLow,
	Data,
	Receive,
	Status,
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Step::ConfigurePin => write!(f, "configuring chip-select pin"),
			Step::ChipSelect => write!(f, "driving chip-select"),
			Step::Opcode(cmd) => write!(f, "sending {} opcode", cmd),
			Step::AddressHigh => write!(f, "sending address high byte"),
			Step::AddressLow => write!(f, "sending address low byte"),
			Step::Data => write!(f, "sending data byte"),
			Step::Receive => write!(f, "receiving data byte"),
			Step::Status => write!(f, "reading status register"),
		}
	}
}

#[derive(Debug, Fail)]
pub enum Error {
	#[fail(display = "EEPROM transport failure while {}: {}", step, cause)]
	Transport {
		step: Step,
		#[cause]
		cause: io::Error,
	},
	#[fail(display = "EEPROM still busy after {} status polls", polls)]
	BusyTimeout {
		polls: u32,
	},
	#[fail(display = "EEPROM data mismatch at 0x{:03x}: expected 0x{:02x}, read 0x{:02x}", address, expected, actual)]
	DataMismatch {
		address: u16,
		expected: u8,
		actual: u8,
	},
}

impl Error {
	pub(crate) fn transport(step: Step) -> impl FnOnce(io::Error) -> Error {
		move |cause| Error::Transport { step, cause }
	}

	pub fn step(&self) -> Option<Step> {
		match self {
			Error::Transport { step, .. } => Some(*step),
			_ => None,
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
