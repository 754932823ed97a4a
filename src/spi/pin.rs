use std::fmt;
use std::io;
use std::ops::Not;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
	Low,
	High,
}

impl Not for Level {
	type Output = Level;

	fn not(self) -> Level {
		match self {
			Level::Low => Level::High,
			Level::High => Level::Low,
		}
	}
}

impl From<bool> for Level {
	fn from(v: bool) -> Self {
		match v {
			false => Level::Low,
			true => Level::High,
		}
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Level::Low => write!(f, "low"),
			Level::High => write!(f, "high"),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Drive {
	PushPull,
	OpenDrain,
}

pub trait OutputPin {
	// set up the pin as output; `initial` must be applied without glitching
	// through the other level if the platform allows it
	fn configure(&mut self, drive: Drive, initial: Level) -> io::Result<()>;

	fn write(&mut self, level: Level) -> io::Result<()>;
}

impl<'a, P: ?Sized + OutputPin> OutputPin for &'a mut P {
	fn configure(&mut self, drive: Drive, initial: Level) -> io::Result<()> {
		P::configure(*self, drive, initial)
	}

	fn write(&mut self, level: Level) -> io::Result<()> {
		P::write(*self, level)
	}
}
