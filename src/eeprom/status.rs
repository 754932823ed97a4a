use std::fmt;

const STATUS_WIP: u8 = 0x01; // write in progress
const STATUS_WEL: u8 = 0x02; // write enable latch
const STATUS_BP_MASK: u8 = 0x0c;
const STATUS_BP_SHIFT: u8 = 2;
const STATUS_WPEN: u8 = 0x80;

/// Content of the status register ("RDSR").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Status(pub u8);

impl Status {
	/// Device still commits a previous write.
	pub fn is_busy(&self) -> bool {
		0 != self.0 & STATUS_WIP
	}

	// only for diagnostics; never used to decide anything
	pub fn is_write_enabled(&self) -> bool {
		0 != self.0 & STATUS_WEL
	}

	pub fn block_protect(&self) -> u8 {
		(self.0 & STATUS_BP_MASK) >> STATUS_BP_SHIFT
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

impl fmt::Debug for Status {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (block protect: {}", self.0, self.block_protect())?;
		if self.is_busy() { write!(f, " [WIP]")?; }
		if self.is_write_enabled() { write!(f, " [WEL]")?; }
		if 0 != self.0 & STATUS_WPEN { write!(f, " [WPEN]")?; }
		write!(f, ")")
	}
}
