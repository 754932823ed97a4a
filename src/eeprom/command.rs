use std::fmt;

/// Number of bytes in the array (25xx320: 4096 x 8 bit).
pub const CAPACITY: usize = 0x1000;

/// Significant address bits; everything above wraps around inside the device.
pub const ADDRESS_MASK: u16 = 0x0fff;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Command {
	Write,
	Read,
	WriteDisable,
	ReadStatus,
	WriteEnable,
}

impl Command {
	pub fn opcode(self) -> u8 {
		match self {
			Command::Write        => 0x02, // write data; clears WEL when CS gets deasserted
			Command::Read         => 0x03, // read data
			Command::WriteDisable => 0x04, // "WRDI": clears WEL
			Command::ReadStatus   => 0x05, // "RDSR"
			Command::WriteEnable  => 0x06, // "WREN": sets WEL
		}
	}

	pub fn from_opcode(opcode: u8) -> Option<Command> {
		match opcode {
			0x02 => Some(Command::Write),
			0x03 => Some(Command::Read),
			0x04 => Some(Command::WriteDisable),
			0x05 => Some(Command::ReadStatus),
			0x06 => Some(Command::WriteEnable),
			_ => None,
		}
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let name = match self {
			Command::Write => "WRITE",
			Command::Read => "READ",
			Command::WriteDisable => "WRDI",
			Command::ReadStatus => "RDSR",
			Command::WriteEnable => "WREN",
		};
		write!(f, "{}", name)
	}
}

/// Split an address into the two address bytes on the wire: the upper 4
/// significant bits in the low nibble of the first byte, the lower 8 bits
/// verbatim in the second.
pub fn split_address(address: u16) -> [u8; 2] {
	let address = address & ADDRESS_MASK;
	[(address >> 8) as u8, address as u8]
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn split_keeps_twelve_bits() {
		assert_eq!(split_address(0x123), [0x01, 0x23]);
		assert_eq!(split_address(0xfff), [0x0f, 0xff]);
		assert_eq!(split_address(0x000), [0x00, 0x00]);
	}

	#[test]
	fn split_aliases_high_bits() {
		assert_eq!(split_address(0x1123), split_address(0x0123));
		assert_eq!(split_address(0xffff), [0x0f, 0xff]);
	}

	#[test]
	fn opcodes() {
		for cmd in &[
			Command::Write,
			Command::Read,
			Command::WriteDisable,
			Command::ReadStatus,
			Command::WriteEnable,
		] {
			assert_eq!(Command::from_opcode(cmd.opcode()), Some(*cmd));
		}
		assert_eq!(Command::Read.opcode(), 0x03);
		assert_eq!(Command::from_opcode(0x01), None);
	}
}
