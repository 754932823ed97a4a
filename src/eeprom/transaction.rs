use std::time::Duration;

use crate::spi::{
	Level,
	OutputPin,
	SpiBus,
};

use super::{
	Command,
	Error,
	Result,
	Status,
	Step,
	split_address,
};

// 25xx parts select on a low CS
pub(super) const CS_ACTIVE: Level = Level::Low;

/// One chip-select window.
///
/// Chip-select is asserted in `begin` and released either by `finish` or, on
/// any early return, when the transaction is dropped.
pub(super) struct Transaction<'a, B: ?Sized + SpiBus, P: ?Sized + OutputPin> {
	bus: &'a mut B,
	cs: &'a mut P,
	selected: bool,
}

impl<'a, B: ?Sized + SpiBus, P: ?Sized + OutputPin> Transaction<'a, B, P> {
	pub fn begin(bus: &'a mut B, cs: &'a mut P) -> Result<Self> {
		let tx = Transaction {
			bus,
			cs,
			selected: true,
		};
		// if this fails `tx` gets dropped, which drives CS inactive again
		tx.cs.write(CS_ACTIVE).map_err(Error::transport(Step::ChipSelect))?;
		trace!("EEPROM chip-select asserted");
		Ok(tx)
	}

	pub fn send(&mut self, step: Step, byte: u8) -> Result<()> {
		trace!("EEPROM > 0x{:02x}", byte);
		self.bus.send(byte).map_err(Error::transport(step))
	}

	pub fn command(&mut self, cmd: Command) -> Result<()> {
		self.send(Step::Opcode(cmd), cmd.opcode())
	}

	pub fn address(&mut self, address: u16) -> Result<()> {
		let [high, low] = split_address(address);
		self.send(Step::AddressHigh, high)?;
		self.send(Step::AddressLow, low)
	}

	pub fn receive(&mut self) -> Result<u8> {
		let byte = self.bus.receive().map_err(Error::transport(Step::Receive))?;
		trace!("EEPROM < 0x{:02x}", byte);
		Ok(byte)
	}

	// RDSR plus one don't-care byte; status arrives during the second byte
	pub fn read_status(&mut self, timeout: Duration) -> Result<Status> {
		let mut rx = [0u8; 2];
		self.bus.transfer(&[Command::ReadStatus.opcode(), 0xff], &mut rx, timeout)
			.map_err(Error::transport(Step::Status))?;
		Ok(Status(rx[1]))
	}

	pub fn finish(mut self) -> Result<()> {
		self.cs.write(!CS_ACTIVE).map_err(Error::transport(Step::ChipSelect))?;
		// on failure `selected` stays set and drop tries once more
		self.selected = false;
		trace!("EEPROM chip-select released");
		Ok(())
	}
}

impl<'a, B: ?Sized + SpiBus, P: ?Sized + OutputPin> Drop for Transaction<'a, B, P> {
	fn drop(&mut self) {
		if self.selected {
			if let Err(e) = self.cs.write(!CS_ACTIVE) {
				error!("Couldn't release EEPROM chip-select: {}", e);
			}
		}
	}
}
