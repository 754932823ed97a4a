//! In-memory 25xx320 for exercising the driver without hardware.
//!
//! `SimulatedEeprom` hands out a bus and a chip-select pin that share one
//! device; it also keeps a transcript of every chip-select window and can
//! inject failures.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crate::eeprom::{
	ADDRESS_MASK,
	Eeprom,
};
use crate::spi::{
	Drive,
	Level,
	OutputPin,
	SpiBus,
};

mod device;

use self::device::Device;

#[derive(Clone)]
pub struct SimulatedEeprom {
	device: Rc<RefCell<Device>>,
}

impl Default for SimulatedEeprom {
	fn default() -> Self {
		Self::new()
	}
}

impl SimulatedEeprom {
	/// Blank device (all bytes 0xff), 3 busy status polls per write.
	pub fn new() -> Self {
		SimulatedEeprom {
			device: Rc::new(RefCell::new(Device::new())),
		}
	}

	pub fn bus(&self) -> SimBus {
		SimBus { device: self.device.clone() }
	}

	pub fn pin(&self) -> SimPin {
		SimPin { device: self.device.clone() }
	}

	pub fn eeprom(&self) -> Eeprom<SimBus, SimPin> {
		Eeprom::new(self.bus(), self.pin())
	}

	pub fn peek(&self, address: u16) -> u8 {
		self.device.borrow().memory[usize::from(address & ADDRESS_MASK)]
	}

	pub fn poke(&self, address: u16, value: u8) {
		self.device.borrow_mut().memory[usize::from(address & ADDRESS_MASK)] = value;
	}

	pub fn chip_select(&self) -> Level {
		self.device.borrow().chip_select
	}

	pub fn is_configured(&self) -> bool {
		self.device.borrow().configured
	}

	pub fn is_write_enabled(&self) -> bool {
		self.device.borrow().write_enabled
	}

	pub fn is_busy(&self) -> bool {
		self.device.borrow().is_busy()
	}

	/// MOSI bytes of every completed chip-select window.
	pub fn windows(&self) -> Vec<Vec<u8>> {
		self.device.borrow().windows.clone()
	}

	pub fn clear_windows(&self) {
		self.device.borrow_mut().windows.clear();
	}

	/// Number of status register bytes clocked out so far.
	pub fn status_polls(&self) -> u32 {
		self.device.borrow().status_polls
	}

	/// Number of bus and pin calls so far (failed ones included).
	pub fn calls(&self) -> u32 {
		self.device.borrow().calls
	}

	/// Let the call with the given (zero based) number fail.
	pub fn fail_call(&self, n: u32) {
		self.device.borrow_mut().fail_at = Some(n);
	}

	/// Status polls reporting busy after each committed write.
	pub fn set_write_cycle_polls(&self, polls: u32) {
		self.device.borrow_mut().write_cycle_polls = polls;
	}

	/// Report busy for the next `polls` status reads.
	pub fn set_busy(&self, polls: u32) {
		self.device.borrow_mut().busy_polls = polls;
	}

	/// Never leave the write cycle (like an absent device with MISO low).
	pub fn set_stuck_busy(&self, stuck: bool) {
		self.device.borrow_mut().stuck_busy = stuck;
	}

	/// Cell that flips the bits in `xor` whenever it gets written.
	pub fn add_defect(&self, address: u16, xor: u8) {
		self.device.borrow_mut().defects.insert(address & ADDRESS_MASK, xor);
	}
}

pub struct SimBus {
	device: Rc<RefCell<Device>>,
}

impl SpiBus for SimBus {
	fn send(&mut self, byte: u8) -> io::Result<()> {
		let mut device = self.device.borrow_mut();
		device.call("send")?;
		device.exchange(byte);
		Ok(())
	}

	fn receive(&mut self) -> io::Result<u8> {
		let mut device = self.device.borrow_mut();
		device.call("receive")?;
		Ok(device.exchange(0xff))
	}

	fn transfer(&mut self, tx: &[u8], rx: &mut [u8], _timeout: Duration) -> io::Result<()> {
		let mut device = self.device.borrow_mut();
		device.call("transfer")?;
		for i in 0..tx.len().max(rx.len()) {
			let miso = device.exchange(tx.get(i).cloned().unwrap_or(0xff));
			if let Some(r) = rx.get_mut(i) {
				*r = miso;
			}
		}
		Ok(())
	}
}

pub struct SimPin {
	device: Rc<RefCell<Device>>,
}

impl OutputPin for SimPin {
	fn configure(&mut self, _drive: Drive, initial: Level) -> io::Result<()> {
		let mut device = self.device.borrow_mut();
		device.call("configure")?;
		device.configured = true;
		device.set_chip_select(initial);
		Ok(())
	}

	fn write(&mut self, level: Level) -> io::Result<()> {
		let mut device = self.device.borrow_mut();
		device.call("write")?;
		device.set_chip_select(level);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn write_needs_latch() {
		let sim = SimulatedEeprom::new();
		let mut pin = sim.pin();
		let mut bus = sim.bus();

		pin.write(Level::Low).unwrap();
		for &b in &[0x02, 0x00, 0x10, 0x42] { bus.send(b).unwrap(); }
		pin.write(Level::High).unwrap();
		assert_eq!(sim.peek(0x10), 0xff);
		assert!(!sim.is_busy());

		pin.write(Level::Low).unwrap();
		bus.send(0x06).unwrap();
		pin.write(Level::High).unwrap();
		assert!(sim.is_write_enabled());

		pin.write(Level::Low).unwrap();
		for &b in &[0x02, 0x00, 0x10, 0x42] { bus.send(b).unwrap(); }
		pin.write(Level::High).unwrap();
		assert_eq!(sim.peek(0x10), 0x42);
		assert!(sim.is_busy());
		assert!(!sim.is_write_enabled());
	}

	#[test]
	fn status_clears_after_write_cycle() {
		let sim = SimulatedEeprom::new();
		sim.set_busy(2);
		let mut pin = sim.pin();
		let mut bus = sim.bus();

		pin.write(Level::Low).unwrap();
		bus.send(0x05).unwrap();
		let statuses: Vec<u8> = (0..3).map(|_| bus.receive().unwrap()).collect();
		pin.write(Level::High).unwrap();

		assert_eq!(statuses, vec![0x01, 0x01, 0x00]);
		assert_eq!(sim.status_polls(), 3);
		assert_eq!(sim.windows(), vec![vec![0x05, 0xff, 0xff, 0xff]]);
	}

	#[test]
	fn ignores_bytes_while_deselected() {
		let sim = SimulatedEeprom::new();
		let mut bus = sim.bus();
		assert_eq!(bus.receive().unwrap(), 0xff);
		bus.send(0x06).unwrap();
		assert!(!sim.is_write_enabled());
		assert!(sim.windows().is_empty());
	}

	#[test]
	fn injected_failure() {
		let sim = SimulatedEeprom::new();
		let mut bus = sim.bus();
		sim.fail_call(1);
		assert!(bus.send(0x00).is_ok());
		assert!(bus.send(0x00).is_err());
		assert!(bus.send(0x00).is_ok());
		assert_eq!(sim.calls(), 3);
	}
}
