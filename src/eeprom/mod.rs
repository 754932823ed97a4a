//! Driver for 25xx320 style SPI EEPROMs (4096 x 8 bit, 12 address bits).
//!
//! Instructions (each framed by one chip-select window):
//! - WREN / WRDI: opcode only; set / clear the write enable latch
//! - RDSR: opcode, then the status register is clocked out
//! - WRITE: opcode, address high, address low, data
//! - READ: opcode, address high, address low, then data is clocked out
//!   (the address auto-increments as long as CS stays asserted)
//!
//! The device commits writes asynchronously; every command that needs the
//! array waits for the write-in-progress bit to clear first.

use std::time::{
	Duration,
	Instant,
};

use crate::spi::{
	Drive,
	OutputPin,
	SpiBus,
};

mod command;
mod error;
mod self_test;
mod status;
mod transaction;

pub use self::command::{
	ADDRESS_MASK,
	CAPACITY,
	Command,
	split_address,
};

pub use self::error::{
	Error,
	Result,
	Step,
};

pub use self::self_test::{
	SelfTest,
	run_self_test,
};

pub use self::status::Status;

use self::transaction::{
	CS_ACTIVE,
	Transaction,
};

pub const DEFAULT_MAX_POLLS: u32 = 0xffff;
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_millis(100);

/// How long `wait_for_write_completion` keeps polling a busy device.
///
/// At least one status read always happens.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PollLimit {
	/// Spin until the device reports ready. Write cycles are bounded in
	/// hardware (a few ms), but an absent or miswired device hangs forever.
	Unbounded,
	/// Give up after this many status reads.
	Polls(u32),
	/// Give up once this much time passed since the first status read.
	Deadline(Duration),
}

impl Default for PollLimit {
	fn default() -> Self {
		PollLimit::Polls(DEFAULT_MAX_POLLS)
	}
}

/// Exclusive handle for one EEPROM: owns the bus and its chip-select line.
pub struct Eeprom<B: SpiBus, P: OutputPin> {
	bus: B,
	cs: P,
	poll_limit: PollLimit,
	transfer_timeout: Duration,
}

impl<B: SpiBus, P: OutputPin> Eeprom<B, P> {
	pub fn new(bus: B, cs: P) -> Self {
		Eeprom {
			bus,
			cs,
			poll_limit: PollLimit::default(),
			transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
		}
	}

	pub fn with_poll_limit(mut self, poll_limit: PollLimit) -> Self {
		self.poll_limit = poll_limit;
		self
	}

	pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
		self.transfer_timeout = timeout;
		self
	}

	pub fn poll_limit(&self) -> PollLimit {
		self.poll_limit
	}

	pub fn into_parts(self) -> (B, P) {
		(self.bus, self.cs)
	}

	fn select(&mut self) -> Result<Transaction<'_, B, P>> {
		Transaction::begin(&mut self.bus, &mut self.cs)
	}

	/// Configure the chip-select pin as output, initially inactive.
	pub fn init_chip_select(&mut self) -> Result<()> {
		self.cs.configure(Drive::PushPull, !CS_ACTIVE)
			.map_err(Error::transport(Step::ConfigurePin))
	}

	/// Single status read; doesn't wait for a pending write.
	pub fn read_status(&mut self) -> Result<Status> {
		let timeout = self.transfer_timeout;
		let mut tx = self.select()?;
		let status = tx.read_status(timeout)?;
		tx.finish()?;
		Ok(status)
	}

	/// Block until the device isn't committing a write anymore.
	///
	/// Every status read gets its own chip-select window. Transport errors
	/// are never retried.
	pub fn wait_for_write_completion(&mut self) -> Result<()> {
		let start = Instant::now();
		let mut polls = 0u32;
		loop {
			let status = self.read_status()?;
			polls = polls.saturating_add(1);
			if !status.is_busy() {
				if polls > 1 {
					debug!("EEPROM ready after {} status polls", polls);
				}
				return Ok(());
			}

			let exhausted = match self.poll_limit {
				PollLimit::Unbounded => false,
				PollLimit::Polls(max) => polls >= max,
				PollLimit::Deadline(deadline) => start.elapsed() >= deadline,
			};
			if exhausted {
				warn!("EEPROM still busy after {} status polls ({:?}), giving up", polls, status);
				return Err(Error::BusyTimeout { polls });
			}
		}
	}

	fn simple_command(&mut self, cmd: Command) -> Result<()> {
		self.wait_for_write_completion()?;
		let mut tx = self.select()?;
		tx.command(cmd)?;
		tx.finish()
	}

	/// Set the write enable latch; the device clears it after each write.
	pub fn write_enable(&mut self) -> Result<()> {
		debug!("EEPROM write enable");
		self.simple_command(Command::WriteEnable)
	}

	pub fn write_disable(&mut self) -> Result<()> {
		debug!("EEPROM write disable");
		self.simple_command(Command::WriteDisable)
	}

	/// Write a single byte.
	///
	/// The device commits the byte after chip-select is released; it is only
	/// durable once the next status poll reports ready.
	pub fn write_byte(&mut self, address: u16, value: u8) -> Result<()> {
		debug!("EEPROM write 0x{:03x}: 0x{:02x}", address & ADDRESS_MASK, value);
		self.write_enable()?;
		self.wait_for_write_completion()?;

		let mut tx = self.select()?;
		tx.command(Command::Write)?;
		tx.address(address)?;
		tx.send(Step::Data, value)?;
		tx.finish()
	}

	pub fn read_byte(&mut self, address: u16) -> Result<u8> {
		self.wait_for_write_completion()?;

		let mut tx = self.select()?;
		tx.command(Command::Read)?;
		tx.address(address)?;
		let value = tx.receive()?;
		tx.finish()?;

		debug!("EEPROM read 0x{:03x}: 0x{:02x}", address & ADDRESS_MASK, value);
		Ok(value)
	}

	/// Sequential read in a single READ command; wraps at the end of the
	/// array.
	pub fn read(&mut self, address: u16, target: &mut [u8]) -> Result<()> {
		if target.is_empty() { return Ok(()); }
		self.wait_for_write_completion()?;

		let mut tx = self.select()?;
		tx.command(Command::Read)?;
		tx.address(address)?;
		for t in target.iter_mut() {
			*t = tx.receive()?;
		}
		tx.finish()
	}

	/// Read back `expected` and fail on the first differing byte.
	pub fn verify(&mut self, address: u16, expected: &[u8]) -> Result<()> {
		let mut actual = vec![0u8; expected.len()];
		self.read(address, &mut actual)?;
		for (offset, (&e, &a)) in expected.iter().zip(actual.iter()).enumerate() {
			if e != a {
				return Err(Error::DataMismatch {
					address: address.wrapping_add(offset as u16) & ADDRESS_MASK,
					expected: e,
					actual: a,
				});
			}
		}
		Ok(())
	}
}
