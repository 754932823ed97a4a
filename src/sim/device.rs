use std::collections::HashMap;
use std::io;

use crate::eeprom::{
	ADDRESS_MASK,
	CAPACITY,
	Command,
};
use crate::spi::Level;

const PAGE_SIZE: u16 = 32;

const STATUS_WIP: u8 = 0x01;
const STATUS_WEL: u8 = 0x02;

pub(super) struct Device {
	pub memory: Vec<u8>,
	pub chip_select: Level,
	pub configured: bool,
	pub write_enabled: bool,
	// status reads that still report busy
	pub busy_polls: u32,
	pub write_cycle_polls: u32,
	pub stuck_busy: bool,
	// xor masks applied when a write commits
	pub defects: HashMap<u16, u8>,
	// MOSI bytes of the current chip-select window
	window: Option<Vec<u8>>,
	pub windows: Vec<Vec<u8>>,
	pub status_polls: u32,
	pub calls: u32,
	pub fail_at: Option<u32>,
}

impl Device {
	pub fn new() -> Self {
		Device {
			memory: vec![0xff; CAPACITY],
			chip_select: Level::High,
			configured: false,
			write_enabled: false,
			busy_polls: 0,
			write_cycle_polls: 3,
			stuck_busy: false,
			defects: HashMap::new(),
			window: None,
			windows: Vec::new(),
			status_polls: 0,
			calls: 0,
			fail_at: None,
		}
	}

	pub fn is_busy(&self) -> bool {
		self.stuck_busy || self.busy_polls > 0
	}

	pub fn status(&self) -> u8 {
		let mut status = 0;
		if self.is_busy() { status |= STATUS_WIP; }
		if self.write_enabled { status |= STATUS_WEL; }
		status
	}

	// every collaborator call goes through here first
	pub fn call(&mut self, what: &str) -> io::Result<()> {
		let n = self.calls;
		self.calls += 1;
		if self.fail_at == Some(n) {
			debug!("simulated EEPROM: failing call {} ({})", n, what);
			return Err(io::Error::new(
				io::ErrorKind::Other,
				format!("injected failure on call {} ({})", n, what),
			));
		}
		Ok(())
	}

	pub fn set_chip_select(&mut self, level: Level) {
		if level == self.chip_select { return; }
		self.chip_select = level;
		match level {
			Level::Low => self.window = Some(Vec::new()),
			Level::High => self.end_window(),
		}
	}

	fn poll_status(&mut self) -> u8 {
		let status = self.status();
		self.status_polls += 1;
		if self.busy_polls > 0 {
			self.busy_polls -= 1;
		}
		status
	}

	/// Clock one byte: `mosi` goes to the device, the result is MISO.
	pub fn exchange(&mut self, mosi: u8) -> u8 {
		let (opcode, index, address) = match self.window.as_mut() {
			// not selected: MISO floats (pulled up)
			None => return 0xff,
			Some(window) => {
				window.push(mosi);
				let address = if window.len() >= 3 {
					Some(u16::from(window[1]) << 8 | u16::from(window[2]))
				} else {
					None
				};
				(window[0], window.len() - 1, address)
			}
		};

		match (Command::from_opcode(opcode), address) {
			(Some(Command::ReadStatus), _) if index >= 1 => self.poll_status(),
			(Some(Command::Read), Some(address)) if index >= 3 && !self.is_busy() => {
				let offset = (index - 3) as u16;
				self.memory[usize::from(address.wrapping_add(offset) & ADDRESS_MASK)]
			},
			_ => 0xff,
		}
	}

	fn end_window(&mut self) {
		let window = match self.window.take() {
			None => return,
			Some(w) => w,
		};
		trace!("simulated EEPROM window: {:02x?}", window);

		let busy = self.is_busy();
		match window.first().cloned().and_then(Command::from_opcode) {
			Some(Command::WriteEnable) if window.len() == 1 && !busy => {
				self.write_enabled = true;
			},
			Some(Command::WriteDisable) if window.len() == 1 && !busy => {
				self.write_enabled = false;
			},
			Some(Command::Write) if window.len() >= 4 && !busy => {
				if self.write_enabled {
					self.commit(u16::from(window[1]) << 8 | u16::from(window[2]), &window[3..]);
				} else {
					debug!("simulated EEPROM: WRITE without write enable latch ignored");
				}
				self.write_enabled = false;
			},
			_ => (),
		}

		self.windows.push(window);
	}

	fn commit(&mut self, address: u16, data: &[u8]) {
		// writes wrap around inside the page
		let page = address & ADDRESS_MASK & !(PAGE_SIZE - 1);
		for (i, &b) in data.iter().enumerate() {
			let a = page | (address.wrapping_add(i as u16) & (PAGE_SIZE - 1));
			let b = b ^ self.defects.get(&a).cloned().unwrap_or(0);
			self.memory[usize::from(a)] = b;
		}
		self.busy_polls = self.write_cycle_polls;
	}
}
