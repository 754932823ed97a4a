use crate::spi::{
	OutputPin,
	SpiBus,
};

use super::{
	ADDRESS_MASK,
	Eeprom,
	Error,
	Result,
};

/// Write an incrementing sequence and read it back.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SelfTest {
	pub base: u16,
	pub first_value: u8,
	pub count: u16,
}

impl Default for SelfTest {
	fn default() -> Self {
		SelfTest {
			base: 0x20,
			first_value: 0x10,
			count: 20,
		}
	}
}

impl SelfTest {
	/// Aborts on the first write failure, read failure or mismatch.
	pub fn run<B: SpiBus, P: OutputPin>(&self, eeprom: &mut Eeprom<B, P>) -> Result<()> {
		let mut address = self.base;
		let mut value = self.first_value;
		for i in 0..self.count {
			if let Err(e) = eeprom.write_byte(address, value) {
				error!("EEPROM write failure at 0x{:03x} (iteration {}): {}", address & ADDRESS_MASK, i, e);
				return Err(e);
			}
			address = address.wrapping_add(1);
			value = value.wrapping_add(1);
		}

		let mut address = self.base;
		let mut expected = self.first_value;
		for i in 0..self.count {
			let actual = match eeprom.read_byte(address) {
				Ok(v) => v,
				Err(e) => {
					error!("EEPROM read failure at 0x{:03x} (iteration {}): {}", address & ADDRESS_MASK, i, e);
					return Err(e);
				}
			};
			if actual != expected {
				let e = Error::DataMismatch {
					address: address & ADDRESS_MASK,
					expected,
					actual,
				};
				error!("EEPROM read data does not match (iteration {}): {}", i, e);
				return Err(e);
			}
			address = address.wrapping_add(1);
			expected = expected.wrapping_add(1);
		}

		info!("EEPROM test passed ({} bytes at 0x{:03x})", self.count, self.base & ADDRESS_MASK);
		Ok(())
	}
}

/// The standard self test: 20 bytes at 0x20, values starting at 0x10.
pub fn run_self_test<B: SpiBus, P: OutputPin>(eeprom: &mut Eeprom<B, P>) -> Result<()> {
	SelfTest::default().run(eeprom)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use crate::eeprom::{
		Command,
		Step,
	};
	use crate::sim::SimulatedEeprom;
	use crate::spi::Level;

	use super::*;

	fn count_windows(sim: &SimulatedEeprom, cmd: Command) -> usize {
		sim.windows().iter().filter(|w| w.first() == Some(&cmd.opcode())).count()
	}

	#[test]
	fn passes_on_healthy_device() {
		let sim = SimulatedEeprom::new();
		let mut eeprom = sim.eeprom();
		eeprom.init_chip_select().unwrap();

		run_self_test(&mut eeprom).unwrap();

		let written: Vec<u8> = (0x20..0x34).map(|a| sim.peek(a)).collect();
		let expected: Vec<u8> = (0x10..0x24).collect();
		assert_eq!(written, expected);
		assert_eq!(count_windows(&sim, Command::Write), 20);
		assert_eq!(count_windows(&sim, Command::Read), 20);
		assert_eq!(sim.chip_select(), Level::High);
	}

	#[test]
	fn aborts_on_first_mismatch() {
		let sim = SimulatedEeprom::new();
		sim.add_defect(0x2a, 0x01);
		let mut eeprom = sim.eeprom();
		eeprom.init_chip_select().unwrap();

		match run_self_test(&mut eeprom) {
			Err(Error::DataMismatch { address, expected, actual }) => {
				assert_eq!((address, expected, actual), (0x2a, 0x1a, 0x1b));
			},
			r => panic!("unexpected result: {:?}", r),
		}
		// iteration 10 is the 11th read; nothing after it
		assert_eq!(count_windows(&sim, Command::Read), 11);
	}

	#[test]
	fn aborts_on_write_failure() {
		let sim = SimulatedEeprom::new();
		let mut eeprom = sim.eeprom();
		eeprom.init_chip_select().unwrap();
		// without write cycle delay every write_byte makes 15 calls; after
		// configure (call 0), fail the WRITE opcode of the third write
		sim.set_write_cycle_polls(0);
		sim.fail_call(1 + 2 * 15 + 10);

		match run_self_test(&mut eeprom) {
			Err(Error::Transport { step, .. }) => assert_eq!(step, Step::Opcode(Command::Write)),
			r => panic!("unexpected result: {:?}", r),
		}
		assert_eq!(sim.peek(0x22), 0xff);
		assert_eq!(count_windows(&sim, Command::Read), 0);
	}

	#[test]
	fn aborts_on_read_failure() {
		let sim = SimulatedEeprom::new();
		let mut eeprom = sim.eeprom();
		eeprom.init_chip_select().unwrap();
		// 20 writes of 15 calls each after configure, then 9 calls per
		// read_byte; fail the receive (8th call) of the fifth read
		sim.set_write_cycle_polls(0);
		sim.fail_call(1 + 20 * 15 + 4 * 9 + 7);

		match run_self_test(&mut eeprom) {
			Err(Error::Transport { step, .. }) => assert_eq!(step, Step::Receive),
			r => panic!("unexpected result: {:?}", r),
		}
		assert_eq!(count_windows(&sim, Command::Read), 5);
		assert_eq!(sim.windows().last(), Some(&vec![0x03, 0x00, 0x24]));
		assert_eq!(sim.chip_select(), Level::High);
	}

	#[test]
	fn custom_range_wraps_values() {
		let sim = SimulatedEeprom::new();
		let mut eeprom = sim.eeprom();
		eeprom.init_chip_select().unwrap();

		let test = SelfTest {
			base: 0xffe,
			first_value: 0xfe,
			count: 4,
		};
		test.run(&mut eeprom).unwrap();
		assert_eq!(
			[sim.peek(0xffe), sim.peek(0xfff), sim.peek(0x000), sim.peek(0x001)],
			[0xfe, 0xff, 0x00, 0x01],
		);
	}
}
