#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate spi_eeprom;
use spi_eeprom::*;

use std::path::Path;
use std::process::exit;

use spi_eeprom::eeprom::{
	CAPACITY,
	DEFAULT_MAX_POLLS,
	Error as EepromError,
};
use spi_eeprom::spi::{
	OutputPin,
	SpiBus,
};

const DEFAULT_DEVICE: &str = "/dev/spidev0.0";

// decimal or 0x-prefixed hex
fn get_number(matches: &clap::ArgMatches, name: &str, max: u64) -> AResult<Option<u64>> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => return Ok(None),
	};
	let (digits, radix) = match param.strip_prefix("0x") {
		Some(hex) => (hex, 16),
		None => (param, 10),
	};
	let value = u64::from_str_radix(digits, radix).map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		failure::Error::from(e.context(msg))
	})?;
	ensure!(value <= max, "parameter {} out of range: {} (maximum {})", name, value, max);
	Ok(Some(value))
}

// every wait reads the status at least once, so a limit of 0 can't be honoured
fn max_polls(polls: Option<u64>) -> AResult<PollLimit> {
	match polls {
		None => Ok(PollLimit::Polls(DEFAULT_MAX_POLLS)),
		Some(p) => {
			ensure!(p >= 1, "--max-polls must be at least 1");
			Ok(PollLimit::Polls(p as u32))
		},
	}
}

fn self_test<B: SpiBus, P: OutputPin>(ee: &mut Eeprom<B, P>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let mut test = SelfTest::default();
	if let Some(base) = get_number(sub_m, "base", CAPACITY as u64 - 1)? {
		test.base = base as u16;
	}
	if let Some(value) = get_number(sub_m, "value", 0xff)? {
		test.first_value = value as u8;
	}
	if let Some(count) = get_number(sub_m, "count", CAPACITY as u64)? {
		test.count = count as u16;
	}

	test.run(ee)?;
	println!("EEPROM test passed");
	Ok(())
}

fn read<B: SpiBus, P: OutputPin>(ee: &mut Eeprom<B, P>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = match get_number(sub_m, "ADDRESS", CAPACITY as u64 - 1)? {
		Some(a) => a as u16,
		None => bail!("missing parameter ADDRESS"),
	};
	let length = get_number(sub_m, "LENGTH", CAPACITY as u64)?.unwrap_or(1) as usize;

	let mut data = vec![0u8; length];
	ee.read(address, &mut data)?;

	for (i, b) in data.iter().enumerate() {
		if 0 == i % 16 {
			print!("{:04x} ", (usize::from(address) + i) % CAPACITY);
		} else if 0 == i % 8 {
			print!(" ");
		}
		print!(" {:02x}", b);
		if 15 == i % 16 {
			println!();
		}
	}
	if 0 != data.len() % 16 {
		println!();
	}

	Ok(())
}

fn write<B: SpiBus, P: OutputPin>(ee: &mut Eeprom<B, P>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = match get_number(sub_m, "ADDRESS", CAPACITY as u64 - 1)? {
		Some(a) => a as u16,
		None => bail!("missing parameter ADDRESS"),
	};
	let value = match get_number(sub_m, "VALUE", 0xff)? {
		Some(v) => v as u8,
		None => bail!("missing parameter VALUE"),
	};

	ee.write_byte(address, value)?;
	ee.wait_for_write_completion()?;
	ee.verify(address, &[value])?;
	info!("Wrote 0x{:02x} to 0x{:03x}", value, address);
	Ok(())
}

fn run<B: SpiBus, P: OutputPin>(ee: &mut Eeprom<B, P>, matches: &clap::ArgMatches) -> AResult<()> {
	ee.init_chip_select()?;

	match matches.subcommand() {
		("test", Some(sub_m)) => {
			self_test(ee, sub_m)
		},
		("read", Some(sub_m)) => {
			read(ee, sub_m)
		},
		("write", Some(sub_m)) => {
			write(ee, sub_m)
		},
		("status", _) => {
			println!("{:?}", ee.read_status()?);
			Ok(())
		},
		("protect", _) => {
			ee.write_disable()?;
			Ok(())
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg simulate: -s --simulate "use a simulated in-memory EEPROM instead of hardware")
		(@arg device: -d --device +takes_value "spidev device (default /dev/spidev0.0)")
		(@arg speed: --speed +takes_value "SPI clock in Hz (default 1 MHz)")
		(@arg unbounded: --unbounded "poll busy status without limit")
		(@subcommand test =>
			(about: "write an incrementing sequence and verify it")
			(@arg base: --base +takes_value "first address (default 0x20)")
			(@arg value: --value +takes_value "first value (default 0x10)")
			(@arg count: --count +takes_value "number of bytes (default 20)")
		)
		(@subcommand read =>
			(about: "read bytes and dump them as hex")
			(@arg ADDRESS: +required "address to start reading at")
			(@arg LENGTH: "number of bytes (default 1)")
		)
		(@subcommand write =>
			(about: "write a single byte")
			(@arg ADDRESS: +required "address to write to")
			(@arg VALUE: +required "byte to write")
		)
		(@subcommand status =>
			(about: "show status register")
		)
		(@subcommand protect =>
			(about: "clear write enable latch")
		)
	)
	.arg(clap::Arg::with_name("cs_gpio").long("cs-gpio").takes_value(true)
		.help("GPIO number driving chip-select"))
	.arg(clap::Arg::with_name("max_polls").long("max-polls").takes_value(true)
		.help("maximum status polls while waiting for a write (at least 1)"))
	.get_matches();

	let poll_limit = if matches.is_present("unbounded") {
		PollLimit::Unbounded
	} else {
		max_polls(get_number(&matches, "max_polls", u64::from(u32::max_value()))?)?
	};

	if matches.is_present("simulate") {
		let sim = sim::SimulatedEeprom::new();
		let mut ee = sim.eeprom().with_poll_limit(poll_limit);
		return run(&mut ee, &matches);
	}

	let device = matches.value_of("device").unwrap_or(DEFAULT_DEVICE);
	let gpio = match get_number(&matches, "cs_gpio", u64::from(u32::max_value()))? {
		Some(g) => g as u32,
		None => bail!("--cs-gpio is required unless --simulate is used"),
	};
	let speed = get_number(&matches, "speed", u64::from(u32::max_value()))?
		.map(|s| s as u32)
		.unwrap_or(spi::linux::DEFAULT_SPEED_HZ);

	let (bus, pin) = spi::linux::open(Path::new(device), speed, gpio)?;
	let mut ee = Eeprom::new(bus, pin).with_poll_limit(poll_limit);
	run(&mut ee, &matches)
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		match e.downcast_ref::<EepromError>() {
			Some(EepromError::DataMismatch { .. }) => exit(2),
			_ => exit(1),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn max_polls_rejects_zero() {
		assert!(max_polls(Some(0)).is_err());
		assert_eq!(max_polls(Some(1)).unwrap(), PollLimit::Polls(1));
		assert_eq!(max_polls(None).unwrap(), PollLimit::Polls(DEFAULT_MAX_POLLS));
	}
}
