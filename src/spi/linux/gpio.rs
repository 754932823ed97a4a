use std::fs;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use crate::spi::{
	Drive,
	Level,
	OutputPin,
};

const SYSFS_GPIO: &str = "/sys/class/gpio";

/// GPIO output through the (legacy) sysfs interface.
pub struct SysfsPin {
	gpio: u32,
	value: Option<fs::File>,
}

impl SysfsPin {
	pub fn new(gpio: u32) -> Self {
		SysfsPin {
			gpio,
			value: None,
		}
	}

	pub fn gpio(&self) -> u32 {
		self.gpio
	}

	fn base(&self) -> PathBuf {
		PathBuf::from(format!("{}/gpio{}", SYSFS_GPIO, self.gpio))
	}

	fn export(&self) -> io::Result<()> {
		if self.base().exists() {
			return Ok(());
		}
		debug!("exporting GPIO {}", self.gpio);
		fs::write(format!("{}/export", SYSFS_GPIO), self.gpio.to_string())
	}
}

impl OutputPin for SysfsPin {
	fn configure(&mut self, drive: Drive, initial: Level) -> io::Result<()> {
		if drive != Drive::PushPull {
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!("sysfs GPIO {} only supports push-pull outputs, not {:?}", self.gpio, drive),
			));
		}

		self.export()?;

		// "high"/"low" set the direction to output with the given initial value
		// in one step
		let direction = match initial {
			Level::Low => "low",
			Level::High => "high",
		};
		fs::write(self.base().join("direction"), direction)?;

		let value = fs::OpenOptions::new()
			.write(true)
			.open(self.base().join("value"))?;
		self.value = Some(value);
		Ok(())
	}

	fn write(&mut self, level: Level) -> io::Result<()> {
		let value = match &self.value {
			Some(v) => v,
			None => return Err(io::Error::new(
				io::ErrorKind::Other,
				format!("GPIO {} used before it was configured", self.gpio),
			)),
		};
		let data: &[u8] = match level {
			Level::Low => b"0",
			Level::High => b"1",
		};
		// writing should push all data in one step (in this case)
		let l = value.write_at(data, 0)?;
		if l != data.len() {
			return Err(io::Error::new(io::ErrorKind::Other, "failed to write GPIO value"));
		}
		Ok(())
	}
}
