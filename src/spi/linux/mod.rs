use std::path::Path;

mod gpio;
mod spidev;

pub use self::gpio::SysfsPin;
pub use self::spidev::{
	DEFAULT_SPEED_HZ,
	Spidev,
};

/// Open a spidev bus and a sysfs GPIO for chip-select.
///
/// The GPIO is only opened, not configured; `Eeprom::init_chip_select` does
/// that.
pub fn open(device: &Path, speed_hz: u32, cs_gpio: u32) -> crate::AResult<(Spidev, SysfsPin)> {
	let bus = with_context!(("couldn't open SPI device {}", device.display()), {
		Ok(Spidev::open(device, speed_hz)?)
	})?;
	let pin = SysfsPin::new(cs_gpio);
	debug!("opened {} at {} Hz, chip-select on GPIO {}", device.display(), speed_hz, cs_gpio);
	Ok((bus, pin))
}
