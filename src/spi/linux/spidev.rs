use std::fs;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{
	Path,
	PathBuf,
};
use std::time::{
	Duration,
	Instant,
};

use crate::spi::SpiBus;

pub const DEFAULT_SPEED_HZ: u32 = 1_000_000;

/* see linux/spi/spidev.h */

const SPI_MODE_0: u8 = 0x00;
const SPI_NO_CS: u8 = 0x40;

#[repr(C)]
#[derive(Default)]
pub struct SpiIocTransfer {
	tx_buf: u64,
	rx_buf: u64,
	len: u32,
	speed_hz: u32,
	delay_usecs: u16,
	bits_per_word: u8,
	cs_change: u8,
	tx_nbits: u8,
	rx_nbits: u8,
	word_delay_usecs: u8,
	pad: u8,
}

mod ioctl {
	use nix::ioctl_write_ptr;

	use super::SpiIocTransfer;

	const SPI_IOC_MAGIC: u8 = b'k';

	const SPI_IOC_TYPE_MESSAGE: u8 = 0;
	const SPI_IOC_TYPE_MODE: u8 = 1;
	const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
	const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

	ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
	ioctl_write_ptr!(spi_ioc_wr_bits_per_word, SPI_IOC_MAGIC, SPI_IOC_TYPE_BITS_PER_WORD, u8);
	ioctl_write_ptr!(spi_ioc_wr_max_speed_hz, SPI_IOC_MAGIC, SPI_IOC_TYPE_MAX_SPEED_HZ, u32);
	// SPI_IOC_MESSAGE(1): the size field is one spi_ioc_transfer
	ioctl_write_ptr!(spi_ioc_message_1, SPI_IOC_MAGIC, SPI_IOC_TYPE_MESSAGE, SpiIocTransfer);
}

pub struct Spidev {
	file: fs::File,
	path: PathBuf,
	speed_hz: u32,
}

impl Spidev {
	/// Opens the device in SPI mode 0 without hardware chip-select.
	pub fn open(path: &Path, speed_hz: u32) -> io::Result<Self> {
		let file = fs::OpenOptions::new()
			.read(true)
			.write(true)
			.open(path)?;

		let dev = Spidev {
			file,
			path: path.to_owned(),
			speed_hz,
		};

		let fd = dev.file.as_raw_fd();
		let mode: u8 = SPI_MODE_0 | SPI_NO_CS;
		unsafe { ioctl::spi_ioc_wr_mode(fd, &mode) }.map_err(io::Error::from)?;
		let bits: u8 = 8;
		unsafe { ioctl::spi_ioc_wr_bits_per_word(fd, &bits) }.map_err(io::Error::from)?;
		unsafe { ioctl::spi_ioc_wr_max_speed_hz(fd, &speed_hz) }.map_err(io::Error::from)?;

		Ok(dev)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn speed_hz(&self) -> u32 {
		self.speed_hz
	}

	// tx and rx must have the same length
	fn message(&mut self, tx: &[u8], rx: &mut [u8]) -> io::Result<()> {
		assert_eq!(tx.len(), rx.len());
		if tx.is_empty() { return Ok(()); }

		let xfer = SpiIocTransfer {
			tx_buf: tx.as_ptr() as u64,
			rx_buf: rx.as_mut_ptr() as u64,
			len: tx.len() as u32,
			speed_hz: self.speed_hz,
			bits_per_word: 8,
			..Default::default()
		};
		unsafe { ioctl::spi_ioc_message_1(self.file.as_raw_fd(), &xfer) }.map_err(io::Error::from)?;
		Ok(())
	}
}

impl SpiBus for Spidev {
	fn send(&mut self, byte: u8) -> io::Result<()> {
		let mut discard = [0u8];
		self.message(&[byte], &mut discard)
	}

	fn receive(&mut self) -> io::Result<u8> {
		let mut buf = [0u8];
		self.message(&[0xff], &mut buf)?;
		Ok(buf[0])
	}

	fn transfer(&mut self, tx: &[u8], rx: &mut [u8], timeout: Duration) -> io::Result<()> {
		let len = tx.len().max(rx.len());
		let mut tx_buf = vec![0xffu8; len];
		tx_buf[..tx.len()].copy_from_slice(tx);
		let mut rx_buf = vec![0u8; len];

		// spidev has no timeout of its own; the ioctl blocks until the
		// controller is done
		let start = Instant::now();
		self.message(&tx_buf, &mut rx_buf)?;
		let elapsed = start.elapsed();
		if elapsed > timeout {
			return Err(io::Error::new(
				io::ErrorKind::TimedOut,
				format!("SPI transfer on {} took {:?} (limit {:?})", self.path.display(), elapsed, timeout),
			));
		}

		let rx_len = rx.len();
		rx.copy_from_slice(&rx_buf[..rx_len]);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::mem;

	use nix::request_code_write;
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn transfer_matches_kernel_layout() {
		// SPI_IOC_MESSAGE(1) encodes exactly one 32 byte spi_ioc_transfer
		assert_eq!(mem::size_of::<SpiIocTransfer>(), 32);
	}

	#[cfg(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "arm"))]
	#[test]
	fn request_codes() {
		assert_eq!(request_code_write!(b'k', 0, mem::size_of::<SpiIocTransfer>()) as u32, 0x4020_6b00);
		assert_eq!(request_code_write!(b'k', 1, mem::size_of::<u8>()) as u32, 0x4001_6b01);
		assert_eq!(request_code_write!(b'k', 4, mem::size_of::<u32>()) as u32, 0x4004_6b04);
	}
}
