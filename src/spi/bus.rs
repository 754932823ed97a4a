use std::io;
use std::time::Duration;

pub trait SpiBus {
	// clock out a single byte, discarding whatever came in
	fn send(&mut self, byte: u8) -> io::Result<()>;

	// clock in a single byte (the value clocked out is "don't care")
	fn receive(&mut self) -> io::Result<u8>;

	// full duplex: clocks max(tx.len(), rx.len()) bytes; missing tx bytes are
	// sent as 0xff, surplus rx bytes are discarded
	fn transfer(&mut self, tx: &[u8], rx: &mut [u8], timeout: Duration) -> io::Result<()>;
}

impl<'a, B: ?Sized + SpiBus> SpiBus for &'a mut B {
	fn send(&mut self, byte: u8) -> io::Result<()> {
		B::send(*self, byte)
	}

	fn receive(&mut self) -> io::Result<u8> {
		B::receive(*self)
	}

	fn transfer(&mut self, tx: &[u8], rx: &mut [u8], timeout: Duration) -> io::Result<()> {
		B::transfer(*self, tx, rx, timeout)
	}
}
