#![no_std]
//! Driver for character LCD modules built around the Sitronix ST7032 controller, connected via
//! i2c at the fixed address `0x3E`. It requires an I2C instance implementing
//! [`embedded_hal::i2c::I2c`] and an instance to delay execution with
//! [`embedded_hal::delay::DelayNs`]. With the `async` feature the same API is available on top of
//! the `embedded-hal-async` traits in [`async_lcd`].
//!
//! Usage:
//! ```ignore
//! // Create a I2C instance, needs to implement embedded_hal::i2c::I2c, this
//! // particular uses the arduino_hal crate for avr microcontrollers like the arduinos.
//! let dp = arduino_hal::Peripherals::take().unwrap();
//! let pins = arduino_hal::pins!(dp);
//! let mut i2c = arduino_hal::I2c::new(
//!     dp.TWI, //
//!     pins.a4.into_pull_up_input(), // use respective pins
//!     pins.a5.into_pull_up_input(),
//!     400000,
//! );
//! let mut delay = arduino_hal::Delay::new();
//!
//! let mut lcd = st7032_i2c::sync_lcd::Lcd::new(&mut i2c, &mut delay)
//!     .with_contrast(0x28)
//!     .with_booster(true); // 3.3V supply
//! lcd.init(st7032_i2c::Lines::Two).unwrap();
//! lcd.write_str("Hello").unwrap();
//! lcd.set_cursor(0, 1).unwrap();
//! lcd.print_number(-42).unwrap();
//! ```
//!
//! The wire protocol is a control byte selecting the instruction or the data register followed by
//! the payload, see the [datasheet].
//!
//! [datasheet]: https://www.newhavendisplay.com/app_notes/ST7032.pdf

use core::convert::Infallible;
use core::fmt;

use ufmt::{uDisplay, Formatter};
use ufmt_write::uWrite;

#[cfg(feature = "async")]
pub mod async_lcd;
mod instruction;
pub mod sync_lcd;

pub use instruction::Status;

/// Fixed 7-bit I2C address of the controller.
pub const ADDRESS: u8 = 0x3E;

/// Register targeted by the bytes following the control byte.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Register {
    Instruction = 0x00,
    Data = 0x40,
}

/// Number of display lines the panel is driven with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lines {
    One,
    Two,
}

/// Lifecycle of a controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Initializing,
    Ready,
}

/// Instruction table selected by the IS bit of the last function-set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum InstructionSet {
    Normal,
    Extended,
}

/// Analog settings sent during initialization.
///
/// The default values reproduce the reference power-on sequence: oscillator `0x14`, contrast
/// `0x79`, power/icon/contrast `0x50` and follower `0x6C`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// 6 bit contrast value.
    pub contrast: u8,
    /// Enable the internal voltage booster, required for 3.3V supplies.
    pub booster: bool,
    /// Enable the icon display.
    pub icon: bool,
    /// Voltage follower amplification ratio, 3 bits.
    pub follower_ratio: u8,
    /// Internal oscillator frequency adjustment, 3 bits.
    pub osc_frequency: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contrast: 0x09,
            booster: false,
            icon: false,
            follower_ratio: 0x04,
            osc_frequency: 0x04,
        }
    }
}

/// Errors returned by the controller.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// The bus reported a failure while writing.
    Bus(E),
    /// Reading the status byte failed.
    Read(E),
    /// The operation requires a successful [`init`](sync_lcd::Lcd::init) first.
    NotInitialized,
    /// The row does not exist with the configured number of lines.
    RowOutOfRange,
    /// DDRAM address above 127 or CGRAM address above 63.
    AddressOutOfRange,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "I2C write failed: {:?}", e),
            Error::Read(e) => write!(f, "I2C status read failed: {:?}", e),
            Error::NotInitialized => f.write_str("controller not initialized"),
            Error::RowOutOfRange => f.write_str("row out of range"),
            Error::AddressOutOfRange => f.write_str("address out of range"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for Error<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::Bus(_e) => defmt::write!(fmt, "I2C write failed"),
            Error::Read(_e) => defmt::write!(fmt, "I2C status read failed"),
            Error::NotInitialized => defmt::write!(fmt, "Controller not initialized"),
            Error::RowOutOfRange => defmt::write!(fmt, "Row out of range"),
            Error::AddressOutOfRange => defmt::write!(fmt, "Address out of range"),
        }
    }
}

/// DDRAM address of `(column, row)`. Row 1 starts at `0x40` and only exists on two line panels.
fn cursor_address<E>(lines: Lines, column: u8, row: u8) -> Result<u8, Error<E>> {
    match (row, lines) {
        (0, _) => Ok(column),
        (1, Lines::Two) => Ok(0x40 | column),
        _ => Err(Error::RowOutOfRange),
    }
}

/// Decimal rendering of an `i32`, sent to the display as one data write.
struct Digits {
    buf: [u8; 11],
    len: usize,
}

impl Digits {
    fn new(number: i32) -> Self {
        let mut digits = Self {
            buf: [0; 11],
            len: 0,
        };
        let _ = uDisplay::fmt(&number, &mut Formatter::new(&mut digits));
        digits
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl uWrite for Digits {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        let end = self.len + s.len();
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

fn bus_error<E>(e: E) -> Error<E> {
    #[cfg(feature = "defmt")]
    defmt::warn!("ST7032 write failed");
    Error::Bus(e)
}

fn read_error<E>(e: E) -> Error<E> {
    #[cfg(feature = "defmt")]
    defmt::warn!("ST7032 status read failed");
    Error::Read(e)
}
