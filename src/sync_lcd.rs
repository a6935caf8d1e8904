use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, Operation};

use ufmt_write::uWrite;

use crate::instruction::{self, Status};
use crate::{
    bus_error, cursor_address, read_error, Config, Digits, Error, InstructionSet, Lines, Register,
    State, ADDRESS,
};

/// API to write to the LCD.
///
/// The controller borrows the bus for its whole lifetime and is meant to be used from a single
/// thread.
pub struct Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    i2c: &'a mut I,
    delay: &'a mut D,
    config: Config,
    lines: Lines,
    state: State,
    instruction_set: InstructionSet,
}

impl<'a, I, D> Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create new instance with only the I2C and delay instance.
    pub fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            i2c,
            delay,
            config: Config::default(),
            lines: Lines::Two,
            state: State::Uninitialized,
            instruction_set: InstructionSet::Normal,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Contrast used by [`init`](Self::init), 0 to 63.
    pub fn with_contrast(mut self, contrast: u8) -> Self {
        self.config.contrast = contrast & 0x3F;
        self
    }

    /// Enable the voltage booster, needed when running from 3.3V.
    pub fn with_booster(mut self, on: bool) -> Self {
        self.config.booster = on;
        self
    }

    pub fn with_icon(mut self, on: bool) -> Self {
        self.config.icon = on;
        self
    }

    pub fn with_follower_ratio(mut self, ratio: u8) -> Self {
        self.config.follower_ratio = ratio & 0x07;
        self
    }

    pub fn with_osc_frequency(mut self, frequency: u8) -> Self {
        self.config.osc_frequency = frequency & 0x07;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Checks whether the controller acknowledges its address. Safe to call before `init`.
    pub fn is_available(&mut self) -> bool {
        self.i2c.write(ADDRESS, &[]).is_ok()
    }

    /// Initializes the hardware.
    ///
    /// After reset the controller only accepts instructions once it received two function-set
    /// instructions, 10ms apart. The second one is followed by another 10ms wait before the
    /// remaining configuration is sent as one batch. On failure the controller is left
    /// uninitialized and `init` may be called again.
    pub fn init(&mut self, lines: Lines) -> Result<(), Error<I::Error>> {
        self.state = State::Initializing;
        self.lines = lines;
        match self.power_on() {
            Ok(()) => {
                self.state = State::Ready;
                #[cfg(feature = "defmt")]
                defmt::debug!("ST7032 ready");
                Ok(())
            }
            Err(e) => {
                self.state = State::Uninitialized;
                Err(e)
            }
        }
    }

    fn power_on(&mut self) -> Result<(), Error<I::Error>> {
        self.send(
            Register::Instruction,
            &[instruction::function_set(InstructionSet::Normal)],
        )?;
        self.delay.delay_ms(10);
        self.send(
            Register::Instruction,
            &[instruction::function_set(InstructionSet::Extended)],
        )?;
        self.delay.delay_ms(10);
        self.instruction_set = InstructionSet::Extended;

        let sequence = instruction::power_on_sequence(&self.config);
        self.send(Register::Instruction, &sequence)?;
        self.delay.delay_ms(1);
        Ok(())
    }

    /// Write a single byte to DDRAM at the current address.
    pub fn print(&mut self, byte: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.send(Register::Data, &[byte])
    }

    /// Write bytes in one transaction. The controller advances the address after each byte,
    /// nothing is wrapped or clamped to the line width.
    pub fn print_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        if bytes.is_empty() {
            return Ok(());
        }
        self.send(Register::Data, bytes)
    }

    /// Write string to display. Bytes are passed to the character ROM unchanged.
    pub fn write_str(&mut self, data: &str) -> Result<(), Error<I::Error>> {
        self.print_bytes(data.as_bytes())
    }

    /// Write an integer in decimal.
    pub fn print_number(&mut self, number: i32) -> Result<(), Error<I::Error>> {
        self.print_bytes(Digits::new(number).as_bytes())
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction(instruction::clear())
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub fn home(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction(instruction::home())
    }

    pub fn set_entry_mode(
        &mut self,
        increment: bool,
        shift_display: bool,
    ) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction(instruction::entry_mode(increment, shift_display))
    }

    pub fn set_on_off(
        &mut self,
        on: bool,
        cursor: bool,
        blink: bool,
    ) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction(instruction::display_control(on, cursor, blink))
    }

    /// Scrolls the visible window one char. The write address is unchanged.
    pub fn set_screen_shift(&mut self, right: bool) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction_in(InstructionSet::Normal, instruction::shift(true, right))
    }

    /// Moves the cursor one char.
    pub fn set_cursor_shift(&mut self, right: bool) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction_in(InstructionSet::Normal, instruction::shift(false, right))
    }

    pub fn set_data_address(&mut self, addr: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        if addr > 0x7F {
            return Err(Error::AddressOutOfRange);
        }
        self.write_instruction(instruction::ddram_address(addr))
    }

    /// Set the cursor to (column, row). Coordinates are zero-based, the column is not checked
    /// against the panel width.
    pub fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let addr = cursor_address(self.lines, column, row)?;
        self.write_instruction(instruction::ddram_address(addr))
    }

    pub fn set_cgram_address(&mut self, addr: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        if addr > 0x3F {
            return Err(Error::AddressOutOfRange);
        }
        self.write_instruction_in(InstructionSet::Normal, instruction::cgram_address(addr))
    }

    /// Change the contrast, 0 to 63.
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.config.contrast = contrast & 0x3F;
        let Config {
            contrast,
            icon,
            booster,
            ..
        } = self.config;
        self.write_instruction_in(InstructionSet::Extended, instruction::contrast_low(contrast))?;
        self.write_instruction(instruction::power_icon_contrast(contrast, icon, booster))
    }

    /// Read the busy flag and address counter.
    pub fn status(&mut self) -> Result<Status, Error<I::Error>> {
        self.ensure_ready()?;
        let mut buf = [0u8; 1];
        self.i2c.read(ADDRESS, &mut buf).map_err(read_error)?;
        Ok(Status(buf[0]))
    }

    pub fn is_busy(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.status()?.is_busy())
    }

    pub fn address(&mut self) -> Result<u8, Error<I::Error>> {
        Ok(self.status()?.address())
    }

    fn ensure_ready(&self) -> Result<(), Error<I::Error>> {
        if self.state == State::Ready {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Switches the instruction table first if `op` is only defined in the other one.
    fn write_instruction_in(
        &mut self,
        set: InstructionSet,
        op: u8,
    ) -> Result<(), Error<I::Error>> {
        if self.instruction_set != set {
            self.write_instruction(instruction::function_set(set))?;
            self.instruction_set = set;
        }
        self.write_instruction(op)
    }

    fn write_instruction(&mut self, op: u8) -> Result<(), Error<I::Error>> {
        self.send(Register::Instruction, &[op])?;
        self.delay.delay_ms(1);
        Ok(())
    }

    /// One bus transaction: control byte, then the payload.
    fn send(&mut self, register: Register, payload: &[u8]) -> Result<(), Error<I::Error>> {
        let result = match payload {
            [byte] => self.i2c.write(ADDRESS, &[register as u8, *byte]),
            _ => self.i2c.transaction(
                ADDRESS,
                &mut [
                    Operation::Write(&[register as u8]),
                    Operation::Write(payload),
                ],
            ),
        };
        result.map_err(bus_error)
    }
}

impl<'a, I, D> uWrite for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = Error<I::Error>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_str(s)
    }
}

impl<'a, I, D> fmt::Write for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
