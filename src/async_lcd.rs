use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{I2c, Operation};

use crate::instruction::{self, Status};
use crate::{
    bus_error, cursor_address, read_error, Config, Digits, Error, InstructionSet, Lines, Register,
    State, ADDRESS,
};

/// API to write to the LCD.
///
/// The controller borrows the bus for its whole lifetime and is meant to be used from a single
/// task.
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
    pub async fn is_available(&mut self) -> bool {
        self.i2c.write(ADDRESS, &[]).await.is_ok()
    }

    /// Initializes the hardware.
    ///
    /// After reset the controller only accepts instructions once it received two function-set
    /// instructions, 10ms apart. The second one is followed by another 10ms wait before the
    /// remaining configuration is sent as one batch. On failure the controller is left
    /// uninitialized and `init` may be called again.
    pub async fn init(&mut self, lines: Lines) -> Result<(), Error<I::Error>> {
        self.state = State::Initializing;
        self.lines = lines;
        match self.power_on().await {
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

    async fn power_on(&mut self) -> Result<(), Error<I::Error>> {
        self.send(
            Register::Instruction,
            &[instruction::function_set(InstructionSet::Normal)],
        )
        .await?;
        self.delay.delay_ms(10).await;
        self.send(
            Register::Instruction,
            &[instruction::function_set(InstructionSet::Extended)],
        )
        .await?;
        self.delay.delay_ms(10).await;
        self.instruction_set = InstructionSet::Extended;

        let sequence = instruction::power_on_sequence(&self.config);
        self.send(Register::Instruction, &sequence).await?;
        self.delay.delay_ms(1).await;
        Ok(())
    }

    /// Write a single byte to DDRAM at the current address.
    pub async fn print(&mut self, byte: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.send(Register::Data, &[byte]).await
    }

    /// Write bytes in one transaction. The controller advances the address after each byte,
    /// nothing is wrapped or clamped to the line width.
    pub async fn print_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        if bytes.is_empty() {
            return Ok(());
        }
        self.send(Register::Data, bytes).await
    }

    /// Write string to display. Bytes are passed to the character ROM unchanged.
    pub async fn write_str(&mut self, data: &str) -> Result<(), Error<I::Error>> {
        self.print_bytes(data.as_bytes()).await
    }

    /// Write an integer in decimal.
    pub async fn print_number(&mut self, number: i32) -> Result<(), Error<I::Error>> {
        self.print_bytes(Digits::new(number).as_bytes()).await
    }

    /// Clear the display
    pub async fn clear(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction(instruction::clear()).await
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub async fn home(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction(instruction::home()).await
    }

    pub async fn set_entry_mode(
        &mut self,
        increment: bool,
        shift_display: bool,
    ) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction(instruction::entry_mode(increment, shift_display))
            .await
    }

    pub async fn set_on_off(
        &mut self,
        on: bool,
        cursor: bool,
        blink: bool,
    ) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction(instruction::display_control(on, cursor, blink))
            .await
    }

    /// Scrolls the visible window one char. The write address is unchanged.
    pub async fn set_screen_shift(&mut self, right: bool) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction_in(InstructionSet::Normal, instruction::shift(true, right))
            .await
    }

    /// Moves the cursor one char.
    pub async fn set_cursor_shift(&mut self, right: bool) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_instruction_in(InstructionSet::Normal, instruction::shift(false, right))
            .await
    }

    pub async fn set_data_address(&mut self, addr: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        if addr > 0x7F {
            return Err(Error::AddressOutOfRange);
        }
        self.write_instruction(instruction::ddram_address(addr)).await
    }

    /// Set the cursor to (column, row). Coordinates are zero-based, the column is not checked
    /// against the panel width.
    pub async fn set_cursor(&mut self, column: u8, row: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let addr = cursor_address(self.lines, column, row)?;
        self.write_instruction(instruction::ddram_address(addr)).await
    }

    pub async fn set_cgram_address(&mut self, addr: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        if addr > 0x3F {
            return Err(Error::AddressOutOfRange);
        }
        self.write_instruction_in(InstructionSet::Normal, instruction::cgram_address(addr))
            .await
    }

    /// Change the contrast, 0 to 63.
    pub async fn set_contrast(&mut self, contrast: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.config.contrast = contrast & 0x3F;
        let Config {
            contrast,
            icon,
            booster,
            ..
        } = self.config;
        self.write_instruction_in(InstructionSet::Extended, instruction::contrast_low(contrast))
            .await?;
        self.write_instruction(instruction::power_icon_contrast(contrast, icon, booster))
            .await
    }

    /// Read the busy flag and address counter.
    pub async fn status(&mut self) -> Result<Status, Error<I::Error>> {
        self.ensure_ready()?;
        let mut buf = [0u8; 1];
        self.i2c
            .read(ADDRESS, &mut buf)
            .await
            .map_err(read_error)?;
        Ok(Status(buf[0]))
    }

    pub async fn is_busy(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.status().await?.is_busy())
    }

    pub async fn address(&mut self) -> Result<u8, Error<I::Error>> {
        Ok(self.status().await?.address())
    }

    fn ensure_ready(&self) -> Result<(), Error<I::Error>> {
        if self.state == State::Ready {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Switches the instruction table first if `op` is only defined in the other one.
    async fn write_instruction_in(
        &mut self,
        set: InstructionSet,
        op: u8,
    ) -> Result<(), Error<I::Error>> {
        if self.instruction_set != set {
            self.write_instruction(instruction::function_set(set))
                .await?;
            self.instruction_set = set;
        }
        self.write_instruction(op).await
    }

    async fn write_instruction(&mut self, op: u8) -> Result<(), Error<I::Error>> {
        self.send(Register::Instruction, &[op]).await?;
        self.delay.delay_ms(1).await;
        Ok(())
    }

    /// One bus transaction: control byte, then the payload.
    async fn send(&mut self, register: Register, payload: &[u8]) -> Result<(), Error<I::Error>> {
        let result = match payload {
            [byte] => self.i2c.write(ADDRESS, &[register as u8, *byte]).await,
            _ => {
                self.i2c
                    .transaction(
                        ADDRESS,
                        &mut [
                            Operation::Write(&[register as u8]),
                            Operation::Write(payload),
                        ],
                    )
                    .await
            }
        };
        result.map_err(bus_error)
    }
}
