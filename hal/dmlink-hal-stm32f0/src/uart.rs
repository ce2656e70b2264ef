//! UART adapters for STM32F0
//!
//! Wraps anything speaking `embedded-io` (the embassy-stm32 buffered UART
//! halves in practice) so the link can use it through [`UartTx`] and
//! [`UartRx`].

use dmlink_hal::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
use embassy_stm32::usart;
use embassy_stm32::usart::Error as UsartError;
use embedded_io::{ErrorType, Read, ReadReady, Write};
use embedded_io_async::BufRead;

/// Error from UART operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartBusError {
    /// Framing error
    Framing,
    /// Noise error
    Noise,
    /// Overrun error
    Overrun,
    /// Parity error
    Parity,
    /// Buffer too small
    BufferTooSmall,
    /// Other error
    Other,
}

impl From<UsartError> for UartBusError {
    fn from(e: UsartError) -> Self {
        match e {
            UsartError::Framing => UartBusError::Framing,
            UsartError::Noise => UartBusError::Noise,
            UsartError::Overrun => UartBusError::Overrun,
            UsartError::Parity => UartBusError::Parity,
            UsartError::BufferTooLong => UartBusError::BufferTooSmall,
            _ => UartBusError::Other,
        }
    }
}

/// Build the embassy USART configuration for a link configuration
pub fn usart_config(config: &UartConfig) -> usart::Config {
    let mut out = usart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Seven => usart::DataBits::DataBits7,
        DataBits::Eight => usart::DataBits::DataBits8,
        DataBits::Nine => usart::DataBits::DataBits9,
    };
    out.parity = match config.parity {
        Parity::None => usart::Parity::ParityNone,
        Parity::Even => usart::Parity::ParityEven,
        Parity::Odd => usart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => usart::StopBits::STOP1,
        StopBits::Two => usart::StopBits::STOP2,
    };
    out
}

/// Blocking transmitter
pub struct SerialTx<W> {
    inner: W,
}

impl<W> SerialTx<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> UartTx for SerialTx<W>
where
    W: Write,
    UartBusError: From<<W as ErrorType>::Error>,
{
    type Error = UartBusError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let mut rest = data;
        while !rest.is_empty() {
            let n = self.inner.write(rest)?;
            if n == 0 {
                return Err(UartBusError::Other);
            }
            rest = &rest[n..];
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Non-blocking receiver
pub struct SerialRx<R> {
    inner: R,
}

impl<R> SerialRx<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R> SerialRx<R>
where
    R: BufRead,
    UartBusError: From<<R as ErrorType>::Error>,
{
    /// Wait until at least one byte is pending, without taking it
    pub async fn wait_ready(&mut self) -> Result<(), UartBusError> {
        self.inner.fill_buf().await?;
        Ok(())
    }
}

impl<R> UartRx for SerialRx<R>
where
    R: Read + ReadReady,
    UartBusError: From<<R as ErrorType>::Error>,
{
    type Error = UartBusError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() || !self.inner.read_ready()? {
            return Ok(0);
        }
        Ok(self.inner.read(buf)?)
    }
}
