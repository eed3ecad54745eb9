//! Transport implementation over a host serial port.

use linkcart_protocol::{Transport, TransferError, BAUD_RATE};
use serialport::{ClearBuffer, SerialPort, SerialPortType};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Read timeout of the port itself. Reply waits are bounded separately.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial port connected to the cartridge.
///
/// Closing drops the port handle; later calls fail with `NotConnected`.
pub struct SerialLink {
    port: Option<Box<dyn SerialPort>>,
    name: String,
}

impl SerialLink {
    /// Open `name` at the cartridge's fixed baud rate
    pub fn open(name: &str) -> Result<Self, TransferError> {
        let port = serialport::new(name, BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| TransferError::Open {
                port: name.to_string(),
                source: e.into(),
            })?;
        log::info!("[SERIAL] Opened {} at {} baud", name, BAUD_RATE);
        Ok(SerialLink {
            port: Some(port),
            name: name.to_string(),
        })
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port closed"))
    }
}

impl Transport for SerialLink {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port()?.write_all(bytes)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.port()?.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.port()?.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn reset_input(&mut self) -> io::Result<()> {
        self.port()?.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn reset_output(&mut self) -> io::Result<()> {
        self.port()?.clear(ClearBuffer::Output).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port()?.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        if self.port.take().is_some() {
            log::info!("[SERIAL] Closed {}", self.name);
        }
        Ok(())
    }
}

/// Serial port found on the host
pub struct PortEntry {
    pub name: String,
    pub description: String,
}

/// Ports available on this machine, for `--list-ports`
pub fn list_ports() -> io::Result<Vec<PortEntry>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| PortEntry {
            description: describe(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB serial");
            format!("{} ({:04x}:{:04x})", product, usb.vid, usb.pid)
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => String::new(),
    }
}
