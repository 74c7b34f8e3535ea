//! Printer discovery strategies
//!
//! Two mechanisms, tried in order by [`crate::PrinterResolver`]:
//! - [`NativeEnumeration`]: the platform print API (Win32 spooler)
//! - [`ShellEnumeration`]: `Get-Printer` via PowerShell on Windows,
//!   `lpstat` on Unix-likes
//!
//! Parsing is kept in pure functions so it can be tested without spawning
//! a shell. A parse failure yields an empty list, never an error: the
//! caller must always receive a usable (if unresolved) printer name.

use crate::descriptor::{PrinterDescriptor, PrinterStatus};
use crate::error::{PrintError, PrintResult};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// A single printer discovery mechanism
#[async_trait]
pub trait PrinterEnumeration: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Enumerate printers visible to this mechanism
    ///
    /// An empty list is a valid answer. Errors signal that the mechanism
    /// itself is unavailable, so the caller can move to the next strategy.
    async fn enumerate(&self) -> PrintResult<Vec<PrinterDescriptor>>;
}

// === Native enumeration (platform print API) ===

/// Enumeration through the native platform print API
///
/// Only the Win32 spooler exposes a direct enumeration call; on other
/// platforms this strategy reports itself unavailable and the shell
/// strategy takes over.
#[derive(Debug, Default)]
pub struct NativeEnumeration;

#[async_trait]
impl PrinterEnumeration for NativeEnumeration {
    fn name(&self) -> &'static str {
        "native"
    }

    #[cfg(windows)]
    async fn enumerate(&self) -> PrintResult<Vec<PrinterDescriptor>> {
        // Win32 calls are synchronous, run in a blocking task
        tokio::task::spawn_blocking(win32::list_printers)
            .await
            .map_err(|e| PrintError::Enumeration(format!("task join failed: {}", e)))?
    }

    #[cfg(not(windows))]
    async fn enumerate(&self) -> PrintResult<Vec<PrinterDescriptor>> {
        Err(PrintError::Enumeration(
            "native printer enumeration not available on this platform".to_string(),
        ))
    }
}

#[cfg(windows)]
mod win32 {
    use super::*;
    use windows::Win32::Graphics::Printing::{
        EnumPrintersW, GetDefaultPrinterW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL,
        PRINTER_INFO_5W,
    };
    use windows::core::PWSTR;

    /// List installed printers, filtering out virtual devices
    pub(super) fn list_printers() -> PrintResult<Vec<PrinterDescriptor>> {
        let default_name = default_printer()?;

        unsafe {
            let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
            let mut needed: u32 = 0;
            let mut returned: u32 = 0;

            let _ = EnumPrintersW(flags, None, 5, None, &mut needed, &mut returned);

            if needed == 0 {
                return Ok(Vec::new());
            }

            let mut buf: Vec<u8> = vec![0; needed as usize];
            EnumPrintersW(
                flags,
                None,
                5,
                Some(buf.as_mut_slice()),
                &mut needed,
                &mut returned,
            )
            .map_err(|_| PrintError::Enumeration("EnumPrintersW failed".to_string()))?;

            let ptr = buf.as_ptr() as *const PRINTER_INFO_5W;
            let slice = std::slice::from_raw_parts(ptr, returned as usize);

            let mut result: Vec<PrinterDescriptor> = Vec::new();
            for info in slice.iter() {
                if info.pPrinterName.is_null() {
                    continue;
                }
                let name = PWSTR(info.pPrinterName.0).to_string().unwrap_or_default();

                let port = if info.pPortName.is_null() {
                    String::new()
                } else {
                    PWSTR(info.pPortName.0).to_string().unwrap_or_default()
                };

                if is_virtual_port(&port) {
                    continue;
                }

                let mut descriptor = PrinterDescriptor::new(&name)
                    .with_status(PrinterStatus::Unknown)
                    .with_description(port);
                if default_name.as_deref() == Some(name.as_str()) {
                    descriptor = descriptor.as_default();
                }
                result.push(descriptor);
            }

            Ok(result)
        }
    }

    /// Check if a port belongs to a virtual printer (PDF/XPS/OneNote)
    fn is_virtual_port(port: &str) -> bool {
        let p = port.to_lowercase();
        p == "file:"
            || p == "portprompt:"
            || p == "xpsport:"
            || p.starts_with("onenote")
            || p == "nul:"
            || p.starts_with("wfsport:")
    }

    /// Get the default printer name
    fn default_printer() -> PrintResult<Option<String>> {
        unsafe {
            let mut needed: u32 = 0;
            let _ = GetDefaultPrinterW(None, &mut needed);

            if needed == 0 {
                return Ok(None);
            }

            let mut buf: Vec<u16> = vec![0; needed as usize];
            let ok = GetDefaultPrinterW(Some(PWSTR(buf.as_mut_ptr())), &mut needed);

            if !ok.as_bool() {
                return Ok(None);
            }

            let name = PWSTR(buf.as_mut_ptr())
                .to_string()
                .map_err(|e| PrintError::Enumeration(format!("UTF-16 decode failed: {}", e)))?;

            Ok(Some(name))
        }
    }
}

// === Shell enumeration (OS command fallback) ===

/// Enumeration through an OS shell command
///
/// Used when the native API is unavailable or returned nothing:
/// PowerShell `Get-Printer` on Windows, `lpstat -p` / `lpstat -d` on
/// Unix-likes.
#[derive(Debug, Default)]
pub struct ShellEnumeration;

#[async_trait]
impl PrinterEnumeration for ShellEnumeration {
    fn name(&self) -> &'static str {
        "shell"
    }

    #[instrument(skip(self))]
    async fn enumerate(&self) -> PrintResult<Vec<PrinterDescriptor>> {
        shell::enumerate().await
    }
}

#[cfg(windows)]
mod shell {
    use super::*;
    use tokio::process::Command;

    pub(super) async fn enumerate() -> PrintResult<Vec<PrinterDescriptor>> {
        let output = Command::new("powershell")
            .args([
                "-NoProfile",
                "-NonInteractive",
                "-Command",
                "Get-Printer | Select-Object Name,PrinterStatus,Comment | ConvertTo-Json",
            ])
            .output()
            .await
            .map_err(|e| PrintError::Enumeration(format!("powershell spawn failed: {}", e)))?;

        if !output.status.success() {
            warn!(status = %output.status, "Get-Printer exited with failure");
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(bytes = stdout.len(), "Get-Printer output captured");
        Ok(parse_get_printer_json(&stdout))
    }
}

#[cfg(not(windows))]
mod shell {
    use super::*;
    use tokio::process::Command;

    pub(super) async fn enumerate() -> PrintResult<Vec<PrinterDescriptor>> {
        let printers = Command::new("lpstat")
            .arg("-p")
            .output()
            .await
            .map_err(|e| PrintError::Enumeration(format!("lpstat spawn failed: {}", e)))?;

        if !printers.status.success() {
            // lpstat exits non-zero when no destinations exist; that is an
            // empty answer, not a failure of the mechanism
            debug!(status = %printers.status, "lpstat -p exited non-zero");
            return Ok(Vec::new());
        }

        // Default destination is a separate query; its failure is ignorable
        let default = Command::new("lpstat").arg("-d").output().await;
        let default_out = match &default {
            Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).into_owned(),
            _ => String::new(),
        };

        let printers_out = String::from_utf8_lossy(&printers.stdout);
        Ok(parse_lpstat(&printers_out, &default_out))
    }
}

// === Pure parsers ===

/// Parse PowerShell `Get-Printer | ConvertTo-Json` output
///
/// ConvertTo-Json emits a bare object for a single printer and an array
/// otherwise; both forms are accepted. Anything unparseable yields an
/// empty list.
pub fn parse_get_printer_json(json: &str) -> Vec<PrinterDescriptor> {
    let value: serde_json::Value = match serde_json::from_str(json.trim()) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Get-Printer output was not valid JSON");
            return Vec::new();
        }
    };

    let entries: Vec<&serde_json::Value> = match &value {
        serde_json::Value::Array(items) => items.iter().collect(),
        serde_json::Value::Object(_) => vec![&value],
        _ => return Vec::new(),
    };

    let mut result = Vec::new();
    for entry in entries {
        let Some(name) = entry.get("Name").and_then(|n| n.as_str()) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let status = match entry.get("PrinterStatus") {
            // WMI PrinterStatus: 3 = idle, 7 = offline
            Some(serde_json::Value::Number(n)) => match n.as_i64() {
                Some(3) => PrinterStatus::Idle,
                Some(7) => PrinterStatus::Offline,
                _ => PrinterStatus::Unknown,
            },
            Some(serde_json::Value::String(s)) => match s.as_str() {
                "Normal" | "Idle" => PrinterStatus::Idle,
                "Offline" => PrinterStatus::Offline,
                _ => PrinterStatus::Unknown,
            },
            _ => PrinterStatus::Unknown,
        };

        let mut descriptor = PrinterDescriptor::new(name).with_status(status);
        if let Some(comment) = entry.get("Comment").and_then(|c| c.as_str())
            && !comment.is_empty()
        {
            descriptor = descriptor.with_description(comment);
        }
        result.push(descriptor);
    }

    // No default marker in Get-Printer output: treat the first entry as
    // the default
    if let Some(first) = result.first_mut() {
        first.is_default = true;
    }

    result
}

/// Parse `lpstat -p` plus `lpstat -d` output
///
/// `lpstat -p` lines look like:
/// `printer POS-58 is idle.  enabled since Mon 03 Aug 2026 ...`
/// `printer Kitchen disabled since ...`
///
/// `lpstat -d` looks like `system default destination: POS-58`.
pub fn parse_lpstat(printers_out: &str, default_out: &str) -> Vec<PrinterDescriptor> {
    let default_name = default_out
        .lines()
        .find_map(|line| line.split_once(':').map(|(_, name)| name.trim()))
        .filter(|name| !name.is_empty());

    let mut result = Vec::new();
    for line in printers_out.lines() {
        let Some(rest) = line.strip_prefix("printer ") else {
            continue;
        };
        let Some(name) = rest.split_whitespace().next() else {
            continue;
        };

        let status = if rest.contains("is idle") {
            PrinterStatus::Idle
        } else if rest.contains("disabled") {
            PrinterStatus::Offline
        } else {
            PrinterStatus::Unknown
        };

        let mut descriptor = PrinterDescriptor::new(name).with_status(status);
        if default_name == Some(name) {
            descriptor = descriptor.as_default();
        }
        result.push(descriptor);
    }

    // First entry is the default unless lpstat -d named one
    if default_name.is_none()
        && let Some(first) = result.first_mut()
    {
        first.is_default = true;
    }

    result
}
