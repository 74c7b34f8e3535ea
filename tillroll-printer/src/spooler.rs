//! Silent print job submission
//!
//! Hands bytes or a file to the OS print subsystem without any user-facing
//! dialog: the Win32 RAW spooler on Windows, `lp` on Unix-likes. Failure
//! reasons come back as strings from the underlying subsystem.

use crate::error::{PrintError, PrintResult};
use std::path::Path;
use tracing::{info, instrument};

/// Parameters for one spooler submission
#[derive(Debug, Clone)]
pub struct SpoolJob<'a> {
    /// Target printer; `None` submits to the system default
    pub printer: Option<&'a str>,
    /// Document name shown in the print queue
    pub doc_name: &'a str,
    /// Number of copies, at least 1
    pub copies: u32,
}

impl<'a> SpoolJob<'a> {
    pub fn new(printer: Option<&'a str>, doc_name: &'a str, copies: u32) -> Self {
        Self {
            printer,
            doc_name,
            copies: copies.max(1),
        }
    }
}

/// Submit in-memory bytes to the spooler
#[instrument(skip(data), fields(printer = ?job.printer, bytes = data.len(), copies = job.copies))]
pub async fn submit_bytes(job: &SpoolJob<'_>, data: &[u8]) -> PrintResult<()> {
    platform::submit_bytes(job, data).await?;
    info!("print job accepted by spooler");
    Ok(())
}

/// Submit a file (typically a PDF) to the spooler
#[instrument(fields(printer = ?job.printer, path = %path.display(), copies = job.copies))]
pub async fn submit_path(job: &SpoolJob<'_>, path: &Path) -> PrintResult<()> {
    platform::submit_path(job, path).await?;
    info!("print job accepted by spooler");
    Ok(())
}

#[cfg(windows)]
mod platform {
    use super::*;

    pub(super) async fn submit_bytes(job: &SpoolJob<'_>, data: &[u8]) -> PrintResult<()> {
        let printer = job.printer.map(str::to_owned);
        let doc_name = job.doc_name.to_owned();
        let copies = job.copies;
        let data = data.to_vec();

        // Spooler calls are synchronous, run in a blocking task
        tokio::task::spawn_blocking(move || {
            let name = match printer {
                Some(name) => name,
                None => default_printer_name()?,
            };
            for _ in 0..copies {
                write_raw(&name, &doc_name, &data)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| PrintError::Spooler(format!("task join failed: {}", e)))?
    }

    pub(super) async fn submit_path(job: &SpoolJob<'_>, path: &Path) -> PrintResult<()> {
        let data = tokio::fs::read(path).await?;
        submit_bytes(job, &data).await
    }

    fn default_printer_name() -> PrintResult<String> {
        use windows::Win32::Graphics::Printing::GetDefaultPrinterW;
        use windows::core::PWSTR;

        unsafe {
            let mut needed: u32 = 0;
            let _ = GetDefaultPrinterW(None, &mut needed);
            if needed == 0 {
                return Err(PrintError::Spooler("no default printer".to_string()));
            }

            let mut buf: Vec<u16> = vec![0; needed as usize];
            if !GetDefaultPrinterW(Some(PWSTR(buf.as_mut_ptr())), &mut needed).as_bool() {
                return Err(PrintError::Spooler("no default printer".to_string()));
            }

            PWSTR(buf.as_mut_ptr())
                .to_string()
                .map_err(|e| PrintError::Spooler(format!("UTF-16 decode failed: {}", e)))
        }
    }

    fn write_raw(printer: &str, doc_name: &str, data: &[u8]) -> PrintResult<()> {
        use core::ffi::c_void;
        use windows::Win32::Graphics::Printing::{
            ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW, PRINTER_HANDLE,
            StartDocPrinterW, StartPagePrinter, WritePrinter,
        };
        use windows::core::{PCWSTR, PWSTR};

        fn to_wide(s: &str) -> Vec<u16> {
            s.encode_utf16().chain(std::iter::once(0)).collect()
        }

        unsafe {
            let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
            let name_w = to_wide(printer);

            OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
                .map_err(|_| PrintError::Spooler(format!("OpenPrinterW failed: {}", printer)))?;

            let doc_name_w = to_wide(doc_name);
            let datatype_w = to_wide("RAW");
            let doc_info = DOC_INFO_1W {
                pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                pOutputFile: PWSTR::null(),
                pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
            };

            if StartDocPrinterW(handle, 1, &doc_info as *const DOC_INFO_1W) == 0 {
                let _ = ClosePrinter(handle);
                return Err(PrintError::Spooler("StartDocPrinter failed".to_string()));
            }

            if !StartPagePrinter(handle).as_bool() {
                let _ = EndDocPrinter(handle);
                let _ = ClosePrinter(handle);
                return Err(PrintError::Spooler("StartPagePrinter failed".to_string()));
            }

            let mut written: u32 = 0;
            let ok = WritePrinter(
                handle,
                data.as_ptr() as *const c_void,
                data.len() as u32,
                &mut written,
            );

            let _ = EndPagePrinter(handle);
            let _ = EndDocPrinter(handle);
            let _ = ClosePrinter(handle);

            if !ok.as_bool() {
                return Err(PrintError::Spooler("WritePrinter failed".to_string()));
            }

            if written != data.len() as u32 {
                return Err(PrintError::Spooler("incomplete write".to_string()));
            }

            Ok(())
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use super::*;
    use std::process::Stdio;
    use tokio::io::AsyncWriteExt;
    use tokio::process::Command;

    fn lp_command(job: &SpoolJob<'_>) -> Command {
        let mut cmd = Command::new("lp");
        if let Some(printer) = job.printer {
            cmd.arg("-d").arg(printer);
        }
        if job.copies > 1 {
            cmd.arg("-n").arg(job.copies.to_string());
        }
        cmd.arg("-t").arg(job.doc_name);
        cmd
    }

    fn check_output(output: std::process::Output) -> PrintResult<()> {
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(PrintError::Spooler(format!(
            "lp exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }

    pub(super) async fn submit_bytes(job: &SpoolJob<'_>, data: &[u8]) -> PrintResult<()> {
        let mut child = lp_command(job)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PrintError::Spooler(format!("lp spawn failed: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(data).await?;
            stdin.shutdown().await?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PrintError::Spooler(format!("lp wait failed: {}", e)))?;
        check_output(output)
    }

    pub(super) async fn submit_path(job: &SpoolJob<'_>, path: &Path) -> PrintResult<()> {
        let output = lp_command(job)
            .arg("--")
            .arg(path)
            .output()
            .await
            .map_err(|e| PrintError::Spooler(format!("lp spawn failed: {}", e)))?;
        check_output(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_clamped_to_one() {
        let job = SpoolJob::new(None, "receipt", 0);
        assert_eq!(job.copies, 1);
    }

    #[test]
    fn test_job_carries_printer() {
        let job = SpoolJob::new(Some("POS-58"), "receipt", 2);
        assert_eq!(job.printer, Some("POS-58"));
        assert_eq!(job.copies, 2);
    }
}
