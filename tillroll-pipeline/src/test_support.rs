//! Scripted surface mocks shared by the unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tillroll_printer::surface::{
    RenderSurface, SurfaceContent, SurfaceFactory, SurfacePrintOptions,
};
use tillroll_printer::{PrintError, PrintResult};

/// How one scripted surface behaves
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceBehavior {
    /// Load never signals completion (executor must force the print)
    pub hang_on_load: bool,
    pub fail_load: Option<&'static str>,
    pub fail_print: Option<&'static str>,
    pub fail_export: Option<&'static str>,
}

/// Record of one print call made against a mock surface
#[derive(Debug, Clone)]
pub struct RecordedPrint {
    pub printer: Option<String>,
    pub copies: u32,
    pub content_was_pdf: bool,
}

pub struct MockSurface {
    behavior: SurfaceBehavior,
    content: Option<SurfaceContent>,
    closed: bool,
    closes: Arc<AtomicUsize>,
    prints: Arc<Mutex<Vec<RecordedPrint>>>,
}

#[async_trait]
impl RenderSurface for MockSurface {
    async fn load(&mut self, content: SurfaceContent) -> PrintResult<()> {
        assert!(!self.closed, "load called on a closed surface");
        self.content = Some(content);
        if self.behavior.hang_on_load {
            std::future::pending::<()>().await;
        }
        if let Some(reason) = self.behavior.fail_load {
            return Err(PrintError::InvalidConfig(reason.to_string()));
        }
        Ok(())
    }

    async fn print(&mut self, options: &SurfacePrintOptions) -> PrintResult<()> {
        assert!(!self.closed, "print called on a closed surface");
        self.prints.lock().unwrap().push(RecordedPrint {
            printer: options.printer.clone(),
            copies: options.copies,
            content_was_pdf: matches!(self.content, Some(SurfaceContent::PdfFile(_))),
        });
        if let Some(reason) = self.behavior.fail_print {
            return Err(PrintError::Spooler(reason.to_string()));
        }
        Ok(())
    }

    async fn export_pdf(&mut self) -> PrintResult<Vec<u8>> {
        assert!(!self.closed, "export called on a closed surface");
        if let Some(reason) = self.behavior.fail_export {
            return Err(PrintError::Pdf(reason.to_string()));
        }
        Ok(b"%PDF-1.7 mock".to_vec())
    }

    async fn close(&mut self) {
        assert!(!self.closed, "surface closed twice");
        self.closed = true;
        self.content = None;
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for MockSurface {
    fn drop(&mut self) {
        // A surface dropped without close() is exactly the leak the
        // executor must prevent
        if !self.closed && !std::thread::panicking() {
            panic!("MockSurface dropped without being closed");
        }
    }
}

/// Factory handing out scripted surfaces in order
///
/// When the script runs dry, further surfaces default to succeeding.
pub struct MockFactory {
    script: Mutex<VecDeque<SurfaceBehavior>>,
    fail_creation: bool,
    created: AtomicUsize,
    closes: Arc<AtomicUsize>,
    prints: Arc<Mutex<Vec<RecordedPrint>>>,
}

impl MockFactory {
    pub fn with_behaviors(behaviors: Vec<SurfaceBehavior>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(behaviors.into()),
            fail_creation: false,
            created: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            prints: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn failing_creation() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fail_creation: true,
            created: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            prints: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn prints(&self) -> Vec<RecordedPrint> {
        self.prints.lock().unwrap().clone()
    }
}

#[async_trait]
impl SurfaceFactory for MockFactory {
    async fn create(&self) -> PrintResult<Box<dyn RenderSurface>> {
        if self.fail_creation {
            return Err(PrintError::InvalidConfig(
                "no rendering backend available".to_string(),
            ));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Ok(Box::new(MockSurface {
            behavior,
            content: None,
            closed: false,
            closes: self.closes.clone(),
            prints: self.prints.clone(),
        }))
    }
}
