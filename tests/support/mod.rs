//! Shared helpers for the integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use pdf_facade::{DocumentRenderer, Orientation, RendererInit, Result, Value, WriteMode};

/// A call received by [`RecordingRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Create(RendererInit),
    AddPage(Orientation),
    SetAuthor(String),
    Header {
        html: String,
        show_on_first_page: bool,
    },
    Footer(String),
    Write {
        html: String,
        mode: WriteMode,
    },
}

/// Renderer that records every call instead of producing a PDF.
///
/// Like the genpdf renderer, construction starts in portrait regardless of the requested
/// orientation. Output is a textual dump of the recorded calls.
#[derive(Debug)]
pub struct RecordingRenderer {
    pub calls: Vec<Call>,
    orientation: Orientation,
    pages: usize,
}

impl RecordingRenderer {
    /// `(html, mode)` of every write, in order.
    pub fn writes(&self) -> Vec<(String, WriteMode)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Write { html, mode } => Some((html.clone(), *mode)),
                _ => None,
            })
            .collect()
    }

    /// Every header installation, in order.
    pub fn headers(&self) -> Vec<(String, bool)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Header {
                    html,
                    show_on_first_page,
                } => Some((html.clone(), *show_on_first_page)),
                _ => None,
            })
            .collect()
    }

    fn dump(&self) -> Vec<u8> {
        self.calls
            .iter()
            .map(|call| format!("{:?}\n", call))
            .collect::<String>()
            .into_bytes()
    }
}

impl DocumentRenderer for RecordingRenderer {
    fn create(init: &RendererInit) -> Result<Self> {
        Ok(Self {
            calls: vec![Call::Create(init.clone())],
            orientation: Orientation::Portrait,
            pages: 0,
        })
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn add_page(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.pages += 1;
        self.calls.push(Call::AddPage(orientation));
    }

    fn set_author(&mut self, author: &str) {
        self.calls.push(Call::SetAuthor(author.to_owned()));
    }

    fn set_html_header(&mut self, html: &str, show_on_first_page: bool) {
        self.calls.push(Call::Header {
            html: html.to_owned(),
            show_on_first_page,
        });
    }

    fn set_html_footer(&mut self, html: &str) {
        self.calls.push(Call::Footer(html.to_owned()));
    }

    fn write_html(&mut self, html: &str, mode: WriteMode) -> Result<()> {
        self.calls.push(Call::Write {
            html: html.to_owned(),
            mode,
        });
        Ok(())
    }

    fn page_count(&mut self) -> Result<usize> {
        Ok(self.pages)
    }

    fn output_to_file(&mut self, path: &Path) -> Result<()> {
        fs::write(path, self.dump())?;
        Ok(())
    }

    fn output_bytes(&mut self) -> Result<Vec<u8>> {
        Ok(self.dump())
    }

    fn invoke(&mut self, operation: &str, args: &[Value]) -> Result<Value> {
        match operation {
            "page_count" => Ok(Value::from(self.page_count()?)),
            "echo" => Ok(args.first().cloned().unwrap_or_default()),
            _ => Err(pdf_facade::FacadeError::UnknownOperation(
                operation.to_owned(),
            )),
        }
    }
}

/// A file in the temporary directory, removed on drop.
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn with_contents(name: &str, contents: &str) -> Self {
        let file = Self::reserve(name);
        fs::write(&file.path, contents).expect("write temp file");
        file
    }

    /// A unique path that does not exist yet.
    pub fn reserve(name: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "pdf_facade_{}_{}_{}",
            std::process::id(),
            unique,
            name
        ));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
