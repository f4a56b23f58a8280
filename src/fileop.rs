//! File operation state.
//!
//! A `FileOp` travels through a load or save.  It carries the options,
//! collects the warnings raised by chunks that could not be decoded,
//! forwards progress to an optional callback, and exposes the stop
//! flag that is polled between frames.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool,Ordering};
use flate2::Compression;

use ::errcode::{AseError,ErrorKind};

/// Options for a load or save.
#[derive(Clone,Copy,Debug)]
pub struct FileOpOptions {
    /// Stop loading after the first frame.
    pub one_frame: bool,

    /// Deflate level for compressed cels.
    pub compression: Compression,
}

/// A recoverable problem met while loading or saving.
#[derive(Clone,Debug,Eq,PartialEq)]
pub struct Warning {
    pub kind: ErrorKind,
    pub message: String,
}

/// Transfer state for one load or save.
pub struct FileOp {
    options: FileOpOptions,
    warnings: Vec<Warning>,
    progress: f32,
    progress_fn: Option<Box<dyn FnMut(f32)>>,
    stop: Option<Arc<AtomicBool>>,
}

/*--------------------------------------------------------------*/

impl Default for FileOpOptions {
    fn default() -> Self {
        FileOpOptions {
            one_frame: false,
            compression: Compression::default(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl FileOp {
    /// Create a file operation with default options.
    pub fn new() -> Self {
        Self::with_options(FileOpOptions::default())
    }

    /// Create a file operation with explicit options.
    pub fn with_options(options: FileOpOptions) -> Self {
        FileOp {
            options: options,
            warnings: Vec::new(),
            progress: 0.0,
            progress_fn: None,
            stop: None,
        }
    }

    pub fn options(&self) -> &FileOpOptions {
        &self.options
    }

    /// Install a progress callback.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut fop = ase::FileOp::new();
    /// fop.set_progress_fn(|fraction| println!("{:.0}%", 100.0 * fraction));
    /// ```
    pub fn set_progress_fn<F>(&mut self, f: F)
            where F: FnMut(f32) + 'static {
        self.progress_fn = Some(Box::new(f));
    }

    /// Install a stop flag.  Setting it cancels the operation at the
    /// next frame boundary.
    pub fn set_stop_flag(&mut self, stop: Arc<AtomicBool>) {
        self.stop = Some(stop);
    }

    /// Returns true if the operation was asked to stop.
    pub fn is_stop(&self) -> bool {
        match self.stop {
            Some(ref stop) => stop.load(Ordering::Relaxed),
            None => false,
        }
    }

    /// Report progress as a fraction of the whole operation.
    ///
    /// The reported value never decreases.
    pub fn progress(&mut self, fraction: f32) {
        let fraction = fraction.max(0.0).min(1.0);
        if fraction <= self.progress {
            return;
        }

        self.progress = fraction;
        if let Some(ref mut f) = self.progress_fn {
            f(fraction);
        }
    }

    /// Last progress value reported.
    pub fn current_progress(&self) -> f32 {
        self.progress
    }

    /// Record a recoverable error.
    pub fn warning(&mut self, err: &AseError) {
        warn!("{}", err);
        self.warnings.push(Warning {
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

impl Default for FileOp {
    fn default() -> Self {
        FileOp::new()
    }
}
