//! Asynchronous resource loading.
//!
//! A [`ResourceRequest`] is a two-state handle: pending until its paired
//! [`Resolver`] completes it with an image or a [`ResourceError`]. Render
//! objects that carry a request are excluded from drawing and hit-testing
//! until it resolves successfully, so a partially loaded object is never
//! painted.

#[cfg(test)]
#[path = "resource_test.rs"]
mod resource_test;

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::error::ResourceError;

/// Decoded RGBA8 image, row-major.
pub type Image = image::RgbaImage;

/// Current state of a [`ResourceRequest`].
#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Ready(Rc<Image>),
    Failed(ResourceError),
}

type CompletionCallback = Box<dyn FnOnce(&Result<Rc<Image>, ResourceError>)>;

struct Slot {
    url: String,
    state: LoadState,
    callbacks: Vec<CompletionCallback>,
}

/// Shared handle to an in-flight or completed load.
///
/// Cloning shares the same slot.
#[derive(Clone)]
pub struct ResourceRequest {
    slot: Rc<RefCell<Slot>>,
}

impl fmt::Debug for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("ResourceRequest").field("url", &slot.url).field("state", &slot.state).finish()
    }
}

/// Completes the paired request exactly once.
pub struct Resolver {
    slot: Rc<RefCell<Slot>>,
}

impl ResourceRequest {
    /// Create a pending request and its resolver.
    #[must_use]
    pub fn pending(url: impl Into<String>) -> (Self, Resolver) {
        let slot = Rc::new(RefCell::new(Slot { url: url.into(), state: LoadState::Pending, callbacks: Vec::new() }));
        (Self { slot: Rc::clone(&slot) }, Resolver { slot })
    }

    /// A request that is already complete.
    #[must_use]
    pub fn ready(url: impl Into<String>, image: Image) -> Self {
        let (request, resolver) = Self::pending(url);
        resolver.resolve(Ok(image));
        request
    }

    /// A request that already failed.
    #[must_use]
    pub fn failed(url: impl Into<String>, error: ResourceError) -> Self {
        let (request, resolver) = Self::pending(url);
        resolver.resolve(Err(error));
        request
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.slot.borrow().url.clone()
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.slot.borrow().state.clone()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.slot.borrow().state, LoadState::Pending)
    }

    /// The image, if loaded.
    #[must_use]
    pub fn image(&self) -> Option<Rc<Image>> {
        match &self.slot.borrow().state {
            LoadState::Ready(img) => Some(Rc::clone(img)),
            _ => None,
        }
    }

    /// The result once complete, `None` while pending.
    #[must_use]
    pub fn result(&self) -> Option<Result<Rc<Image>, ResourceError>> {
        match &self.slot.borrow().state {
            LoadState::Pending => None,
            LoadState::Ready(img) => Some(Ok(Rc::clone(img))),
            LoadState::Failed(e) => Some(Err(e.clone())),
        }
    }

    /// Run `callback` on completion, or immediately if already complete.
    pub fn on_complete(&self, callback: impl FnOnce(&Result<Rc<Image>, ResourceError>) + 'static) {
        match self.result() {
            Some(result) => callback(&result),
            None => self.slot.borrow_mut().callbacks.push(Box::new(callback)),
        }
    }
}

impl Resolver {
    /// Complete the request and run its callbacks.
    ///
    /// Consumes the resolver, so a request completes at most once.
    pub fn resolve(self, result: Result<Image, ResourceError>) {
        let result = result.map(Rc::new);
        let callbacks = {
            let mut slot = self.slot.borrow_mut();
            slot.state = match &result {
                Ok(img) => LoadState::Ready(Rc::clone(img)),
                Err(e) => {
                    tracing::warn!(url = %slot.url, error = %e, "resource load failed");
                    LoadState::Failed(e.clone())
                }
            };
            std::mem::take(&mut slot.callbacks)
        };
        for cb in callbacks {
            cb(&result);
        }
    }
}

/// Source of resource requests.
pub trait ResourceLoader {
    fn load(&self, url: &str) -> ResourceRequest;
}

/// Loads PNG images from the local filesystem.
///
/// Decoding is synchronous, so the returned request is already complete.
#[derive(Debug, Clone, Default)]
pub struct FileLoader;

impl ResourceLoader for FileLoader {
    fn load(&self, url: &str) -> ResourceRequest {
        match decode_file(Path::new(url)) {
            Ok(image) => ResourceRequest::ready(url, image),
            Err(e) => ResourceRequest::failed(url, e),
        }
    }
}

fn decode_file(path: &Path) -> Result<Image, ResourceError> {
    let url = path.display().to_string();
    if !path.exists() {
        return Err(ResourceError::NotFound { url });
    }
    let decoded = image::open(path).map_err(|e| ResourceError::Unreadable { url, reason: e.to_string() })?;
    Ok(decoded.into_rgba8())
}
