use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::config::FieldConfig;
use crate::field::ParticleField;
use crate::schedule::{FrameHandle, FrameScheduler};
use crate::surface::Surface;

/// Shared handle to a particle field driven by a [`FrameScheduler`].
///
/// The field sits behind a mutex, so pointer and resize events delivered from
/// another thread never interleave with a frame in progress.
pub struct ParticleFieldHandle<S> {
    field: Arc<Mutex<ParticleField<S>>>,
    scheduler: Arc<dyn FrameScheduler>,
    frame: Arc<Mutex<Option<FrameHandle>>>,
    /// While hidden: whether the field was started when it was hidden.
    hidden: Arc<Mutex<Option<bool>>>,
}

impl<S> Clone for ParticleFieldHandle<S> {
    fn clone(&self) -> Self {
        Self {
            field: Arc::clone(&self.field),
            scheduler: Arc::clone(&self.scheduler),
            frame: Arc::clone(&self.frame),
            hidden: Arc::clone(&self.hidden),
        }
    }
}

impl<S: Surface + Send + 'static> ParticleFieldHandle<S> {
    pub fn create(
        config: FieldConfig,
        surface: Option<S>,
        scheduler: Arc<dyn FrameScheduler>,
    ) -> Self {
        Self::from_field(ParticleField::new(config, surface), scheduler)
    }

    pub fn from_field(field: ParticleField<S>, scheduler: Arc<dyn FrameScheduler>) -> Self {
        Self {
            field: Arc::new(Mutex::new(field)),
            scheduler,
            frame: Arc::new(Mutex::new(None)),
            hidden: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts ticking once per refresh. Does nothing if already started.
    pub fn start(&self) {
        let mut frame = self.frame.lock();
        if frame.is_some() {
            return;
        }

        self.field.lock().start();
        let field = Arc::clone(&self.field);
        *frame = Some(self.scheduler.schedule(Arc::new(move || {
            field.lock().tick();
        })));
        log::info!("particle field started");
    }

    /// Cancels the frame callback. The field keeps its state and can be
    /// started again.
    pub fn stop(&self) {
        let mut frame = self.frame.lock();
        if let Some(handle) = frame.take() {
            self.scheduler.cancel(handle);
            log::info!("particle field stopped");
        }
        self.field.lock().stop();
    }

    pub fn is_started(&self) -> bool {
        self.frame.lock().is_some()
    }

    /// Follows the host's visibility. Hiding stops the field; showing it again
    /// restarts it only if it was started when it was hidden.
    pub fn set_visible(&self, visible: bool) {
        let mut hidden = self.hidden.lock();
        match (visible, *hidden) {
            (false, None) => {
                *hidden = Some(self.is_started());
                self.stop();
            }
            (true, Some(was_started)) => {
                *hidden = None;
                if was_started {
                    self.start();
                }
            }
            _ => {}
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.lock().is_some()
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.field.lock().resize(width, height);
    }

    pub fn set_pointer(&self, x: f32, y: f32) {
        self.field.lock().set_pointer(x, y);
    }

    /// Locks the field, e.g. to replay its surface after a frame.
    pub fn lock(&self) -> MutexGuard<'_, ParticleField<S>> {
        self.field.lock()
    }
}
