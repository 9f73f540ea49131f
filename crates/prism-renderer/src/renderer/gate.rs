//! Thread-safety gate around a [`Renderer`]

use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::lock_api::ArcMutexGuard;

use crate::device::RenderDevice;
use crate::error::RenderError;
use crate::frame::RenderData;
use crate::picking::PickingQuery;
use crate::scene::Scene;

use super::Renderer;

/// Shared handle serialising every access to one renderer.
///
/// Each method holds the lock for its own duration only. The compositor
/// window uses [`RenderGate::begin_compose`] instead, which keeps the lock
/// until the returned guard drops. Calling the gate from the thread that holds
/// a [`ComposeGuard`] deadlocks.
pub struct RenderGate<D: RenderDevice> {
    inner: Arc<Mutex<Renderer<D>>>,
}

impl<D: RenderDevice> Clone for RenderGate<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Lock held across the compositor window.
pub struct ComposeGuard<D: RenderDevice> {
    guard: ArcMutexGuard<parking_lot::RawMutex, Renderer<D>>,
}

impl<D: RenderDevice> std::ops::Deref for ComposeGuard<D> {
    type Target = Renderer<D>;

    fn deref(&self) -> &Renderer<D> {
        &self.guard
    }
}

impl<D: RenderDevice> std::ops::DerefMut for ComposeGuard<D> {
    fn deref_mut(&mut self) -> &mut Renderer<D> {
        &mut self.guard
    }
}

impl<D: RenderDevice> RenderGate<D> {
    /// Take ownership of `renderer`.
    pub fn new(renderer: Renderer<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(renderer)),
        }
    }

    /// Render one frame.
    pub fn render(&self, scene: &mut Scene, data: &RenderData) -> Result<(), RenderError> {
        self.inner.lock().render(scene, data)
    }

    /// Resize the viewport.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), RenderError> {
        self.inner.lock().resize(width, height)
    }

    /// Reload shaders.
    pub fn reload_shaders(&self) -> Result<(), RenderError> {
        self.inner.lock().reload_shaders()
    }

    /// Select the composited texture.
    pub fn display_texture(&self, name: &str) -> Result<(), RenderError> {
        self.inner.lock().display_texture(name)
    }

    /// Queue a picking query for the next frame.
    pub fn add_picking_request(&self, query: PickingQuery) {
        self.inner.lock().add_picking_request(query);
    }

    /// Run `f` with the renderer locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Renderer<D>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Run `f` only if the renderer is not locked elsewhere.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut Renderer<D>) -> R) -> Option<R> {
        self.inner.try_lock().map(|mut renderer| f(&mut renderer))
    }

    /// Lock the renderer until the returned guard drops.
    pub fn begin_compose(&self) -> ComposeGuard<D> {
        ComposeGuard {
            guard: self.inner.lock_arc(),
        }
    }

    /// True while some thread holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Renderer name.
    pub fn name(&self) -> String {
        self.inner.lock().name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    use glam::Vec2;
    use prism_core::MouseButton;

    use super::*;
    use crate::config::RendererConfig;
    use crate::device::{SoftwareDevice, TextureId};
    use crate::picking::PickingMode;
    use crate::strategy::{ForwardStrategy, FrameContext, RenderStrategy};
    use crate::textures::TextureRegistry;

    /// Forward strategy that flags overlapping main passes.
    struct Exclusive {
        inner: ForwardStrategy,
        inside: Arc<AtomicBool>,
        overlaps: Arc<AtomicUsize>,
    }

    impl RenderStrategy for Exclusive {
        fn name(&self) -> &str {
            "exclusive"
        }

        fn initialize(
            &mut self,
            device: &mut dyn RenderDevice,
            textures: &mut TextureRegistry,
        ) -> Result<(), RenderError> {
            self.inner.initialize(device, textures)
        }

        fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
            if self.inside.swap(true, Ordering::SeqCst) {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            thread::yield_now();
            let result = self.inner.render(ctx);
            self.inside.store(false, Ordering::SeqCst);
            result
        }

        fn post_process(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
            self.inner.post_process(ctx)
        }

        fn debug(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
            self.inner.debug(ctx)
        }

        fn ui(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), RenderError> {
            self.inner.ui(ctx)
        }

        fn output(&self) -> Option<TextureId> {
            self.inner.output()
        }
    }

    fn gate() -> (RenderGate<SoftwareDevice>, Arc<AtomicUsize>) {
        let overlaps = Arc::new(AtomicUsize::new(0));
        let strategy = Exclusive {
            inner: ForwardStrategy::new(),
            inside: Arc::new(AtomicBool::new(false)),
            overlaps: overlaps.clone(),
        };
        let renderer = Renderer::new(
            "gated",
            SoftwareDevice::new(16, 16),
            Box::new(strategy),
            RendererConfig::default(),
        )
        .unwrap();
        (RenderGate::new(renderer), overlaps)
    }

    #[test]
    fn test_concurrent_access_is_serialised() {
        let (gate, overlaps) = gate();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let gate = gate.clone();
                thread::spawn(move || {
                    let mut scene = Scene::new();
                    let data = RenderData::default();
                    for frame in 0..25 {
                        gate.add_picking_request(PickingQuery::new(
                            Vec2::new(8.0, 8.0),
                            MouseButton::Left,
                            PickingMode::Ro,
                        ));
                        gate.render(&mut scene, &data).unwrap();
                        if (i + frame) % 5 == 0 {
                            gate.resize(16, 16).unwrap();
                        }
                        gate.with(|r| {
                            assert_eq!(r.picking_queries().len(), r.picking_results().len())
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert_eq!(gate.with(|r| r.frame_count()), 100);
    }

    #[test]
    fn test_compose_guard_holds_lock() {
        let (gate, _) = gate();
        {
            let mut guard = gate.begin_compose();
            assert!(gate.is_locked());
            assert!(gate.try_with(|_| ()).is_none());
            guard.set_wireframe(true);
        }
        assert!(!gate.is_locked());
        assert_eq!(gate.try_with(|r| r.config().debug.wireframe), Some(true));
    }

    #[test]
    fn test_compose_guard_blocks_other_threads() {
        let (gate, _) = gate();
        let guard = gate.begin_compose();
        let done = Arc::new(AtomicBool::new(false));

        let worker = {
            let gate = gate.clone();
            let done = done.clone();
            thread::spawn(move || {
                gate.resize(32, 32).unwrap();
                done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!done.load(Ordering::SeqCst));
        drop(guard);
        worker.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(gate.with(|r| r.size()), (32, 32));
    }
}
