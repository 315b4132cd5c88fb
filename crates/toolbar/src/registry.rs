use tracing::debug;

use crate::frame::FrameLoadEvent;

/// Lifecycle of a toolbar component mounted inside a grid container.
pub trait ToolbarComponent: Send {
    /// Stable name used for lookups and logs.
    fn name(&self) -> &'static str;

    /// Binds the component to the container element with `container_id`.
    fn attach(&mut self, container_id: &str);

    /// Unbinds the component and drops any loaded state.
    fn detach(&mut self);

    /// Handles a frame load; returns true when the component consumed it.
    fn on_frame_load(&mut self, event: &FrameLoadEvent) -> bool;
}

/// Components registered once at start and driven by frame loads.
#[derive(Default)]
pub struct ComponentRegistry {
    components: Vec<Box<dyn ToolbarComponent>>,
    container_id: Option<String>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component; it is attached right away when the registry is.
    #[must_use]
    pub fn with(mut self, mut component: Box<dyn ToolbarComponent>) -> Self {
        if let Some(container_id) = self.container_id.as_deref() {
            component.attach(container_id);
        }
        self.components.push(component);
        self
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Attaches every component to a container.
    pub fn attach_all(&mut self, container_id: &str) {
        self.container_id = Some(container_id.to_owned());
        for component in &mut self.components {
            component.attach(container_id);
        }
    }

    /// Detaches every component.
    pub fn detach_all(&mut self) {
        self.container_id = None;
        for component in &mut self.components {
            component.detach();
        }
    }

    /// Forwards a frame load to every component; returns how many handled it.
    pub fn dispatch_frame_load(&mut self, event: &FrameLoadEvent) -> usize {
        let handled = self
            .components
            .iter_mut()
            .filter_map(|component| component.on_frame_load(event).then_some(component.name()))
            .collect::<Vec<_>>();
        debug!(frame_id = %event.frame_id, ?handled, "dispatched frame load");
        handled.len()
    }

    /// Returns the component registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ToolbarComponent> {
        self.components
            .iter()
            .find(|component| component.name() == name)
            .map(AsRef::as_ref)
    }
}
