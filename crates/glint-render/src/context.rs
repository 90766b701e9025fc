use std::sync::Arc;

/// Errors raised while acquiring GPU resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// No adapter matched the request
    AdapterUnavailable(String),
    /// The adapter refused to create a device
    DeviceRequest(String),
    /// Surface creation or configuration failed
    Surface(String),
}

impl std::fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdapterUnavailable(msg) => write!(f, "No suitable GPU adapter: {}", msg),
            Self::DeviceRequest(msg) => write!(f, "Failed to create device: {}", msg),
            Self::Surface(msg) => write!(f, "Surface error: {}", msg),
        }
    }
}

impl std::error::Error for GraphicsError {}

/// Options for [`GraphicsContext`] creation.
#[derive(Debug, Clone)]
pub struct GraphicsContextDescriptor {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    pub limits: wgpu::Limits,
    pub label: Option<&'static str>,
}

impl Default for GraphicsContextDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            limits: wgpu::Limits::downlevel_defaults(),
            label: Some("Glint Device"),
        }
    }
}

/// A shared wgpu instance, adapter, device and queue.
///
/// ```rust,no_run
/// use glint_render::GraphicsContext;
///
/// let ctx = GraphicsContext::new_owned_sync()?;
/// let ctx2 = ctx.clone(); // Cheap clone (Arc)
/// # Ok::<(), glint_render::GraphicsError>(())
/// ```
pub struct GraphicsContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GraphicsContext {
    pub async fn new_owned() -> Result<Arc<Self>, GraphicsError> {
        Self::new_owned_with_descriptor(GraphicsContextDescriptor::default()).await
    }

    /// Blocks the current thread until the context is created.
    pub fn new_owned_sync() -> Result<Arc<Self>, GraphicsError> {
        pollster::block_on(Self::new_owned())
    }

    pub async fn new_owned_with_descriptor(
        descriptor: GraphicsContextDescriptor,
    ) -> Result<Arc<Self>, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: descriptor.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: descriptor.power_preference,
                compatible_surface: None,
                force_fallback_adapter: descriptor.force_fallback_adapter,
            })
            .await
            .map_err(|err| GraphicsError::AdapterUnavailable(err.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: descriptor.label,
                required_limits: descriptor.limits.clone(),
                ..Default::default()
            })
            .await
            .map_err(|err| GraphicsError::DeviceRequest(err.to_string()))?;

        tracing::info!("Created graphics context on {}", adapter.get_info().name);

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
        }))
    }

    /// Get device info
    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Get device limits
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Dynamic uniform offsets must be aligned to this value.
    #[inline]
    pub fn min_uniform_buffer_offset_alignment(&self) -> u32 {
        self.device.limits().min_uniform_buffer_offset_alignment
    }
}

impl std::fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("adapter", &self.adapter.get_info().name)
            .finish()
    }
}
