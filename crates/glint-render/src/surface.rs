use std::sync::Arc;

use glint_core::profiling::profile_function;
use winit::{dpi::PhysicalSize, window::Window};

use crate::context::{GraphicsContext, GraphicsError};

/// A configured wgpu surface for a winit window.
pub struct WindowSurface {
    window: Arc<Window>,
    graphics: Arc<GraphicsContext>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    pending_resize: Option<PhysicalSize<u32>>,
}

impl WindowSurface {
    pub fn new(graphics: Arc<GraphicsContext>, window: Arc<Window>) -> Result<Self, GraphicsError> {
        let PhysicalSize { width, height } = window.inner_size();
        let surface = graphics
            .instance
            .create_surface(window.clone())
            .map_err(|err| GraphicsError::Surface(err.to_string()))?;

        let config = surface
            .get_default_config(&graphics.adapter, width.max(1), height.max(1))
            .ok_or_else(|| {
                GraphicsError::Surface("surface is not supported by the adapter".to_string())
            })?;

        surface.configure(&graphics.device, &config);

        Ok(Self {
            window,
            graphics,
            surface,
            config,
            pending_resize: None,
        })
    }

    /// Handle window resize event. The surface is reconfigured on the next
    /// [`acquire`](Self::acquire).
    pub fn resized(&mut self, new_size: PhysicalSize<u32>) {
        self.pending_resize = Some(new_size);
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Get the next frame to draw into.
    pub fn acquire(&mut self) -> Result<(wgpu::SurfaceTexture, wgpu::TextureView), GraphicsError> {
        profile_function!();

        if let Some(new_size) = self.pending_resize.take()
            && new_size.width > 0
            && new_size.height > 0
        {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.graphics.device, &self.config);
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                tracing::debug!("Surface outdated, reconfiguring");
                self.surface.configure(&self.graphics.device, &self.config);
                self.surface
                    .get_current_texture()
                    .map_err(|err| GraphicsError::Surface(err.to_string()))?
            }
            Err(err) => return Err(GraphicsError::Surface(err.to_string())),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok((frame, view))
    }
}

impl std::fmt::Debug for WindowSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowSurface")
            .field("format", &self.config.format)
            .field("size", &(self.config.width, self.config.height))
            .finish()
    }
}
