use std::ops::Range;

use slotmap::{Key, SlotMap};

use super::{FrameError, FrameEvent, FrameState, FrameTracker};
use crate::device::surface::{is_deferred, reconfigure, surface_error_action};
use crate::device::{Gpu, SurfaceErrorAction};
use crate::error::{GpuError, Result};
use crate::registry::{
    BindGroupHandle, BufferHandle, CommandBufferHandle, CommandEncoderHandle, DeviceHandle,
    EncoderRecord, PassRecord, PipelineHandle, QueueHandle, RenderPassHandle, SurfaceHandle,
    TextureViewHandle, ViewRecord, get, get_mut,
};
use crate::resource::buffer_range;

/// Result of [`Gpu::render_frame`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented,
    /// The surface could not provide a target; nothing was recorded.
    Skipped,
}

/// Handles belonging to the single frame in flight.
#[derive(Debug, Default)]
pub(crate) struct FrameRecorder {
    pub tracker: FrameTracker,
    pub surface: Option<SurfaceHandle>,
    pub view: Option<TextureViewHandle>,
    pub encoder: Option<CommandEncoderHandle>,
    pub commands: Option<CommandBufferHandle>,
}

impl FrameRecorder {
    pub fn owns_encoder(&self, encoder: CommandEncoderHandle) -> bool {
        self.encoder == Some(encoder)
    }

    pub fn owns_commands(&self, commands: CommandBufferHandle) -> bool {
        self.commands == Some(commands)
    }

    fn reject(&self, event: FrameEvent) -> GpuError {
        FrameError::InvalidTransition {
            state: self.tracker.state(),
            event,
        }
        .into()
    }
}

/// Looks up an open pass and advances the tracker if it belongs to the frame.
fn pass_for<'a>(
    passes: &'a mut SlotMap<RenderPassHandle, PassRecord>,
    frame: &mut FrameRecorder,
    pass: RenderPassHandle,
    event: FrameEvent,
) -> Result<&'a mut wgpu::RenderPass<'static>> {
    let record = get_mut(passes, pass, "render pass")?;
    if frame.owns_encoder(record.encoder) {
        frame.tracker.apply(event)?;
    }
    Ok(&mut record.pass)
}

impl Gpu {
    // ── acquisition ──────────────────────────────────────────────────────

    /// Acquires the surface's current texture as this frame's target.
    ///
    /// Returns `Ok(None)` when the surface cannot provide an optimal target
    /// (resize, minimize, timeout); skip the frame and retry next cycle. A
    /// lost, outdated or suboptimal surface is reconfigured first.
    pub fn acquire_frame_view(&mut self, surface: SurfaceHandle) -> Result<Option<TextureViewHandle>> {
        self.frame.tracker.check(FrameEvent::Acquire)?;
        let record = get_mut(&mut self.reg.surfaces, surface, "surface")?;

        let Some(size) = record.size else {
            return Err(GpuError::SurfaceNotConfigured);
        };
        if record.current.take().is_some() {
            log::warn!("dropping unpresented frame of {surface:?}");
        }

        let view = if is_deferred(size) {
            log::debug!("surface {surface:?} is zero-sized; frame skipped");
            None
        } else {
            match record.surface.get_current_texture() {
                Ok(texture) if texture.suboptimal => {
                    drop(texture);
                    reconfigure(record);
                    log::debug!("surface {surface:?} suboptimal; reconfigured, frame skipped");
                    None
                }
                Ok(texture) => {
                    let view = texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    record.current = Some(texture);
                    Some(view)
                }
                Err(err) => match surface_error_action(&err) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface {surface:?}: {err}");
                        return Err(GpuError::SurfaceOutOfMemory);
                    }
                    SurfaceErrorAction::Reconfigured => {
                        reconfigure(record);
                        log::debug!("surface {surface:?}: {err}; reconfigured, frame skipped");
                        None
                    }
                    SurfaceErrorAction::SkipFrame => {
                        log::debug!("surface {surface:?}: {err}; frame skipped");
                        None
                    }
                },
            }
        };

        let Some(view) = view else {
            self.frame.tracker.apply(FrameEvent::AcquireSkipped)?;
            return Ok(None);
        };

        self.frame.tracker.apply(FrameEvent::Acquire)?;
        let handle = self.reg.texture_views.insert(ViewRecord {
            view,
            frame_of: Some(surface),
        });
        self.frame.surface = Some(surface);
        self.frame.view = Some(handle);
        log::trace!("acquired frame view {handle:?} of {surface:?}");
        Ok(Some(handle))
    }

    // ── encoding ─────────────────────────────────────────────────────────

    /// Opens a command encoder.
    ///
    /// The first encoder opened after a frame view is acquired records that
    /// frame; any other encoder is off-screen work and is not tracked.
    pub fn create_command_encoder(&mut self, device: DeviceHandle) -> Result<CommandEncoderHandle> {
        let dev = &get(&self.reg.devices, device, "device")?.device;
        let frame = self.frame.tracker.state() == FrameState::ViewAcquired;
        let encoder = dev.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(if frame {
                "ember frame encoder"
            } else {
                "ember encoder"
            }),
        });
        let handle = self.reg.encoders.insert(EncoderRecord {
            encoder,
            open_pass: None,
        });
        if frame {
            self.frame.tracker.apply(FrameEvent::OpenEncoder)?;
            self.frame.encoder = Some(handle);
        }
        log::trace!("created command encoder {handle:?}");
        Ok(handle)
    }

    /// Begins a pass that clears `view` to `clear` and stores the result.
    pub fn begin_render_pass(
        &mut self,
        encoder: CommandEncoderHandle,
        view: TextureViewHandle,
        clear: wgpu::Color,
    ) -> Result<RenderPassHandle> {
        self.begin_pass(encoder, view, clear, None)
    }

    /// As [`begin_render_pass`](Self::begin_render_pass), also clearing
    /// `depth_view` to 1.0 and storing it.
    pub fn begin_render_pass_depth(
        &mut self,
        encoder: CommandEncoderHandle,
        view: TextureViewHandle,
        clear: wgpu::Color,
        depth_view: TextureViewHandle,
    ) -> Result<RenderPassHandle> {
        self.begin_pass(encoder, view, clear, Some(depth_view))
    }

    fn begin_pass(
        &mut self,
        encoder: CommandEncoderHandle,
        view: TextureViewHandle,
        clear: wgpu::Color,
        depth: Option<TextureViewHandle>,
    ) -> Result<RenderPassHandle> {
        let tracked = self.frame.owns_encoder(encoder);
        let record = get_mut(&mut self.reg.encoders, encoder, "command encoder")?;
        if record.open_pass.is_some() {
            return Err(GpuError::PassStillOpen);
        }
        if tracked {
            self.frame.tracker.check(FrameEvent::BeginPass)?;
        }

        let color = &get(&self.reg.texture_views, view, "texture view")?.view;
        let depth = match depth {
            Some(h) => Some(&get(&self.reg.texture_views, h, "depth view")?.view),
            None => None,
        };

        let pass = record
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        let handle = self.reg.passes.insert(PassRecord { pass, encoder });
        record.open_pass = Some(handle);
        if tracked {
            self.frame.tracker.apply(FrameEvent::BeginPass)?;
        }
        log::trace!("began render pass {handle:?} on {encoder:?}");
        Ok(handle)
    }

    // ── in-pass commands ─────────────────────────────────────────────────

    pub fn set_pipeline(&mut self, pass: RenderPassHandle, pipeline: PipelineHandle) -> Result<()> {
        let pipeline = get(&self.reg.pipelines, pipeline, "pipeline")?;
        pass_for(&mut self.reg.passes, &mut self.frame, pass, FrameEvent::PassCommand)?
            .set_pipeline(pipeline);
        Ok(())
    }

    /// Binds `offset..offset + size` of `buffer` to `slot`; `size` 0 binds
    /// the rest of the buffer.
    ///
    /// Empty or out-of-bounds ranges fail with
    /// [`BufferRangeOutOfBounds`](GpuError::BufferRangeOutOfBounds) before
    /// anything is recorded.
    pub fn set_vertex_buffer(
        &mut self,
        pass: RenderPassHandle,
        slot: u32,
        buffer: BufferHandle,
        offset: u64,
        size: u64,
    ) -> Result<()> {
        let buffer = &get(&self.reg.buffers, buffer, "buffer")?.buffer;
        let range = buffer_range(offset, size, buffer.size())?;
        pass_for(&mut self.reg.passes, &mut self.frame, pass, FrameEvent::PassCommand)?
            .set_vertex_buffer(slot, buffer.slice(range));
        Ok(())
    }

    /// Binds the index buffer; `size` 0 binds the rest of the buffer.
    pub fn set_index_buffer(
        &mut self,
        pass: RenderPassHandle,
        buffer: BufferHandle,
        format: wgpu::IndexFormat,
        offset: u64,
        size: u64,
    ) -> Result<()> {
        let buffer = &get(&self.reg.buffers, buffer, "buffer")?.buffer;
        let range = buffer_range(offset, size, buffer.size())?;
        pass_for(&mut self.reg.passes, &mut self.frame, pass, FrameEvent::PassCommand)?
            .set_index_buffer(buffer.slice(range), format);
        Ok(())
    }

    pub fn set_bind_group(
        &mut self,
        pass: RenderPassHandle,
        index: u32,
        group: BindGroupHandle,
    ) -> Result<()> {
        let group = get(&self.reg.bind_groups, group, "bind group")?;
        pass_for(&mut self.reg.passes, &mut self.frame, pass, FrameEvent::PassCommand)?
            .set_bind_group(index, group, &[]);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_viewport(
        &mut self,
        pass: RenderPassHandle,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        min_depth: f32,
        max_depth: f32,
    ) -> Result<()> {
        pass_for(&mut self.reg.passes, &mut self.frame, pass, FrameEvent::PassCommand)?
            .set_viewport(x, y, width, height, min_depth, max_depth);
        Ok(())
    }

    pub fn set_scissor_rect(
        &mut self,
        pass: RenderPassHandle,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        pass_for(&mut self.reg.passes, &mut self.frame, pass, FrameEvent::PassCommand)?
            .set_scissor_rect(x, y, width, height);
        Ok(())
    }

    /// Draws `vertex_count` vertices of a single instance.
    pub fn draw(&mut self, pass: RenderPassHandle, vertex_count: u32) -> Result<()> {
        pass_for(&mut self.reg.passes, &mut self.frame, pass, FrameEvent::Draw)?
            .draw(0..vertex_count, 0..1);
        Ok(())
    }

    pub fn draw_indexed(
        &mut self,
        pass: RenderPassHandle,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) -> Result<()> {
        let indices = draw_range(first_index, index_count)?;
        let instances = draw_range(first_instance, instance_count)?;
        pass_for(&mut self.reg.passes, &mut self.frame, pass, FrameEvent::Draw)?.draw_indexed(
            indices,
            base_vertex,
            instances,
        );
        Ok(())
    }

    /// Ends the pass; its handle becomes invalid.
    pub fn end_render_pass(&mut self, pass: RenderPassHandle) -> Result<()> {
        let encoder = get(&self.reg.passes, pass, "render pass")?.encoder;
        if self.frame.owns_encoder(encoder) {
            self.frame.tracker.apply(FrameEvent::EndPass)?;
        }
        // Dropping the pass records its end into the encoder.
        self.reg.passes.remove(pass);
        if let Some(record) = self.reg.encoders.get_mut(encoder) {
            record.open_pass = None;
        }
        log::trace!("ended render pass {pass:?}");
        Ok(())
    }

    // ── submission ───────────────────────────────────────────────────────

    /// Finishes the encoder into a command buffer; the encoder handle is consumed.
    pub fn finish_encoder(&mut self, encoder: CommandEncoderHandle) -> Result<CommandBufferHandle> {
        if get(&self.reg.encoders, encoder, "command encoder")?
            .open_pass
            .is_some()
        {
            return Err(GpuError::PassStillOpen);
        }
        let tracked = self.frame.owns_encoder(encoder);
        if tracked {
            self.frame.tracker.apply(FrameEvent::Finish)?;
        }

        let record = self
            .reg
            .encoders
            .remove(encoder)
            .ok_or_else(|| GpuError::invalid("command encoder"))?;
        let handle = self.reg.command_buffers.insert(record.encoder.finish());
        if tracked {
            self.frame.encoder = None;
            self.frame.commands = Some(handle);
        }
        log::trace!("finished {encoder:?} into {handle:?}");
        Ok(handle)
    }

    /// Submits one command buffer; the handle is consumed.
    pub fn submit(&mut self, queue: QueueHandle, commands: CommandBufferHandle) -> Result<()> {
        let queue = get(&self.reg.queues, queue, "queue")?;
        get(&self.reg.command_buffers, commands, "command buffer")?;
        let tracked = self.frame.owns_commands(commands);
        if tracked {
            self.frame.tracker.apply(FrameEvent::Submit)?;
        }

        if let Some(buffer) = self.reg.command_buffers.remove(commands) {
            queue.submit(std::iter::once(buffer));
        }
        if tracked {
            self.frame.commands = None;
        }
        log::trace!("submitted {commands:?}");
        Ok(())
    }

    /// Presents the frame acquired from `surface`.
    ///
    /// The frame view handle is released here.
    pub fn present(&mut self, surface: SurfaceHandle) -> Result<()> {
        let record = get_mut(&mut self.reg.surfaces, surface, "surface")?;
        if self.frame.surface != Some(surface) {
            return Err(self.frame.reject(FrameEvent::Present));
        }
        self.frame.tracker.check(FrameEvent::Present)?;
        let Some(texture) = record.current.take() else {
            return Err(self.frame.reject(FrameEvent::Present));
        };

        if let Some(view) = self.frame.view.take() {
            self.reg.texture_views.remove(view);
        }
        self.frame.surface = None;
        self.frame.tracker.apply(FrameEvent::Present)?;
        texture.present();
        log::trace!("presented {surface:?}");
        Ok(())
    }

    /// Abandons the frame in flight if it targets `surface`.
    pub(crate) fn abandon_frame_of(&mut self, surface: SurfaceHandle) {
        if self.frame.surface == Some(surface) {
            log::warn!("dropping unpresented frame of {surface:?}");
            self.abandon_frame();
        }
    }

    /// Drops the frame in flight without presenting it.
    ///
    /// Its open pass, encoder, command buffer, view and surface texture are
    /// released and the tracker returns to `Idle`.
    pub fn abandon_frame(&mut self) {
        if let Some(encoder) = self.frame.encoder.take() {
            let pass = self
                .reg
                .encoders
                .get(encoder)
                .and_then(|record| record.open_pass);
            if let Some(pass) = pass {
                self.reg.passes.remove(pass);
            }
            self.reg.encoders.remove(encoder);
        }
        if let Some(commands) = self.frame.commands.take() {
            self.reg.command_buffers.remove(commands);
        }
        if let Some(view) = self.frame.view.take() {
            self.reg.texture_views.remove(view);
        }
        if let Some(surface) = self.frame.surface.take() {
            if let Some(record) = self.reg.surfaces.get_mut(surface) {
                record.current = None;
            }
        }
        if self.frame.tracker.in_progress() {
            log::debug!("abandoned frame in state {}", self.frame.tracker.state());
        }
        self.frame.tracker.abandon();
    }

    // ── whole frame ──────────────────────────────────────────────────────

    /// Runs one complete frame: acquire, one pass cleared to `clear` (with
    /// depth when `depth_view` is not null), `draw`, end, finish, submit,
    /// present.
    ///
    /// Any error after acquisition, including one from `draw`, abandons the
    /// frame and is returned.
    pub fn render_frame<F>(
        &mut self,
        surface: SurfaceHandle,
        device: DeviceHandle,
        queue: QueueHandle,
        clear: wgpu::Color,
        depth_view: TextureViewHandle,
        draw: F,
    ) -> Result<FrameOutcome>
    where
        F: FnOnce(&mut Gpu, RenderPassHandle) -> Result<()>,
    {
        let Some(view) = self.acquire_frame_view(surface)? else {
            return Ok(FrameOutcome::Skipped);
        };

        let done = self
            .record_frame(device, view, clear, depth_view, draw)
            .and_then(|commands| {
                self.submit(queue, commands)?;
                self.present(surface)
            });
        if let Err(err) = done {
            self.abandon_frame();
            return Err(err);
        }
        Ok(FrameOutcome::Presented)
    }

    fn record_frame<F>(
        &mut self,
        device: DeviceHandle,
        view: TextureViewHandle,
        clear: wgpu::Color,
        depth_view: TextureViewHandle,
        draw: F,
    ) -> Result<CommandBufferHandle>
    where
        F: FnOnce(&mut Gpu, RenderPassHandle) -> Result<()>,
    {
        let encoder = self.create_command_encoder(device)?;
        let pass = if depth_view.is_null() {
            self.begin_render_pass(encoder, view, clear)?
        } else {
            self.begin_render_pass_depth(encoder, view, clear, depth_view)?
        };
        draw(self, pass)?;
        self.end_render_pass(pass)?;
        self.finish_encoder(encoder)
    }
}

fn draw_range(first: u32, count: u32) -> Result<Range<u32>> {
    first
        .checked_add(count)
        .map(|end| first..end)
        .ok_or(GpuError::DrawRangeOverflow { first, count })
}
