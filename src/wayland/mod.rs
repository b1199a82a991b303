use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::time::Duration;

use anyhow::{Context, anyhow};
use memfd::MemfdOptions;
use tracing::{debug, info, trace, warn};
use wayland_client::{
    Connection, Dispatch, EventQueue, Proxy, QueueHandle, WEnum,
    backend::WaylandError,
    delegate_noop,
    protocol::{
        wl_buffer::WlBuffer,
        wl_compositor::WlCompositor,
        wl_keyboard::{self, WlKeyboard},
        wl_pointer::{self, WlPointer},
        wl_registry,
        wl_seat::{self, WlSeat},
        wl_shm::{self, WlShm},
        wl_shm_pool::WlShmPool,
        wl_surface::WlSurface,
    },
};
use wayland_protocols::xdg::shell::client::{
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};

use crate::blink::BlinkPhase;
use crate::driver::{Presenter, Signal};
use crate::render::FramePair;

const TITLE: &str = "textmode";
const BYTES_PER_PIXEL: usize = 4;

/// Protocol state of the window.
///
/// Window setup message flow (client perspective).
///
/// CLIENT                                 COMPOSITOR
///   |                                         |
///   | wl_registry.bind wl_compositor, wl_shm, xdg_wm_base, wl_seat
///   |---------------------------------------->|
///   |                                         |
///   | wl_compositor.create_surface            |
///   | xdg_wm_base.get_xdg_surface             |
///   | xdg_surface.get_toplevel                |
///   | wl_surface.commit (no buffer)           |
///   |---------------------------------------->|
///   |                                         |
///   |<------------------ xdg_surface.configure (serial)
///   |  xdg_surface.ack_configure              |
///   |---------------------------------------->|
///   |                                         |
///   |  wl_shm.create_pool (memfd, both frames)|
///   |  wl_shm_pool.create_buffer x2           |
///   |---------------------------------------->|
///   |                                         |
///   |  per blink flip:                        |
///   |  wl_surface.attach(buffer[phase])       |
///   |  wl_surface.damage_buffer + commit      |
///   |---------------------------------------->|
///   |                                         |
///   |<------------------ xdg_wm_base.ping     |
///   |  xdg_wm_base.pong                       |
///   |---------------------------------------->|
///   |                                         |
///   |<------- xdg_toplevel.close / wl_keyboard.key / wl_pointer.button
///   |  (render loop ends)                     |
#[derive(Default)]
struct Window {
    compositor: Option<WlCompositor>,
    shm: Option<WlShm>,
    wm_base: Option<XdgWmBase>,
    seat: Option<WlSeat>,
    keyboard: Option<WlKeyboard>,
    pointer: Option<WlPointer>,
    surface: Option<WlSurface>,
    xdg_surface: Option<XdgSurface>,
    toplevel: Option<XdgToplevel>,
    buffers: Vec<WlBuffer>,
    attached: Option<usize>,
    dimensions: (i32, i32),
    configured: bool,
    signal: Option<Signal>,
}

impl Window {
    fn attach(&mut self, index: usize) {
        let (Some(surface), Some(buffer)) = (self.surface.as_ref(), self.buffers.get(index)) else {
            return;
        };
        let (width, height) = self.dimensions;
        surface.attach(Some(buffer), 0, 0);
        surface.damage_buffer(0, 0, width, height);
        surface.commit();
        self.attached = Some(index);
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for Window {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Window>,
    ) {
        if let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        {
            match interface.as_str() {
                "wl_compositor" => {
                    let version = version.min(WlCompositor::interface().version);
                    state.compositor = Some(registry.bind(name, version, qh, ()));
                }
                "wl_shm" => {
                    let version = version.min(WlShm::interface().version);
                    state.shm = Some(registry.bind(name, version, qh, ()));
                }
                "xdg_wm_base" => {
                    let version = version.min(XdgWmBase::interface().version);
                    state.wm_base = Some(registry.bind(name, version, qh, ()));
                }
                "wl_seat" if state.seat.is_none() => {
                    let version = version.min(WlSeat::interface().version);
                    state.seat = Some(registry.bind(name, version, qh, ()));
                }
                _ => return,
            }

            debug!(name, interface = %interface, version, "bound global");
        }
    }
}

impl Dispatch<XdgWmBase, ()> for Window {
    fn event(
        _state: &mut Self,
        wm_base: &XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Window>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<XdgSurface, ()> for Window {
    fn event(
        state: &mut Self,
        xdg_surface: &XdgSurface,
        event: xdg_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Window>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            xdg_surface.ack_configure(serial);
            state.configured = true;
            // a configure after the first one needs a fresh commit to take effect
            if let Some(index) = state.attached {
                state.attach(index);
            }
        }
    }
}

impl Dispatch<XdgToplevel, ()> for Window {
    fn event(
        state: &mut Self,
        _: &XdgToplevel,
        event: xdg_toplevel::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Window>,
    ) {
        match event {
            xdg_toplevel::Event::Close => {
                state.signal.get_or_insert(Signal::Quit);
            }
            xdg_toplevel::Event::Configure { width, height, .. } => {
                trace!(width, height, "toplevel configure");
            }
            _ => {}
        }
    }
}

impl Dispatch<WlSeat, ()> for Window {
    fn event(
        state: &mut Self,
        seat: &WlSeat,
        event: wl_seat::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Window>,
    ) {
        if let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(capabilities),
        } = event
        {
            if capabilities.contains(wl_seat::Capability::Keyboard) && state.keyboard.is_none() {
                state.keyboard = Some(seat.get_keyboard(qh, ()));
            }
            if capabilities.contains(wl_seat::Capability::Pointer) && state.pointer.is_none() {
                state.pointer = Some(seat.get_pointer(qh, ()));
            }
        }
    }
}

impl Dispatch<WlKeyboard, ()> for Window {
    fn event(
        state: &mut Self,
        _: &WlKeyboard,
        event: wl_keyboard::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Window>,
    ) {
        if let wl_keyboard::Event::Key {
            key,
            state: WEnum::Value(wl_keyboard::KeyState::Pressed),
            ..
        } = event
        {
            trace!(key, "key pressed");
            state.signal.get_or_insert(Signal::KeyPress);
        }
    }
}

impl Dispatch<WlPointer, ()> for Window {
    fn event(
        state: &mut Self,
        _: &WlPointer,
        event: wl_pointer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Window>,
    ) {
        if let wl_pointer::Event::Button {
            button,
            state: WEnum::Value(wl_pointer::ButtonState::Pressed),
            ..
        } = event
        {
            trace!(button, "pointer button pressed");
            state.signal.get_or_insert(Signal::ButtonPress);
        }
    }
}

delegate_noop!(Window: ignore WlCompositor);
delegate_noop!(Window: ignore WlShm);
delegate_noop!(Window: ignore WlShmPool);
delegate_noop!(Window: ignore WlBuffer);
delegate_noop!(Window: ignore WlSurface);

/// A fixed-size `xdg_toplevel` showing the frames through `wl_shm` buffers.
pub struct WaylandPresenter {
    queue: EventQueue<Window>,
    qh: QueueHandle<Window>,
    window: Window,
    scale: usize,
    // keeps the pool's backing file open for the life of the buffers
    pool: Option<(File, WlShmPool)>,
}

impl WaylandPresenter {
    pub fn connect(scale: usize) -> anyhow::Result<Self> {
        let conn = Connection::connect_to_env().context("connect to wayland display")?;
        let mut queue = conn.new_event_queue();
        let qh = queue.handle();
        let _registry = conn.display().get_registry(&qh, ());

        let mut window = Window::default();
        queue
            .roundtrip(&mut window)
            .context("wayland registry roundtrip")?;

        let compositor = window
            .compositor
            .clone()
            .ok_or_else(|| anyhow!("could not find a compositor in the registry advertisement"))?;
        let wm_base = window
            .wm_base
            .clone()
            .ok_or_else(|| anyhow!("could not find xdg_wm_base in the registry advertisement"))?;
        if window.shm.is_none() {
            return Err(anyhow!("could not find wl_shm in the registry advertisement"));
        }
        if window.seat.is_none() {
            warn!("no wl_seat advertised; only closing the window will exit");
        }

        let surface = compositor.create_surface(&qh, ());
        let xdg_surface = wm_base.get_xdg_surface(&surface, &qh, ());
        let toplevel = xdg_surface.get_toplevel(&qh, ());
        toplevel.set_title(TITLE.to_string());
        toplevel.set_app_id(TITLE.to_string());
        surface.commit();

        window.surface = Some(surface);
        window.xdg_surface = Some(xdg_surface);
        window.toplevel = Some(toplevel);

        queue
            .roundtrip(&mut window)
            .context("wayland surface roundtrip")?;
        info!("wayland window created");

        Ok(Self {
            queue,
            qh,
            window,
            scale: scale.max(1),
            pool: None,
        })
    }

    /// Waits up to `timeout` for socket activity and dispatches what arrives.
    fn wait(&mut self, timeout: Duration) -> anyhow::Result<()> {
        self.queue.flush().context("flush wayland requests")?;
        if self
            .queue
            .dispatch_pending(&mut self.window)
            .context("dispatch wayland events")?
            > 0
        {
            return Ok(());
        }

        let Some(guard) = self.queue.prepare_read() else {
            self.queue
                .dispatch_pending(&mut self.window)
                .context("dispatch wayland events")?;
            return Ok(());
        };

        let mut fds = [libc::pollfd {
            fd: guard.connection_fd().as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        }];
        // round up so a sub-millisecond wait does not spin
        let millis = timeout.as_micros().div_ceil(1000).min(i32::MAX as u128) as libc::c_int;
        // SAFETY: `fds` is a live array of exactly one pollfd for the whole call.
        let ready = unsafe { libc::poll(fds.as_mut_ptr(), 1, millis) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err).context("poll wayland socket");
        }

        if ready > 0 {
            match guard.read() {
                Ok(_) => {}
                Err(WaylandError::Io(err)) if err.kind() == io::ErrorKind::WouldBlock => {}
                Err(err) => return Err(err).context("read wayland events"),
            }
        }

        self.queue
            .dispatch_pending(&mut self.window)
            .context("dispatch wayland events")?;
        Ok(())
    }
}

impl Presenter for WaylandPresenter {
    fn upload(&mut self, frames: &FramePair) -> anyhow::Result<()> {
        let shm = self
            .window
            .shm
            .clone()
            .ok_or_else(|| anyhow!("wl_shm must be bound before uploading frames"))?;

        let width = frames.width() * self.scale;
        let height = frames.height() * self.scale;
        let stride = width * BYTES_PER_PIXEL;
        let frame_len = stride * height;

        let mut file = MemfdOptions::default()
            .close_on_exec(true)
            .create("textmode-frames")
            .context("create memfd for frames")?
            .into_file();
        file.set_len((frame_len * 2) as u64)
            .context("size frame memfd")?;
        file.write_all(&frames.visible.to_xrgb8888(self.scale))
            .context("write visible frame")?;
        file.write_all(&frames.suppressed.to_xrgb8888(self.scale))
            .context("write suppressed frame")?;

        let pool_len = i32::try_from(frame_len * 2).context("frames too large for wl_shm")?;
        let (width, height, stride, frame_len) = (
            i32::try_from(width)?,
            i32::try_from(height)?,
            i32::try_from(stride)?,
            i32::try_from(frame_len)?,
        );

        let pool = shm.create_pool(file.as_fd(), pool_len, &self.qh, ());
        self.window.buffers = [0, frame_len]
            .into_iter()
            .map(|offset| {
                pool.create_buffer(
                    offset,
                    width,
                    height,
                    stride,
                    wl_shm::Format::Xrgb8888,
                    &self.qh,
                    (),
                )
            })
            .collect();
        self.window.dimensions = (width, height);

        if let Some(toplevel) = self.window.toplevel.as_ref() {
            toplevel.set_min_size(width, height);
            toplevel.set_max_size(width, height);
        }
        self.pool = Some((file, pool));

        debug!(width, height, "uploaded frames to wl_shm");
        Ok(())
    }

    fn present(&mut self, phase: BlinkPhase) -> anyhow::Result<()> {
        while !self.window.configured {
            self.queue
                .blocking_dispatch(&mut self.window)
                .context("wait for first configure")?;
        }

        let index = match phase {
            BlinkPhase::Visible => 0,
            BlinkPhase::Suppressed => 1,
        };
        if self.window.buffers.get(index).is_none() {
            return Err(anyhow!("present called before upload"));
        }
        self.window.attach(index);
        self.queue.flush().context("flush wayland requests")?;
        Ok(())
    }

    fn poll_signal(&mut self, timeout: Duration) -> anyhow::Result<Option<Signal>> {
        if let Some(signal) = self.window.signal.take() {
            return Ok(Some(signal));
        }
        self.wait(timeout)?;
        Ok(self.window.signal.take())
    }
}

impl Drop for WaylandPresenter {
    fn drop(&mut self) {
        for buffer in self.window.buffers.drain(..) {
            buffer.destroy();
        }
        if let Some((_, pool)) = self.pool.take() {
            pool.destroy();
        }
        if let Some(toplevel) = self.window.toplevel.take() {
            toplevel.destroy();
        }
        if let Some(xdg_surface) = self.window.xdg_surface.take() {
            xdg_surface.destroy();
        }
        if let Some(surface) = self.window.surface.take() {
            surface.destroy();
        }
        let _ = self.queue.flush();
    }
}
