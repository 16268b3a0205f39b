//! Named image windows in the style of HighGUI.
//!
//! [`HighGui`] is plain state: windows with their current image, trackbars,
//! queued key presses and per-window mouse events. The eframe loop in
//! [`native_viewer`] renders that state every frame and feeds input back into
//! it, so program logic runs inside a tick callback instead of blocking on
//! `wait_key`.

use cv_core::{Image, U8Pixel};
use image::RgbImage;
use std::collections::VecDeque;
use std::time::Duration;

pub mod figure;

#[cfg(not(target_arch = "wasm32"))]
pub mod native_viewer;

pub use figure::Figure;

#[cfg(not(target_arch = "wasm32"))]
pub use native_viewer::{run, show_and_wait};

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Unknown window: {0}")]
    UnknownWindow(String),

    #[error("Unknown trackbar '{trackbar}' in window '{window}'")]
    UnknownTrackbar { window: String, trackbar: String },

    #[error("Invalid subplot: {0}")]
    InvalidSubplot(String),

    #[error("Failed to launch viewer: {0}")]
    Launch(String),

    #[error("Render error: {0}")]
    Render(String),
}

/// Key codes returned by [`HighGui::wait_key`]; printable keys are their ASCII value.
pub mod keys {
    pub const BACKSPACE: i32 = 8;
    pub const TAB: i32 = 9;
    pub const ENTER: i32 = 13;
    pub const ESC: i32 = 27;
    pub const SPACE: i32 = 32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowFlags {
    /// User-resizable; the image is scaled to the window.
    Normal,
    /// Sized to the image and not resizable.
    #[default]
    Autosize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    MouseMove,
    LButtonDown,
    RButtonDown,
    MButtonDown,
    LButtonUp,
    RButtonUp,
    MButtonUp,
    LButtonDblClk,
    RButtonDblClk,
    MButtonDblClk,
    MouseWheel,
}

impl MouseEventKind {
    pub const ALL: [MouseEventKind; 11] = [
        MouseEventKind::MouseMove,
        MouseEventKind::LButtonDown,
        MouseEventKind::RButtonDown,
        MouseEventKind::MButtonDown,
        MouseEventKind::LButtonUp,
        MouseEventKind::RButtonUp,
        MouseEventKind::MButtonUp,
        MouseEventKind::LButtonDblClk,
        MouseEventKind::RButtonDblClk,
        MouseEventKind::MButtonDblClk,
        MouseEventKind::MouseWheel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MouseEventKind::MouseMove => "EVENT_MOUSEMOVE",
            MouseEventKind::LButtonDown => "EVENT_LBUTTONDOWN",
            MouseEventKind::RButtonDown => "EVENT_RBUTTONDOWN",
            MouseEventKind::MButtonDown => "EVENT_MBUTTONDOWN",
            MouseEventKind::LButtonUp => "EVENT_LBUTTONUP",
            MouseEventKind::RButtonUp => "EVENT_RBUTTONUP",
            MouseEventKind::MButtonUp => "EVENT_MBUTTONUP",
            MouseEventKind::LButtonDblClk => "EVENT_LBUTTONDBLCLK",
            MouseEventKind::RButtonDblClk => "EVENT_RBUTTONDBLCLK",
            MouseEventKind::MButtonDblClk => "EVENT_MBUTTONDBLCLK",
            MouseEventKind::MouseWheel => "EVENT_MOUSEWHEEL",
        }
    }
}

/// Button and modifier state carried by a [`MouseEvent`].
pub mod mouse_flags {
    pub const LBUTTON: u32 = 1;
    pub const RBUTTON: u32 = 2;
    pub const MBUTTON: u32 = 4;
    pub const CTRLKEY: u32 = 8;
    pub const SHIFTKEY: u32 = 16;
    pub const ALTKEY: u32 = 32;
}

/// Mouse events kept per window between drains; older ones are dropped first.
pub const MOUSE_QUEUE_LEN: usize = 256;

/// Mouse input in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: i32,
    pub y: i32,
    /// Bitwise OR of [`mouse_flags`].
    pub flags: u32,
    /// Scroll amount for `MouseWheel`, positive away from the user.
    pub delta: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trackbar {
    pub name: String,
    pub value: i32,
    pub max: i32,
}

#[derive(Debug, Clone)]
pub struct Window {
    pub name: String,
    pub flags: WindowFlags,
    image: Option<RgbImage>,
    /// Bumped on every `imshow` so the renderer knows to re-upload.
    version: u64,
    trackbars: Vec<Trackbar>,
    mouse_enabled: bool,
    mouse_events: VecDeque<MouseEvent>,
}

impl Window {
    fn new(name: &str, flags: WindowFlags) -> Self {
        Self {
            name: name.to_string(),
            flags,
            image: None,
            version: 0,
            trackbars: Vec::new(),
            mouse_enabled: false,
            mouse_events: VecDeque::new(),
        }
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn trackbars(&self) -> &[Trackbar] {
        &self.trackbars
    }

    pub fn trackbars_mut(&mut self) -> &mut [Trackbar] {
        &mut self.trackbars
    }

    pub fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }
}

/// Returned by the tick callback of [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Converts any 8-bit image to the RGB buffer windows display.
pub fn to_display_rgb<P: U8Pixel>(img: &Image<P>) -> RgbImage {
    let (w, h) = img.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let mut out = RgbImage::new(w, h);
    for (dst, src) in out.chunks_exact_mut(3).zip(img.as_raw().chunks_exact(channels)) {
        match channels {
            // gray, or gray + alpha
            1 | 2 => dst.fill(src[0]),
            _ => dst.copy_from_slice(&src[..3]),
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct HighGui {
    windows: Vec<Window>,
    keys: VecDeque<i32>,
    repaint_after: Option<Duration>,
}

impl HighGui {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a window; an existing window keeps its flags.
    pub fn named_window(&mut self, name: &str, flags: WindowFlags) {
        if self.window(name).is_none() {
            tracing::debug!(name, ?flags, "created window");
            self.windows.push(Window::new(name, flags));
        }
    }

    /// Shows `img` in `name`, creating an autosized window on first use.
    pub fn imshow<P: U8Pixel>(&mut self, name: &str, img: &Image<P>) {
        self.named_window(name, WindowFlags::Autosize);
        if let Some(window) = self.windows.iter_mut().find(|w| w.name == name) {
            window.image = Some(to_display_rgb(img));
            window.version += 1;
        }
    }

    pub fn destroy_window(&mut self, name: &str) -> Result<()> {
        let idx = self.index_of(name)?;
        self.windows.remove(idx);
        Ok(())
    }

    pub fn destroy_all_windows(&mut self) {
        self.windows.clear();
    }

    pub fn window_names(&self) -> Vec<&str> {
        self.windows.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn window(&self, name: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.name == name)
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn windows_mut(&mut self) -> &mut [Window] {
        &mut self.windows
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.windows
            .iter()
            .position(|w| w.name == name)
            .ok_or_else(|| ViewerError::UnknownWindow(name.to_string()))
    }

    fn window_mut(&mut self, name: &str) -> Result<&mut Window> {
        let idx = self.index_of(name)?;
        Ok(&mut self.windows[idx])
    }

    /// Pops the oldest key pressed since the last call.
    ///
    /// The event loop never blocks, so `delay_ms` sets how soon the next frame
    /// is rendered; `0` waits for input before repainting.
    pub fn wait_key(&mut self, delay_ms: u32) -> Option<i32> {
        self.repaint_after = (delay_ms > 0).then(|| Duration::from_millis(delay_ms as u64));
        self.keys.pop_front()
    }

    pub fn repaint_after(&self) -> Option<Duration> {
        self.repaint_after
    }

    /// Queues a key press as if it came from the keyboard.
    pub fn push_key(&mut self, key: i32) {
        self.keys.push_back(key);
    }

    pub fn create_trackbar(&mut self, name: &str, window: &str, initial: i32, max: i32) -> Result<()> {
        let max = max.max(0);
        let win = self.window_mut(window)?;
        let value = initial.clamp(0, max);
        match win.trackbars.iter_mut().find(|t| t.name == name) {
            Some(t) => {
                t.max = max;
                t.value = value;
            }
            None => win.trackbars.push(Trackbar {
                name: name.to_string(),
                value,
                max,
            }),
        }
        Ok(())
    }

    fn trackbar_mut(&mut self, name: &str, window: &str) -> Result<&mut Trackbar> {
        let win = self.window_mut(window)?;
        win.trackbars
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| ViewerError::UnknownTrackbar {
                window: window.to_string(),
                trackbar: name.to_string(),
            })
    }

    pub fn get_trackbar_pos(&mut self, name: &str, window: &str) -> Result<i32> {
        Ok(self.trackbar_mut(name, window)?.value)
    }

    /// Moves a trackbar; the value is clamped to `0..=max`.
    pub fn set_trackbar_pos(&mut self, name: &str, window: &str, pos: i32) -> Result<()> {
        let t = self.trackbar_mut(name, window)?;
        t.value = pos.clamp(0, t.max);
        Ok(())
    }

    /// Starts recording mouse events for `window`.
    pub fn enable_mouse_events(&mut self, window: &str) -> Result<()> {
        self.window_mut(window)?.mouse_enabled = true;
        Ok(())
    }

    /// Drains the mouse events recorded for `window`, oldest first.
    pub fn take_mouse_events(&mut self, window: &str) -> Result<Vec<MouseEvent>> {
        Ok(self.window_mut(window)?.mouse_events.drain(..).collect())
    }

    /// Records a mouse event; ignored unless mouse events are enabled for the window.
    ///
    /// At most [`MOUSE_QUEUE_LEN`] events are kept.
    pub fn push_mouse_event(&mut self, window: &str, event: MouseEvent) -> Result<()> {
        let win = self.window_mut(window)?;
        if win.mouse_enabled {
            if win.mouse_events.len() == MOUSE_QUEUE_LEN {
                win.mouse_events.pop_front();
            }
            win.mouse_events.push_back(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn click(kind: MouseEventKind, x: i32, y: i32) -> MouseEvent {
        MouseEvent {
            kind,
            x,
            y,
            flags: 0,
            delta: 0.0,
        }
    }

    #[test]
    fn imshow_creates_autosize_window() {
        let mut gui = HighGui::new();
        gui.imshow("frame", &GrayImage::from_pixel(4, 3, Luma([9])));
        let win = gui.window("frame").unwrap();
        assert_eq!(win.flags, WindowFlags::Autosize);
        assert_eq!(win.version(), 1);
        assert_eq!(win.image().unwrap().get_pixel(0, 0).0, [9, 9, 9]);
    }

    #[test]
    fn named_window_keeps_flags_on_imshow() {
        let mut gui = HighGui::new();
        gui.named_window("Saved as PNG", WindowFlags::Normal);
        gui.imshow("Saved as PNG", &RgbImage::new(2, 2));
        assert_eq!(gui.window("Saved as PNG").unwrap().flags, WindowFlags::Normal);
        assert_eq!(gui.window_names(), vec!["Saved as PNG"]);
    }

    #[test]
    fn destroy_windows() {
        let mut gui = HighGui::new();
        gui.named_window("a", WindowFlags::Normal);
        gui.named_window("b", WindowFlags::Normal);
        gui.destroy_window("a").unwrap();
        assert!(matches!(gui.destroy_window("a"), Err(ViewerError::UnknownWindow(_))));
        gui.destroy_all_windows();
        assert!(gui.window_names().is_empty());
    }

    #[test]
    fn wait_key_pops_in_order_and_sets_repaint() {
        let mut gui = HighGui::new();
        gui.push_key('q' as i32);
        gui.push_key(keys::ESC);
        assert_eq!(gui.wait_key(1), Some('q' as i32));
        assert_eq!(gui.repaint_after(), Some(Duration::from_millis(1)));
        assert_eq!(gui.wait_key(0), Some(27));
        assert_eq!(gui.repaint_after(), None);
        assert_eq!(gui.wait_key(20), None);
    }

    #[test]
    fn trackbars_clamp() {
        let mut gui = HighGui::new();
        gui.named_window("palette", WindowFlags::Autosize);
        gui.create_trackbar("H", "palette", 200, 179).unwrap();
        assert_eq!(gui.get_trackbar_pos("H", "palette").unwrap(), 179);
        gui.set_trackbar_pos("H", "palette", -5).unwrap();
        assert_eq!(gui.get_trackbar_pos("H", "palette").unwrap(), 0);
        assert!(gui.get_trackbar_pos("S", "palette").is_err());
        assert!(gui.create_trackbar("H", "missing", 0, 10).is_err());
    }

    #[test]
    fn mouse_events_need_enabling() {
        let mut gui = HighGui::new();
        gui.named_window("image", WindowFlags::Autosize);
        gui.push_mouse_event("image", click(MouseEventKind::LButtonDown, 1, 2)).unwrap();
        assert!(gui.take_mouse_events("image").unwrap().is_empty());

        gui.enable_mouse_events("image").unwrap();
        gui.push_mouse_event("image", click(MouseEventKind::LButtonDblClk, 10, 20)).unwrap();
        let events = gui.take_mouse_events("image").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, MouseEventKind::LButtonDblClk);
        assert_eq!((events[0].x, events[0].y), (10, 20));
        assert!(gui.take_mouse_events("image").unwrap().is_empty());
    }

    #[test]
    fn undrained_mouse_queue_keeps_newest_events() {
        let mut gui = HighGui::new();
        gui.named_window("image", WindowFlags::Autosize);
        gui.enable_mouse_events("image").unwrap();
        for x in 0..(MOUSE_QUEUE_LEN as i32 + 10) {
            gui.push_mouse_event("image", click(MouseEventKind::MouseMove, x, 0)).unwrap();
        }
        let events = gui.take_mouse_events("image").unwrap();
        assert_eq!(events.len(), MOUSE_QUEUE_LEN);
        assert_eq!(events[0].x, 10);
        assert_eq!(events.last().map(|e| e.x), Some(MOUSE_QUEUE_LEN as i32 + 9));
    }

    #[test]
    fn event_names_are_unique() {
        let mut names: Vec<_> = MouseEventKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MouseEventKind::ALL.len());
    }
}
