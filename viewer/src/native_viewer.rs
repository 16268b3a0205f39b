use crate::{mouse_flags, Flow, HighGui, MouseEvent, MouseEventKind, Result, ViewerError, WindowFlags};
use cv_core::{Image, U8Pixel};
use eframe::egui;
use std::collections::HashMap;

type Tick = Box<dyn FnMut(&mut HighGui) -> Flow>;

struct UploadedImage {
    version: u64,
    texture: egui::TextureHandle,
}

pub struct NativeViewer {
    gui: HighGui,
    tick: Tick,
    textures: HashMap<String, UploadedImage>,
    last_pointer: HashMap<String, (i32, i32)>,
}

fn key_code(key: egui::Key) -> Option<i32> {
    match key {
        egui::Key::Escape => Some(crate::keys::ESC),
        egui::Key::Enter => Some(crate::keys::ENTER),
        egui::Key::Backspace => Some(crate::keys::BACKSPACE),
        egui::Key::Tab => Some(crate::keys::TAB),
        _ => None,
    }
}

impl NativeViewer {
    pub fn new(_cc: &eframe::CreationContext<'_>, gui: HighGui, tick: Tick) -> Self {
        Self {
            gui,
            tick,
            textures: HashMap::new(),
            last_pointer: HashMap::new(),
        }
    }

    fn collect_keys(&mut self, ctx: &egui::Context) {
        let mut pressed = Vec::new();
        ctx.input(|i| {
            for event in &i.events {
                match event {
                    // Printable keys, space included, arrive as text.
                    egui::Event::Text(text) => {
                        pressed.extend(text.chars().filter(char::is_ascii).map(|c| c as i32))
                    }
                    egui::Event::Key { key, pressed: true, .. } => pressed.extend(key_code(*key)),
                    _ => {}
                }
            }
        });
        for key in pressed {
            self.gui.push_key(key);
        }
    }

    fn texture_for(&mut self, ctx: &egui::Context, window: usize) -> Option<(egui::TextureId, egui::Vec2)> {
        let win = &self.gui.windows()[window];
        let image = win.image()?;
        let size = [image.width() as usize, image.height() as usize];
        let needs_upload = self
            .textures
            .get(&win.name)
            .map_or(true, |t| t.version != win.version());

        if needs_upload {
            let color = egui::ColorImage::from_rgb(size, image.as_raw());
            match self.textures.get_mut(&win.name) {
                Some(uploaded) => {
                    uploaded.texture.set(color, egui::TextureOptions::NEAREST);
                    uploaded.version = win.version();
                }
                None => {
                    let texture = ctx.load_texture(win.name.clone(), color, egui::TextureOptions::NEAREST);
                    self.textures.insert(
                        win.name.clone(),
                        UploadedImage {
                            version: win.version(),
                            texture,
                        },
                    );
                }
            }
        }
        let uploaded = self.textures.get(&win.name)?;
        Some((uploaded.texture.id(), egui::vec2(size[0] as f32, size[1] as f32)))
    }

    /// Translates pointer input over an image into window mouse events.
    fn mouse_events(
        &mut self,
        ctx: &egui::Context,
        name: &str,
        response: &egui::Response,
        image_size: egui::Vec2,
    ) -> Vec<MouseEvent> {
        let Some(pos) = response.hover_pos() else {
            self.last_pointer.remove(name);
            return Vec::new();
        };
        let rect = response.rect;
        let x = ((pos.x - rect.min.x) / rect.width() * image_size.x).floor() as i32;
        let y = ((pos.y - rect.min.y) / rect.height() * image_size.y).floor() as i32;

        let mut events = Vec::new();
        let (flags, scroll) = ctx.input(|i| {
            let mut flags = 0;
            for (button, flag) in [
                (egui::PointerButton::Primary, mouse_flags::LBUTTON),
                (egui::PointerButton::Secondary, mouse_flags::RBUTTON),
                (egui::PointerButton::Middle, mouse_flags::MBUTTON),
            ] {
                if i.pointer.button_down(button) {
                    flags |= flag;
                }
            }
            if i.modifiers.ctrl {
                flags |= mouse_flags::CTRLKEY;
            }
            if i.modifiers.shift {
                flags |= mouse_flags::SHIFTKEY;
            }
            if i.modifiers.alt {
                flags |= mouse_flags::ALTKEY;
            }

            let buttons = [
                (
                    egui::PointerButton::Primary,
                    MouseEventKind::LButtonDown,
                    MouseEventKind::LButtonUp,
                ),
                (
                    egui::PointerButton::Secondary,
                    MouseEventKind::RButtonDown,
                    MouseEventKind::RButtonUp,
                ),
                (
                    egui::PointerButton::Middle,
                    MouseEventKind::MButtonDown,
                    MouseEventKind::MButtonUp,
                ),
            ];
            for (button, down, up) in buttons {
                if i.pointer.button_pressed(button) {
                    events.push(down);
                }
                if i.pointer.button_released(button) {
                    events.push(up);
                }
            }
            (flags, i.raw_scroll_delta.y)
        });

        for (button, kind) in [
            (egui::PointerButton::Primary, MouseEventKind::LButtonDblClk),
            (egui::PointerButton::Secondary, MouseEventKind::RButtonDblClk),
            (egui::PointerButton::Middle, MouseEventKind::MButtonDblClk),
        ] {
            if response.double_clicked_by(button) {
                events.push(kind);
            }
        }

        let moved = self.last_pointer.insert(name.to_string(), (x, y)) != Some((x, y));
        let mut out: Vec<MouseEvent> = Vec::with_capacity(events.len() + 2);
        let event = |kind, delta| MouseEvent {
            kind,
            x,
            y,
            flags,
            delta,
        };
        if moved {
            out.push(event(MouseEventKind::MouseMove, 0.0));
        }
        out.extend(events.into_iter().map(|kind| event(kind, 0.0)));
        if scroll != 0.0 {
            out.push(event(MouseEventKind::MouseWheel, scroll));
        }
        out
    }

    fn show_windows(&mut self, ctx: &egui::Context) {
        let mut pending: Vec<(String, MouseEvent)> = Vec::new();

        for index in 0..self.gui.windows().len() {
            let texture = self.texture_for(ctx, index);
            let (name, flags, mouse_enabled) = {
                let win = &self.gui.windows()[index];
                (win.name.clone(), win.flags, win.mouse_enabled())
            };

            let mut image_response = None;
            let mut trackbars = self.gui.windows()[index].trackbars().to_vec();
            egui::Window::new(name.as_str())
                .resizable(flags == WindowFlags::Normal)
                .show(ctx, |ui| {
                    for t in trackbars.iter_mut() {
                        ui.add(egui::Slider::new(&mut t.value, 0..=t.max).text(t.name.as_str()));
                    }
                    if let Some((id, size)) = texture {
                        let shown = match flags {
                            WindowFlags::Autosize => size,
                            WindowFlags::Normal => {
                                let avail = ui.available_size();
                                let scale = (avail.x / size.x).min(avail.y / size.y);
                                if scale.is_finite() && scale > 0.0 {
                                    size * scale
                                } else {
                                    size
                                }
                            }
                        };
                        let sense = if mouse_enabled {
                            egui::Sense::click_and_drag()
                        } else {
                            egui::Sense::hover()
                        };
                        let response = ui.add(egui::Image::new((id, shown)).sense(sense));
                        image_response = Some((response, size));
                    }
                });

            if let Some(win) = self.gui.windows_mut().get_mut(index) {
                for (slot, t) in win.trackbars_mut().iter_mut().zip(trackbars) {
                    slot.value = t.value;
                }
            }
            if let (true, Some((response, size))) = (mouse_enabled, image_response) {
                for event in self.mouse_events(ctx, &name, &response, size) {
                    pending.push((name.clone(), event));
                }
            }
        }

        for (window, event) in pending {
            // The window may have been destroyed by the tick in the meantime.
            let _ = self.gui.push_mouse_event(&window, event);
        }
    }
}

impl eframe::App for NativeViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_keys(ctx);

        let flow = (self.tick)(&mut self.gui);
        if flow == Flow::Exit || self.gui.windows().is_empty() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        let names: Vec<&str> = self.gui.window_names();
        self.textures.retain(|name, _| names.contains(&name.as_str()));

        self.show_windows(ctx);

        if let Some(delay) = self.gui.repaint_after() {
            ctx.request_repaint_after(delay);
        }
    }
}

/// Runs the event loop, calling `tick` once per frame until it returns
/// [`Flow::Exit`], every window is destroyed or the viewport is closed.
pub fn run<F>(app_name: &str, gui: HighGui, tick: F) -> Result<()>
where
    F: FnMut(&mut HighGui) -> Flow + 'static,
{
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };

    tracing::debug!(app_name, windows = gui.windows().len(), "starting viewer");
    eframe::run_native(
        app_name,
        options,
        Box::new(move |cc| Ok(Box::new(NativeViewer::new(cc, gui, Box::new(tick))))),
    )
    .map_err(|e| ViewerError::Launch(e.to_string()))
}

/// Shows each image in its own window until any key is pressed.
pub fn show_and_wait<P: U8Pixel>(app_name: &str, images: &[(&str, &Image<P>)]) -> Result<()> {
    let mut gui = HighGui::new();
    for (name, img) in images {
        gui.imshow(name, img);
    }
    run(app_name, gui, |gui| match gui.wait_key(0) {
        Some(_) => Flow::Exit,
        None => Flow::Continue,
    })
}
