use anyhow::Result;
use easel_engine::component::{Clickable, Component, Drawable, EventListener, Hoverable};
use easel_engine::coords::Rect;
use easel_engine::input::KeyId;
use easel_engine::logging::{init_logging, LoggingConfig};
use easel_engine::paint::TextAlign;
use easel_engine::{launch_from_env, Canvas, Engine};

const BALL_RADIUS: f32 = 18.0;
const FPS: f32 = 60.0;

// ── button ────────────────────────────────────────────────────────────────

/// Highlights under the pointer and counts left clicks.
struct Button {
    area: Rect,
    label: &'static str,
    hovered: bool,
    clicks: u32,
}

impl Button {
    fn new(area: Rect, label: &'static str) -> Self {
        Self { area, label, hovered: false, clicks: 0 }
    }
}

impl Component for Button {
    fn as_drawable(&mut self) -> Option<&mut dyn Drawable> {
        Some(self)
    }

    fn as_hoverable(&mut self) -> Option<&mut dyn Hoverable> {
        Some(self)
    }

    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        Some(self)
    }
}

impl Drawable for Button {
    fn draw(&mut self, canvas: &mut Canvas) {
        let Rect { x, y, width, height } = self.area;
        if self.hovered {
            canvas.set_color(70, 130, 220);
        } else {
            canvas.set_color(50, 90, 160);
        }
        canvas.fill_rect(x, y, width, height);

        canvas.set_color(255, 255, 255);
        canvas.set_font(18.0, true, false);
        canvas.set_text_align(TextAlign::Center);
        canvas.draw_string(format!("{} ({})", self.label, self.clicks), x + width * 0.5, y + height * 0.5 + 6.0);
    }
}

impl Hoverable for Button {
    fn hover_area(&self) -> Rect {
        self.area
    }

    fn on_mouse_enter(&mut self) {
        self.hovered = true;
    }

    fn on_mouse_exit(&mut self) {
        self.hovered = false;
    }
}

impl Clickable for Button {
    fn click_area(&self) -> Rect {
        self.area
    }

    fn on_left_click(&mut self, _x: f32, _y: f32) {
        self.clicks += 1;
        log::info!("{} clicked {} times", self.label, self.clicks);
    }

    fn on_right_click(&mut self, _x: f32, _y: f32) {
        self.clicks = 0;
    }
}

// ── key echo ──────────────────────────────────────────────────────────────

/// Shows the last keys released, newest last.
#[derive(Default)]
struct KeyEcho {
    typed: String,
}

impl Component for KeyEcho {
    fn as_drawable(&mut self) -> Option<&mut dyn Drawable> {
        Some(self)
    }

    fn as_listener(&mut self) -> Option<&mut dyn EventListener> {
        Some(self)
    }
}

impl Drawable for KeyEcho {
    fn draw(&mut self, canvas: &mut Canvas) {
        canvas.set_color(40, 40, 40);
        canvas.set_font(16.0, false, false);
        let baseline = canvas.height() as f32 - 24.0;
        canvas.draw_string(format!("typed: {}", self.typed), 20.0, baseline);
    }
}

impl EventListener for KeyEcho {
    fn on_key_release(&mut self, key: &KeyId) {
        let shown = key
            .ch()
            .filter(|c| !c.is_control())
            .map(String::from)
            .unwrap_or_else(|| format!("<{}>", key.name()));
        self.typed.push_str(&shown);
        if self.typed.chars().count() > 40 {
            self.typed = self.typed.chars().skip(self.typed.chars().count() - 40).collect();
        }
    }
}

// ── program ───────────────────────────────────────────────────────────────

fn run(engine: &mut Engine) -> Result<()> {
    engine.set_title("easel demo")?;
    engine.add_component(Button::new(Rect::new(20.0, 20.0, 180.0, 44.0), "click me"));
    engine.add_component(KeyEcho::default());

    let (mut x, mut y) = (120.0_f32, 160.0_f32);
    let (mut vx, mut vy) = (180.0_f32, 140.0_f32);
    let mut paused = false;

    while engine.is_open() {
        let frame = engine.deliver_and_clear_fps(FPS)?;

        if engine.was_key_typed("space")? {
            paused = !paused;
        }
        if engine.was_key_typed("escape")? {
            engine.close();
            break;
        }

        let (w, h) = (engine.width() as f32, engine.height() as f32);
        if !paused {
            x += vx * frame.dt;
            y += vy * frame.dt;
            if x < BALL_RADIUS || x > w - BALL_RADIUS {
                vx = -vx;
                x = x.min(w - BALL_RADIUS).max(BALL_RADIUS);
            }
            if y < BALL_RADIUS || y > h - BALL_RADIUS {
                vy = -vy;
                y = y.min(h - BALL_RADIUS).max(BALL_RADIUS);
            }
        }

        engine.set_color(230, 90, 60);
        engine.fill_oval(x - BALL_RADIUS, y - BALL_RADIUS, BALL_RADIUS * 2.0, BALL_RADIUS * 2.0);

        // Ring following the pointer.
        let (mx, my) = (engine.mouse_x(), engine.mouse_y());
        engine.set_color(0, 0, 0);
        engine.set_stroke_width(2.0);
        engine.draw_oval(mx - 8.0, my - 8.0, 16.0, 16.0);

        engine.set_color(90, 90, 90);
        engine.set_font(14.0, false, true);
        engine.set_text_align(TextAlign::Right);
        let status = if paused { "paused" } else { "space: pause\nesc: quit" };
        engine.draw_string(status, w - 16.0, 30.0);
    }

    Ok(())
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    launch_from_env(run)
}
