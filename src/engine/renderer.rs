use super::stage::{Node, Size, Stage, TilingSprite};
use crate::browser;
use anyhow::{anyhow, Result};
use std::cell::Cell;
use std::rc::Rc;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Paints a view's stage. Implemented by the canvas renderer in the browser
/// and by recording fakes in tests.
pub trait RenderBackend {
    fn render(&mut self, stage: &Stage);
}

/// Where a fixed logical resolution lands inside the window: one uniform
/// scale factor, aspect ratio preserved, centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub ratio: f64,
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

impl Viewport {
    pub fn fit(logical: Size, window: Size) -> Self {
        let ratio = (window.width / logical.width).min(window.height / logical.height);
        let width = logical.width * ratio;
        let height = logical.height * ratio;
        Viewport {
            ratio,
            width,
            height,
            left: window.width / 2.0 - width / 2.0,
            top: window.height / 2.0 - height / 2.0,
        }
    }

    pub fn identity(logical: Size) -> Self {
        Viewport {
            ratio: 1.0,
            width: logical.width,
            height: logical.height,
            left: 0.0,
            top: 0.0,
        }
    }
}

/// 2d canvas backend. Views always paint in logical coordinates; the
/// renderer scales around every paint and keeps the canvas fitted to the
/// window.
pub struct CanvasRenderer {
    context: CanvasRenderingContext2d,
    logical: Size,
    viewport: Rc<Cell<Viewport>>,
}

impl CanvasRenderer {
    pub fn new(logical: Size) -> Result<Self> {
        let canvas = browser::canvas()?;
        let context = browser::context(&canvas)?;
        canvas
            .style()
            .set_property("position", "absolute")
            .map_err(|err| anyhow!("Could not position canvas : {:#?}", err))?;

        let viewport = Rc::new(Cell::new(Viewport::identity(logical)));
        rescale(&canvas, logical, &viewport)?;

        let resized = Rc::clone(&viewport);
        browser::on_resize(move || {
            if let Err(err) = rescale(&canvas, logical, &resized) {
                log::error!("could not rescale canvas: {:#}", err);
            }
        })?;

        Ok(CanvasRenderer {
            context,
            logical,
            viewport,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn paint(&self, stage: &Stage) {
        self.context.set_fill_style_str(stage.background());
        self.context
            .fill_rect(0.0, 0.0, self.logical.width, self.logical.height);

        for node in stage.nodes() {
            let painted = match node {
                Node::Sprite(sprite) => {
                    let sprite = sprite.borrow();
                    let size = sprite.texture.size();
                    self.context.save();
                    self.context.set_global_alpha(sprite.alpha);
                    let result = self
                        .context
                        .translate(sprite.position.x, sprite.position.y)
                        .and_then(|_| self.context.rotate(sprite.rotation))
                        .and_then(|_| self.context.scale(sprite.scale.x, sprite.scale.y))
                        .and_then(|_| {
                            self.context.draw_image_with_html_image_element(
                                sprite.texture.image(),
                                -size.width * sprite.anchor.x,
                                -size.height * sprite.anchor.y,
                            )
                        });
                    self.context.restore();
                    result
                }
                Node::Tiling(tiling) => self.paint_tiles(tiling),
                Node::Text(text) => {
                    self.context.set_font(&text.font);
                    self.context.set_fill_style_str(&text.fill);
                    self.context.set_text_align("center");
                    self.context.set_text_baseline("middle");
                    self.context
                        .fill_text(&text.content, text.position.x, text.position.y)
                }
            };
            if let Err(err) = painted {
                log::warn!("skipped a node that failed to paint: {:?}", err);
            }
        }
    }

    fn paint_tiles(&self, tiling: &TilingSprite) -> Result<(), wasm_bindgen::JsValue> {
        let tile = tiling.texture.size();
        if tile.width <= 0.0 || tile.height <= 0.0 {
            return Ok(());
        }
        let start_x = tiling.tile_offset.x.rem_euclid(tile.width) - tile.width;
        let start_y = tiling.tile_offset.y.rem_euclid(tile.height) - tile.height;

        self.context.save();
        self.context.set_global_alpha(tiling.alpha);
        self.context.begin_path();
        self.context
            .rect(0.0, 0.0, tiling.size.width, tiling.size.height);
        self.context.clip();

        let mut result = Ok(());
        let mut y = start_y;
        while y < tiling.size.height && result.is_ok() {
            let mut x = start_x;
            while x < tiling.size.width && result.is_ok() {
                result = self
                    .context
                    .draw_image_with_html_image_element(tiling.texture.image(), x, y);
                x += tile.width;
            }
            y += tile.height;
        }
        self.context.restore();
        result
    }
}

impl RenderBackend for CanvasRenderer {
    fn render(&mut self, stage: &Stage) {
        let ratio = self.viewport.get().ratio;
        self.context.save();
        if let Err(err) = self.context.scale(ratio, ratio) {
            log::warn!("could not scale canvas: {:?}", err);
        }
        self.paint(stage);
        self.context.restore();
    }
}

fn rescale(canvas: &HtmlCanvasElement, logical: Size, viewport: &Cell<Viewport>) -> Result<()> {
    let (width, height) = browser::inner_size()?;
    let fitted = Viewport::fit(logical, Size::new(width, height));

    canvas.set_width(fitted.width as u32);
    canvas.set_height(fitted.height as u32);
    let style = canvas.style();
    style
        .set_property("left", &format!("{}px", fitted.left))
        .and_then(|_| style.set_property("top", &format!("{}px", fitted.top)))
        .map_err(|err| anyhow!("Could not move canvas : {:#?}", err))?;

    log::debug!("canvas scaled by {:.3}", fitted.ratio);
    viewport.set(fitted);
    Ok(())
}
