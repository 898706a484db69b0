use anyhow::{anyhow, Result};
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    Document,
    Window,
    CanvasRenderingContext2d,
    HtmlCanvasElement,
    HtmlImageElement,
    Response,
};

// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
    pub const RESIZE_EVENT: &str = "resize";
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    // get_context is Result<Option<Object>, JsValue>: map the JsValue error,
    // then the missing context, then the cast
    canvas
        .get_context(html::CONTEXT_2D)
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new()
        .map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

/// Inner window size in CSS pixels as `(width, height)`.
pub fn inner_size() -> Result<(f64, f64)> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Could not read window width : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window width is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Could not read window height : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window height is not a number"))?;
    Ok((width, height))
}

/// Calls `on_resize` every time the window is resized, for the rest of the
/// page's life.
pub fn on_resize(on_resize: impl FnMut() + 'static) -> Result<()> {
    let callback = Closure::<dyn FnMut()>::new(on_resize);
    window()?
        .add_event_listener_with_callback(html::RESIZE_EVENT, callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Could not listen for resize : {:#?}", err))?;
    // the listener lives as long as the window
    callback.forget();
    Ok(())
}

pub fn closure_once<F, A, R>(f: F) -> Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

/// Schedules `callback` for the next paint opportunity. The closure frees
/// itself once it has run, so a frame chain does not leak one closure per
/// frame.
pub fn request_animation_frame_once<F>(callback: F) -> Result<i32>
where
    F: FnOnce(f64) + 'static,
{
    let callback = Closure::once_into_js(move |time: f64| callback(time));
    window()?
        .request_animation_frame(callback.unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame : {:#?}", err))
}

/// Resolves after `ms` milliseconds.
pub async fn sleep(ms: u32) -> Result<()> {
    let window = window()?;
    let mut scheduled = Ok(0);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            &resolve,
            ms.min(i32::MAX as u32) as i32,
        );
    });
    scheduled.map_err(|err| anyhow!("Could not set timeout : {:#?}", err))?;
    JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|err| anyhow!("Timeout failed : {:#?}", err))
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// `spawn_local` in the shape the texture loader expects.
pub fn spawn_boxed(future: LocalBoxFuture<'static, ()>) {
    wasm_bindgen_futures::spawn_local(future);
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!(
            "fetching '{}' answered with status {}",
            json_path,
            resp.status()
        ));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}
